use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redress_core::config::AppConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::RetrievalError;

/// Text-to-vector boundary. Implementations must return one vector per
/// input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}

/// Picks the embedding family from config: remote deployment when
/// configured, otherwise the local model identifier. Config validation
/// guarantees exactly one is present.
pub fn embedder_from_config(config: &AppConfig) -> Result<Arc<dyn Embedder>, RetrievalError> {
    if config.embeddings.deployment.is_some() {
        return Ok(Arc::new(AzureEmbedder::from_config(config)?));
    }
    let model = config.embeddings.local_model.as_deref().unwrap_or("hash-256");
    Ok(Arc::new(HashEmbedder::from_model_id(model)?))
}

/// Remote embeddings over the Azure-OpenAI-shaped REST surface.
pub struct AzureEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    api_version: String,
    deployment: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl AzureEmbedder {
    pub fn from_config(config: &AppConfig) -> Result<Self, RetrievalError> {
        let deployment = config
            .embeddings
            .deployment
            .clone()
            .ok_or_else(|| RetrievalError::Transport("no embeddings deployment configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.embeddings.timeout_secs))
            .build()
            .map_err(|err| RetrievalError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.oracle.endpoint.trim_end_matches('/').to_string(),
            api_key: config.oracle.api_key.clone(),
            api_version: config.oracle.api_version.clone(),
            deployment,
        })
    }
}

#[async_trait]
impl Embedder for AzureEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let url = format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&EmbeddingsRequest { input: texts })
            .send()
            .await
            .map_err(|err| RetrievalError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Backend { status: status.as_u16(), detail });
        }

        let payload: EmbeddingsResponse =
            response.json().await.map_err(|err| RetrievalError::Transport(err.to_string()))?;

        if payload.data.len() != texts.len() {
            return Err(RetrievalError::VectorCountMismatch {
                expected: texts.len(),
                got: payload.data.len(),
            });
        }

        let mut items = payload.data;
        items.sort_by_key(|item| item.index);
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }
}

/// Deterministic local embedder: feature-hashed bag of words, L2-normalized.
///
/// Stand-in for a local embedding model; crude as semantics go, but it keeps
/// the entire retrieval path runnable offline and gives stable, testable
/// rankings for keyword-overlapping text.
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    /// Builds the embedder from a `hash-<dimensions>` model identifier, the
    /// form `embeddings.local_model` takes in config.
    pub fn from_model_id(model: &str) -> Result<Self, RetrievalError> {
        let dimensions = model
            .strip_prefix("hash-")
            .and_then(|suffix| suffix.parse::<usize>().ok())
            .filter(|dimensions| *dimensions > 0)
            .ok_or_else(|| RetrievalError::UnknownLocalModel(model.to_string()))?;
        Ok(Self::new(dimensions))
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.to_lowercase().split(|ch: char| !ch.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Embedder, HashEmbedder};
    use crate::RetrievalError;

    #[tokio::test]
    async fn hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::default();
        let texts = vec!["refund for a broken seal".to_string()];

        let first = embedder.embed(&texts).await.expect("embed");
        let second = embedder.embed(&texts).await.expect("embed");
        assert_eq!(first, second);

        let norm = first[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "expected unit norm, got {norm}");
    }

    #[tokio::test]
    async fn overlapping_text_is_more_similar_than_disjoint_text() {
        let embedder = HashEmbedder::default();
        let texts = vec![
            "broken seal refund policy".to_string(),
            "the seal was broken on arrival".to_string(),
            "rider arrived very late yesterday".to_string(),
        ];
        let vectors = embedder.embed(&texts).await.expect("embed");

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2]));
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let vectors = embedder.embed(&["   ".to_string()]).await.expect("embed");
        assert!(vectors[0].iter().all(|value| *value == 0.0));
    }

    #[tokio::test]
    async fn model_id_suffix_sets_the_vector_width() {
        let embedder = HashEmbedder::from_model_id("hash-64").expect("valid model id");
        let vectors = embedder.embed(&["late delivery".to_string()]).await.expect("embed");
        assert_eq!(vectors[0].len(), 64);
    }

    #[test]
    fn unrecognized_model_id_is_rejected() {
        for model in ["minilm-l6", "hash-", "hash-0", "hash-abc", ""] {
            let result = HashEmbedder::from_model_id(model);
            assert!(
                matches!(result, Err(RetrievalError::UnknownLocalModel(_))),
                "expected rejection for {model:?}"
            );
        }
    }
}
