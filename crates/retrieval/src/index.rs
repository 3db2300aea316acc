use std::sync::Arc;

use redress_core::domain::{KnowledgeDoc, PolicySnippet};

use crate::embeddings::Embedder;
use crate::RetrievalError;

pub const DEFAULT_TOP_K: usize = 3;

struct IndexEntry {
    policy_id: String,
    text: String,
    vector: Vec<f32>,
}

/// Brute-force cosine index over the embedded knowledge base.
///
/// Building embeds every document and is the expensive step; searching is a
/// linear scan, which is fine for a policy catalog of this size.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub async fn build(
        embedder: Arc<dyn Embedder>,
        docs: &[KnowledgeDoc],
    ) -> Result<Self, RetrievalError> {
        if docs.is_empty() {
            return Err(RetrievalError::EmptyKnowledgeBase);
        }

        let contents: Vec<String> = docs.iter().map(|doc| doc.content.clone()).collect();
        let vectors = embedder.embed(&contents).await?;
        if vectors.len() != docs.len() {
            return Err(RetrievalError::VectorCountMismatch {
                expected: docs.len(),
                got: vectors.len(),
            });
        }

        let entries = docs
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| IndexEntry {
                policy_id: doc.policy_id.clone(),
                text: doc.content.clone(),
                vector,
            })
            .collect();

        Ok(Self { embedder, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k snippets by cosine similarity, relevance-descending. Ties keep
    /// catalog insertion order (the sort is stable).
    pub async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<PolicySnippet>, RetrievalError> {
        let query_vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = query_vectors.first().ok_or(RetrievalError::VectorCountMismatch {
            expected: 1,
            got: 0,
        })?;

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (cosine_similarity(query_vector, &entry.vector), position))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, position)| {
                let entry = &self.entries[position];
                PolicySnippet { policy_id: entry.policy_id.clone(), text: entry.text.clone() }
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|value| value * value).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
