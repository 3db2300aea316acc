use std::future::Future;
use std::sync::{Arc, RwLock};

use redress_core::config::AppConfig;
use tokio::sync::Mutex;
use tracing::info;

use crate::index::VectorIndex;
use crate::RetrievalError;

/// Configuration tuple identifying which index instance is valid. Any field
/// change invalidates the cached index on next use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalKey {
    pub endpoint: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embeddings_deployment: Option<String>,
    pub local_model: Option<String>,
}

impl RetrievalKey {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.oracle.endpoint.clone(),
            api_version: config.oracle.api_version.clone(),
            chat_deployment: config.oracle.deployment.clone(),
            embeddings_deployment: config.embeddings.deployment.clone(),
            local_model: config.embeddings.local_model.clone(),
        }
    }
}

/// Process-wide lazy index cache.
///
/// Lookups take a read lock only. The build step is serialized by a separate
/// async mutex so a cold cache cannot trigger duplicate builds, and requests
/// that hit the cache during a rebuild keep serving the stale index.
#[derive(Default)]
pub struct IndexCache {
    cached: RwLock<Option<(RetrievalKey, Arc<VectorIndex>)>>,
    build_lock: Mutex<()>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_build<F, Fut>(
        &self,
        key: RetrievalKey,
        build: F,
    ) -> Result<Arc<VectorIndex>, RetrievalError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex, RetrievalError>>,
    {
        if let Some(index) = self.lookup(&key) {
            return Ok(index);
        }

        let _build_guard = self.build_lock.lock().await;

        // Another request may have finished the build while we waited.
        if let Some(index) = self.lookup(&key) {
            return Ok(index);
        }

        info!(event_name = "retrieval.index.build", "building retrieval index");
        let index = Arc::new(build().await?);

        if let Ok(mut slot) = self.cached.write() {
            *slot = Some((key, Arc::clone(&index)));
        }
        Ok(index)
    }

    fn lookup(&self, key: &RetrievalKey) -> Option<Arc<VectorIndex>> {
        let slot = self.cached.read().ok()?;
        match slot.as_ref() {
            Some((cached_key, index)) if cached_key == key => Some(Arc::clone(index)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use redress_core::domain::KnowledgeDoc;

    use super::{IndexCache, RetrievalKey};
    use crate::embeddings::HashEmbedder;
    use crate::index::VectorIndex;

    fn key(endpoint: &str) -> RetrievalKey {
        RetrievalKey {
            endpoint: endpoint.to_string(),
            api_version: "2024-06-01".to_string(),
            chat_deployment: "gpt-chat".to_string(),
            embeddings_deployment: None,
            local_model: Some("hash-256".to_string()),
        }
    }

    fn docs() -> Vec<KnowledgeDoc> {
        vec![KnowledgeDoc {
            content: "broken seal refund policy".to_string(),
            title: "policy".to_string(),
            policy_id: "P1".to_string(),
        }]
    }

    #[tokio::test]
    async fn same_key_reuses_the_built_index() {
        let cache = IndexCache::new();
        let builds = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let builds = Arc::clone(&builds);
            cache
                .get_or_build(key("https://a.example"), move || async move {
                    builds.fetch_add(1, Ordering::SeqCst);
                    VectorIndex::build(Arc::new(HashEmbedder::default()), &docs()).await
                })
                .await
                .expect("build");
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn key_change_triggers_a_rebuild() {
        let cache = IndexCache::new();
        let builds = Arc::new(AtomicUsize::new(0));

        for endpoint in ["https://a.example", "https://b.example", "https://b.example"] {
            let builds = Arc::clone(&builds);
            cache
                .get_or_build(key(endpoint), move || async move {
                    builds.fetch_add(1, Ordering::SeqCst);
                    VectorIndex::build(Arc::new(HashEmbedder::default()), &docs()).await
                })
                .await
                .expect("build");
        }

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_build_leaves_the_cache_cold() {
        let cache = IndexCache::new();

        let result = cache
            .get_or_build(key("https://a.example"), || async {
                VectorIndex::build(Arc::new(HashEmbedder::default()), &[]).await
            })
            .await;
        assert!(result.is_err());

        // A later successful build must still be possible.
        cache
            .get_or_build(key("https://a.example"), || async {
                VectorIndex::build(Arc::new(HashEmbedder::default()), &docs()).await
            })
            .await
            .expect("rebuild after failure");
    }
}
