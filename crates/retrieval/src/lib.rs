//! Policy-text retrieval: an embeddings boundary, a small in-memory cosine
//! index over the knowledge-base catalog, and a process-wide index cache
//! keyed by the embedding configuration.
//!
//! The similarity backend is deliberately simple - a brute-force cosine scan
//! over a fixed catalog. The expensive step is embedding the catalog, which
//! is why the built index is cached until the configuration tuple changes.

pub mod cache;
pub mod embeddings;
pub mod index;

pub use cache::{IndexCache, RetrievalKey};
pub use embeddings::{embedder_from_config, AzureEmbedder, Embedder, HashEmbedder};
pub use index::VectorIndex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding transport failure: {0}")]
    Transport(String),
    #[error("embedding backend returned {status}: {detail}")]
    Backend { status: u16, detail: String },
    #[error("embedding backend returned {got} vectors for {expected} inputs")]
    VectorCountMismatch { expected: usize, got: usize },
    #[error("knowledge base is empty, nothing to index")]
    EmptyKnowledgeBase,
    #[error("unrecognized local embedding model '{0}', expected the form hash-<dimensions>")]
    UnknownLocalModel(String),
    #[error("catalog failure: {0}")]
    Catalog(String),
}
