use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{KnowledgeDoc, PolicyRecord};

pub const POLICIES_FILE: &str = "policies.json";
pub const KNOWLEDGE_BASE_FILE: &str = "knowledge_base.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Loads the policy catalog. Catalog order is meaningful: the rule-based
/// fallback scans policies first-to-last.
pub fn load_policies(data_dir: &Path) -> Result<Vec<PolicyRecord>, CatalogError> {
    load_catalog(&data_dir.join(POLICIES_FILE))
}

/// Loads the knowledge-base documents that feed the retrieval index.
pub fn load_knowledge_base(data_dir: &Path) -> Result<Vec<KnowledgeDoc>, CatalogError> {
    load_catalog(&data_dir.join(KNOWLEDGE_BASE_FILE))
}

fn load_catalog<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, CatalogError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&raw)
        .map_err(|source| CatalogError::Parse { path: path.to_path_buf(), source })
}
