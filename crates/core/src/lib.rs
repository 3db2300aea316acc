//! Core domain for the complaint-resolution agent.
//!
//! This crate holds everything the rest of the workspace agrees on:
//!
//! - `config` - layered application configuration (defaults, TOML file,
//!   environment, programmatic overrides) with fail-fast validation
//! - `domain` - complaint/session/policy/decision types shared across crates
//! - `errors` - the request-level error taxonomy and its HTTP-facing mapping
//! - `catalog` - read-only loaders for the policy and knowledge-base catalogs
//! - `validate` - input validation for customer-supplied fields
//!
//! Nothing here performs I/O beyond reading configuration and catalog files;
//! the oracle, retrieval, and database boundaries live in sibling crates.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod validate;

pub use catalog::{load_knowledge_base, load_policies, CatalogError};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use domain::{Decision, DecisionStatus, KnowledgeDoc, PolicyRecord, PolicySnippet, Role, Turn};
pub use errors::AgentError;
pub use validate::{validate_message, validate_order_id, validate_session_id, MESSAGE_MAX_LEN};
