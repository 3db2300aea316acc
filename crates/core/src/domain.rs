use serde::{Deserialize, Serialize};

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a session transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Terminal disposition of a complaint exchange.
///
/// `NeedsHuman` is a successful outcome, not an error: it marks the complaint
/// for manual review instead of automated resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Handled,
    NeedsHuman,
}

/// Structured outcome of one exchange.
///
/// `policy_citations` and `next_steps` are always lists of strings after
/// normalization, regardless of what shape the oracle returned them in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    pub resolution: Option<String>,
    pub message: String,
    pub escalate: bool,
    pub policy_citations: Vec<String>,
    pub next_steps: Vec<String>,
}

/// One entry of the policy catalog (`policies.json`). Read-only at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub policy_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub default_resolution: String,
    pub response_template: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// One entry of the knowledge-base catalog (`knowledge_base.json`), the
/// source material for the retrieval index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDoc {
    pub content: String,
    #[serde(default = "KnowledgeDoc::default_title")]
    pub title: String,
    #[serde(default = "KnowledgeDoc::unknown_policy")]
    pub policy_id: String,
}

impl KnowledgeDoc {
    fn default_title() -> String {
        "policy".to_string()
    }

    fn unknown_policy() -> String {
        "unknown".to_string()
    }
}

/// A retrieved snippet, scoped to a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicySnippet {
    pub policy_id: String,
    pub text: String,
}
