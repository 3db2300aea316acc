use std::time::Duration;

use async_trait::async_trait;
use redress_core::config::OracleConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failure: {0}")]
    Transport(String),
    #[error("oracle returned {status}: {detail}")]
    Backend { status: u16, detail: String },
    #[error("oracle response contained no message content")]
    EmptyResponse,
}

/// The language-model boundary: structured request in, free text out.
///
/// The returned text SHOULD be a single JSON decision object, but that is a
/// request, not a guarantee - callers must go through the parser/fallback.
#[async_trait]
pub trait ChatOracle: Send + Sync {
    async fn decide(&self, messages: &[ChatMessage]) -> Result<String, OracleError>;
}

/// Azure-OpenAI-shaped chat-completions client. One attempt per call; the
/// only failure handling at this layer is the configured request timeout.
pub struct AzureChatOracle {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    api_version: String,
    deployment: String,
}

const DECISION_TEMPERATURE: f32 = 0.2;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl AzureChatOracle {
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            deployment: config.deployment.clone(),
        })
    }
}

#[async_trait]
impl ChatOracle for AzureChatOracle {
    async fn decide(&self, messages: &[ChatMessage]) -> Result<String, OracleError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&CompletionRequest { messages, temperature: DECISION_TEMPERATURE })
            .send()
            .await
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(OracleError::Backend { status: status.as_u16(), detail });
        }

        let payload: CompletionResponse =
            response.json().await.map_err(|err| OracleError::Transport(err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}
