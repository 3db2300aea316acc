//! The JSON chat endpoint.
//!
//! `POST /chat` — run one complaint exchange and return the decision.
//!
//! Invalid input is the caller's problem (400 with the user-facing reason);
//! anything else that escapes the agent's internal degradation is a 500 with
//! a generic body, details go to the log only.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use redress_agent::{ChatOutcome, ComplaintAgent};
use redress_core::domain::DecisionStatus;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Clone)]
pub struct ChatState {
    agent: Arc<ComplaintAgent>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub order_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: DecisionStatus,
    pub resolution: Option<String>,
    pub message: String,
    pub escalate: bool,
    pub policy_citations: Vec<String>,
    pub next_steps: Vec<String>,
    pub order_summary: Option<String>,
    pub session_id: String,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            status: outcome.decision.status,
            resolution: outcome.decision.resolution,
            message: outcome.decision.message,
            escalate: outcome.decision.escalate,
            policy_citations: outcome.decision.policy_citations,
            next_steps: outcome.decision.next_steps,
            order_summary: outcome.order_summary,
            session_id: outcome.session_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub fn router(agent: Arc<ComplaintAgent>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(ChatState { agent })
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiError>)> {
    let outcome = state
        .agent
        .handle_chat(&body.message, body.order_id.as_deref(), body.session_id.as_deref())
        .await;

    match outcome {
        Ok(outcome) => {
            info!(
                event_name = "server.chat.completed",
                session_id = %outcome.session_id,
                escalate = outcome.decision.escalate,
                "chat exchange completed"
            );
            Ok(Json(ChatResponse::from(outcome)))
        }
        Err(error) if error.is_user_error() => {
            Err((StatusCode::BAD_REQUEST, Json(ApiError { error: error.user_message() })))
        }
        Err(error) => {
            error!(event_name = "server.chat.failed", error = %error, "chat exchange failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "an internal error occurred".to_string() }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::{extract::State, http::StatusCode, Json};
    use redress_agent::{
        ChatMessage, ChatOracle, ComplaintAgent, InMemorySessionStore, OracleError,
    };
    use redress_core::config::{
        AppConfig, CatalogConfig, DatabaseConfig, EmbeddingsConfig, LogFormat, LoggingConfig,
        OracleConfig, ServerConfig,
    };
    use redress_core::domain::DecisionStatus;
    use redress_db::{connect_with_settings, migrations};
    use redress_retrieval::HashEmbedder;
    use secrecy::SecretString;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::{chat, router, ChatRequest, ChatState};

    struct FixedOracle {
        reply: Mutex<Option<String>>,
    }

    #[async_trait]
    impl ChatOracle for FixedOracle {
        async fn decide(&self, _messages: &[ChatMessage]) -> Result<String, OracleError> {
            match self.reply.lock().unwrap().clone() {
                Some(reply) => Ok(reply),
                None => Err(OracleError::EmptyResponse),
            }
        }
    }

    async fn chat_state(reply: Option<&str>) -> (ChatState, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join("policies.json"),
            r#"[{"policy_id": "P1", "keywords": ["broken seal"],
                 "default_resolution": "full refund",
                 "response_template": "A full refund is on its way.",
                 "next_steps": ["Refund lands in 3-5 business days"]}]"#,
        )
        .expect("write policies");
        fs::write(
            dir.path().join("knowledge_base.json"),
            r#"[{"content": "Broken seals qualify for a full refund.", "policy_id": "P1"}]"#,
        )
        .expect("write knowledge base");

        let config = AppConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                timeout_secs: 30,
            },
            oracle: OracleConfig {
                endpoint: "https://unit.test".to_string(),
                api_key: SecretString::from("test-key"),
                api_version: "2024-06-01".to_string(),
                deployment: "gpt-chat".to_string(),
                timeout_secs: 120,
            },
            embeddings: EmbeddingsConfig {
                deployment: None,
                local_model: Some("hash-256".to_string()),
                timeout_secs: 120,
            },
            catalog: CatalogConfig { data_dir: dir.path().to_path_buf() },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        };

        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let agent = ComplaintAgent::with_parts(
            config,
            pool,
            Arc::new(FixedOracle { reply: Mutex::new(reply.map(str::to_string)) }),
            Arc::new(HashEmbedder::default()),
            Arc::new(InMemorySessionStore::new()),
        );
        (ChatState { agent: Arc::new(agent) }, dir)
    }

    #[tokio::test]
    async fn valid_request_returns_the_decision_payload() {
        let (state, _dir) = chat_state(Some(
            r#"{"status": "handled", "resolution": "full refund",
                "message": "Refund approved.", "escalate": false,
                "policy_citations": ["P1"], "next_steps": ["Wait 3-5 days"]}"#,
        ))
        .await;

        let Json(response) = chat(
            State(state),
            Json(ChatRequest {
                message: "broken seal on my order".to_string(),
                order_id: None,
                session_id: Some("client-1".to_string()),
            }),
        )
        .await
        .expect("200");

        assert_eq!(response.status, DecisionStatus::Handled);
        assert_eq!(response.resolution.as_deref(), Some("full refund"));
        assert_eq!(response.session_id, "client-1");
        assert_eq!(response.order_summary, None);
    }

    #[tokio::test]
    async fn invalid_message_is_a_bad_request() {
        let (state, _dir) = chat_state(None).await;

        let result = chat(
            State(state),
            Json(ChatRequest {
                message: "   ".to_string(),
                order_id: None,
                session_id: None,
            }),
        )
        .await;

        let (status, Json(body)) = result.expect_err("400");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Message is required.");
    }

    #[tokio::test]
    async fn invalid_order_id_is_a_bad_request() {
        let (state, _dir) = chat_state(None).await;

        let result = chat(
            State(state),
            Json(ChatRequest {
                message: "where is my food".to_string(),
                order_id: Some("ord!123".to_string()),
                session_id: None,
            }),
        )
        .await;

        let (status, Json(body)) = result.expect_err("400");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Order ID format is invalid.");
    }

    #[tokio::test]
    async fn router_serves_chat_over_http() {
        let (state, _dir) = chat_state(Some(
            r#"{"status": "handled", "resolution": "full refund",
                "message": "Refund approved.", "escalate": false,
                "policy_citations": ["P1"], "next_steps": []}"#,
        ))
        .await;
        let app = router(Arc::clone(&state.agent));

        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"message": "broken seal on my order", "session_id": "client-9"}"#,
            ))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(payload["status"], "handled");
        assert_eq!(payload["session_id"], "client-9");

        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message": "   "}"#))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(payload["error"], "Message is required.");
    }

    #[tokio::test]
    async fn oracle_failure_still_produces_an_answer() {
        let (state, _dir) = chat_state(None).await;

        let Json(response) = chat(
            State(state),
            Json(ChatRequest {
                message: "my food came with a broken seal".to_string(),
                order_id: None,
                session_id: None,
            }),
        )
        .await
        .expect("fallback answers instead of erroring");

        assert_eq!(response.status, DecisionStatus::Handled);
        assert_eq!(response.policy_citations, vec!["P1".to_string()]);
        assert_eq!(response.session_id.len(), 36);
    }
}
