use std::sync::Arc;

use redress_core::catalog::{load_knowledge_base, load_policies};
use redress_core::config::AppConfig;
use redress_core::domain::{Decision, PolicySnippet, Role};
use redress_core::errors::AgentError;
use redress_core::validate::{validate_message, validate_order_id, validate_session_id};
use redress_db::DbPool;
use redress_retrieval::index::DEFAULT_TOP_K;
use redress_retrieval::{embedder_from_config, Embedder, IndexCache, RetrievalKey, VectorIndex};
use tracing::{info, warn};

use crate::context::ContextAssembler;
use crate::fallback::rule_based_fallback;
use crate::llm::{AzureChatOracle, ChatOracle};
use crate::parser::parse_decision;
use crate::prompt::{build_messages, ExchangeContext};
use crate::session::{get_or_create_session, InMemorySessionStore, SessionStore};

/// Everything a caller gets back from one exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatOutcome {
    pub decision: Decision,
    pub order_summary: Option<String>,
    pub session_id: String,
}

/// The complaint-resolution engine. Owns the oracle and embedder handles,
/// the per-session transcript store, and the lazily built retrieval index.
///
/// One instance serves all sessions; `handle_chat` takes `&self` and is safe
/// to call concurrently.
pub struct ComplaintAgent {
    config: AppConfig,
    context: ContextAssembler,
    oracle: Arc<dyn ChatOracle>,
    embedder: Arc<dyn Embedder>,
    sessions: Arc<dyn SessionStore>,
    index_cache: IndexCache,
}

impl ComplaintAgent {
    pub fn from_config(config: AppConfig, pool: DbPool) -> Result<Self, AgentError> {
        let oracle = AzureChatOracle::from_config(&config.oracle)
            .map_err(|err| AgentError::Configuration(err.to_string()))?;
        let embedder = embedder_from_config(&config)
            .map_err(|err| AgentError::Configuration(err.to_string()))?;
        Ok(Self::with_parts(
            config,
            pool,
            Arc::new(oracle),
            embedder,
            Arc::new(InMemorySessionStore::new()),
        ))
    }

    /// Assembles an agent from pre-built parts. This is the seam the tests
    /// use to substitute a scripted oracle.
    pub fn with_parts(
        config: AppConfig,
        pool: DbPool,
        oracle: Arc<dyn ChatOracle>,
        embedder: Arc<dyn Embedder>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            context: ContextAssembler::new(pool),
            oracle,
            embedder,
            sessions,
            index_cache: IndexCache::new(),
        }
    }

    /// Runs one full exchange: validate, gather context, consult the oracle
    /// once, parse or fall back, record both turns.
    ///
    /// Returns `Err` only for invalid input or a broken policy catalog;
    /// oracle and retrieval failures degrade to the rule-based fallback.
    pub async fn handle_chat(
        &self,
        message: &str,
        order_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<ChatOutcome, AgentError> {
        let message = validate_message(message)?;
        let order_id = validate_order_id(order_id)?;
        let session_id = validate_session_id(session_id)?;
        let session_id = get_or_create_session(session_id.as_deref());

        let policies = load_policies(&self.config.catalog.data_dir)
            .map_err(|err| AgentError::Configuration(err.to_string()))?;

        let (snippets, (order_summary, complaint_history)) = tokio::join!(
            self.policy_snippets(&message),
            self.order_context(order_id.as_deref()),
        );

        let history = self.sessions.history(&session_id);
        let exchange = ExchangeContext {
            message: &message,
            order_summary: order_summary.as_deref(),
            complaint_history: complaint_history.as_deref(),
            snippets: &snippets,
        };
        let request = build_messages(&history, &exchange);

        let decision = match self.oracle.decide(&request).await {
            Ok(raw) => parse_decision(&raw),
            Err(error) => {
                warn!(
                    event_name = "agent.oracle.degraded",
                    session_id,
                    error = %error,
                    "oracle call failed, using rule-based fallback"
                );
                None
            }
        };
        let fallback_used = decision.is_none();
        let decision = decision.unwrap_or_else(|| rule_based_fallback(&message, &policies));

        self.sessions.append(&session_id, Role::User, &message);
        self.sessions.append(&session_id, Role::Assistant, &decision.message);

        info!(
            event_name = "agent.exchange.completed",
            session_id,
            status = ?decision.status,
            escalate = decision.escalate,
            fallback_used,
            snippet_count = snippets.len(),
            has_order_summary = order_summary.is_some(),
        );

        Ok(ChatOutcome { decision, order_summary, session_id })
    }

    /// Top-k policy snippets for the message. Index build and search failures
    /// degrade to no snippets; the exchange continues either way.
    async fn policy_snippets(&self, message: &str) -> Vec<PolicySnippet> {
        let key = RetrievalKey::from_config(&self.config);
        let index = match self
            .index_cache
            .get_or_build(key, || self.build_index())
            .await
        {
            Ok(index) => index,
            Err(error) => {
                warn!(
                    event_name = "agent.retrieval.degraded",
                    error = %error,
                    "retrieval index unavailable, continuing without snippets"
                );
                return Vec::new();
            }
        };

        match index.search(message, DEFAULT_TOP_K).await {
            Ok(snippets) => snippets,
            Err(error) => {
                warn!(
                    event_name = "agent.retrieval.degraded",
                    error = %error,
                    "snippet search failed, continuing without snippets"
                );
                Vec::new()
            }
        }
    }

    async fn build_index(&self) -> Result<VectorIndex, redress_retrieval::RetrievalError> {
        let docs = load_knowledge_base(&self.config.catalog.data_dir)
            .map_err(|err| redress_retrieval::RetrievalError::Catalog(err.to_string()))?;
        let index = VectorIndex::build(Arc::clone(&self.embedder), &docs).await?;
        info!(
            event_name = "agent.retrieval.index_built",
            documents = index.len(),
            "knowledge base embedded"
        );
        Ok(index)
    }

    async fn order_context(
        &self,
        order_id: Option<&str>,
    ) -> (Option<String>, Option<String>) {
        let Some(order_id) = order_id else {
            return (None, None);
        };
        tokio::join!(
            self.context.order_summary(order_id),
            self.context.complaint_history(self.oracle.as_ref(), order_id),
        )
    }
}
