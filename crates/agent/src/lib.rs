//! Decision/orchestration pipeline for complaint resolution.
//!
//! One exchange flows through a fixed state machine:
//!
//! 1. **Validate** the message / order id / session id (`redress_core::validate`)
//! 2. **Retrieve** policy snippets and order context in parallel
//!    (`redress_retrieval`, `context`)
//! 3. **Decide** - one oracle call with system instructions, session history,
//!    and the current-turn payload (`prompt`, `llm`)
//! 4. **Parse** the oracle's free text best-effort (`parser`); on failure,
//!    apply the deterministic **fallback** (`fallback`)
//! 5. **Normalize** list fields, inject order summary and session id
//! 6. **Append** the user and assistant turns to the session (`session`)
//!
//! The oracle is strictly untrusted: the parser boundary is mandatory, and
//! the rule-based fallback is the only guaranteed-available path.

pub mod context;
pub mod fallback;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod runtime;
pub mod session;

pub use fallback::{rule_based_fallback, CUSTOMER_CARE_HELPLINE};
pub use llm::{AzureChatOracle, ChatMessage, ChatOracle, MessageRole, OracleError};
pub use parser::parse_decision;
pub use runtime::{ChatOutcome, ComplaintAgent};
pub use session::{get_or_create_session, InMemorySessionStore, SessionStore, MAX_HISTORY_TURNS};
