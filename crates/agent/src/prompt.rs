use redress_core::domain::{PolicySnippet, Role, Turn};

use crate::llm::ChatMessage;

/// Fixed system instruction block. The resolution policy lives here:
/// self-serve the common complaint categories, honor safe customer
/// preferences, escalate only when uncovered, inconsistent, or
/// low-confidence - and always answer with a single JSON object.
pub const SYSTEM_PROMPT: &str = "\
You are a polite, empathetic food-delivery complaint resolution chat agent.

- You are having a conversation with a customer. Previous messages in this conversation
  are provided below, so you can reference what was discussed earlier and maintain context.
- Use the policy snippets, order summary, complaint history, and conversation context to
  decide between refund, redelivery, or escalation.
- For common complaint types that clearly match a policy (missing item, wrong food delivered,
  food smells bad/spoiled, broken or missing seal, late delivery) you should normally RESOLVE
  the issue yourself (set escalate=false) using the policy rules, unless the data is clearly
  contradictory or there is a serious risk that must be reviewed by a human.
- If the customer clearly expresses a preference that is allowed by policy (for example,
  they say things like \"I want a refund\" or \"please resend the food\"), honour that preference
  when it is safe and consistent with the policy.
- In the 'message' field, speak directly to the customer in 3-5 short sentences:
  (1) warmly acknowledge and summarize their issue,
  (2) clearly explain WHAT help you can provide (e.g., partial refund, full refund, redelivery,
      credits) and WHY this option fits the policy and their order details,
  (3) briefly describe HOW it will work in practice (for example, when the refund will appear,
      whether they can choose between refund and redelivery, or what information you used),
  (4) if anything is unclear, ask one short follow-up question they can answer in their next
      message (for example, whether they prefer refund vs redelivery).
- Only escalate when the scenario is not covered by policy, the data is inconsistent,
  or your confidence is low, and explain the reason for escalation
  (e.g., missing data, unusual situation, or overlapping policies).

You MUST respond with a single JSON object and nothing else. Do not include Markdown,
explanations, or additional text outside the JSON. The JSON must have exactly these keys:
status, resolution, message, escalate, policy_citations, next_steps.";

/// Everything request-scoped the oracle needs for the current turn.
pub struct ExchangeContext<'a> {
    pub message: &'a str,
    pub order_summary: Option<&'a str>,
    pub complaint_history: Option<&'a str>,
    pub snippets: &'a [PolicySnippet],
}

/// Assembles the deterministic oracle request: system instructions, prior
/// session turns oldest-first, then the current-turn payload.
pub fn build_messages(history: &[Turn], context: &ExchangeContext<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));

    for turn in history {
        messages.push(match turn.role {
            Role::User => ChatMessage::user(turn.content.clone()),
            Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        });
    }

    messages.push(ChatMessage::user(current_turn_payload(context)));
    messages
}

fn current_turn_payload(context: &ExchangeContext<'_>) -> String {
    let snippet_block = context
        .snippets
        .iter()
        .map(|snippet| format!("[{}] {}", snippet.policy_id, snippet.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "User message: {message}\n\n\
         Order summary: {order_summary}\n\n\
         Complaint history (text-to-sql): {complaint_history}\n\n\
         Policy snippets:\n{snippet_block}",
        message = context.message,
        order_summary = context.order_summary.unwrap_or("not available"),
        complaint_history = context.complaint_history.unwrap_or("none"),
    )
}
