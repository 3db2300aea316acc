use redress_core::domain::{Decision, DecisionStatus};
use serde_json::Value;

/// Best-effort extraction of a decision from the oracle's free text.
///
/// Two stages and no more: a strict parse of the whole text, then a parse of
/// the first-`{`-to-last-`}` substring for oracles that wrap their JSON in
/// prose or Markdown fencing. Anything else - no braces, unparseable
/// candidate, wrong shape - returns `None` and the caller falls back. No
/// speculative repair beyond this, to keep behavior predictable.
pub fn parse_decision(raw: &str) -> Option<Decision> {
    let value = parse_json_object(raw)?;
    normalize_decision(&value)
}

fn parse_json_object(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Shapes a parsed JSON object into a `Decision`.
///
/// `status`, `message`, and `escalate` must be present with their exact
/// types; a payload missing them is not a decision and is rejected so the
/// fallback can answer instead. `policy_citations` and `next_steps` accept
/// whatever shape the oracle produced: a string becomes a one-element list,
/// a list has every element coerced to text, anything else becomes empty.
pub fn normalize_decision(value: &Value) -> Option<Decision> {
    let object = value.as_object()?;

    let status = match object.get("status").and_then(Value::as_str) {
        Some("handled") => DecisionStatus::Handled,
        Some("needs_human") => DecisionStatus::NeedsHuman,
        _ => return None,
    };
    let message = object.get("message").and_then(Value::as_str)?.to_string();
    let escalate = object.get("escalate").and_then(Value::as_bool)?;
    let resolution = object.get("resolution").and_then(Value::as_str).map(str::to_string);

    Some(Decision {
        status,
        resolution,
        message,
        escalate,
        policy_citations: normalize_string_list(object.get("policy_citations")),
        next_steps: normalize_string_list(object.get("next_steps")),
    })
}

fn normalize_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(single)) => vec![single.clone()],
        Some(Value::Array(items)) => items.iter().map(coerce_to_text).collect(),
        _ => Vec::new(),
    }
}

fn coerce_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
