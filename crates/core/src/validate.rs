use crate::errors::AgentError;

pub const MESSAGE_MAX_LEN: usize = 800;
pub const SESSION_ID_MAX_LEN: usize = 100;

const ORDER_ID_MIN_LEN: usize = 3;
const ORDER_ID_MAX_LEN: usize = 40;

/// Trims the complaint message and rejects empty or oversized input.
pub fn validate_message(message: &str) -> Result<String, AgentError> {
    let cleaned = message.trim();
    if cleaned.is_empty() {
        return Err(AgentError::InvalidInput("Message is required.".to_string()));
    }
    if cleaned.chars().count() > MESSAGE_MAX_LEN {
        return Err(AgentError::InvalidInput("Message is too long.".to_string()));
    }
    Ok(cleaned.to_string())
}

/// Validates an optional order id against the `[A-Za-z0-9-]{3,40}` shape.
///
/// Absent or empty input passes through as `None`. A present id that fails
/// the shape check is an error, never silently dropped. Case is preserved.
pub fn validate_order_id(order_id: Option<&str>) -> Result<Option<String>, AgentError> {
    let Some(raw) = order_id else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }

    let trimmed = raw.trim();
    if !is_order_id_shaped(trimmed) {
        return Err(AgentError::InvalidInput("Order ID format is invalid.".to_string()));
    }
    Ok(Some(trimmed.to_string()))
}

/// Session ids are opaque and trusted, but bounded in length.
pub fn validate_session_id(session_id: Option<&str>) -> Result<Option<String>, AgentError> {
    match session_id {
        Some(id) if id.chars().count() > SESSION_ID_MAX_LEN => {
            Err(AgentError::InvalidInput("Session ID is too long.".to_string()))
        }
        Some(id) => Ok(Some(id.to_string())),
        None => Ok(None),
    }
}

fn is_order_id_shaped(candidate: &str) -> bool {
    let length = candidate.chars().count();
    if !(ORDER_ID_MIN_LEN..=ORDER_ID_MAX_LEN).contains(&length) {
        return false;
    }
    candidate.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::{validate_message, validate_order_id, validate_session_id, MESSAGE_MAX_LEN};
    use crate::errors::AgentError;

    #[test]
    fn whitespace_only_message_is_rejected() {
        let error = validate_message("   \n\t  ").expect_err("should reject");
        assert_eq!(error, AgentError::InvalidInput("Message is required.".to_string()));
    }

    #[test]
    fn oversized_message_is_rejected() {
        let message = "a".repeat(MESSAGE_MAX_LEN + 1);
        let error = validate_message(&message).expect_err("should reject");
        assert_eq!(error, AgentError::InvalidInput("Message is too long.".to_string()));
    }

    #[test]
    fn message_is_trimmed_but_content_preserved() {
        let validated = validate_message("  my food never arrived  ").expect("should pass");
        assert_eq!(validated, "my food never arrived");

        let exactly_max = "b".repeat(MESSAGE_MAX_LEN);
        assert_eq!(validate_message(&exactly_max).expect("at limit passes"), exactly_max);
    }

    #[test]
    fn malformed_order_ids_are_rejected() {
        for bad in ["ab", "ord!123", &"a".repeat(41), "has space", "emoji🍕id"] {
            let result = validate_order_id(Some(bad));
            assert!(result.is_err(), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn well_formed_and_absent_order_ids_pass() {
        assert_eq!(validate_order_id(Some("ZOM-123")).expect("valid"), Some("ZOM-123".to_string()));
        assert_eq!(validate_order_id(None).expect("absent"), None);
        assert_eq!(validate_order_id(Some("")).expect("empty"), None);
    }

    #[test]
    fn order_id_case_is_preserved() {
        let validated = validate_order_id(Some("  OrD-99  ")).expect("valid");
        assert_eq!(validated, Some("OrD-99".to_string()));
    }

    #[test]
    fn session_id_length_is_bounded() {
        assert!(validate_session_id(Some(&"s".repeat(101))).is_err());
        assert_eq!(
            validate_session_id(Some("client-session-1")).expect("valid"),
            Some("client-session-1".to_string())
        );
        assert_eq!(validate_session_id(None).expect("absent"), None);
    }
}
