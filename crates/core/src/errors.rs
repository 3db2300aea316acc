use thiserror::Error;

/// Request-level error taxonomy: the errors an exchange can actually return.
///
/// Retrieval and data-store failures degrade the exchange to "context not
/// available", and oracle failures are absorbed by the rule-based fallback;
/// those classes stay inside the crates that raise them (`RetrievalError`,
/// `RepositoryError`, `OracleError`) and never cross this boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Whether the caller can correct this error by changing the request.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Message safe to show the customer. Internal detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(detail) => detail.clone(),
            Self::Configuration(_) => {
                "The service is not configured correctly. Please try again later.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AgentError;

    #[test]
    fn invalid_input_is_user_correctable_and_verbatim() {
        let error = AgentError::InvalidInput("Message is required.".to_string());
        assert!(error.is_user_error());
        assert_eq!(error.user_message(), "Message is required.");
    }

    #[test]
    fn configuration_error_hides_internal_detail() {
        let error = AgentError::Configuration("oracle.api_key is required".to_string());
        assert!(!error.is_user_error());
        assert!(!error.user_message().contains("api_key"));
    }
}
