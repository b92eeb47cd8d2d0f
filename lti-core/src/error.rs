//! Error kinds for outcome exchanges

use thiserror::Error;

/// Caller or programmer misuse, detected before any network I/O
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("No signature to verify: request has no oauth_signature parameter")]
    MissingSignature,

    #[error("Invalid outcome action: {0} (expected read, replace or delete)")]
    InvalidAction(String),

    #[error("Score is not a number: {0}")]
    ScoreNotANumber(String),

    #[error("Score is out of range: {0} (must be between 0 and 1)")]
    ScoreOutOfRange(f64),

    #[error("A replace request requires a score")]
    MissingScore,

    #[error("A {0} request does not carry a score")]
    UnexpectedScore(String),

    #[error("Outcome service URL unavailable")]
    MissingOutcomeServiceUrl,

    #[error("Sourced ID unavailable")]
    MissingSourcedId,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Runtime failure of the remote exchange
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResultError {
    #[error("Outcome request failed: {0}")]
    Transport(String),

    #[error("Invalid XML document: {0}")]
    InvalidXml(String),

    #[error("Failed to encode outcome request: {0}")]
    Encode(String),
}

/// Any failure of an outcome operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutcomeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Result(#[from] ResultError),
}

impl OutcomeError {
    /// Whether the failure happened before any request was sent
    pub fn is_configuration(&self) -> bool {
        matches!(self, OutcomeError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_distinguish_score_failures() {
        let nan = ConfigurationError::ScoreNotANumber("abc".to_string()).to_string();
        let range = ConfigurationError::ScoreOutOfRange(1.5).to_string();
        assert!(nan.contains("not a number"));
        assert!(range.contains("out of range"));
    }

    #[test]
    fn test_outcome_error_kind() {
        let err: OutcomeError = ConfigurationError::MissingSourcedId.into();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Sourced ID unavailable");

        let err: OutcomeError = ResultError::Transport("refused".to_string()).into();
        assert!(!err.is_configuration());
    }
}
