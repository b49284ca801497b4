//! Escalation error types

use crate::escalation::state::EscalationStatus;
use thiserror::Error;

/// Result type alias for escalation operations
pub type EscalationResult<T> = Result<T, EscalationError>;

/// Errors raised by the escalation core.
///
/// Running out of attempts is not an error: it ends in `human_required` with a
/// ticket attached.
#[derive(Debug, Error)]
pub enum EscalationError {
    /// Attempt or abandon requested on a state that already finished
    #[error("Escalation {escalation_id} is already terminal ({status})")]
    AlreadyTerminal {
        escalation_id: String,
        status: EscalationStatus,
    },

    /// Configuration values out of range
    #[error("Invalid escalation config: {message}")]
    InvalidConfig { message: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl EscalationError {
    pub fn already_terminal(escalation_id: impl Into<String>, status: EscalationStatus) -> Self {
        Self::AlreadyTerminal {
            escalation_id: escalation_id.into(),
            status,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::TomlParse(_) => "TOML_PARSE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_terminal_message() {
        let err = EscalationError::already_terminal("ESC-t1-001", EscalationStatus::Resolved);
        assert_eq!(err.to_string(), "Escalation ESC-t1-001 is already terminal (resolved)");
        assert_eq!(err.code(), "ALREADY_TERMINAL");
    }

    #[test]
    fn test_invalid_config_code() {
        let err = EscalationError::invalid_config("max_retries must be at least 1");
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_wrapped_error_codes() {
        let io: EscalationError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(io.code(), "IO_ERROR");

        let toml_err = toml::from_str::<toml::Value>("max_retries = ").unwrap_err();
        let parsed: EscalationError = toml_err.into();
        assert_eq!(parsed.code(), "TOML_PARSE_ERROR");
        assert!(parsed.to_string().starts_with("TOML parse error"));
    }
}
