//! Error taxonomy for the teller workflow
//!
//! Guardrail rejections are not errors: they surface as `RunOutcome::Rejected`.
//! Upstream completion failures surface as `RunOutcome::Failed` and never cross
//! the router boundary. Only configuration and invariant errors propagate as
//! `TellerError`, and both are treated as fatal by callers.

use crate::llm::provider::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

static BEARER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bearer\s+\S+").expect("bearer pattern is valid"));

const MAX_MESSAGE_LEN: usize = 500;

/// Main error type for teller operations
#[derive(Debug, Error)]
pub enum TellerError {
    /// Unknown agent or guardrail reference, duplicate names, bad settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Provider failure outside a run (client setup, health check). Failures
    /// inside a run are reported as `RunOutcome::Failed` instead.
    #[error("Upstream error: {0}")]
    Upstream(#[from] LlmError),

    /// A programming defect: unregistered handoff, negative balance, loops
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Config file error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl TellerError {
    /// Create configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create invariant violation
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Whether the error must stop the process rather than a single query
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TellerError::Upstream(_))
    }

    /// Process exit status for the CLI: 1 for fatal errors, 2 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            2
        }
    }

    /// Message safe to show to an end user or print in batch output
    pub fn user_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Strip credentials and sensitive paths from messages bound for users or logs
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN.replace_all(message, "${1}=***").to_string();
    sanitized = BEARER_PATTERN
        .replace_all(&sanitized, "Bearer ***")
        .to_string();
    sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized = format!("{}{}", &sanitized[..cut], truncate_suffix);
    }

    sanitized
}

/// Result type for teller operations
pub type TellerResult<T> = Result<T, TellerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_constructor() {
        let error = TellerError::configuration("unknown agent 'Ghost'");
        assert!(matches!(error, TellerError::Configuration { .. }));
        assert_eq!(
            error.to_string(),
            "Configuration error: unknown agent 'Ghost'"
        );
        assert!(error.is_fatal());
    }

    #[test]
    fn test_invariant_constructor() {
        let error = TellerError::invariant("balance would go negative");
        assert!(matches!(error, TellerError::InvariantViolation { .. }));
        assert!(error.is_fatal());
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_upstream_is_not_fatal() {
        let error = TellerError::from(LlmError::NetworkError("connection reset".to_string()));
        assert!(!error.is_fatal());
        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.to_string(),
            "Upstream error: Network error: connection reset"
        );
    }

    #[test]
    fn test_error_message_sanitization() {
        let error =
            TellerError::configuration("Failed to authenticate: password=secret123 token=abc456");
        let message = error.user_message();

        assert!(!message.contains("secret123"));
        assert!(!message.contains("abc456"));
        assert!(message.contains("password=***"));
        assert!(message.contains("token=***"));
    }

    #[test]
    fn test_bearer_token_redaction() {
        let sanitized = sanitize_error_message("rejected header Authorization: Bearer sk-live-123");
        assert!(!sanitized.contains("sk-live-123"));
        assert!(sanitized.contains("Bearer ***"));
    }

    #[test]
    fn test_long_message_truncation() {
        let sanitized = sanitize_error_message(&"x".repeat(600));
        assert!(sanitized.len() <= MAX_MESSAGE_LEN);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let sanitized = sanitize_error_message(&"é".repeat(400));
        assert!(sanitized.len() <= MAX_MESSAGE_LEN);
        assert!(sanitized.ends_with("...[truncated]"));
    }

    #[test]
    fn test_exactly_500_chars_untouched() {
        let message = "x".repeat(500);
        assert_eq!(sanitize_error_message(&message), message);
    }

    #[test]
    fn test_file_path_redaction() {
        let sanitized = sanitize_error_message("Failed to read /home/user/.aws/credentials");
        assert!(sanitized.contains("/***REDACTED***/"));
        assert!(!sanitized.contains(".aws/credentials"));
    }
}
