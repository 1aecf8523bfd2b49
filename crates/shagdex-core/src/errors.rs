use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal to Record Store initialization. The process still starts and
/// reports a degraded status; it never crashes on a bad snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("record snapshot not found at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read record snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot schema mismatch, missing columns: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },

    #[error("malformed snapshot row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Caller error in a tool invocation. Serialized back to the oracle as a
/// structured tool result so it can rephrase, never raised to the end user.
#[derive(Debug, Clone, Serialize, Error)]
#[error("{code}: {message}")]
pub struct ToolError {
    pub code: String,
    pub message: String,
}

impl ToolError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::new("invalid_filter", message)
    }

    pub fn missing_parameter(param: &str) -> Self {
        Self::new(
            "missing_parameter",
            format!("'{param}' is required for this operation"),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new("unknown_tool", format!("no tool named '{name}'"))
    }

    /// Shape handed back to the oracle in a tool_result block.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "error": self })
    }
}

/// Oracle transport failures. Retried at most once, then degraded to a
/// fixed user-legible message; a raw transport error never reaches the user.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request timed out")]
    Timeout,

    #[error("oracle rate limited")]
    RateLimited,

    #[error("oracle connection failed: {0}")]
    Connection(String),

    #[error("oracle authentication failed")]
    Auth,

    #[error("oracle reply was malformed: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Transient failures worth one retry with a short backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OracleError::Timeout | OracleError::RateLimited | OracleError::Connection(_)
        )
    }

    /// Fixed degraded-service message per category. Informative about what
    /// to try next; never an internal message.
    pub fn user_message(&self) -> &'static str {
        match self {
            OracleError::Timeout => {
                "That question took too long to research. Try a simpler or more specific question."
            }
            OracleError::RateLimited => {
                "The archive assistant is in high demand right now. Please try again shortly."
            }
            OracleError::Connection(_) => {
                "The archive assistant is temporarily unreachable. Please try again in a moment."
            }
            OracleError::Auth => {
                "The archive assistant is not configured. Please contact the site operator."
            }
            OracleError::Malformed(_) => {
                "The archive assistant gave an unexpected reply. Please try rephrasing your question."
            }
        }
    }
}
