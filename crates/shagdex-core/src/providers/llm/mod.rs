//! Oracle abstraction: the conversational model behind the orchestrator.
//! The orchestrator only sees this trait, so tests drive it with a scripted
//! double and production wires in the HTTP client.

use crate::errors::OracleError;
use async_trait::async_trait;
use serde_json::Value;

pub mod anthropic;
pub mod scripted;

/// One request to the oracle. `messages` are already in wire shape (role +
/// content blocks); the provider owns nothing conversational.
#[derive(Debug, Clone, Default)]
pub struct OracleRequest {
    pub system: String,
    pub messages: Vec<Value>,
    pub tools: Vec<Value>,
}

/// A tool invocation requested by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, Default)]
pub struct OracleReply {
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
    pub stop_reason: Option<String>,
}

impl OracleReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn tool_call(id: &str, name: &str, arguments: Value) -> Self {
        Self {
            tool_calls: vec![ToolInvocation {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
            stop_reason: Some("tool_use".to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn chat(&self, request: &OracleRequest) -> Result<OracleReply, OracleError>;
    fn provider_name(&self) -> &'static str;
}
