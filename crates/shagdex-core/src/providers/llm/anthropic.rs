//! Anthropic Messages API client. Non-streaming: the orchestrator consumes
//! whole replies, and tool loops re-enter before anything reaches the user.

use super::{Oracle, OracleReply, OracleRequest, ToolInvocation};
use crate::errors::OracleError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicOracle {
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            max_tokens,
        })
    }

    /// Point at a different endpoint (test servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse_reply(body: &Value) -> Result<OracleReply, OracleError> {
        let content = body["content"]
            .as_array()
            .ok_or_else(|| OracleError::Malformed("missing content array".to_string()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in content {
            match block["type"].as_str() {
                Some("text") => {
                    text.push_str(block["text"].as_str().unwrap_or_default());
                }
                Some("tool_use") => {
                    let id = block["id"]
                        .as_str()
                        .ok_or_else(|| OracleError::Malformed("tool_use without id".to_string()))?;
                    let name = block["name"].as_str().ok_or_else(|| {
                        OracleError::Malformed("tool_use without name".to_string())
                    })?;
                    tool_calls.push(ToolInvocation {
                        id: id.to_string(),
                        name: name.to_string(),
                        arguments: block["input"].clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(OracleReply {
            text,
            tool_calls,
            stop_reason: body["stop_reason"].as_str().map(str::to_string),
        })
    }
}

#[async_trait]
impl Oracle for AnthropicOracle {
    async fn chat(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": request.system,
            "messages": request.messages,
        });
        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
        }
        debug!(model = %self.model, messages = request.messages.len(), "oracle request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "oracle API error");
            return Err(match status.as_u16() {
                401 | 403 => OracleError::Auth,
                429 => OracleError::RateLimited,
                s => OracleError::Connection(format!("API error {s}: {detail}")),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;
        Self::parse_reply(&body)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_tool_use_blocks() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "tu_1", "name": "query_archive",
                 "input": {"query_type": "rank_by_wins"}}
            ],
            "stop_reason": "tool_use"
        });
        let reply = AnthropicOracle::parse_reply(&body).unwrap();
        assert_eq!(reply.text, "Let me check.");
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].name, "query_archive");
        assert_eq!(reply.stop_reason.as_deref(), Some("tool_use"));
    }

    #[test]
    fn missing_content_is_malformed() {
        assert!(matches!(
            AnthropicOracle::parse_reply(&json!({"stop_reason": "end_turn"})),
            Err(OracleError::Malformed(_))
        ));
    }
}
