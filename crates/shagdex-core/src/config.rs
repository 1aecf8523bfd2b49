//! Engine configuration. YAML file with serde defaults; a missing file means
//! "all defaults". The API key comes from the environment only and is never
//! read from or written to a config file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Archive snapshot consumed at startup.
    pub data_path: PathBuf,
    pub model: String,
    pub max_tokens: u32,
    /// Ceiling on oracle round-trips per question.
    pub max_rounds: usize,
    pub oracle_timeout_seconds: u64,
    pub retry_backoff_ms: u64,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: u64,
    /// Raw rows embedded in the system prompt as format examples.
    pub sample_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/contest_archive.csv"),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 3000,
            max_rounds: 6,
            oracle_timeout_seconds: 60,
            retry_backoff_ms: 500,
            cache_ttl_seconds: 300,
            cache_capacity: 256,
            sample_rows: 5,
        }
    }
}

impl EngineConfig {
    /// Load from YAML. `None`, or a path that does not exist, yields the
    /// defaults; a present-but-invalid file is an error, not a silent
    /// fallback.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Oracle credential, environment only.
pub fn api_key() -> Option<String> {
    std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_defaults() {
        let config = EngineConfig::load(Some(Path::new("/nonexistent/shagdex.yaml"))).unwrap();
        assert_eq!(config.max_rounds, 6);
        assert_eq!(config.cache_ttl_seconds, 300);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: EngineConfig = serde_yaml::from_str("max_rounds: 3\nmodel: test-model\n").unwrap();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.model, "test-model");
        assert_eq!(config.max_tokens, 3000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<EngineConfig>("api_key: sk-123\n").is_err());
    }
}
