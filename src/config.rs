//! Engine configuration
//!
//! Read from the environment (after `dotenv` has loaded `.env`). Parsing goes
//! through a lookup function so tests never touch process state.

use crate::error::EngineError;
use crate::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_TRIAL_COUNT: usize = 3;
pub const DEFAULT_TRIAL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DOCUMENT_PATH: &str = "db/db.json";
pub const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub api_url: String,
    pub api_token: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub collaborator: CollaboratorConfig,
    pub trial_count: usize,
    pub trial_timeout: Duration,
    pub document_path: PathBuf,
    pub port: u16,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("LLM_API_TOKEN")
            .or_else(|| lookup("LITTLE_LLM_TOKEN"))
            .unwrap_or_else(|| {
                warn!("LLM_API_TOKEN not set, every trial will fail");
                String::new()
            });

        let trial_count = parse_or(&lookup, "TRIAL_COUNT", DEFAULT_TRIAL_COUNT)?;
        if trial_count == 0 {
            return Err(EngineError::ConfigError(
                "TRIAL_COUNT must be at least 1".to_string(),
            ));
        }

        let trial_timeout_secs =
            parse_or(&lookup, "TRIAL_TIMEOUT_SECS", DEFAULT_TRIAL_TIMEOUT_SECS)?;
        let trial_timeout = Duration::from_secs(trial_timeout_secs);

        let temperature = match lookup("LLM_TEMPERATURE") {
            Some(raw) => Some(parse_value::<f32>("LLM_TEMPERATURE", &raw)?),
            None => None,
        };

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            collaborator: CollaboratorConfig {
                api_url: lookup("LLM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                api_token,
                model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature,
                request_timeout: trial_timeout,
            },
            trial_count,
            trial_timeout,
            document_path: lookup("DOCUMENT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_PATH)),
            port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| EngineError::ConfigError(format!("Invalid {} '{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<EngineConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.trial_count, 3);
        assert_eq!(config.trial_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 9000);
        assert_eq!(config.collaborator.model, DEFAULT_MODEL);
        assert!(config.collaborator.api_token.is_empty());
        assert_eq!(config.collaborator.temperature, None);
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = config_from(&[
            ("LITTLE_LLM_TOKEN", "secret"),
            ("TRIAL_COUNT", "5"),
            ("TRIAL_TIMEOUT_SECS", "7"),
            ("API_PORT", "8088"),
            ("LLM_TEMPERATURE", "0.7"),
            ("DOCUMENT_PATH", "/data/db.json"),
        ])
        .unwrap();

        assert_eq!(config.collaborator.api_token, "secret");
        assert_eq!(config.trial_count, 5);
        assert_eq!(config.trial_timeout, Duration::from_secs(7));
        assert_eq!(config.port, 8088);
        assert_eq!(config.collaborator.temperature, Some(0.7));
        assert_eq!(config.document_path, PathBuf::from("/data/db.json"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            config_from(&[("TRIAL_COUNT", "0")]),
            Err(EngineError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("TRIAL_COUNT", "three")]),
            Err(EngineError::ConfigError(_))
        ));
        assert!(matches!(
            config_from(&[("PORT", "99999")]),
            Err(EngineError::ConfigError(_))
        ));
    }
}
