use std::env;

use thiserror::Error;
use url::Url;

/// Environment variable holding the Azure OpenAI API key.
pub const KEY_ENV: &str = "REP_FIRM_KEY";
/// Optional override for the model endpoint.
pub const ENDPOINT_ENV: &str = "REP_FIRM_ENDPOINT";

const DEFAULT_ENDPOINT: &str = "https://adity-mczs6jhv-eastus2.cognitiveservices.azure.com";
const DEPLOYMENT: &str = "gpt-4o";
const API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingKey(&'static str),
    #[error("model API key is empty")]
    EmptyKey,
    #[error("invalid model endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
}

/// Credentials and routing for the chat deployment, validated up front so a
/// bad environment fails before any page is fetched.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub deployment: String,
    pub api_version: String,
}

impl ModelConfig {
    pub fn new(api_key: String, endpoint: &str) -> Result<Self, ConfigError> {
        if api_key.trim().is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        let endpoint = Url::parse(endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            api_key,
            endpoint,
            deployment: DEPLOYMENT.to_string(),
            api_version: API_VERSION.to_string(),
        })
    }

    /// Read the key (and optional endpoint override) from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(KEY_ENV).map_err(|_| ConfigError::MissingKey(KEY_ENV))?;
        let endpoint = env::var(ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(api_key, &endpoint)
    }

    /// Full chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.as_str().trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let err = ModelConfig::new("   ".into(), "https://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyKey));
    }

    #[test]
    fn rejects_bad_endpoint() {
        let err = ModelConfig::new("key".into(), "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
    }

    #[test]
    fn completions_url_shape() {
        let config = ModelConfig::new("key".into(), "https://example.com/").unwrap();
        assert_eq!(
            config.completions_url(),
            format!(
                "https://example.com/openai/deployments/{}/chat/completions?api-version={}",
                DEPLOYMENT, API_VERSION
            )
        );
    }

    #[test]
    fn from_env_without_key() {
        env::remove_var(KEY_ENV);
        let err = ModelConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(KEY_ENV)));
    }
}
