use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `ADS_INSIGHT__` and an optional `ads-insight.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub graph: GraphApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphApiConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_graph_version")]
    pub api_version: String,
    /// Long-lived user token handed out by the Meta login flow.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_campaign_limit")]
    pub campaign_limit: u32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Unset means the remote cache is not configured.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

// Default functions
fn default_graph_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_graph_version() -> String {
    "v18.0".to_string()
}
fn default_campaign_limit() -> u32 {
    50
}
fn default_request_timeout_ms() -> u64 {
    15_000
}
fn default_key_prefix() -> String {
    "ad_insights".to_string()
}
fn default_ttl_secs() -> u64 {
    60 * 60 * 24 * 400
}
fn default_state_path() -> String {
    "ads_insight_session.json".to_string()
}
fn default_history_days() -> u32 {
    90
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            api_version: default_graph_version(),
            access_token: None,
            campaign_limit: default_campaign_limit(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: default_key_prefix(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            history_days: default_history_days(),
            seed: None,
        }
    }
}

impl CacheConfig {
    pub fn is_configured(&self) -> bool {
        self.redis_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("ads-insight").required(false))
            .add_source(
                config::Environment::with_prefix("ADS_INSIGHT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.graph.api_version, "v18.0");
        assert_eq!(config.graph.campaign_limit, 50);
        assert_eq!(config.mock.history_days, 90);
        assert!(!config.cache.is_configured());
    }

    #[test]
    fn test_partial_source_fills_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("cache.redis_url", "redis://localhost:6379")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(config.cache.is_configured());
        assert_eq!(config.cache.key_prefix, "ad_insights");
        assert_eq!(config.graph.base_url, "https://graph.facebook.com");
    }

    #[test]
    fn test_blank_redis_url_is_unconfigured() {
        let cache = CacheConfig {
            redis_url: Some("  ".into()),
            ..CacheConfig::default()
        };
        assert!(!cache.is_configured());
    }
}
