mod presets;

pub use presets::{AWS, LOCALSTACK, LOCALSTACK_ENDPOINT, Preset};

use anyhow::{Result, anyhow};
use aws_sdk_s3::Client;
use std::collections::HashMap;

use crate::Config;

/// Configuration for creating an S3 client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Optional custom endpoint URL
    pub endpoint_url: Option<String>,
    /// Whether to use path-style addressing (required for most S3-compatible services)
    pub force_path_style: bool,
    /// Whether to skip credentials (for anonymous/public access)
    pub anonymous: bool,
    /// Optional default region override
    pub default_region: Option<String>,
}

impl ProviderConfig {
    /// Apply the endpoint and region set in the user configuration on top of
    /// the provider preset. An explicit endpoint implies path-style addressing.
    pub fn with_overrides(mut self, config: &Config) -> Self {
        if let Some(endpoint) = &config.endpoint_url {
            self.endpoint_url = Some(endpoint.clone());
            self.force_path_style = true;
        }
        if let Some(region) = &config.region {
            self.default_region = Some(region.clone());
        }
        self
    }
}

/// Trait for S3 provider implementations
/// Providers supply configuration for creating S3 clients
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// One-line description shown when listing providers
    fn description(&self) -> &str;

    /// Build the provider configuration
    async fn build_config(&self) -> Result<ProviderConfig>;
}

/// Factory function to create an SDK client from provider configuration
/// Returns (client, region)
pub async fn create_s3_client(config: ProviderConfig) -> Result<(Client, String)> {
    let mut sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if config.anonymous {
        sdk_config = sdk_config.no_credentials();
    }
    if let Some(region) = &config.default_region {
        sdk_config = sdk_config.region(aws_config::Region::new(region.clone()));
    }

    let base_config = sdk_config.load().await;

    let region = base_config
        .region()
        .map(|r| r.as_ref().to_string())
        .unwrap_or_else(|| "us-east-1".to_string());

    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&base_config);

    if let Some(endpoint) = config.endpoint_url {
        tracing::debug!(%endpoint, "using custom S3 endpoint");
        s3_config_builder = s3_config_builder.endpoint_url(endpoint);
    }

    if config.force_path_style {
        s3_config_builder = s3_config_builder.force_path_style(true);
    }

    let client = Client::from_conf(s3_config_builder.build());

    Ok((client, region))
}

/// Registry of available providers
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new registry with all built-in providers
    pub fn new() -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
        };

        registry.register(Box::new(AWS));
        registry.register(Box::new(LOCALSTACK));

        registry
    }

    /// Register a provider
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Get a provider by name
    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(|p| p.as_ref())
    }

    /// List all available providers
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// `name - description` lines for every provider, sorted by name
    pub fn describe(&self) -> Vec<String> {
        self.list()
            .into_iter()
            .filter_map(|name| self.get(name))
            .map(|p| format!("{} - {}", p.name(), p.description()))
            .collect()
    }

    /// Resolve the provider named in `config` and apply its overrides
    pub async fn resolve(&self, config: &Config) -> Result<ProviderConfig> {
        let provider = self.get(&config.provider).ok_or_else(|| {
            anyhow!(
                "Unknown provider '{}'. Available providers:\n  {}",
                config.provider,
                self.describe().join("\n  ")
            )
        })?;
        Ok(provider.build_config().await?.with_overrides(config))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_builtin_providers() {
        let registry = ProviderRegistry::new();
        assert_eq!(registry.list(), vec!["aws", "localstack"]);
        assert!(registry.get("aws").is_some());
        assert!(registry.get("gcs").is_none());
        assert_eq!(registry.describe().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_applies_overrides() {
        let registry = ProviderRegistry::new();
        let config = Config {
            endpoint_url: Some("http://minio:9000".to_string()),
            region: Some("eu-west-1".to_string()),
            ..Config::default()
        };

        let resolved = registry.resolve(&config).await.unwrap();
        assert_eq!(resolved.endpoint_url.as_deref(), Some("http://minio:9000"));
        assert!(resolved.force_path_style);
        assert_eq!(resolved.default_region.as_deref(), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_provider() {
        let registry = ProviderRegistry::new();
        let config = Config {
            provider: "gcs".to_string(),
            ..Config::default()
        };

        let err = registry.resolve(&config).await.unwrap_err().to_string();
        assert!(err.contains("Unknown provider 'gcs'"));
        assert!(err.contains("aws - Amazon S3 (default)"));
        assert!(err.contains("localstack - LocalStack S3 emulator"));
    }
}
