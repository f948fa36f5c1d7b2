use super::{Provider, ProviderConfig};
use anyhow::Result;

pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

/// A provider defined entirely by a fixed endpoint and region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    name: &'static str,
    description: &'static str,
    endpoint_url: Option<&'static str>,
    region: Option<&'static str>,
}

/// Amazon S3, with region and credentials taken from the AWS environment
pub const AWS: Preset = Preset {
    name: "aws",
    description: "Amazon S3 (default)",
    endpoint_url: None,
    region: None,
};

/// LocalStack on its default port. It accepts any credentials but still
/// expects signed requests.
pub const LOCALSTACK: Preset = Preset {
    name: "localstack",
    description: "LocalStack S3 emulator on localhost:4566",
    endpoint_url: Some(LOCALSTACK_ENDPOINT),
    region: Some("us-east-1"),
};

#[async_trait::async_trait]
impl Provider for Preset {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn build_config(&self) -> Result<ProviderConfig> {
        Ok(ProviderConfig {
            endpoint_url: self.endpoint_url.map(str::to_string),
            // Emulators serve buckets by path, not by virtual host
            force_path_style: self.endpoint_url.is_some(),
            anonymous: false,
            default_region: self.region.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_aws_uses_sdk_defaults() {
        let config = AWS.build_config().await.unwrap();
        assert_eq!(config.endpoint_url, None);
        assert!(!config.force_path_style);
        assert!(!config.anonymous);
        assert_eq!(config.default_region, None);
    }

    #[tokio::test]
    async fn test_localstack_is_path_style() {
        assert_eq!(LOCALSTACK.name(), "localstack");

        let config = LOCALSTACK.build_config().await.unwrap();
        assert_eq!(config.endpoint_url.as_deref(), Some(LOCALSTACK_ENDPOINT));
        assert!(config.force_path_style);
        assert_eq!(config.default_region.as_deref(), Some("us-east-1"));
    }
}
