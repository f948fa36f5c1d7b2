//! The multipart object-store API that parts are uploaded through.

pub mod memory;
pub mod s3;

pub use memory::MemoryGateway;
pub use s3::S3Gateway;

use async_trait::async_trait;

/// Credential presented with every gateway call.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken(token.into())
    }

    /// Token used when the gateway does not require one.
    pub fn anonymous() -> Self {
        AuthToken(String::new())
    }

    /// Check this token against the one a gateway was configured with.
    pub fn authorize(&self, expected: Option<&str>) -> Result<(), GatewayError> {
        match expected {
            Some(expected) if expected != self.0 => Err(GatewayError::Unauthorized),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Identifiers issued when an upload is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedUpload {
    pub upload_id: String,
    pub file_key: String,
}

/// Acknowledgment of a single part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartAck {
    pub part_number: u32,
    pub ack_token: String,
}

/// Result of a finalized upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedUpload {
    /// Stable locator of the assembled object.
    pub file_url: String,
}

/// Part size and count bounds a gateway enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartLimits {
    /// Smallest size of every part except the last.
    pub min_part_size: u64,
    pub max_part_size: u64,
    pub max_parts: u64,
}

impl PartLimits {
    /// No bounds beyond what a `u32` part number can address.
    pub const UNBOUNDED: PartLimits = PartLimits {
        min_part_size: 0,
        max_part_size: u64::MAX,
        max_parts: u32::MAX as u64,
    };

    /// S3 multipart limits: 5 MiB to 5 GiB per part, at most 10,000 parts.
    pub const S3: PartLimits = PartLimits {
        min_part_size: 5 * 1024 * 1024,
        max_part_size: crate::upload::MAX_PART_SIZE,
        max_parts: 10_000,
    };
}

/// Errors reported by a gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway rejected the access token")]
    Unauthorized,

    #[error("gateway rejected the request: {0}")]
    Rejected(String),

    #[error("S3 error: {0:#}")]
    S3(#[from] anyhow::Error),
}

/// Three-phase multipart upload API.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Open an upload session for `file_name`.
    async fn start(&self, auth: &AuthToken, file_name: &str)
    -> Result<StartedUpload, GatewayError>;

    /// Upload one base64-encoded part. `part_number` starts at 1.
    async fn upload_part(
        &self,
        auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        part_number: u32,
        payload: &str,
    ) -> Result<PartAck, GatewayError>;

    /// Assemble the object from the acknowledged parts, given in part order.
    async fn complete(
        &self,
        auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        parts: &[PartAck],
    ) -> Result<CompletedUpload, GatewayError>;

    /// Bounds checked against the chunk plan before an upload starts.
    fn limits(&self) -> PartLimits {
        PartLimits::UNBOUNDED
    }
}
