//! Chunked, strictly ordered upload of a single file through an
//! [`UploadGateway`](crate::gateway::UploadGateway).

pub mod coordinator;
pub mod encoder;
pub mod planner;
pub mod session;
pub mod source;

pub use coordinator::{ProgressCallback, UploadCoordinator, UploadOutcome};
pub use encoder::PartEncoder;
pub use planner::{ChunkPlan, ChunkPlanner, ChunkRange};
pub use session::{
    FailureKind, Part, PartResult, SessionStatus, TransferSession, UploadProgress, UploadState,
};
pub use source::{FileSource, MemorySource, UploadSource};

use crate::gateway::GatewayError;

/// Default part size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Largest part the S3 multipart API accepts: 5 GiB.
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Errors produced while planning or running an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to initiate upload: {0}")]
    Initiation(#[source] GatewayError),

    #[error("part {sequence_number} failed: {source}")]
    PartUpload {
        sequence_number: u32,
        #[source]
        source: GatewayError,
    },

    #[error("failed to read part {sequence_number} from source: {source}")]
    Source {
        sequence_number: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to finalize upload: {0}")]
    Finalization(#[source] GatewayError),

    #[error("invalid part payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl UploadError {
    /// Terminal state kind this error leaves the coordinator in.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            UploadError::Configuration(_) | UploadError::Decode(_) => FailureKind::Configuration,
            UploadError::Initiation(_) => FailureKind::Initiation,
            UploadError::PartUpload {
                sequence_number, ..
            }
            | UploadError::Source {
                sequence_number, ..
            } => FailureKind::PartUpload {
                sequence_number: *sequence_number,
            },
            UploadError::Finalization(_) => FailureKind::Finalization,
        }
    }
}
