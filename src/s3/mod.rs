pub mod client;
pub mod metrics;

pub use client::{S3Client, parse_s3_locator};
pub use metrics::TransferMetrics;
