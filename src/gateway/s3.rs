//! Gateway backed by S3 multipart uploads.
//!
//! Requests are signed with credentials from the AWS SDK chain. The
//! `AuthToken` passed to each call is not forwarded to S3.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    AuthToken, CompletedUpload, GatewayError, PartAck, PartLimits, StartedUpload, UploadGateway,
};
use crate::s3::S3Client;
use crate::upload::PartEncoder;

pub struct S3Gateway {
    client: Arc<S3Client>,
    bucket: String,
    key_prefix: String,
}

impl S3Gateway {
    pub fn new(
        client: Arc<S3Client>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        S3Gateway {
            client,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Build a unique object key for an uploaded file:
/// `<prefix>/<timestamp>-<id>/<file name>`.
pub fn object_key_for(prefix: &str, file_name: &str, now: DateTime<Utc>, id: &str) -> String {
    let name = file_name
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or("upload.bin");
    let stamp = now.format("%Y%m%dT%H%M%S");
    let prefix = prefix.trim_matches('/');

    if prefix.is_empty() {
        format!("{stamp}-{id}/{name}")
    } else {
        format!("{prefix}/{stamp}-{id}/{name}")
    }
}

#[async_trait]
impl UploadGateway for S3Gateway {
    async fn start(
        &self,
        _auth: &AuthToken,
        file_name: &str,
    ) -> Result<StartedUpload, GatewayError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let file_key = object_key_for(&self.key_prefix, file_name, Utc::now(), &id);
        let upload_id = self
            .client
            .create_multipart_upload(&self.bucket, &file_key)
            .await?;

        tracing::debug!(bucket = %self.bucket, key = %file_key, "multipart upload created");
        Ok(StartedUpload {
            upload_id,
            file_key,
        })
    }

    async fn upload_part(
        &self,
        _auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        part_number: u32,
        payload: &str,
    ) -> Result<PartAck, GatewayError> {
        let body = PartEncoder::decode(payload)
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;
        let ack_token = self
            .client
            .upload_part(&self.bucket, file_key, upload_id, part_number, Bytes::from(body))
            .await?;

        Ok(PartAck {
            part_number,
            ack_token,
        })
    }

    async fn complete(
        &self,
        _auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        parts: &[PartAck],
    ) -> Result<CompletedUpload, GatewayError> {
        let etags: Vec<(u32, String)> = parts
            .iter()
            .map(|p| (p.part_number, p.ack_token.clone()))
            .collect();
        self.client
            .complete_multipart_upload(&self.bucket, file_key, upload_id, &etags)
            .await?;

        Ok(CompletedUpload {
            file_url: format!("s3://{}/{}", self.bucket, file_key),
        })
    }

    fn limits(&self) -> PartLimits {
        PartLimits::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_object_key_layout() {
        assert_eq!(
            object_key_for("exports", "takeout-001.zip", at(), "abc"),
            "exports/20240309T140500-abc/takeout-001.zip"
        );
    }

    #[test]
    fn test_object_key_strips_directories_and_slashes() {
        assert_eq!(
            object_key_for("/exports/", "C:\\Users\\me\\takeout.zip", at(), "abc"),
            "exports/20240309T140500-abc/takeout.zip"
        );
        assert_eq!(
            object_key_for("", "dir/archive.tar.gz", at(), "abc"),
            "20240309T140500-abc/archive.tar.gz"
        );
    }

    #[test]
    fn test_reports_s3_part_limits() {
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let client = aws_sdk_s3::Client::from_conf(conf);
        let s3 = S3Client::from_client(client, "us-east-1".to_string());
        let gateway = S3Gateway::new(Arc::new(s3), "exports-bucket", "exports");

        assert_eq!(gateway.limits(), PartLimits::S3);
        assert_eq!(gateway.bucket(), "exports-bucket");
    }

    #[test]
    fn test_object_key_fallback_name() {
        assert_eq!(
            object_key_for("exports", "/", at(), "abc"),
            "exports/20240309T140500-abc/upload.bin"
        );
    }
}
