use anyhow::{Context, Result, anyhow};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;

use crate::providers::{ProviderConfig, create_s3_client};

/// Wrapper around AWS S3 client
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    /// Create a client from a provider configuration
    pub async fn from_provider(config: ProviderConfig) -> Result<Self> {
        let (client, region) = create_s3_client(config).await?;
        Ok(S3Client { client, region })
    }

    /// Wrap an already configured SDK client (useful for testing)
    pub fn from_client(client: Client, region: String) -> Self {
        S3Client { client, region }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get an entire object's contents
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to get object s3://{}/{}", bucket, key))?;

        let bytes = resp
            .body
            .collect()
            .await
            .context("Failed to read object body")?
            .into_bytes();

        Ok(bytes)
    }

    /// Start a multipart upload, returning its upload id
    pub async fn create_multipart_upload(&self, bucket: &str, key: &str) -> Result<String> {
        let resp = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context(format!("Failed to start multipart upload for s3://{}/{}", bucket, key))?;

        resp.upload_id()
            .map(String::from)
            .ok_or_else(|| anyhow!("S3 returned no upload id for s3://{}/{}", bucket, key))
    }

    /// Upload one part, returning its ETag
    pub async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        body: Bytes,
    ) -> Result<String> {
        let part_number = i32::try_from(part_number)
            .map_err(|_| anyhow!("Part number {} out of range", part_number))?;

        let resp = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .context(format!(
                "Failed to upload part {} of s3://{}/{}",
                part_number, bucket, key
            ))?;

        resp.e_tag()
            .map(String::from)
            .ok_or_else(|| anyhow!("S3 returned no ETag for part {}", part_number))
    }

    /// Assemble a multipart upload from `(part_number, etag)` pairs in part order
    pub async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[(u32, String)],
    ) -> Result<()> {
        let completed_parts = parts
            .iter()
            .map(|(number, etag)| -> Result<CompletedPart> {
                Ok(CompletedPart::builder()
                    .part_number(
                        i32::try_from(*number)
                            .map_err(|_| anyhow!("Part number {} out of range", number))?,
                    )
                    .e_tag(etag)
                    .build())
            })
            .collect::<Result<Vec<_>>>()?;

        let upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(upload)
            .send()
            .await
            .context(format!("Failed to complete multipart upload for s3://{}/{}", bucket, key))?;

        Ok(())
    }
}

/// Split an `s3://bucket/key` locator into bucket and key
pub fn parse_s3_locator(locator: &str) -> Option<(&str, &str)> {
    let rest = locator.strip_prefix("s3://")?;
    let (bucket, key) = rest.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_locator() {
        assert_eq!(
            parse_s3_locator("s3://bucket/exports/a.zip"),
            Some(("bucket", "exports/a.zip"))
        );
        assert_eq!(parse_s3_locator("s3://bucket"), None);
        assert_eq!(parse_s3_locator("s3:///key"), None);
        assert_eq!(parse_s3_locator("https://bucket/key"), None);
    }
}
