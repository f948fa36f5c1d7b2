//! In-process gateway that keeps assembled objects in memory.
//!
//! Used for dry runs and as a test double. Failures can be injected per phase.

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{
    AuthToken, CompletedUpload, GatewayError, PartAck, PartLimits, StartedUpload, UploadGateway,
};
use crate::archive::ObjectFetcher;
use crate::upload::PartEncoder;

/// Locator scheme for objects held by a [`MemoryGateway`].
pub const MEMORY_SCHEME: &str = "memory://";

/// A call observed by the gateway, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Start { file_name: String },
    UploadPart { part_number: u32, size: usize },
    Complete { parts: Vec<PartAck> },
}

#[derive(Default)]
struct MemoryState {
    next_upload: u64,
    uploads: HashMap<String, PendingUpload>,
    objects: HashMap<String, Bytes>,
    calls: Vec<GatewayCall>,
}

struct PendingUpload {
    file_key: String,
    parts: BTreeMap<u32, (String, Vec<u8>)>,
}

pub struct MemoryGateway {
    access_token: Option<String>,
    limits: PartLimits,
    fail_start: bool,
    fail_part: Option<u32>,
    fail_complete: bool,
    state: Mutex<MemoryState>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        MemoryGateway {
            access_token: None,
            limits: PartLimits::UNBOUNDED,
            fail_start: false,
            fail_part: None,
            fail_complete: false,
            state: Mutex::default(),
        }
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `limits` to the coordinator instead of no limits at all.
    pub fn with_limits(mut self, limits: PartLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Require every call to present `token`.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Reject every `start` call.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Reject the upload of part `part_number`.
    pub fn failing_part(mut self, part_number: u32) -> Self {
        self.fail_part = Some(part_number);
        self
    }

    /// Reject every `complete` call.
    pub fn failing_complete(mut self) -> Self {
        self.fail_complete = true;
        self
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    /// Assembled object stored under `file_key`.
    pub fn object(&self, file_key: &str) -> Option<Bytes> {
        self.lock().objects.get(file_key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UploadGateway for MemoryGateway {
    async fn start(
        &self,
        auth: &AuthToken,
        file_name: &str,
    ) -> Result<StartedUpload, GatewayError> {
        auth.authorize(self.access_token.as_deref())?;

        let mut state = self.lock();
        state.calls.push(GatewayCall::Start {
            file_name: file_name.to_string(),
        });
        if self.fail_start {
            return Err(GatewayError::Rejected("start refused".to_string()));
        }

        state.next_upload += 1;
        let upload_id = format!("upload-{}", state.next_upload);
        let file_key = format!("{}/{}", upload_id, file_name);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                file_key: file_key.clone(),
                parts: BTreeMap::new(),
            },
        );

        Ok(StartedUpload {
            upload_id,
            file_key,
        })
    }

    async fn upload_part(
        &self,
        auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        part_number: u32,
        payload: &str,
    ) -> Result<PartAck, GatewayError> {
        auth.authorize(self.access_token.as_deref())?;

        let data = PartEncoder::decode(payload)
            .map_err(|e| GatewayError::Rejected(e.to_string()))?;

        let mut state = self.lock();
        state.calls.push(GatewayCall::UploadPart {
            part_number,
            size: data.len(),
        });
        if self.fail_part == Some(part_number) {
            return Err(GatewayError::Rejected(format!("part {part_number} refused")));
        }
        if part_number == 0 {
            return Err(GatewayError::Rejected("part numbers start at 1".to_string()));
        }

        let upload = state
            .uploads
            .get_mut(upload_id)
            .filter(|u| u.file_key == file_key)
            .ok_or_else(|| GatewayError::Rejected(format!("unknown upload {upload_id}")))?;

        let ack_token = format!("{upload_id}-{part_number}-{}", data.len());
        upload.parts.insert(part_number, (ack_token.clone(), data));

        Ok(PartAck {
            part_number,
            ack_token,
        })
    }

    async fn complete(
        &self,
        auth: &AuthToken,
        upload_id: &str,
        file_key: &str,
        parts: &[PartAck],
    ) -> Result<CompletedUpload, GatewayError> {
        auth.authorize(self.access_token.as_deref())?;

        let mut state = self.lock();
        state.calls.push(GatewayCall::Complete {
            parts: parts.to_vec(),
        });
        if self.fail_complete {
            return Err(GatewayError::Rejected("complete refused".to_string()));
        }

        let upload = state
            .uploads
            .remove(upload_id)
            .filter(|u| u.file_key == file_key)
            .ok_or_else(|| GatewayError::Rejected(format!("unknown upload {upload_id}")))?;

        if parts.len() != upload.parts.len() {
            return Err(GatewayError::Rejected(format!(
                "expected {} parts, got {}",
                upload.parts.len(),
                parts.len()
            )));
        }

        let mut assembled = Vec::new();
        for (ack, (number, (token, data))) in parts.iter().zip(upload.parts.iter()) {
            if ack.part_number != *number || ack.ack_token != *token {
                return Err(GatewayError::Rejected(format!(
                    "part {} does not match stored part {}",
                    ack.part_number, number
                )));
            }
            assembled.extend_from_slice(data);
        }

        state
            .objects
            .insert(file_key.to_string(), Bytes::from(assembled));

        Ok(CompletedUpload {
            file_url: format!("{MEMORY_SCHEME}{file_key}"),
        })
    }

    fn limits(&self) -> PartLimits {
        self.limits
    }
}

#[async_trait]
impl ObjectFetcher for MemoryGateway {
    async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes> {
        let key = locator
            .strip_prefix(MEMORY_SCHEME)
            .ok_or_else(|| anyhow!("Not a memory locator: {locator}"))?;
        self.object(key)
            .ok_or_else(|| anyhow!("Object not found: {locator}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assembles_parts_in_order() {
        let gateway = MemoryGateway::new();
        let auth = AuthToken::anonymous();

        let started = gateway.start(&auth, "a.bin").await.unwrap();
        let (id, key) = (&started.upload_id, &started.file_key);
        let first = gateway
            .upload_part(&auth, id, key, 1, &PartEncoder::encode(b"ab"))
            .await
            .unwrap();
        let second = gateway
            .upload_part(&auth, id, key, 2, &PartEncoder::encode(b"cd"))
            .await
            .unwrap();

        let done = gateway
            .complete(&auth, id, key, &[first, second])
            .await
            .unwrap();

        assert_eq!(done.file_url, format!("memory://{}", started.file_key));
        let fetched = gateway.fetch(&done.file_url).await.unwrap();
        assert_eq!(&fetched[..], b"abcd");
    }

    #[tokio::test]
    async fn test_rejects_wrong_token() {
        let gateway = MemoryGateway::new().with_access_token("secret");
        let result = gateway.start(&AuthToken::new("guess"), "a.bin").await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_out_of_order_completion() {
        let gateway = MemoryGateway::new();
        let auth = AuthToken::anonymous();
        let started = gateway.start(&auth, "a.bin").await.unwrap();
        let first = gateway
            .upload_part(&auth, &started.upload_id, &started.file_key, 1, "YQ==")
            .await
            .unwrap();
        let second = gateway
            .upload_part(&auth, &started.upload_id, &started.file_key, 2, "Yg==")
            .await
            .unwrap();

        let result = gateway
            .complete(&auth, &started.upload_id, &started.file_key, &[second, first])
            .await;
        assert!(result.is_err());
    }
}
