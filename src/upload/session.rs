use super::ChunkRange;
use super::PartEncoder;
use crate::gateway::PartAck;

/// Largest progress fraction reported before the upload is finalized.
const MAX_TRANSFER_FRACTION: f64 = 0.999;

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Initiating,
    Transferring,
    Finalizing,
    Completed,
    Failed(FailureKind),
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Failed(_))
    }
}

/// Which phase a failed upload stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Initiation,
    PartUpload { sequence_number: u32 },
    Finalization,
}

/// Status of a [`TransferSession`] as seen by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A planned range with its encoded payload, ready for submission.
///
/// Only one `Part` is alive at a time; it is dropped once acknowledged.
#[derive(Debug)]
pub struct Part {
    pub range: ChunkRange,
    pub payload: String,
}

impl Part {
    pub fn encode(range: ChunkRange, bytes: &[u8]) -> Self {
        Part {
            range,
            payload: PartEncoder::encode(bytes),
        }
    }

    pub fn sequence_number(&self) -> u32 {
        self.range.sequence_number
    }
}

/// What remains of a part after the gateway acknowledged it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResult {
    pub sequence_number: u32,
    pub ack_token: String,
    pub size: u64,
}

/// One upload, from initiation to finalization.
///
/// `id` and `object_key` are issued by the gateway and never modified here.
#[derive(Debug, Clone)]
pub struct TransferSession {
    id: String,
    object_key: String,
    total_size: u64,
    chunk_size: u64,
    parts: Vec<PartResult>,
    pub status: SessionStatus,
}

impl TransferSession {
    pub fn new(id: String, object_key: String, total_size: u64, chunk_size: u64) -> Self {
        TransferSession {
            id,
            object_key,
            total_size,
            chunk_size,
            parts: Vec::new(),
            status: SessionStatus::Pending,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn parts(&self) -> &[PartResult] {
        &self.parts
    }

    /// Record an acknowledged part. Parts must arrive in sequence order.
    pub fn record(&mut self, result: PartResult) {
        debug_assert_eq!(result.sequence_number as usize, self.parts.len() + 1);
        self.parts.push(result);
    }

    pub fn completed_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.size).sum()
    }

    /// Ack tokens in part order, as the gateway expects them on completion.
    pub fn ack_list(&self) -> Vec<PartAck> {
        self.parts
            .iter()
            .map(|p| PartAck {
                part_number: p.sequence_number,
                ack_token: p.ack_token.clone(),
            })
            .collect()
    }
}

/// Snapshot published to progress observers.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub state: UploadState,
    pub completed_bytes: u64,
    pub total_bytes: u64,
    pub parts_done: u64,
    pub parts_total: u64,
    pub fraction: f64,
}

impl UploadProgress {
    pub fn new(
        state: UploadState,
        completed_bytes: u64,
        total_bytes: u64,
        parts_done: u64,
        parts_total: u64,
    ) -> Self {
        let fraction = if state == UploadState::Completed {
            1.0
        } else if total_bytes == 0 {
            0.0
        } else {
            (completed_bytes as f64 / total_bytes as f64).min(MAX_TRANSFER_FRACTION)
        };

        UploadProgress {
            state,
            completed_bytes,
            total_bytes,
            parts_done,
            parts_total,
            fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tracks_parts_in_order() {
        let mut session = TransferSession::new("u1".into(), "k".into(), 10, 4);
        session.record(PartResult {
            sequence_number: 1,
            ack_token: "a".into(),
            size: 4,
        });
        session.record(PartResult {
            sequence_number: 2,
            ack_token: "b".into(),
            size: 4,
        });

        assert_eq!(session.completed_bytes(), 8);
        let tokens: Vec<_> = session
            .ack_list()
            .into_iter()
            .map(|ack| (ack.part_number, ack.ack_token))
            .collect();
        assert_eq!(tokens, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }

    #[test]
    fn test_progress_held_below_one_until_completed() {
        let transferring = UploadProgress::new(UploadState::Transferring, 10, 10, 3, 3);
        assert!(transferring.fraction < 1.0);

        let finalizing = UploadProgress::new(UploadState::Finalizing, 10, 10, 3, 3);
        assert!(finalizing.fraction < 1.0);

        let done = UploadProgress::new(UploadState::Completed, 10, 10, 3, 3);
        assert_eq!(done.fraction, 1.0);
    }

    #[test]
    fn test_empty_upload_progress() {
        let p = UploadProgress::new(UploadState::Transferring, 0, 0, 1, 1);
        assert_eq!(p.fraction, 0.0);
        let p = UploadProgress::new(UploadState::Completed, 0, 0, 1, 1);
        assert_eq!(p.fraction, 1.0);
    }
}
