//! Three-phase upload driver: initiate, transfer parts in order, finalize.
//!
//! Parts are submitted strictly one at a time in increasing sequence order,
//! so at most one encoded chunk is held in memory. Any gateway failure is
//! terminal for the upload; nothing is retried here.

use std::sync::Arc;
use std::time::Instant;

use crate::gateway::{AuthToken, GatewayError, UploadGateway};
use crate::s3::TransferMetrics;

use super::{
    ChunkPlanner, FailureKind, Part, PartResult, SessionStatus, TransferSession, UploadError,
    UploadProgress, UploadSource, UploadState,
};

/// Callback invoked with every progress update.
pub type ProgressCallback = Box<dyn Fn(&UploadProgress) + Send + Sync>;

/// Result of a finished upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Locator of the assembled object, as returned by the gateway.
    pub locator: String,
    pub session: TransferSession,
}

pub struct UploadCoordinator {
    gateway: Arc<dyn UploadGateway>,
    auth: AuthToken,
    planner: ChunkPlanner,
    state: UploadState,
    session: Option<TransferSession>,
    observers: Vec<ProgressCallback>,
    metrics: Option<Arc<TransferMetrics>>,
}

impl UploadCoordinator {
    pub fn new(gateway: Arc<dyn UploadGateway>, auth: AuthToken, planner: ChunkPlanner) -> Self {
        UploadCoordinator {
            gateway,
            auth,
            planner,
            state: UploadState::Idle,
            session: None,
            observers: Vec::new(),
            metrics: None,
        }
    }

    /// Record per-part timings into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<TransferMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register a progress observer.
    pub fn on_progress(&mut self, callback: ProgressCallback) {
        self.observers.push(callback);
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Session of the current or most recent upload.
    pub fn session(&self) -> Option<&TransferSession> {
        self.session.as_ref()
    }

    /// Upload `source` and return the locator of the assembled object.
    ///
    /// A coordinator may be reused; every call starts again from `Idle`.
    pub async fn upload<S>(&mut self, source: &mut S) -> Result<UploadOutcome, UploadError>
    where
        S: UploadSource + ?Sized,
    {
        self.state = UploadState::Idle;
        self.session = None;
        if let Some(metrics) = &self.metrics {
            metrics.start_operation();
        }

        let total_size = source.len();
        if let Err(e) = self.planner.check(total_size, &self.gateway.limits()) {
            return Err(self.fail(None, e));
        }
        let parts_total = self.planner.part_count(total_size);
        let plan = self.planner.plan(total_size);

        // Initiate
        self.state = UploadState::Initiating;
        tracing::info!(
            file = source.name(),
            bytes = total_size,
            parts = parts_total,
            "starting upload"
        );

        let started = match self.gateway.start(&self.auth, source.name()).await {
            Ok(started) => started,
            Err(e) => return Err(self.fail(None, UploadError::Initiation(e))),
        };

        let mut session = TransferSession::new(
            started.upload_id,
            started.file_key,
            total_size,
            self.planner.chunk_size(),
        );
        session.status = SessionStatus::InProgress;
        self.state = UploadState::Transferring;
        self.publish(&session, parts_total);

        // Transfer, one part in flight at a time
        for range in plan {
            let sequence_number = range.sequence_number;

            let bytes = match source.read_range(&range).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = UploadError::Source {
                        sequence_number,
                        source: e,
                    };
                    return Err(self.fail(Some(session), err));
                }
            };
            let part = Part::encode(range, &bytes);
            drop(bytes);

            let sent_at = Instant::now();
            let ack = self
                .gateway
                .upload_part(
                    &self.auth,
                    session.id(),
                    session.object_key(),
                    part.sequence_number(),
                    &part.payload,
                )
                .await;

            let ack = match ack {
                Ok(ack) if ack.part_number == sequence_number => ack,
                Ok(ack) => {
                    let err = UploadError::PartUpload {
                        sequence_number,
                        source: GatewayError::Rejected(format!(
                            "acknowledged part {} instead of {}",
                            ack.part_number, sequence_number
                        )),
                    };
                    return Err(self.fail(Some(session), err));
                }
                Err(e) => {
                    let err = UploadError::PartUpload {
                        sequence_number,
                        source: e,
                    };
                    return Err(self.fail(Some(session), err));
                }
            };

            if let Some(metrics) = &self.metrics {
                metrics.record_request(sequence_number, part.range.len(), sent_at.elapsed());
            }

            session.record(PartResult {
                sequence_number,
                ack_token: ack.ack_token,
                size: part.range.len(),
            });
            tracing::debug!(
                part = sequence_number,
                bytes = part.range.len(),
                "part acknowledged"
            );
            self.publish(&session, parts_total);
        }

        // Finalize
        self.state = UploadState::Finalizing;
        self.publish(&session, parts_total);

        let acks = session.ack_list();
        let completed = match self
            .gateway
            .complete(&self.auth, session.id(), session.object_key(), &acks)
            .await
        {
            Ok(completed) => completed,
            Err(e) => return Err(self.fail(Some(session), UploadError::Finalization(e))),
        };

        session.status = SessionStatus::Completed;
        self.state = UploadState::Completed;
        self.publish(&session, parts_total);
        tracing::info!(
            locator = %completed.file_url,
            parts = session.parts().len(),
            "upload completed"
        );

        self.session = Some(session.clone());
        Ok(UploadOutcome {
            locator: completed.file_url,
            session,
        })
    }

    /// Move to the terminal failed state and hand the error back.
    fn fail(&mut self, session: Option<TransferSession>, err: UploadError) -> UploadError {
        let kind: FailureKind = err.failure_kind();
        self.state = UploadState::Failed(kind);
        self.session = session.map(|mut s| {
            s.status = SessionStatus::Failed;
            s
        });

        tracing::warn!(error = %err, "upload failed");
        err
    }

    fn publish(&self, session: &TransferSession, parts_total: u64) {
        if self.observers.is_empty() {
            return;
        }
        let progress = UploadProgress::new(
            self.state,
            session.completed_bytes(),
            session.total_size(),
            session.parts().len() as u64,
            parts_total,
        );
        for observer in &self.observers {
            observer(&progress);
        }
    }
}
