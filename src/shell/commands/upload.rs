use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use super::{Command, ShellState};
use crate::gateway::{AuthToken, UploadGateway};
use crate::s3::TransferMetrics;
use crate::upload::{
    ChunkPlanner, FileSource, MAX_PART_SIZE, UploadCoordinator, UploadOutcome, UploadSource,
};

pub struct UploadCommand;

#[async_trait]
impl Command for UploadCommand {
    fn name(&self) -> &str {
        "upload"
    }

    fn usage(&self) -> &str {
        "upload FILE - Upload a local archive in parts"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let path = args
            .first()
            .ok_or_else(|| anyhow!("Usage: {}", self.usage()))?;

        state.metrics().reset();
        let outcome = upload_file(
            Arc::clone(state.gateway()),
            state.auth().clone(),
            state.config().chunk_size_bytes,
            Some(Arc::clone(state.metrics())),
            Path::new(path),
        )
        .await?;

        print_summary(&outcome, state.metrics());
        state.inspector().cache().invalidate(&outcome.locator);
        state.set_last_upload(outcome.locator);
        Ok(())
    }
}

/// Upload the file at `path`, rendering a progress bar on stderr
pub async fn upload_file(
    gateway: Arc<dyn UploadGateway>,
    auth: AuthToken,
    chunk_size: u64,
    metrics: Option<Arc<TransferMetrics>>,
    path: &Path,
) -> Result<UploadOutcome> {
    let mut source = FileSource::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let planner = ChunkPlanner::new(chunk_size, MAX_PART_SIZE)?;
    let mut coordinator = UploadCoordinator::new(gateway, auth, planner);
    if let Some(metrics) = metrics {
        coordinator = coordinator.with_metrics(metrics);
    }

    let bar = ProgressBar::new(source.len());
    bar.set_style(progress_style());
    bar.set_message(source.name().to_string());

    let progress = bar.clone();
    coordinator.on_progress(Box::new(move |update| {
        progress.set_position(update.completed_bytes);
    }));

    match coordinator.upload(&mut source).await {
        Ok(outcome) => {
            bar.finish_and_clear();
            Ok(outcome)
        }
        Err(e) => {
            bar.abandon();
            Err(e).with_context(|| format!("Upload of {} failed", path.display()))
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes}",
    )
    .map(|style| style.progress_chars("=>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Print the locator and transfer statistics of a finished upload
pub fn print_summary(outcome: &UploadOutcome, metrics: &TransferMetrics) {
    let session = &outcome.session;
    println!(
        "{} {} ({} in {} part{})",
        "Uploaded".green().bold(),
        outcome.locator.bold(),
        humansize::format_size(session.total_size(), humansize::BINARY),
        session.parts().len(),
        if session.parts().len() == 1 { "" } else { "s" }
    );

    if let Some(throughput) = metrics.throughput() {
        println!(
            "  {}/s over {} request{}",
            humansize::format_size(throughput as u64, humansize::BINARY),
            metrics.request_count(),
            if metrics.request_count() == 1 { "" } else { "s" }
        );
    }
}
