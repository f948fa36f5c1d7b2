use anyhow::{Result, anyhow};
use async_trait::async_trait;
use colored::*;

use super::{Command, ShellState};
use crate::shell::OpenArchive;

pub struct OpenCommand;

#[async_trait]
impl Command for OpenCommand {
    fn name(&self) -> &str {
        "open"
    }

    fn usage(&self) -> &str {
        "open [LOCATOR] - Inspect an uploaded archive (defaults to the last upload)"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let locator = match args.first() {
            Some(locator) => locator.clone(),
            None => state
                .last_upload()
                .map(String::from)
                .ok_or_else(|| anyhow!("Nothing uploaded yet. Usage: {}", self.usage()))?,
        };

        let tree = state.inspector().inspect(&locator).await?;
        println!(
            "{} {} ({} files, {} directories)",
            "Opened".green().bold(),
            locator,
            tree.file_count(),
            tree.dir_count()
        );

        state.set_archive(OpenArchive::new(locator, tree));
        Ok(())
    }
}
