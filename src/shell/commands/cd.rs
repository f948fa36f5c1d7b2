use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{Command, ShellState};
use crate::tree::NodePath;

pub struct CdCommand;

#[async_trait]
impl Command for CdCommand {
    fn name(&self) -> &str {
        "cd"
    }

    fn usage(&self) -> &str {
        "cd [PATH] - Change directory inside the open archive"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let archive = state.require_archive_mut()?;

        // cd with no args goes to the archive root
        let target = match args.first() {
            Some(path) => archive.resolve(path),
            None => NodePath::root(),
        };

        match archive.tree.find(&target) {
            Some(node) if node.is_dir() => {
                archive.cwd = target;
                Ok(())
            }
            Some(_) => Err(anyhow!("Not a directory: {target}")),
            None => Err(anyhow!("No such directory: {target}")),
        }
    }
}
