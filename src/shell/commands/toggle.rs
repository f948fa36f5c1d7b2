use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{Command, ShellState};

pub struct ToggleCommand;

#[async_trait]
impl Command for ToggleCommand {
    fn name(&self) -> &str {
        "toggle"
    }

    fn usage(&self) -> &str {
        "toggle PATH - Expand or collapse a directory in the tree view"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let path = args
            .first()
            .ok_or_else(|| anyhow!("Usage: {}", self.usage()))?;

        let archive = state.require_archive_mut()?;
        let target = archive.resolve(path);
        match archive.tree.find(&target) {
            Some(node) if node.is_dir() => {}
            Some(_) => return Err(anyhow!("Not a directory: {target}")),
            None => return Err(anyhow!("No such directory: {target}")),
        }

        let expanded = archive.view.toggle(&target.key());
        println!("{} {}", if expanded { "expanded" } else { "collapsed" }, target);
        Ok(())
    }
}
