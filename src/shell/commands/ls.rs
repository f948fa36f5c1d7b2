use anyhow::{Result, anyhow};
use async_trait::async_trait;
use colored::*;

use super::output::dir_summary;
use super::{Command, ShellState};
use crate::print_line;

pub struct LsCommand;

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &str {
        "ls"
    }

    fn usage(&self) -> &str {
        "ls [-l] [PATH] - List directory contents inside the open archive"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let mut long_format = false;
        let mut path_arg: Option<&str> = None;

        for arg in args {
            if arg == "-l" {
                long_format = true;
            } else if !arg.starts_with('-') {
                path_arg = Some(arg);
                break; // Only take the first non-flag argument
            }
        }

        let archive = state.require_archive()?;
        let target = archive.resolve(path_arg.unwrap_or("."));
        let node = archive
            .tree
            .find(&target)
            .ok_or_else(|| anyhow!("No such file or directory: {target}"))?;

        if !node.is_dir() {
            print_line!("{}", node.name());
            return Ok(());
        }

        for (name, child) in node.list() {
            match (child.is_dir(), long_format) {
                (true, true) => {
                    print_line!("{:<50} {}", format!("{name}/").blue().bold(), dir_summary(child))
                }
                (true, false) => print_line!("{}/", name.blue().bold()),
                (false, _) => print_line!("{name}"),
            }
        }

        Ok(())
    }
}
