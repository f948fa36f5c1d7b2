use anyhow::Result;
use async_trait::async_trait;
use colored::*;

use super::{Command, ShellState};
use crate::print_line;
use crate::tree::{TreeNode, TreeRow, TreeView};

pub struct TreeCommand;

#[async_trait]
impl Command for TreeCommand {
    fn name(&self) -> &str {
        "tree"
    }

    fn usage(&self) -> &str {
        "tree [--collapse] [PATH] - Show the expanded tree, optionally revealing PATH"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let archive = state.require_archive_mut()?;

        for arg in args {
            if arg == "--collapse" {
                archive.view.collapse_all();
            } else if !arg.starts_with('-') {
                let target = archive.resolve(arg);
                archive.view.expand_to(&target.key());
            }
        }

        let archive = state.require_archive()?;
        print_line!("{}", archive.locator.bold());
        for line in render(&archive.view, &archive.tree) {
            print_line!("{line}");
        }
        Ok(())
    }
}

/// One display line per visible row, indented by depth
pub fn render(view: &TreeView, root: &TreeNode) -> Vec<String> {
    view.visible_rows(root).iter().map(render_row).collect()
}

fn render_row(row: &TreeRow<'_>) -> String {
    let indent = "  ".repeat(row.depth);
    let name = row.node.name();
    if row.node.is_dir() {
        let marker = if row.expanded { "▾" } else { "▸" };
        format!("{indent}{marker} {}/", name.blue().bold())
    } else {
        format!("{indent}  {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PathTrie;

    #[test]
    fn test_render_indents_expanded_children() {
        colored::control::set_override(false);
        let root = PathTrie::build(["a/b.txt", "c.txt"]);
        let mut view = TreeView::new();
        assert_eq!(render(&view, &root), vec!["▸ a/", "  c.txt"]);

        view.toggle("a");
        assert_eq!(render(&view, &root), vec!["▾ a/", "    b.txt", "  c.txt"]);
    }
}
