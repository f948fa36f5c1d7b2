//! Archive directory trees and their expand/collapse state.

pub mod path;
pub mod trie;
pub mod view;

pub use path::NodePath;
pub use trie::{NodeKind, PathTrie, TreeEntry, TreeNode};
pub use view::{TreeRow, TreeView};

/// Errors raised while building a tree in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("'{path}' is declared both as a file and as a directory")]
    Conflict { path: String },
}
