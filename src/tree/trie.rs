//! Hierarchical tree built from flat archive entry paths.
//!
//! The tree derives purely from the entry path strings: intermediate
//! components are always materialized as directories, whether or not the
//! archive carries an explicit entry for them.

use std::collections::BTreeMap;

use super::{NodePath, TreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// A flat archive entry: its path and, if the container says so, its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: Option<NodeKind>,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, kind: Option<NodeKind>) -> Self {
        TreeEntry {
            path: path.into(),
            kind,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path, Some(NodeKind::File))
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::new(path, Some(NodeKind::Directory))
    }
}

impl From<&str> for TreeEntry {
    fn from(path: &str) -> Self {
        TreeEntry::new(path, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    kind: NodeKind,
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn new(name: &str, kind: NodeKind) -> Self {
        TreeNode {
            name: name.to_string(),
            kind,
            children: BTreeMap::new(),
        }
    }

    /// The synthetic, unnamed root directory
    pub fn root() -> Self {
        Self::new("", NodeKind::Directory)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Children sorted ascending by name. Files have none.
    pub fn list(&self) -> impl Iterator<Item = (&str, &TreeNode)> + '_ {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Look up a descendant by path; the empty path is this node.
    pub fn find(&self, path: &NodePath) -> Option<&TreeNode> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Number of files below this node.
    pub fn file_count(&self) -> usize {
        self.children
            .values()
            .map(|c| if c.is_dir() { c.file_count() } else { 1 })
            .sum()
    }

    /// Number of directories below this node.
    pub fn dir_count(&self) -> usize {
        self.children
            .values()
            .filter(|c| c.is_dir())
            .map(|c| 1 + c.dir_count())
            .sum()
    }
}

/// Incremental tree builder.
///
/// By default a name declared both as a file and as a directory keeps its
/// last declaration and the conflict is logged. In strict mode such a
/// conflict is an error instead.
#[derive(Debug)]
pub struct PathTrie {
    root: TreeNode,
    strict: bool,
    conflicts: Vec<String>,
}

impl Default for PathTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTrie {
    pub fn new() -> Self {
        PathTrie {
            root: TreeNode::root(),
            strict: false,
            conflicts: Vec::new(),
        }
    }

    pub fn strict() -> Self {
        PathTrie {
            strict: true,
            ..Self::new()
        }
    }

    /// Build a tree from `entries`, resolving conflicts last-write-wins.
    pub fn build<I, E>(entries: I) -> TreeNode
    where
        I: IntoIterator<Item = E>,
        E: Into<TreeEntry>,
    {
        let mut trie = PathTrie::new();
        for entry in entries {
            // Only strict tries return errors
            let _ = trie.insert(entry.into());
        }
        trie.into_root()
    }

    /// Build a tree from `entries`, failing on the first conflict.
    pub fn build_strict<I, E>(entries: I) -> Result<TreeNode, TreeError>
    where
        I: IntoIterator<Item = E>,
        E: Into<TreeEntry>,
    {
        let mut trie = PathTrie::strict();
        for entry in entries {
            trie.insert(entry.into())?;
        }
        Ok(trie.into_root())
    }

    /// Insert one entry. Entries made only of separators are skipped.
    pub fn insert(&mut self, entry: TreeEntry) -> Result<(), TreeError> {
        let path = NodePath::parse(&entry.path);
        let segments = path.segments();
        let Some(last) = segments.len().checked_sub(1) else {
            return Ok(());
        };
        let leaf_kind = entry.kind.unwrap_or(NodeKind::File);

        let mut node = &mut self.root;
        for (i, segment) in segments.iter().enumerate() {
            let declared = if i == last {
                leaf_kind
            } else {
                NodeKind::Directory
            };

            let child = node
                .children
                .entry(segment.clone())
                .or_insert_with(|| TreeNode::new(segment, declared));

            if child.kind != declared {
                let conflict = segments[..=i].join("/");
                if self.strict {
                    return Err(TreeError::Conflict { path: conflict });
                }

                tracing::warn!(
                    path = %conflict,
                    previous = ?child.kind,
                    declared = ?declared,
                    "entry declared as both file and directory, keeping last declaration"
                );
                child.kind = declared;
                if declared == NodeKind::File {
                    child.children.clear();
                }
                self.conflicts.push(conflict);
            }

            node = child;
        }

        Ok(())
    }

    /// Paths whose kind was overridden by a later entry.
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn into_root(self) -> TreeNode {
        self.root
    }
}
