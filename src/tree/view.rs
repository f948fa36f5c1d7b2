use std::collections::HashSet;

use super::{NodePath, TreeNode};

/// One line of a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow<'a> {
    /// Depth below the root; top-level entries are at depth 0
    pub depth: usize,
    pub path: NodePath,
    pub node: &'a TreeNode,
    pub expanded: bool,
}

/// Expand/collapse state of a tree, keyed by node path.
///
/// The root starts expanded; everything else starts collapsed. The state
/// knows nothing about the tree it is applied to, so stale paths are harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeView {
    expanded: HashSet<String>,
}

impl Default for TreeView {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeView {
    pub fn new() -> Self {
        let mut expanded = HashSet::new();
        expanded.insert(NodePath::root().key());
        TreeView { expanded }
    }

    /// Flip the expansion of `path`, returning the new state.
    pub fn toggle(&mut self, path: &str) -> bool {
        let key = NodePath::parse(path).key();
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(&NodePath::parse(path).key())
    }

    /// Expand `path` and every directory above it.
    pub fn expand_to(&mut self, path: &str) {
        let path = NodePath::parse(path);
        for ancestor in path.ancestors() {
            self.expanded.insert(ancestor.key());
        }
        self.expanded.insert(path.key());
    }

    /// Collapse everything except the root.
    pub fn collapse_all(&mut self) {
        self.expanded.clear();
        self.expanded.insert(NodePath::root().key());
    }

    /// Rows visible under the current state: children of every expanded
    /// directory reachable from the root through expanded directories.
    /// Collapsed subtrees are never walked.
    pub fn visible_rows<'a>(&self, root: &'a TreeNode) -> Vec<TreeRow<'a>> {
        let mut rows = Vec::new();
        if self.expanded.contains(&NodePath::root().key()) {
            self.push_children(root, &NodePath::root(), 0, &mut rows);
        }
        rows
    }

    fn push_children<'a>(
        &self,
        node: &'a TreeNode,
        path: &NodePath,
        depth: usize,
        rows: &mut Vec<TreeRow<'a>>,
    ) {
        for (name, child) in node.list() {
            let child_path = path.child(name);
            let expanded = child.is_dir() && self.expanded.contains(&child_path.key());
            rows.push(TreeRow {
                depth,
                path: child_path.clone(),
                node: child,
                expanded,
            });
            if expanded {
                self.push_children(child, &child_path, depth + 1, rows);
            }
        }
    }
}
