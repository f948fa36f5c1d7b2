/// A "/"-separated path inside an archive tree.
///
/// Empty segments and `.` are dropped, so `a//b/`, `/a/b` and `a/./b` all
/// name the same node. The root is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// The root path
    pub fn root() -> Self {
        NodePath::default()
    }

    /// Parse a path string into its segments
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(String::from)
            .collect();

        NodePath { segments }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this path is the root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the parent path
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut parent_segments = self.segments.clone();
            parent_segments.pop();
            Some(NodePath {
                segments: parent_segments,
            })
        }
    }

    /// Get the last segment
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    /// Append a single child segment
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        NodePath { segments }
    }

    /// Resolve `other` relative to this path. An absolute `other` starts
    /// from the root; `..` steps up one level.
    pub fn join(&self, other: &str) -> Self {
        let mut new_segments = if other.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for segment in other.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            } else if segment == ".." {
                new_segments.pop();
            } else {
                new_segments.push(segment.to_string());
            }
        }

        NodePath {
            segments: new_segments,
        }
    }

    /// Every proper ancestor, from the root down
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.segments.len()).map(|n| NodePath {
            segments: self.segments[..n].to_vec(),
        })
    }

    /// The canonical "/"-joined key, empty for the root
    pub fn key(&self) -> String {
        self.segments.join("/")
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}
