pub mod tar;
pub mod zip;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::cache::TreeCache;
use crate::s3::{S3Client, parse_s3_locator};
use crate::tree::{PathTrie, TreeEntry, TreeError, TreeNode};

/// Container formats whose entry list we can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    Tar,
    TarGz,
    TarBz2,
    Zip,
}

impl ArchiveType {
    /// Detect archive type from file extension
    pub fn from_path(path: &str) -> Option<Self> {
        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".tar.gz") || path_lower.ends_with(".tgz") {
            return Some(ArchiveType::TarGz);
        }
        if path_lower.ends_with(".tar.bz2") || path_lower.ends_with(".tbz2") {
            return Some(ArchiveType::TarBz2);
        }
        if path_lower.ends_with(".tar") {
            return Some(ArchiveType::Tar);
        }
        if path_lower.ends_with(".zip") {
            return Some(ArchiveType::Zip);
        }
        None
    }

    /// Entry lister for this format
    pub fn lister(&self) -> Box<dyn EntryLister> {
        match self {
            ArchiveType::Zip => Box::new(zip::ZipLister),
            ArchiveType::Tar => Box::new(tar::TarLister::new(tar::TarCompression::None)),
            ArchiveType::TarGz => Box::new(tar::TarLister::new(tar::TarCompression::Gzip)),
            ArchiveType::TarBz2 => Box::new(tar::TarLister::new(tar::TarCompression::Bzip2)),
        }
    }
}

/// Errors raised while inspecting an archive
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("failed to fetch archive: {0:#}")]
    Fetch(#[source] anyhow::Error),

    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("archive is unreadable: {0}")]
    Decode(String),

    #[error(transparent)]
    Conflict(#[from] TreeError),
}

/// Reads the entry list (path and kind) of a container without extracting
/// entry contents
pub trait EntryLister: Send + Sync {
    fn list_entries(&self, data: &[u8]) -> Result<Vec<TreeEntry>, InspectError>;
}

/// Retrieves stored objects by locator
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes>;
}

#[async_trait]
impl ObjectFetcher for S3Client {
    async fn fetch(&self, locator: &str) -> anyhow::Result<Bytes> {
        let (bucket, key) = parse_s3_locator(locator)
            .ok_or_else(|| anyhow::anyhow!("Not an s3://bucket/key locator: {locator}"))?;
        self.get_object(bucket, key).await
    }
}

/// Fetches archives and turns their entry lists into trees
pub struct ArchiveInspector {
    fetcher: Arc<dyn ObjectFetcher>,
    cache: TreeCache,
    strict: bool,
}

impl ArchiveInspector {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, cache: TreeCache) -> Self {
        ArchiveInspector {
            fetcher,
            cache,
            strict: false,
        }
    }

    /// Fail on entries declared both as file and directory instead of
    /// keeping the last declaration
    pub fn with_strict_conflicts(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Build (or fetch from cache) the directory tree of the archive at
    /// `locator`
    pub async fn inspect(&self, locator: &str) -> Result<Arc<TreeNode>, InspectError> {
        if let Some(tree) = self.cache.get(locator) {
            tracing::debug!(locator, "archive tree served from cache");
            return Ok(tree);
        }

        let archive_type = ArchiveType::from_path(locator)
            .ok_or_else(|| InspectError::UnsupportedFormat(locator.to_string()))?;

        let data = self
            .fetcher
            .fetch(locator)
            .await
            .map_err(InspectError::Fetch)?;
        tracing::debug!(locator, bytes = data.len(), ?archive_type, "archive fetched");

        let strict = self.strict;
        let tree = tokio::task::spawn_blocking(move || build_tree(archive_type, &data, strict))
            .await
            .map_err(|e| InspectError::Decode(format!("archive listing task failed: {e}")))??;

        let tree = Arc::new(tree);
        self.cache.put(locator.to_string(), Arc::clone(&tree));
        Ok(tree)
    }
}

/// List the entries of `data` and build the tree. Nothing is returned unless
/// the whole entry list could be read.
pub fn build_tree(
    archive_type: ArchiveType,
    data: &[u8],
    strict: bool,
) -> Result<TreeNode, InspectError> {
    let entries = archive_type.lister().list_entries(data)?;
    tracing::debug!(entries = entries.len(), "archive entries listed");

    if strict {
        Ok(PathTrie::build_strict(entries)?)
    } else {
        Ok(PathTrie::build(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_type_detection() {
        assert_eq!(ArchiveType::from_path("s3://b/x.zip"), Some(ArchiveType::Zip));
        assert_eq!(ArchiveType::from_path("x.TAR.GZ"), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_path("x.tgz"), Some(ArchiveType::TarGz));
        assert_eq!(ArchiveType::from_path("x.tbz2"), Some(ArchiveType::TarBz2));
        assert_eq!(ArchiveType::from_path("x.tar"), Some(ArchiveType::Tar));
        assert_eq!(ArchiveType::from_path("x.gz"), None);
        assert_eq!(ArchiveType::from_path("x.txt"), None);
    }
}
