use std::io::Cursor;

use super::{EntryLister, InspectError};
use crate::tree::{NodeKind, TreeEntry};

/// Lists the central directory of a ZIP archive. Entry data is never
/// decompressed.
pub struct ZipLister;

impl EntryLister for ZipLister {
    fn list_entries(&self, data: &[u8]) -> Result<Vec<TreeEntry>, InspectError> {
        let mut archive = ::zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| InspectError::Decode(format!("invalid ZIP archive: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| InspectError::Decode(format!("invalid ZIP entry {i}: {e}")))?;

            // Directory entries carry a trailing slash
            let kind = if file.is_dir() {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            entries.push(TreeEntry::new(file.name(), Some(kind)));
        }

        Ok(entries)
    }
}
