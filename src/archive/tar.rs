use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::io::Read;

use super::{EntryLister, InspectError};
use crate::tree::{NodeKind, TreeEntry};

/// Outer compression wrapped around a tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
}

/// Lists tar headers. Compressed tars are decompressed as a stream while
/// walking headers; entry bodies are skipped, not extracted.
pub struct TarLister {
    compression: TarCompression,
}

impl TarLister {
    pub fn new(compression: TarCompression) -> Self {
        TarLister { compression }
    }

    fn list_from<R: Read>(reader: R) -> Result<Vec<TreeEntry>, InspectError> {
        let mut archive = ::tar::Archive::new(reader);
        let iter = archive
            .entries()
            .map_err(|e| InspectError::Decode(format!("invalid tar archive: {e}")))?;

        let mut entries = Vec::new();
        for entry in iter {
            let entry =
                entry.map_err(|e| InspectError::Decode(format!("invalid tar entry: {e}")))?;
            let path = entry
                .path()
                .map_err(|e| InspectError::Decode(format!("invalid tar entry path: {e}")))?
                .to_string_lossy()
                .into_owned();

            let kind = if entry.header().entry_type().is_dir() {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            entries.push(TreeEntry::new(path, Some(kind)));
        }

        Ok(entries)
    }
}

impl EntryLister for TarLister {
    fn list_entries(&self, data: &[u8]) -> Result<Vec<TreeEntry>, InspectError> {
        match self.compression {
            TarCompression::None => Self::list_from(data),
            TarCompression::Gzip => Self::list_from(GzDecoder::new(data)),
            TarCompression::Bzip2 => Self::list_from(BzDecoder::new(data)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveType, build_tree};
    use bzip2::write::BzEncoder;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn append_file<W: std::io::Write>(builder: &mut ::tar::Builder<W>, path: &str, data: &[u8]) {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, data).unwrap();
    }

    fn append_dir<W: std::io::Write>(builder: &mut ::tar::Builder<W>, path: &str) {
        let mut header = ::tar::Header::new_gnu();
        header.set_entry_type(::tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, std::io::empty()).unwrap();
    }

    // Writes the name bytes as given; `append_data` would strip a leading `./`
    fn append_raw<W: std::io::Write>(builder: &mut ::tar::Builder<W>, path: &str, data: &[u8]) {
        let mut header = ::tar::Header::new_gnu();
        header.as_old_mut().name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, data).unwrap();
    }

    fn build_targz() -> Vec<u8> {
        let mut out = Vec::new();
        {
            let encoder = GzEncoder::new(&mut out, Compression::default());
            let mut builder = ::tar::Builder::new(encoder);
            append_dir(&mut builder, "export/");
            append_file(&mut builder, "export/posts/1.json", b"{}");
            append_file(&mut builder, "export/media/photo.jpg", &[0xff, 0xd8, 0xff]);
            builder.into_inner().unwrap().finish().unwrap();
        }
        out
    }

    #[test]
    fn test_lists_gzipped_tar() {
        let entries = TarLister::new(TarCompression::Gzip)
            .list_entries(&build_targz())
            .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, Some(NodeKind::Directory));
        assert_eq!(entries[0].path.trim_end_matches('/'), "export");
        assert_eq!(entries[1], TreeEntry::file("export/posts/1.json"));
        assert_eq!(entries[2], TreeEntry::file("export/media/photo.jpg"));
    }

    #[test]
    fn test_lists_bzipped_tar() {
        let mut out = Vec::new();
        {
            let encoder = BzEncoder::new(&mut out, bzip2::Compression::default());
            let mut builder = ::tar::Builder::new(encoder);
            append_raw(&mut builder, "./d/x.txt", b"x");
            append_file(&mut builder, "d/e/y.txt", b"y");
            builder.into_inner().unwrap().finish().unwrap();
        }

        let entries = TarLister::new(TarCompression::Bzip2)
            .list_entries(&out)
            .unwrap();
        assert_eq!(
            entries,
            vec![TreeEntry::file("./d/x.txt"), TreeEntry::file("d/e/y.txt")]
        );

        let tree = build_tree(ArchiveType::TarBz2, &out, true).unwrap();
        let names: Vec<&str> = tree.list().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["d"]);
        let d = tree.child("d").unwrap();
        assert!(d.child("x.txt").is_some());
        assert!(d.child("e").unwrap().is_dir());
    }

    #[test]
    fn test_plain_tar() {
        let mut builder = ::tar::Builder::new(Vec::new());
        append_file(&mut builder, "a.txt", b"a");
        let data = builder.into_inner().unwrap();

        let entries = TarLister::new(TarCompression::None)
            .list_entries(&data)
            .unwrap();
        assert_eq!(entries, vec![TreeEntry::file("a.txt")]);
    }

    #[test]
    fn test_garbage_gzip_is_decode_error() {
        let err = TarLister::new(TarCompression::Gzip)
            .list_entries(b"not gzip at all, just text")
            .unwrap_err();
        assert!(matches!(err, InspectError::Decode(_)));
    }
}
