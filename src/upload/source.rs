use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::ChunkRange;

/// Something that can hand out byte ranges of a payload on demand, so the
/// uploader never holds more than one part in memory.
#[async_trait]
pub trait UploadSource: Send {
    /// File name announced to the gateway.
    fn name(&self) -> &str;

    /// Total payload length in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly the bytes of `range`.
    async fn read_range(&mut self, range: &ChunkRange) -> std::io::Result<Bytes>;
}

/// A payload that is already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Bytes,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        MemorySource {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl UploadSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&mut self, range: &ChunkRange) -> std::io::Result<Bytes> {
        if range.end > self.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "range {}..{} beyond payload of {} bytes",
                    range.start,
                    range.end,
                    self.len()
                ),
            ));
        }
        Ok(self.data.slice(range.start as usize..range.end as usize))
    }
}

/// A payload read from a local file, one range at a time.
#[derive(Debug)]
pub struct FileSource {
    name: String,
    file: tokio::fs::File,
    len: u64,
}

impl FileSource {
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        Ok(FileSource { name, file, len })
    }
}

#[async_trait]
impl UploadSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn read_range(&mut self, range: &ChunkRange) -> std::io::Result<Bytes> {
        self.file.seek(SeekFrom::Start(range.start)).await?;
        let mut buf = vec![0u8; range.len() as usize];
        self.file.read_exact(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}
