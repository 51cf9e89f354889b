//! Chunked byte sources: sequential, size-aware access to archives.
//!
//! The parser never requires the whole archive to be memory-resident. A
//! [`ByteSource`] yields owned chunks with lossy UTF-8 decoding; invalid
//! sequences are replaced rather than aborting the stream.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Result, SiftError};
use crate::options::{BUFFER_CHUNK_SIZE, LARGE_BUFFER_THRESHOLD, PATH_CHUNK_SIZE};

/// A read-only byte source for an archive.
#[derive(Debug)]
pub enum ByteSource {
    /// Stream a file from disk at 100 MiB granularity.
    Path(PathBuf),
    /// Slice an in-memory buffer at 5 MiB granularity.
    Buffer(Vec<u8>),
}

impl ByteSource {
    /// Open a path source, verifying the file exists up front.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match std::fs::metadata(&path) {
            Ok(_) => Ok(Self::Path(path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SiftError::FileNotFound(path))
            }
            Err(e) => Err(SiftError::io(path, e)),
        }
    }

    /// Total size in bytes, if knowable without reading.
    pub fn len(&self) -> Result<u64> {
        match self {
            Self::Path(path) => std::fs::metadata(path)
                .map(|m| m.len())
                .map_err(|e| SiftError::io(path, e)),
            Self::Buffer(buf) => Ok(buf.len() as u64),
        }
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// The default chunk size for this source mode.
    ///
    /// Buffers beyond ~500 MiB fall back to path-mode granularity so no
    /// single decoded string approaches platform string-size caps.
    pub fn default_chunk_size(&self) -> usize {
        match self {
            Self::Path(_) => PATH_CHUNK_SIZE,
            Self::Buffer(buf) if buf.len() > LARGE_BUFFER_THRESHOLD => PATH_CHUNK_SIZE,
            Self::Buffer(_) => BUFFER_CHUNK_SIZE,
        }
    }

    /// Create a sequential chunk reader over this source.
    pub fn chunks(&self, chunk_size: Option<usize>) -> Result<ChunkedReader<'_>> {
        let size = chunk_size.unwrap_or_else(|| self.default_chunk_size()).max(1);
        let inner = match self {
            Self::Path(path) => {
                let file = File::open(path).map_err(|e| SiftError::io(path, e))?;
                ReaderInner::File { file, path }
            }
            Self::Buffer(buf) => ReaderInner::Slice { buf, pos: 0 },
        };
        Ok(ChunkedReader { inner, size })
    }

    /// Read the first `n` bytes (for format sniffing).
    pub fn peek(&self, n: usize) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => {
                let mut file = File::open(path).map_err(|e| SiftError::io(path, e))?;
                let mut buf = vec![0u8; n];
                let mut read = 0;
                while read < n {
                    match file.read(&mut buf[read..]) {
                        Ok(0) => break,
                        Ok(k) => read += k,
                        Err(e) => return Err(SiftError::io(path, e)),
                    }
                }
                buf.truncate(read);
                Ok(buf)
            }
            Self::Buffer(buf) => Ok(buf[..n.min(buf.len())].to_vec()),
        }
    }
}

enum ReaderInner<'a> {
    File { file: File, path: &'a Path },
    Slice { buf: &'a [u8], pos: usize },
}

/// Sequential chunk iterator over a [`ByteSource`].
///
/// Each call to [`ChunkedReader::next_chunk`] yields an owned, lossily
/// UTF-8-decoded string of at most the configured chunk size, or `None`
/// at end of source.
pub struct ChunkedReader<'a> {
    inner: ReaderInner<'a>,
    size: usize,
}

impl ChunkedReader<'_> {
    /// Configured chunk size in bytes.
    pub fn chunk_size(&self) -> usize {
        self.size
    }

    /// Read the next chunk, or `None` at EOF.
    pub fn next_chunk(&mut self) -> Result<Option<String>> {
        match &mut self.inner {
            ReaderInner::File { file, path } => {
                let mut buf = vec![0u8; self.size];
                let mut read = 0;
                // Fill the chunk fully unless EOF arrives first.
                while read < self.size {
                    match file.read(&mut buf[read..]) {
                        Ok(0) => break,
                        Ok(k) => read += k,
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(SiftError::io(*path, e)),
                    }
                }
                if read == 0 {
                    return Ok(None);
                }
                buf.truncate(read);
                Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
            }
            ReaderInner::Slice { buf, pos } => {
                if *pos >= buf.len() {
                    return Ok(None);
                }
                let end = (*pos + self.size).min(buf.len());
                let chunk = String::from_utf8_lossy(&buf[*pos..end]).into_owned();
                *pos = end;
                Ok(Some(chunk))
            }
        }
    }
}
