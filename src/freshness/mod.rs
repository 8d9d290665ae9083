//! Content-hash (blake3) freshness for build outputs.
//!
//! Outputs are only rewritten when their bytes change, so unchanged pages
//! keep their mtime and `ghp-import` sees a minimal diff.

use std::{
    fs::{self, File},
    io::{self, BufReader, Read},
    path::Path,
};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory buffer.
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Hash a file's contents, streaming.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(64 * 1024, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = [0u8; 64 * 1024];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    hasher.update(&buffer[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Self(*hasher.finalize().as_bytes()))
    }
}

/// Whether `path` already holds exactly `bytes`.
///
/// Sizes are compared first; files are only hashed when sizes match.
pub fn is_fresh(path: &Path, bytes: &[u8]) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == bytes.len() as u64 => {
            ContentHash::of_file(path).is_ok_and(|hash| hash == ContentHash::of(bytes))
        }
        _ => false,
    }
}

/// Write `bytes` to `path` unless it is already fresh.
///
/// Creates parent directories. Returns whether the file was written.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    if is_fresh(path, bytes) {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(true)
}
