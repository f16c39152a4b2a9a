//! Content digests used to skip copies that would not change anything.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::FsError;

/// SHA-256 of a file's bytes. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDigest([u8; 32]);

impl FileDigest {
    pub fn of_bytes(content: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(content))
    }

    pub fn of_file(path: &Path) -> Result<Self, FsError> {
        let read_error = |e| FsError::Read {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(path).map_err(read_error)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buffer).map_err(read_error)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(Self::from_hasher(hasher))
    }

    fn from_hasher(hasher: Sha256) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// True when `dst` is missing, is not a regular file, or holds different bytes than `src`.
pub fn should_copy(src: &Path, dst: &Path) -> Result<bool, FsError> {
    if !dst.is_file() {
        return Ok(true);
    }
    Ok(FileDigest::of_file(src)? != FileDigest::of_file(dst)?)
}
