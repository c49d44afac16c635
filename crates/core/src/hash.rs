//! BLAKE3 content digests for manifest entries
//!
//! Digests are truncated to 8 bytes (16 hex characters) so manifests stay
//! readable. The truncation is for display and change detection only; it is
//! not an integrity guarantee against a deliberate adversary.

use crate::error::{CodexError, IoResultExt, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Width of a digest in bytes
pub const DIGEST_LEN: usize = 8;

/// Truncated BLAKE3 digest of a file's content
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct FileDigest([u8; DIGEST_LEN]);

impl FileDigest {
    /// Create a digest from raw bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a byte slice
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, always 16 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 16-character hex string
    pub fn from_hex(s: &str) -> std::result::Result<Self, String> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(format!(
                "invalid digest length: expected {} characters, got {}",
                DIGEST_LEN * 2,
                s.len()
            ));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| format!("invalid digest: {e}"))?;
        Ok(Self(bytes))
    }

    fn from_full(hash: blake3::Hash) -> Self {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..DIGEST_LEN]);
        Self(bytes)
    }
}

impl std::fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileDigest({})", self.to_hex())
    }
}

impl std::fmt::Display for FileDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for FileDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FileDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Digest an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> FileDigest {
    FileDigest::from_full(blake3::hash(data))
}

/// Digest a file's full content (streaming)
pub fn hash_file(path: &Path) -> Result<FileDigest> {
    let file = File::open(path).at(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer).at(path)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(FileDigest::from_full(hasher.finalize()))
}

/// Digest a file, returning `None` when it does not exist
pub fn hash_file_if_exists(path: &Path) -> Result<Option<FileDigest>> {
    match hash_file(path) {
        Ok(digest) => Ok(Some(digest)),
        Err(CodexError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
