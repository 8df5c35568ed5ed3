//! Configuration files served to agents.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use sha2::{Digest, Sha256};

const DEFAULT_PERMISSIONS: &str = "0644";

/// Describes a file without its contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMeta {
    /// The absolute path of the file on the data plane.
    pub name: String,
    pub hash: String,
    pub permissions: String,
    pub size: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct File {
    pub meta: FileMeta,
    pub contents: Bytes,
}

// === impl File ===

impl File {
    pub fn new(name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        let contents = contents.into();
        let meta = FileMeta {
            name: name.into(),
            hash: hash(&contents),
            permissions: DEFAULT_PERMISSIONS.to_string(),
            size: contents.len() as i64,
        };
        Self { meta, contents }
    }
}

/// Hashes file contents as base64(sha256(contents)).
pub fn hash(contents: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(contents))
}

/// Derives a version for a set of files from the files' hashes, in order.
pub fn config_version<'f>(files: impl IntoIterator<Item = &'f FileMeta>) -> String {
    let hashes = files
        .into_iter()
        .map(|f| f.hash.as_str())
        .collect::<String>();
    hash(hashes.as_bytes())
}
