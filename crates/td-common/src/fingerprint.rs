//! Content fingerprints.
//!
//! A fingerprint identifies one distinct input to the loader: either the
//! bytes of an uploaded file or the path of the default export. Two uploads
//! with identical bytes share a fingerprint regardless of their file names.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// SHA-256 based identity of a loader input.
///
/// Format: `<kind>:<hex digest>` where kind is `bytes` or `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Fingerprint raw uploaded bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fingerprint(format!("bytes:{}", sha256_hex(bytes)))
    }

    /// Fingerprint an on-disk file by its path.
    pub fn of_path(path: &Path) -> Self {
        let canonical = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        Fingerprint(format!(
            "path:{}",
            sha256_hex(canonical.to_string_lossy().as_bytes())
        ))
    }

    /// Short prefix suitable for log lines.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(18)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_same_bytes_same_fingerprint() {
        let a = Fingerprint::of_bytes(b"Status;Prioridade\n");
        let b = Fingerprint::of_bytes(b"Status;Prioridade\n");
        let c = Fingerprint::of_bytes(b"Status,Prioridade\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.0.starts_with("bytes:"));
    }

    #[test]
    fn test_path_fingerprint_is_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("glpi.csv");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "a;b").expect("write");

        let first = Fingerprint::of_path(&path);
        let second = Fingerprint::of_path(&path);
        assert_eq!(first, second);
        assert!(first.0.starts_with("path:"));
    }

    #[test]
    fn test_short_prefix() {
        let fp = Fingerprint::of_bytes(b"x");
        assert_eq!(fp.short().len(), 18);
        assert!(fp.0.starts_with(fp.short()));
    }
}
