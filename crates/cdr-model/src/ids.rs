#![deny(unsafe_code)]

use std::fmt;

use sha2::{Digest, Sha256};

/// Separator placed between the id inputs before hashing.
const ID_FIELD_SEPARATOR: &[u8] = b"|";

/// A deterministic call identifier.
///
/// Derived from `(filename, date, phone_number_client)` with SHA-256: the
/// first 8 digest bytes are read as a big-endian `i64` and the absolute value
/// is rendered in decimal. The same triple yields the same id in every process.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    pub fn derive(filename: &str, date: &str, phone_number_client: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(filename.as_bytes());
        hasher.update(ID_FIELD_SEPARATOR);
        hasher.update(date.as_bytes());
        hasher.update(ID_FIELD_SEPARATOR);
        hasher.update(phone_number_client.as_bytes());
        let digest = hasher.finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let value = i64::from_be_bytes(prefix);
        Self(value.unsigned_abs().to_string())
    }

    /// Wraps an id received from a caller (e.g. a lookup request).
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
