//! Canonical hashing of declared task inputs.
//!
//! Every field is written with an explicit length prefix so distinct inputs
//! never serialize to the same byte stream before hashing.

use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Default)]
pub(crate) struct CanonicalHasher {
    inner: Sha256,
}

impl CanonicalHasher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hashes a byte field with an explicit length prefix.
    pub(crate) fn field(&mut self, bytes: &[u8]) -> &mut Self {
        let len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.inner.update(len.to_be_bytes());
        self.inner.update(bytes);
        self
    }

    pub(crate) fn str_field(&mut self, value: &str) -> &mut Self {
        self.field(value.as_bytes())
    }

    /// Hashes a fixed-width integer field.
    pub(crate) fn u64_field(&mut self, value: u64) -> &mut Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    /// Hashes a path while preserving platform identity semantics.
    ///
    /// On Unix the raw OS bytes are hashed so distinct non-UTF-8 paths stay
    /// distinct. Elsewhere the lossy string form is used.
    pub(crate) fn path_field(&mut self, path: &Path) -> &mut Self {
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            self.field(path.as_os_str().as_bytes())
        }
        #[cfg(not(unix))]
        {
            self.field(path.to_string_lossy().as_bytes())
        }
    }

    /// Base64-encoded SHA-256 of everything hashed so far.
    pub(crate) fn finish(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.inner.clone().finalize())
    }
}
