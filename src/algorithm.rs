//! Digest algorithm names and their resolution.
//!
//! Algorithm names arrive as free-form strings from configuration or from a
//! task rule (`calculateMD5`). They are normalized, then looked up
//! case-insensitively against the set of digests we can compute.

use sha2::digest::DynDigest;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlgorithmError {
    #[error("Unsupported algorithm: {0}")]
    Unsupported(String),
    #[error("Not a recognized digest: {0:?}")]
    UnrecognizedDigest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    Md2,
    Md5,
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
}

/// Lookup table of accepted names. `SHA` is an alias for `SHA-1`.
const NAMES: &[(&str, Algorithm)] = &[
    ("MD2", Algorithm::Md2),
    ("MD5", Algorithm::Md5),
    ("SHA", Algorithm::Sha1),
    ("SHA-1", Algorithm::Sha1),
    ("SHA-224", Algorithm::Sha224),
    ("SHA-256", Algorithm::Sha256),
    ("SHA-384", Algorithm::Sha384),
    ("SHA-512", Algorithm::Sha512),
    ("SHA-512/224", Algorithm::Sha512_224),
    ("SHA-512/256", Algorithm::Sha512_256),
];

impl Algorithm {
    pub const DEFAULT_NAME: &'static str = "SHA-1";

    /// Resolves a user supplied algorithm name.
    ///
    /// The name is first passed through [`normalize_name`], so `SHA256`,
    /// `sha256` and `SHA-256` all resolve to [`Algorithm::Sha256`].
    pub fn resolve(name: &str) -> Result<Self, AlgorithmError> {
        let normalized = normalize_name(name);
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(&normalized))
            .map(|(_, algorithm)| *algorithm)
            .ok_or_else(|| AlgorithmError::Unsupported(name.to_string()))
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Algorithm::Md2 => "MD2",
            Algorithm::Md5 => "MD5",
            Algorithm::Sha1 => "SHA-1",
            Algorithm::Sha224 => "SHA-224",
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha384 => "SHA-384",
            Algorithm::Sha512 => "SHA-512",
            Algorithm::Sha512_224 => "SHA-512/224",
            Algorithm::Sha512_256 => "SHA-512/256",
        }
    }

    /// Number of hex characters in a digest produced by this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Algorithm::Md2 | Algorithm::Md5 => 32,
            Algorithm::Sha1 => 40,
            Algorithm::Sha224 | Algorithm::Sha512_224 => 56,
            Algorithm::Sha256 | Algorithm::Sha512_256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }

    /// Infers the algorithm family that produced a hex digest from its length.
    ///
    /// Lengths are ambiguous: MD2 and MD5 both produce 32 hex characters and
    /// the result is always reported as MD5. Likewise the truncated SHA-512
    /// variants are reported as SHA-224 and SHA-256.
    pub fn from_hex_digest(code: &str) -> Result<Self, AlgorithmError> {
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AlgorithmError::UnrecognizedDigest(code.to_string()));
        }

        match code.len() {
            32 => Ok(Algorithm::Md5),
            40 => Ok(Algorithm::Sha1),
            56 => Ok(Algorithm::Sha224),
            64 => Ok(Algorithm::Sha256),
            96 => Ok(Algorithm::Sha384),
            128 => Ok(Algorithm::Sha512),
            _ => Err(AlgorithmError::UnrecognizedDigest(code.to_string())),
        }
    }

    /// Creates a fresh accumulator for this algorithm.
    pub(crate) fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            Algorithm::Md2 => Box::new(md2::Md2::default()),
            Algorithm::Md5 => Box::new(md5::Md5::default()),
            Algorithm::Sha1 => Box::new(sha1::Sha1::default()),
            Algorithm::Sha224 => Box::new(sha2::Sha224::default()),
            Algorithm::Sha256 => Box::new(sha2::Sha256::default()),
            Algorithm::Sha384 => Box::new(sha2::Sha384::default()),
            Algorithm::Sha512 => Box::new(sha2::Sha512::default()),
            Algorithm::Sha512_224 => Box::new(sha2::Sha512_224::default()),
            Algorithm::Sha512_256 => Box::new(sha2::Sha512_256::default()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Inserts the separator into `SHA`-family names written without one.
///
/// `SHA256` becomes `SHA-256` and `sha512/256` becomes `sha-512/256`. The
/// `SHA` prefix is matched case-insensitively and its original casing is
/// kept. Any other name, including a bare `SHA`, is returned unchanged.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    match (name.get(..3), name.get(3..)) {
        (Some(prefix), Some(rest))
            if prefix.eq_ignore_ascii_case("sha") && !rest.is_empty() && !rest.starts_with('-') =>
        {
            Cow::Owned(format!("{prefix}-{rest}"))
        }
        _ => Cow::Borrowed(name),
    }
}
