use crate::algorithm::Algorithm;
use crate::select::FileEntry;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl DigestError {
    fn from_io(e: std::io::Error, path: &Path) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            DigestError::PermissionDenied(path.to_path_buf())
        } else {
            DigestError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    pub algorithm: Algorithm,
    /// Lower case hex encoded.
    pub hex_digest: String,
}

/// Computes a single digest over the concatenated contents of `files`.
///
/// # Behavior
/// - One accumulator is fed every file, in the order given
/// - Files are streamed in chunks, never loaded whole
/// - Nothing is inserted between files, so the result is the digest of the
///   concatenation of their bytes
/// - An empty `files` yields the algorithm's digest of empty input
///
/// # Errors
/// - `DigestError::PermissionDenied`: a file could not be opened or read
/// - `DigestError::Io`: any other I/O error, including a file removed after
///   it was selected
pub fn digest_files(
    files: &[FileEntry],
    algorithm: Algorithm,
) -> Result<DigestResult, DigestError> {
    let mut hasher = algorithm.hasher();
    let mut buffer = [0u8; 8192];

    for entry in files {
        let mut file =
            File::open(&entry.path).map_err(|e| DigestError::from_io(e, &entry.path))?;
        let mut bytes_total = 0u64;

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DigestError::from_io(e, &entry.path)),
            };
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            bytes_total += bytes_read as u64;
        }

        debug!("Digested {} ({} bytes)", entry.path.display(), bytes_total);
    }

    let hex_digest = hex::encode(hasher.finalize());
    debug_assert_eq!(hex_digest.len(), algorithm.hex_len());

    debug!(
        "{} of {} files is {}",
        algorithm,
        files.len(),
        hex_digest
    );

    Ok(DigestResult {
        algorithm,
        hex_digest,
    })
}
