use crate::algorithm::{Algorithm, AlgorithmError};
use crate::config::FingerprintConfig;
use crate::digest::{DigestError, DigestResult, digest_files};
use crate::select::{SelectError, select_files};
use crate::util::hashing::CanonicalHasher;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{0}")]
    UnsupportedAlgorithm(#[from] AlgorithmError),
    #[error("Failed to read inputs: {0}")]
    InputReadFailure(#[from] InputError),
    #[error("Failed to write {path}: {source}")]
    OutputWriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TaskError {
    /// Short name of the failure kind, for reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::UnsupportedAlgorithm(_) => "UnsupportedAlgorithm",
            TaskError::InputReadFailure(_) => "InputReadFailure",
            TaskError::OutputWriteFailure { .. } => "OutputWriteFailure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error("Cannot stat {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One unit of work: a set of input roots digested into one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintTarget {
    /// Used to identify the target in logs and error reports.
    pub name: String,
    pub input_roots: Vec<PathBuf>,
    pub output_path: PathBuf,
}

/// A matched input file as seen at declaration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub size: u64,
    /// Modification time in nanoseconds since Unix epoch.
    pub mtime_nanos: u64,
    /// Hex encoded SHA-256 of the file content.
    pub sha256: String,
}

/// Everything a task execution depends on and produces.
///
/// A host decides whether a target is up to date by comparing the
/// [`TaskInputs::fingerprint`] recorded after the last successful run with
/// the current one, and by checking that [`TaskInputs::outputs`] still exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInputs {
    pub algorithm: Algorithm,
    pub extensions: Vec<String>,
    pub files: Vec<InputFile>,
    pub output_path: PathBuf,
}

impl TaskInputs {
    pub fn outputs(&self) -> Vec<PathBuf> {
        vec![self.output_path.clone()]
    }

    /// A stable identifier for this exact set of declared inputs.
    ///
    /// This is currently a Base64-encoded SHA-256 but it could change
    /// in the future.
    pub fn fingerprint(&self) -> String {
        let mut hasher = CanonicalHasher::new();
        hasher.str_field(self.algorithm.canonical_name());

        hasher.u64_field(self.extensions.len() as u64);
        for extension in &self.extensions {
            hasher.str_field(extension);
        }

        hasher.u64_field(self.files.len() as u64);
        for file in &self.files {
            hasher
                .path_field(&file.path)
                .u64_field(file.size)
                .u64_field(file.mtime_nanos)
                .str_field(&file.sha256);
        }

        hasher.path_field(&self.output_path);
        hasher.finish()
    }
}

pub struct FingerprintTask<'a> {
    target: &'a FingerprintTarget,
    algorithm: &'a str,
    extensions: &'a [String],
}

impl<'a> FingerprintTask<'a> {
    pub fn new(target: &'a FingerprintTarget, config: &'a FingerprintConfig) -> Self {
        FingerprintTask {
            target,
            algorithm: &config.algorithm,
            extensions: &config.file_extensions,
        }
    }

    /// Uses `algorithm` instead of the configured one for this task only.
    pub fn with_algorithm(mut self, algorithm: &'a str) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Collects the inputs this task would consume, without digesting or
    /// writing anything.
    pub fn declared_inputs(&self) -> Result<TaskInputs, TaskError> {
        let algorithm = Algorithm::resolve(self.algorithm)?;
        let selected =
            select_files(&self.target.input_roots, self.extensions).map_err(InputError::from)?;

        let mut files = Vec::with_capacity(selected.len());
        for entry in selected {
            let metadata_error = |source: std::io::Error| InputError::Metadata {
                path: entry.path.clone(),
                source,
            };
            let metadata = std::fs::metadata(&entry.path).map_err(metadata_error)?;
            let mtime_nanos = mtime_nanos(&metadata).map_err(metadata_error)?;

            // Timestamps can be preserved across edits (cp -p, touch -r), so
            // the content itself is part of the declared inputs.
            let content = digest_files(std::slice::from_ref(&entry), Algorithm::Sha256)
                .map_err(InputError::from)?;

            files.push(InputFile {
                path: entry.path,
                size: metadata.len(),
                mtime_nanos,
                sha256: content.hex_digest,
            });
        }

        Ok(TaskInputs {
            algorithm,
            extensions: self.extensions.to_vec(),
            files,
            output_path: self.target.output_path.clone(),
        })
    }

    /// Digests the target's inputs and writes the hex digest to its output.
    ///
    /// # Behavior
    /// - The algorithm is resolved before any file is touched
    /// - The digest is computed completely before the output is opened
    /// - Missing parent directories of the output are created
    /// - The output is replaced atomically, so it either holds the previous
    ///   content or the complete new digest
    ///
    /// # Errors
    /// - `TaskError::UnsupportedAlgorithm`: the algorithm name did not resolve
    /// - `TaskError::InputReadFailure`: an input could not be listed or read
    /// - `TaskError::OutputWriteFailure`: the output could not be written
    pub fn execute(&self) -> Result<DigestResult, TaskError> {
        let algorithm = Algorithm::resolve(self.algorithm)?;

        let files =
            select_files(&self.target.input_roots, self.extensions).map_err(InputError::from)?;
        debug!(
            "Target {} selected {} files",
            self.target.name,
            files.len()
        );

        let result = digest_files(&files, algorithm).map_err(InputError::from)?;

        write_output(&self.target.output_path, &result.hex_digest)?;

        info!(
            "Wrote {} digest of {} files to {}",
            algorithm,
            files.len(),
            self.target.output_path.display()
        );

        Ok(result)
    }
}

fn mtime_nanos(metadata: &std::fs::Metadata) -> Result<u64, std::io::Error> {
    let since_epoch = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map_err(std::io::Error::other)?;
    u64::try_from(since_epoch.as_nanos()).map_err(std::io::Error::other)
}

/// Writes `content` to `path` atomically.
///
/// Writes to a temporary file next to `path`, fsyncs it, then renames it
/// into place.
fn write_output(path: &Path, content: &str) -> Result<(), TaskError> {
    let write_failure = |source: std::io::Error| TaskError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(write_failure)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(write_failure)?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(write_failure)?;
    temp_file.as_file().sync_all().map_err(write_failure)?;
    temp_file.persist(path).map_err(|e| write_failure(e.error))?;

    Ok(())
}
