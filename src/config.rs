//! Workspace configuration, read from `hashsum.toml`.
//!
//! The file is optional. Every key has a default, so an absent file means a
//! single root project hashed with SHA-1 over `.kt` and `.java` sources.

use crate::algorithm::Algorithm;
use crate::task::FingerprintTarget;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILENAME: &str = "hashsum.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Settings shared by every target of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintConfig {
    pub algorithm: String,
    /// Extensions without the leading dot.
    pub file_extensions: Vec<String>,
    pub output_file_name: String,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        FingerprintConfig {
            algorithm: Algorithm::DEFAULT_NAME.to_string(),
            file_extensions: vec!["kt".to_string(), "java".to_string()],
            output_file_name: "hash_sum.txt".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    algorithm: Option<String>,
    file_extensions: Option<Vec<String>>,
    output_file_name: Option<String>,
    #[serde(default)]
    projects: Vec<PathBuf>,
}

/// The loaded configuration plus the project layout it describes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceConfig {
    pub fingerprint: FingerprintConfig,
    /// Subproject directories relative to the workspace root.
    pub projects: Vec<PathBuf>,
}

impl WorkspaceConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = FingerprintConfig::default();

        Ok(WorkspaceConfig {
            fingerprint: FingerprintConfig {
                algorithm: raw.algorithm.unwrap_or(defaults.algorithm),
                file_extensions: raw.file_extensions.unwrap_or(defaults.file_extensions),
                output_file_name: raw.output_file_name.unwrap_or(defaults.output_file_name),
            },
            projects: raw.projects,
        })
    }

    /// Loads `hashsum.toml` from `root`, falling back to defaults if absent.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILENAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} in {}, using defaults", CONFIG_FILENAME, root.display());
                Ok(Self::default())
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(ConfigError::PermissionDenied(path))
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// One target per project: the root project first, then each
    /// subproject in configuration order.
    ///
    /// A project at `P` hashes `P/src` into `P/build/<output_file_name>`.
    /// Duplicate projects are listed once.
    pub fn targets(&self, root: &Path) -> Vec<FingerprintTarget> {
        let mut seen: Vec<PathBuf> = Vec::new();
        let mut targets = Vec::new();

        for project in std::iter::once(Path::new(".")).chain(self.projects.iter().map(PathBuf::as_path)) {
            let normalized = normalize_project(project);
            if seen.contains(&normalized) {
                warn!("Project {} listed more than once", project.display());
                continue;
            }

            let dir = root.join(&normalized);
            let name = if normalized.as_os_str().is_empty() {
                ".".to_string()
            } else {
                normalized.display().to_string()
            };

            targets.push(FingerprintTarget {
                name,
                input_roots: vec![dir.join("src")],
                output_path: dir.join("build").join(&self.fingerprint.output_file_name),
            });
            seen.push(normalized);
        }

        targets
    }
}

/// Drops `.` components so `./core`, `core/` and `core` compare equal.
fn normalize_project(project: &Path) -> PathBuf {
    project
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
