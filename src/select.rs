//! Selection of the files that make up a fingerprint.
//!
//! Each input root is walked recursively. The entries of every directory are
//! sorted by name before descending, so the resulting order depends only on
//! the set of files present and never on the order the OS hands them out.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl SelectError {
    fn from_io(e: std::io::Error, path: &Path) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            SelectError::PermissionDenied(path.to_path_buf())
        } else {
            SelectError::Io(e)
        }
    }
}

/// A file chosen for digesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file, the input root joined with `relative_path`.
    pub path: PathBuf,
    /// Path relative to the input root the file was found under.
    pub relative_path: PathBuf,
}

/// Lists the files under `roots` whose names end in `.` followed by one of
/// `extensions`.
///
/// Roots are visited in the order given; files within a root are ordered
/// depth-first with siblings sorted by name. Matching is an exact,
/// case-sensitive suffix comparison on the file name.
///
/// Roots that do not exist contribute no files. So does a root that is not
/// a directory. Symlinks to files are selected; symlinks to directories are
/// not followed.
pub fn select_files<P: AsRef<Path>>(
    roots: &[P],
    extensions: &[String],
) -> Result<Vec<FileEntry>, SelectError> {
    let suffixes: Vec<String> = extensions.iter().map(|ext| format!(".{ext}")).collect();
    let mut selected = Vec::new();

    if suffixes.is_empty() {
        debug!("No file extensions configured, selecting nothing");
        return Ok(selected);
    }

    for root in roots {
        let root = root.as_ref();
        let metadata = match std::fs::metadata(root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Input root {} does not exist, skipping", root.display());
                continue;
            }
            Err(e) => return Err(SelectError::from_io(e, root)),
        };

        if !metadata.is_dir() {
            warn!("Input root {} is not a directory, skipping", root.display());
            continue;
        }

        walk_directory(root, Path::new(""), &suffixes, &mut selected)?;
    }

    Ok(selected)
}

fn walk_directory(
    root: &Path,
    relative_dir: &Path,
    suffixes: &[String],
    selected: &mut Vec<FileEntry>,
) -> Result<(), SelectError> {
    let dir = root.join(relative_dir);
    let read_dir = std::fs::read_dir(&dir).map_err(|e| SelectError::from_io(e, &dir))?;

    let mut names = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(SelectError::Io)?;
        names.push(entry.file_name());
    }
    names.sort();

    for name in names {
        let relative_path = relative_dir.join(&name);
        let path = root.join(&relative_path);

        let link_metadata =
            std::fs::symlink_metadata(&path).map_err(|e| SelectError::from_io(e, &path))?;

        if link_metadata.is_dir() {
            walk_directory(root, &relative_path, suffixes, selected)?;
            continue;
        }

        if !matches_extension(&name, suffixes) {
            continue;
        }

        if link_metadata.file_type().is_symlink() {
            match std::fs::metadata(&path) {
                Ok(target) if target.is_file() => {}
                Ok(_) => {
                    debug!("Skipping symlink to non-file {}", path.display());
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Skipping broken symlink {}", path.display());
                    continue;
                }
                Err(e) => return Err(SelectError::from_io(e, &path)),
            }
        } else if !link_metadata.is_file() {
            continue;
        }

        debug!("Selected {}", relative_path.display());
        selected.push(FileEntry {
            path,
            relative_path,
        });
    }

    Ok(())
}

fn matches_extension(name: &OsStr, suffixes: &[String]) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        let name = name.as_bytes();
        suffixes.iter().any(|suffix| name.ends_with(suffix.as_bytes()))
    }
    #[cfg(not(unix))]
    {
        let name = name.to_string_lossy();
        suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}
