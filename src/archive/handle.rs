//! Read-only handle onto a published archive

use crate::archive::{validate_relative_path, ArchiveHash};
use crate::error::{StoreError, StoreResult};
use crate::process::ExternalCommand;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// A published, immutable archive directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    hash: ArchiveHash,
    root: PathBuf,
}

impl Archive {
    /// Handle onto the archive `hash` published at `root`
    pub fn new(hash: ArchiveHash, root: impl Into<PathBuf>) -> Self {
        Self {
            hash,
            root: root.into(),
        }
    }

    /// Content hash identifying the archive
    pub fn hash(&self) -> &ArchiveHash {
        &self.hash
    }

    /// Directory holding the archive
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Read a file of the archive.
    ///
    /// Returns `Ok(None)` if there is no such file; other I/O errors propagate.
    pub async fn file_content(&self, relative_path: &str) -> StoreResult<Option<Vec<u8>>> {
        let normalized = validate_relative_path(relative_path)?;
        if normalized == "." {
            return Err(StoreError::path_invalid(relative_path, "is the archive root"));
        }
        let path = self.root.join(&normalized);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(format!("inspecting {}", path.display()), e)),
        };
        if metadata.is_dir() {
            return Err(StoreError::path_invalid(relative_path, "is a directory"));
        }

        match fs::read(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(format!("reading {}", path.display()), e)),
        }
    }

    /// Run `command` (program and arguments) inside the archive directory and return its stdout
    pub async fn exec_in_directory(&self, command: &[String]) -> StoreResult<String> {
        let (program, args) = command.split_first().ok_or(StoreError::EmptyCommand)?;
        ExternalCommand::new(program)
            .args(args)
            .current_dir(&self.root)
            .output()
            .await
    }

    /// Relative paths of every file and symlink in the archive, sorted
    pub async fn files(&self) -> StoreResult<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Vec<String>> {
            let mut files = Vec::new();
            for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    StoreError::io(format!("listing {}", root.display()), e.into())
                })?;
                if entry.file_type().is_dir() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&root)
                    .map_err(|_| StoreError::path_invalid(entry.path(), "outside archive"))?;
                files.push(
                    rel.components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                );
            }
            Ok(files)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("listing task failed: {e}")))?
    }
}
