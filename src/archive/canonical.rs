//! Reproducible archive hashing
//!
//! The hash of a tree is the SHA-256 of a GNU tar stream in which everything
//! that depends on who built the tree, or when, is fixed:
//!
//! - entries in depth-first order, siblings sorted by file name, root omitted
//! - mtime 0, uid/gid 0, no user or group names, no extended headers
//! - directories `0755`, files `0755` if any execute bit is set else `0644`,
//!   symlinks `0777` with their target
//!
//! The stream is fed straight into the hasher and never buffered.

use crate::archive::ArchiveHash;
use crate::error::{StoreError, StoreResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path};
use tar::{EntryType, Header};
use walkdir::WalkDir;

/// `io::Write` adapter that hashes everything written to it
struct DigestWriter(Sha256);

impl Write for DigestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn is_executable(metadata: &fs::Metadata) -> bool {
    metadata.permissions().mode() & 0o111 != 0
}

/// Entry name inside the archive, always `/`-separated.
///
/// Non-UTF-8 names are rejected so that distinct names never collide.
fn entry_name(rel: &Path) -> StoreResult<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| StoreError::path_invalid(rel, "file name is not valid UTF-8"))?,
            ),
            _ => return Err(StoreError::path_invalid(rel, "unexpected path component")),
        }
    }
    Ok(parts.join("/"))
}

/// Compute the archive hash of the tree rooted at `root`.
///
/// Symlinks are archived as links and never followed.
pub fn archive_hash(root: &Path) -> StoreResult<ArchiveHash> {
    let tar_err = |e: io::Error| StoreError::io(format!("archiving {}", root.display()), e);

    let mut builder = tar::Builder::new(DigestWriter(Sha256::new()));
    builder.follow_symlinks(false);

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            StoreError::io(format!("walking {}", path.display()), e.into())
        })?;
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|_| StoreError::path_invalid(path, "outside archive root"))?;
        let name = entry_name(rel)?;
        let metadata = entry
            .metadata()
            .map_err(|e| StoreError::io(format!("reading metadata of {}", path.display()), e.into()))?;

        let mut header = Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        let file_type = metadata.file_type();
        if file_type.is_dir() {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder
                .append_data(&mut header, Path::new(&name), io::empty())
                .map_err(tar_err)?;
        } else if file_type.is_file() {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(if is_executable(&metadata) { 0o755 } else { 0o644 });
            header.set_size(metadata.len());
            let file = File::open(path)
                .map_err(|e| StoreError::io(format!("opening {}", path.display()), e))?;
            builder
                .append_data(&mut header, Path::new(&name), file)
                .map_err(tar_err)?;
        } else if file_type.is_symlink() {
            header.set_entry_type(EntryType::Symlink);
            header.set_mode(0o777);
            header.set_size(0);
            let target = fs::read_link(path)
                .map_err(|e| StoreError::io(format!("reading symlink {}", path.display()), e))?;
            builder
                .append_link(&mut header, Path::new(&name), &target)
                .map_err(tar_err)?;
        } else {
            return Err(StoreError::path_invalid(
                path,
                "only files, directories and symlinks can be archived",
            ));
        }
    }

    let writer = builder.into_inner().map_err(tar_err)?;
    Ok(ArchiveHash::from_digest(&writer.0.finalize()))
}
