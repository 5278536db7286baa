//! Copy a checked-out subtree into an archive workspace
//!
//! Symlinks are split in two kinds. A safe link is relative and stays inside
//! the copied subtree; it is recreated as a link. Any other link is unsafe and
//! is replaced by a copy of whatever it points to, so the archive never
//! depends on files outside itself.
//!
//! Absolute links and links climbing out of the subtree are unsafe, wherever
//! they point. A dangling unsafe link fails the build with
//! [`StoreError::UnsafeSymlinkBroken`]; a dangling safe link is kept as is.

use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Counters reported after a sync
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Regular files copied
    pub files: usize,
    /// Safe symlinks preserved as links
    pub links: usize,
    /// Unsafe symlinks replaced by copies of their referent
    pub materialized: usize,
}

/// What a walked entry is, without following links
enum EntryKind {
    Directory,
    File,
    Symlink,
    Other,
}

impl EntryKind {
    fn of(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Whether a link at `link_rel` (relative to the subtree root) pointing at
/// `target` stays inside the subtree.
pub(crate) fn is_safe_link(link_rel: &Path, target: &Path) -> bool {
    // Depth of the directory holding the link
    let mut depth = link_rel.components().count() as isize - 1;
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    target.components().next().is_some()
}

fn io_err(action: &str, path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let context = format!("{} {}", action, path.display());
    move |e| StoreError::io(context, e)
}

/// Copy the tree at `source` into the existing, empty directory `dest`.
pub fn sync_tree(source: &Path, dest: &Path) -> StoreResult<SyncStats> {
    let mut stats = SyncStats::default();

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            StoreError::io(format!("walking {}", path.display()), e.into())
        })?;
        let path = entry.path();
        let rel = path
            .strip_prefix(source)
            .map_err(|_| StoreError::path_invalid(path, "outside copied tree"))?;
        let target = dest.join(rel);

        match EntryKind::of(entry.file_type()) {
            EntryKind::Directory => {
                fs::create_dir(&target).map_err(io_err("creating", &target))?;
            }
            EntryKind::File => {
                fs::copy(path, &target).map_err(io_err("copying", path))?;
                stats.files += 1;
            }
            EntryKind::Symlink => {
                let link_target = fs::read_link(path).map_err(io_err("reading symlink", path))?;
                if is_safe_link(rel, &link_target) {
                    symlink(&link_target, &target).map_err(io_err("creating symlink", &target))?;
                    stats.links += 1;
                } else {
                    materialize(path, rel, &link_target, &target, &mut stats)?;
                    stats.materialized += 1;
                }
            }
            EntryKind::Other => {
                warn!("Skipping special file {}", rel.display());
            }
        }
    }

    debug!(
        "Synced {} file(s), {} link(s), {} materialized link(s)",
        stats.files, stats.links, stats.materialized
    );
    Ok(stats)
}

/// Resolve a link that is about to be dereferenced
fn resolve_referent(link: &Path, link_rel: &Path, link_target: &Path) -> StoreResult<PathBuf> {
    match fs::canonicalize(link) {
        Ok(referent) => Ok(referent),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::UnsafeSymlinkBroken {
            link: link_rel.to_path_buf(),
            target: link_target.to_path_buf(),
        }),
        Err(e) => Err(StoreError::io(format!("resolving {}", link.display()), e)),
    }
}

/// Replace the unsafe link at `link` by a real copy of its referent at `target`
fn materialize(
    link: &Path,
    link_rel: &Path,
    link_target: &Path,
    target: &Path,
    stats: &mut SyncStats,
) -> StoreResult<()> {
    let referent = resolve_referent(link, link_rel, link_target)?;
    debug!(
        "Materializing {} -> {}",
        link_rel.display(),
        link_target.display()
    );

    if !referent.is_dir() {
        fs::copy(&referent, target).map_err(io_err("copying", &referent))?;
        stats.files += 1;
        return Ok(());
    }

    // Everything below a materialized directory is dereferenced as well
    for entry in WalkDir::new(&referent).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(&referent).to_path_buf();
            let dangling = e
                .io_error()
                .is_some_and(|io| io.kind() == io::ErrorKind::NotFound);
            if dangling {
                StoreError::UnsafeSymlinkBroken {
                    target: fs::read_link(&path).unwrap_or_default(),
                    link: path,
                }
            } else {
                StoreError::io(format!("walking {}", path.display()), e.into())
            }
        })?;
        let path = entry.path();
        if entry.path_is_symlink() {
            let nested_target = fs::read_link(path).map_err(io_err("reading symlink", path))?;
            resolve_referent(path, path, &nested_target)?;
        }

        let rel = path
            .strip_prefix(&referent)
            .map_err(|_| StoreError::path_invalid(path, "outside materialized tree"))?;
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(io_err("creating", &dest))?;
        } else {
            fs::copy(path, &dest).map_err(io_err("copying", path))?;
            stats.files += 1;
        }
    }
    Ok(())
}
