//! Whole-file copy and delete primitives.
//!
//! Both operations treat a missing source as a no-op. Neither is
//! transactional: an interrupted directory copy leaves a partial tree.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::FsError;

/// Copies `src` to `dst`, replacing whatever `dst` held.
///
/// Directories are replaced wholesale, not merged.
pub fn copy_path(src: &Path, dst: &Path) -> Result<(), FsError> {
    let metadata = match fs::metadata(src) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Copy skipped, source is gone: {}", src.display());
            return Ok(());
        }
        Err(e) => {
            return Err(FsError::Read {
                path: src.to_path_buf(),
                source: e,
            })
        }
    };

    debug!("Copy {} -> {}", src.display(), dst.display());

    if metadata.is_dir() {
        delete_path(dst)?;
        copy_tree(src, dst)
    } else {
        if let Some(parent) = dst.parent() {
            create_dir_all(parent)?;
        }
        copy_file(src, dst)
    }
}

/// Removes `path` recursively. Missing paths are ignored.
pub fn delete_path(path: &Path) -> Result<(), FsError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(FsError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    debug!("Delete {}", path.display());

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(()),
        // Raced with another remover.
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FsError::Delete {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), FsError> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| FsError::Walk {
            path: src.to_path_buf(),
            source: e,
        })?;

        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), FsError> {
    fs::copy(src, dst).map(|_| ()).map_err(|e| FsError::Copy {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })
}

fn create_dir_all(path: &Path) -> Result<(), FsError> {
    fs::create_dir_all(path).map_err(|e| FsError::CreateDirectory {
        path: path.to_path_buf(),
        source: e,
    })
}
