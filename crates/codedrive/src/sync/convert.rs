//! Re-rooting paths from one synced tree into the other.

use std::path::{Component, Path, PathBuf};

use crate::config::SyncRoots;
use crate::error::PathScopeError;

/// Rewrites `path`, which must live under `from_root`, to the same relative
/// location under `to_root`.
///
/// The prefix test is per path component, so `/foo2/x` is not under `/foo`.
/// Suffixes that climb out with `..` are rejected as well.
pub fn convert_path(
    path: &Path,
    from_root: &Path,
    to_root: &Path,
) -> Result<PathBuf, PathScopeError> {
    let suffix = path
        .strip_prefix(from_root)
        .map_err(|_| PathScopeError::new(path, from_root))?;

    if suffix
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(PathScopeError::new(path, from_root));
    }

    let converted = if suffix.as_os_str().is_empty() {
        to_root.to_path_buf()
    } else {
        to_root.join(suffix)
    };

    if !converted.starts_with(to_root) {
        return Err(PathScopeError::new(&converted, to_root));
    }
    Ok(converted)
}

/// Converter bound to one direction of a [`SyncRoots`] pair.
#[derive(Debug, Clone)]
pub struct PathConverter {
    roots: SyncRoots,
}

impl PathConverter {
    pub fn new(roots: SyncRoots) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &SyncRoots {
        &self.roots
    }

    pub fn convert(&self, path: &Path) -> Result<PathBuf, PathScopeError> {
        convert_path(path, &self.roots.from, &self.roots.to)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.roots.reversed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_convert_nested_file() {
        let out = convert_path(
            Path::new("/src/dir/b.txt"),
            Path::new("/src"),
            Path::new("/mirror"),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/mirror/dir/b.txt"));
    }

    #[test]
    fn test_convert_root_itself() {
        let out = convert_path(Path::new("/src"), Path::new("/src"), Path::new("/mirror")).unwrap();
        assert_eq!(out, PathBuf::from("/mirror"));
    }

    #[test]
    fn test_partial_segment_is_out_of_scope() {
        let err = convert_path(
            Path::new("/foo2/file.txt"),
            Path::new("/foo"),
            Path::new("/bar"),
        )
        .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/foo2/file.txt"));
        assert_eq!(err.root, PathBuf::from("/foo"));
    }

    #[test]
    fn test_unrelated_path_is_out_of_scope() {
        assert!(convert_path(
            Path::new("/elsewhere/a.txt"),
            Path::new("/src"),
            Path::new("/mirror")
        )
        .is_err());
    }

    #[test]
    fn test_parent_dir_escape_is_out_of_scope() {
        assert!(convert_path(
            Path::new("/src/../etc/passwd"),
            Path::new("/src"),
            Path::new("/mirror")
        )
        .is_err());
    }

    #[test]
    fn test_converter_reversed() {
        let converter = PathConverter::new(SyncRoots::new("/a", "/b"));
        let forward = converter.convert(Path::new("/a/x/y")).unwrap();
        let back = converter.reversed().convert(&forward).unwrap();
        assert_eq!(back, PathBuf::from("/a/x/y"));
    }

    fn segment() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-][A-Za-z0-9_.-]{0,11}".prop_filter("not a dot segment", |s| {
            s != "." && s != ".."
        })
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            root_a in prop::collection::vec(segment(), 1..4),
            root_b in prop::collection::vec(segment(), 1..4),
            rel in prop::collection::vec(segment(), 0..5),
        ) {
            let root_a: PathBuf = std::iter::once("/".to_string()).chain(root_a).collect();
            let root_b: PathBuf = std::iter::once("/".to_string()).chain(root_b).collect();
            let path = root_a.join(rel.iter().collect::<PathBuf>());

            let there = convert_path(&path, &root_a, &root_b).unwrap();
            prop_assert!(there.starts_with(&root_b));
            let back = convert_path(&there, &root_b, &root_a).unwrap();
            prop_assert_eq!(back, path);
        }

        #[test]
        fn prop_sibling_with_shared_prefix_fails(
            root in segment(),
            extra in "[a-z0-9]{1,4}",
            rel in segment(),
        ) {
            let root_a = PathBuf::from("/").join(&root);
            let sibling = PathBuf::from("/").join(format!("{}{}", root, extra)).join(rel);
            prop_assert!(convert_path(&sibling, &root_a, Path::new("/mirror")).is_err());
        }
    }
}
