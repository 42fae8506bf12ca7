//! Lexical path helpers shared by the remap table and the tree walker.
//!
//! Nothing here touches the filesystem: normalization collapses `.` and `..`
//! components without resolving symlinks, and prefix checks compare whole
//! components so `/data/run1` is never treated as a parent of `/data/run12`.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components and redundant separators.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                let _ = out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Normalized parent directory of a file path.
pub fn parent_dir(path: &Path) -> PathBuf {
    normalize_path(path.parent().unwrap_or(path))
}

/// True when `path` is `dir` itself or lies beneath it.
pub fn is_under(path: &Path, dir: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(dir))
}

/// Number of components in the normalized form of `path`.
pub fn depth(path: &Path) -> usize {
    normalize_path(path).components().count()
}

/// Append `ext` to the final component without treating it as an extension
/// replacement (`in.bam` + `.bai` is `in.bam.bai`, not `in.bai`).
pub fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    if ext.is_empty() {
        return path.to_path_buf();
    }
    let mut s = path.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}
