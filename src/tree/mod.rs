//! Walk an argument tree and rewrite the path-like string leaves.
//!
//! Argument trees are plain `serde_json::Value`s: objects, arrays and
//! scalars. The walker visits each string leaf that a [`PathDetector`]
//! accepts, hands it to a callback together with the [`Context`] of mapping
//! keys leading to it, and builds a new tree from the callback's answers.
//! Everything else is cloned through untouched.

use crate::error::Result;
use crate::remap::paths::is_under;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};


/// Mapping keys from the tree root down to a leaf.
///
/// Array positions do not contribute a key, so every element of a list
/// stored under `"files"` shares the context `["files"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context(Vec<String>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Elementwise prefix match against `prefix`.
    pub fn starts_with<S: AsRef<str>>(&self, prefix: &[S]) -> bool {
        prefix.len() <= self.0.len()
            && self.0.iter().zip(prefix).all(|(key, want)| {
                let want: &str = want.as_ref();
                key == want
            })
    }

    fn push(&mut self, key: &str) {
        self.0.push(key.to_string());
    }

    fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Decides which string leaves are filesystem paths.
pub trait PathDetector {
    fn is_path_like(&self, leaf: &str) -> bool;
}

/// Default detector: absolute paths that exist on disk, or that sit under one
/// of a set of known directories even if they have not been produced yet.
#[derive(Debug, Clone, Default)]
pub struct PathLike {
    known_dirs: Vec<PathBuf>,
}

impl PathLike {
    /// Only paths that already exist are path-like.
    pub fn existing() -> Self {
        Self::default()
    }

    /// Existing paths plus anything under `dirs`.
    pub fn under<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            known_dirs: dirs.into_iter().map(|d| d.as_ref().to_path_buf()).collect(),
        }
    }
}

impl PathDetector for PathLike {
    fn is_path_like(&self, leaf: &str) -> bool {
        if leaf.is_empty() {
            return false;
        }
        let path = Path::new(leaf);
        if !path.is_absolute() {
            return false;
        }
        path.exists() || self.known_dirs.iter().any(|dir| is_under(path, dir))
    }
}

impl<F> PathDetector for F
where
    F: Fn(&str) -> bool,
{
    fn is_path_like(&self, leaf: &str) -> bool {
        self(leaf)
    }
}

/// Rebuild `tree`, replacing each path-like leaf with `f(leaf, context)`.
///
/// Leaves are visited depth-first; object entries in key order, arrays by
/// index. The first callback error stops the walk.
pub fn walk_files<D, F>(tree: &Value, detector: &D, mut f: F) -> Result<Value>
where
    D: PathDetector + ?Sized,
    F: FnMut(&str, &Context) -> Result<String>,
{
    let mut context = Context::new();
    walk_value(tree, detector, &mut context, &mut f)
}

fn walk_value<D, F>(value: &Value, detector: &D, context: &mut Context, f: &mut F) -> Result<Value>
where
    D: PathDetector + ?Sized,
    F: FnMut(&str, &Context) -> Result<String>,
{
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                context.push(key);
                let walked = walk_value(child, detector, context, f);
                context.pop();
                out.insert(key.clone(), walked?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| walk_value(item, detector, context, f))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::String(leaf) if detector.is_path_like(leaf) => Ok(Value::String(f(leaf, context)?)),
        other => Ok(other.clone()),
    }
}

/// Visit path-like leaves without building a new tree.
pub fn visit_files<D, F>(tree: &Value, detector: &D, mut f: F) -> Result<()>
where
    D: PathDetector + ?Sized,
    F: FnMut(&str, &Context) -> Result<()>,
{
    walk_files(tree, detector, |leaf, context| {
        f(leaf, context)?;
        Ok(leaf.to_string())
    })
    .map(|_| ())
}
