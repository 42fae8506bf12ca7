//! Directory prefix remap table

use super::paths::{depth, is_under, normalize_path};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One registered directory mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Ordered mapping from source directories to destination directories.
///
/// Entries keep their insertion order, which is what gives `external/<N>`
/// directories their stable numbering. Paths are rewritten against the
/// longest registered source that contains them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemapTable {
    entries: Vec<RemapEntry>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the single `source -> destination` entry.
    pub fn seeded(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        let mut table = Self::new();
        table.insert(source, destination);
        table
    }

    /// Register a mapping. An already registered source keeps its original
    /// destination and `false` is returned.
    pub fn insert(&mut self, source: impl AsRef<Path>, destination: impl AsRef<Path>) -> bool {
        let source = normalize_path(source.as_ref());
        if self.entries.iter().any(|e| e.source == source) {
            return false;
        }
        self.entries.push(RemapEntry {
            source,
            destination: normalize_path(destination.as_ref()),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemapEntry> {
        self.entries.iter()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.source.as_path())
    }

    /// True when some registered source contains `path`.
    pub fn covers(&self, path: &Path) -> bool {
        self.sources().any(|source| is_under(path, source))
    }

    /// The entry with the deepest source containing `path`.
    pub fn lookup(&self, path: &Path) -> Option<&RemapEntry> {
        self.entries
            .iter()
            .filter(|e| is_under(path, &e.source))
            .max_by_key(|e| depth(&e.source))
    }

    /// Rewrite `path` by prefix substitution. Paths outside every source are
    /// returned unchanged.
    pub fn remap(&self, path: &Path) -> PathBuf {
        let Some(entry) = self.lookup(path) else {
            return path.to_path_buf();
        };
        let normalized = normalize_path(path);
        match normalized.strip_prefix(&entry.source) {
            Ok(rel) if rel.as_os_str().is_empty() => entry.destination.clone(),
            Ok(rel) => entry.destination.join(rel),
            Err(_) => path.to_path_buf(),
        }
    }

    /// Swap sources and destinations, keeping entry order.
    pub fn inverted(&self) -> Self {
        let mut table = Self::new();
        for entry in &self.entries {
            table.insert(&entry.destination, &entry.source);
        }
        table
    }
}
