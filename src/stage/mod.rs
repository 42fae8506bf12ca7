//! Copy referenced files between the shared filesystem and a workspace
//!
//! The stager rewrites one path at a time against a [`RemapTable`] and, when
//! the file exists and the partition needs it, copies it together with its
//! index sidecars. The same stager runs in both directions: forward with the
//! table built for a new workspace, backward with its inverse when results
//! are shipped home.
//!
//! Destinations are never overwritten. A second staging pass over the same
//! workspace does no extra copying, but a truncated copy left by an aborted
//! run is not refreshed either.

use crate::error::{Result, ShipError};
use crate::reconstitute::ParallelDescriptor;
use crate::remap::paths::with_suffix;
use crate::remap::RemapTable;
use crate::resources::is_required_resource;
use crate::tree::{walk_files, Context, PathLike};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, trace};


/// Suffixes copied alongside a staged file. The empty suffix is the file itself.
pub const SIDECAR_EXTENSIONS: &[&str] = &["", ".idx", ".gbi", ".tbi", ".bai"];

/// Counters for one staging pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub files_staged: usize,
    pub sidecars_staged: usize,
    pub skipped_existing: usize,
    pub excluded: usize,
    /// Directories that did not exist before this pass
    pub directories_created: usize,
}

pub struct Stager<'a> {
    table: &'a RemapTable,
    parallel: &'a ParallelDescriptor,
    extensions: Vec<String>,
    stats: StageStats,
}

impl<'a> Stager<'a> {
    pub fn new(table: &'a RemapTable, parallel: &'a ParallelDescriptor) -> Self {
        Self {
            table,
            parallel,
            extensions: SIDECAR_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            stats: StageStats::default(),
        }
    }

    /// Replace the sidecar suffixes. The base file is always copied.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut exts = vec![String::new()];
        for ext in extensions {
            let ext = ext.into();
            if !exts.contains(&ext) {
                exts.push(ext);
            }
        }
        self.extensions = exts;
        self
    }

    pub fn stats(&self) -> &StageStats {
        &self.stats
    }

    /// Rewrite `path` through the table, copying it into place if needed.
    ///
    /// Missing paths are rewritten without touching the filesystem so that
    /// outputs can be declared before they exist.
    pub fn stage(&mut self, path: &str, context: &Context) -> Result<String> {
        let source = Path::new(path);
        let target = self.table.remap(source);
        if target == source {
            trace!("No remap for {} ({})", path, context);
            return Ok(path.to_string());
        }

        if source.is_file() {
            if is_required_resource(context, self.parallel) {
                info!("Staging {}: {}", context, path);
                self.copy_with_sidecars(source, &target)?;
            } else {
                info!("Not required {}: {}", context, path);
                self.stats.excluded += 1;
            }
        } else if source.is_dir() && !target.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| ShipError::filesystem("create directory", &target, e))?;
            self.stats.directories_created += 1;
        }

        Ok(target.to_string_lossy().into_owned())
    }

    /// Stage every path-like leaf of `tree`, returning the rewritten tree.
    ///
    /// Leaves under a table source count as paths even if they do not exist.
    pub fn stage_tree(&mut self, tree: &Value) -> Result<Value> {
        let detector = PathLike::under(self.table.sources());
        let staged = walk_files(tree, &detector, |leaf, context| self.stage(leaf, context))?;
        debug!("Staging pass complete: {:?}", self.stats);
        Ok(staged)
    }

    fn copy_with_sidecars(&mut self, source: &Path, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ShipError::filesystem("create directory", parent, e))?;
        }

        for ext in &self.extensions {
            let from = with_suffix(source, ext);
            if !from.is_file() {
                continue;
            }
            let to = with_suffix(target, ext);
            if to.exists() {
                trace!("Keeping existing {}", to.display());
                self.stats.skipped_existing += 1;
                continue;
            }
            fs::copy(&from, &to).map_err(|e| ShipError::filesystem("copy", &from, e))?;
            if ext.is_empty() {
                self.stats.files_staged += 1;
            } else {
                self.stats.sidecars_staged += 1;
            }
        }
        Ok(())
    }
}
