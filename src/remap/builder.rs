//! Build the remap table for a fresh workspace.

use super::paths::parent_dir;
use super::table::RemapTable;
use crate::error::{Result, ShipError};
use crate::tree::{visit_files, PathLike};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Subdirectory of the new workdir holding files from outside the shared workdir.
pub const EXTERNAL_DIR: &str = "external";

/// Derive the remap table for staging `args` from `shared_workdir` into
/// `new_workdir`.
///
/// The table starts as `shared_workdir -> new_workdir`. Every existing path in
/// `args` that no entry covers adds its parent directory, mapped to a newly
/// created `new_workdir/external/<N>` where `N` is the table size at that
/// point. Leaves with an empty context, or whose first context key is in
/// `ignore_keys`, never add entries.
pub fn build_remap_table<S: AsRef<str>>(
    shared_workdir: &Path,
    new_workdir: &Path,
    args: &Value,
    ignore_keys: &[S],
) -> Result<RemapTable> {
    let mut table = RemapTable::seeded(shared_workdir, new_workdir);

    visit_files(args, &PathLike::existing(), |leaf, context| {
        let path = Path::new(leaf);
        if table.covers(path) {
            return Ok(());
        }
        let ignored = match context.first() {
            None => true,
            Some(first) => ignore_keys.iter().any(|k| {
                let key: &str = k.as_ref();
                key == first
            }),
        };
        if ignored {
            return Ok(());
        }

        let source = parent_dir(path);
        let destination = new_workdir
            .join(EXTERNAL_DIR)
            .join(table.len().to_string());
        fs::create_dir_all(&destination)
            .map_err(|e| ShipError::filesystem("create directory", &destination, e))?;
        debug!(
            "Remapping external directory {} -> {} (from {})",
            source.display(),
            destination.display(),
            context
        );
        table.insert(source, destination);
        Ok(())
    })?;

    Ok(table)
}
