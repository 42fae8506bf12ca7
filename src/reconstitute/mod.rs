//! Reconstitute a task in a private workspace
//!
//! [`prepare_workdir`] takes the task's pack and parallel descriptors plus
//! its argument tree and, when a scratch directory is configured, builds a
//! fresh workspace under it, copies in the files the task needs, and rewrites
//! the arguments to point at the copies. The returned [`Finalizer`] reverses
//! the mapping once the task is done.
//!
//! Only the shared-filesystem strategy exists. Other pack types fail with a
//! configuration error rather than falling back to running in place.

pub mod descriptor;
pub mod finalizer;

#[cfg(test)]
mod tests;

pub use descriptor::{PackDescriptor, PackKind, ParallelDescriptor};
pub use finalizer::Finalizer;

use crate::config::StagingConfig;
use crate::error::{Result, ShipError};
use crate::remap::build_remap_table;
use crate::stage::{StageStats, Stager};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Result of preparing a task
#[derive(Debug)]
pub struct Reconstitution {
    /// Directory the task should run in
    pub workdir: PathBuf,
    /// Arguments with paths pointing into `workdir`
    pub args: Value,
    pub finalizer: Finalizer,
    pub stats: StageStats,
}

/// Prepare `args` for running under `pack`, with default staging settings.
pub fn prepare_workdir(
    pack: &PackDescriptor,
    parallel: &ParallelDescriptor,
    args: &Value,
) -> Result<Reconstitution> {
    prepare_workdir_with(&StagingConfig::default(), pack, parallel, args)
}

pub fn prepare_workdir_with(
    config: &StagingConfig,
    pack: &PackDescriptor,
    parallel: &ParallelDescriptor,
    args: &Value,
) -> Result<Reconstitution> {
    if let PackKind::Other(kind) = &pack.kind {
        return Err(ShipError::Configuration(format!(
            "Currently only handle shared filesystems, got pack type '{kind}'"
        )));
    }
    let workdir = pack.workdir.clone().ok_or_else(|| {
        ShipError::Configuration("Shared pack descriptor is missing 'workdir'".to_string())
    })?;

    let Some(tmpdir) = pack.staging_tmpdir() else {
        debug!("No tmpdir set, running in {}", workdir.display());
        return Ok(Reconstitution {
            finalizer: Finalizer::identity(args.clone(), workdir.clone(), parallel.clone()),
            workdir,
            args: args.clone(),
            stats: StageStats::default(),
        });
    };

    let new_workdir = create_workspace(tmpdir, &config.workdir_prefix)?;
    let table = build_remap_table(
        &workdir,
        &new_workdir,
        args,
        config.ignore_keys.as_slice(),
    )?;

    let (new_args, stats) = {
        let mut stager = Stager::new(&table, parallel)
            .with_extensions(config.sidecar_extensions.iter().cloned());
        let new_args = stager.stage_tree(args)?;
        (new_args, stager.stats().clone())
    };

    info!(
        "Prepared {} from {}: {} file(s), {} sidecar(s) staged, {} external dir(s)",
        new_workdir.display(),
        workdir.display(),
        stats.files_staged,
        stats.sidecars_staged,
        table.len() - 1
    );

    let finalizer = Finalizer::new(
        new_args.clone(),
        new_workdir.clone(),
        table,
        parallel.clone(),
        config.sidecar_extensions.clone(),
    );

    Ok(Reconstitution {
        workdir: new_workdir,
        args: new_args,
        finalizer,
        stats,
    })
}

/// The reference data directory for `pack`.
pub fn prepare_datadir(pack: &PackDescriptor) -> Result<PathBuf> {
    pack.datadir.clone().ok_or_else(|| {
        ShipError::Configuration(
            "Pack descriptor has no 'datadir'; unpacking reference data is not supported"
                .to_string(),
        )
    })
}

/// Create `<tmpdir>/<prefix>-<uuid>`, unique across concurrent callers.
fn create_workspace(tmpdir: &Path, prefix: &str) -> Result<PathBuf> {
    let dir = tmpdir.join(format!("{}-{}", prefix, Uuid::new_v4()));
    fs::create_dir_all(&dir).map_err(|e| ShipError::filesystem("create directory", &dir, e))?;
    Ok(dir)
}
