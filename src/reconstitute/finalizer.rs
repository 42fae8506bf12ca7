//! Ship task outputs back to the shared filesystem and drop the workspace

use super::ParallelDescriptor;
use crate::error::{Result, ShipError};
use crate::remap::RemapTable;
use crate::stage::{Stager, SIDECAR_EXTENSIONS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn default_extensions() -> Vec<String> {
    SIDECAR_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Everything needed to undo one preparation.
///
/// `finalize` takes the handle by value, so a preparation can only be
/// finalized once. The handle is serializable for when the task runs in a
/// different process from the one that prepared it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finalizer {
    args: Value,
    workdir: PathBuf,
    remap: RemapTable,
    /// Kept for inspection only. The return pass copies every output and does
    /// not apply the partition's resource filter.
    parallel: ParallelDescriptor,
    #[serde(default = "default_extensions")]
    sidecar_extensions: Vec<String>,
}

impl Finalizer {
    pub(crate) fn new(
        args: Value,
        workdir: PathBuf,
        remap: RemapTable,
        parallel: ParallelDescriptor,
        sidecar_extensions: Vec<String>,
    ) -> Self {
        Self {
            args,
            workdir,
            remap,
            parallel,
            sidecar_extensions,
        }
    }

    /// A finalizer for a task that ran in place: finalizing is a no-op.
    pub fn identity(args: Value, workdir: PathBuf, parallel: ParallelDescriptor) -> Self {
        Self::new(
            args,
            workdir,
            RemapTable::new(),
            parallel,
            default_extensions(),
        )
    }

    pub fn is_identity(&self) -> bool {
        self.remap.is_empty()
    }

    /// The rewritten arguments the task was given
    pub fn args(&self) -> &Value {
        &self.args
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn remap(&self) -> &RemapTable {
        &self.remap
    }

    pub fn parallel(&self) -> &ParallelDescriptor {
        &self.parallel
    }

    /// Copy outputs back through the inverted table and remove the workspace.
    ///
    /// Returns the output tree with paths pointing at the shared filesystem.
    /// A missing or null output skips the copy but still removes the
    /// workspace. Every existing output file is copied home regardless of the
    /// partition's declared resources, since the workspace is deleted
    /// afterwards.
    pub fn finalize(self, output: Option<Value>) -> Result<Option<Value>> {
        if self.is_identity() {
            debug!("Nothing staged for {}, returning output as is", self.workdir.display());
            return Ok(output);
        }

        let inverted = self.remap.inverted();
        let shipped = match output {
            Some(out) if !out.is_null() => {
                let everything = ParallelDescriptor::default();
                let mut stager = Stager::new(&inverted, &everything)
                    .with_extensions(self.sidecar_extensions.iter().cloned());
                let shipped = stager.stage_tree(&out)?;
                info!(
                    "Shipped {} file(s) and {} sidecar(s) back from {}",
                    stager.stats().files_staged,
                    stager.stats().sidecars_staged,
                    self.workdir.display()
                );
                Some(shipped)
            }
            _ => None,
        };

        if self.workdir.exists() {
            fs::remove_dir_all(&self.workdir)
                .map_err(|e| ShipError::filesystem("remove", &self.workdir, e))?;
            debug!("Removed workspace {}", self.workdir.display());
        } else {
            warn!("Workspace {} already removed", self.workdir.display());
        }

        Ok(shipped)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ShipError::filesystem("write", path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ShipError::filesystem("read", path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
