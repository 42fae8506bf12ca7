//! Command-line front end
//!
//! Descriptor and argument files are read as YAML, which also accepts JSON.
//! Results go to stdout as pretty JSON; logs go to stderr.

pub mod commands;

use crate::error::{Result, ShipError};
use serde::de::DeserializeOwned;
use std::path::Path;

pub use commands::{run_datadir, run_finalize, run_prepare, run_task, RunOptions};

/// File the `run` command writes rewritten arguments to inside the workdir
pub const ARGS_FILE: &str = "bcbio-ship-args.json";

/// Default name of the output tree the task writes inside its workdir
pub const OUTPUT_FILE: &str = "bcbio-ship-output.json";

/// Default name of the persisted finalizer handle inside the workdir
pub const HANDLE_FILE: &str = "bcbio-ship-handle.json";

/// Read a YAML or JSON document from `path`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ShipError::filesystem("read", path, e))?;
    Ok(serde_yaml::from_str(&content)?)
}
