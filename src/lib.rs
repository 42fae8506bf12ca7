//! # bcbio-ship
//!
//! Reconstitute a task in a private working directory on local scratch space
//! while its inputs and outputs live on a shared filesystem.
//!
//! ## Usage
//!
//! ```no_run
//! use bcbio_ship::reconstitute::{prepare_workdir, PackDescriptor, ParallelDescriptor};
//! use serde_json::json;
//!
//! let pack = PackDescriptor::shared("/shared/run1").with_tmpdir("/scratch");
//! let args = json!({"bam": "/shared/run1/in.bam", "algorithm": {"ref": "hg19"}});
//! let prepared = prepare_workdir(&pack, &ParallelDescriptor::default(), &args)?;
//!
//! // ... run the task in prepared.workdir with prepared.args ...
//! let output = Some(json!({"vcf": prepared.workdir.join("out.vcf")}));
//! let shipped = prepared.finalizer.finalize(output)?;
//! # Ok::<(), bcbio_ship::ShipError>(())
//! ```
//!
//! ## Modules
//!
//! - `tree` - Walk argument trees and rewrite path-like leaves
//! - `remap` - Directory remap table and its construction
//! - `resources` - Per-partition filter for which files get copied
//! - `stage` - Copy files and their index sidecars through a remap table
//! - `reconstitute` - Workspace preparation and the finalizer that undoes it
//! - `config` - Staging settings from TOML and the environment
//! - `cli` - Subcommands behind the `bcbio-ship` binary
pub mod cli;
pub mod config;
pub mod error;
pub mod reconstitute;
pub mod remap;
pub mod resources;
pub mod stage;
pub mod tree;

pub use error::{Result, ShipError};
pub use reconstitute::{
    prepare_datadir, prepare_workdir, prepare_workdir_with, Finalizer, PackDescriptor,
    ParallelDescriptor, Reconstitution,
};
