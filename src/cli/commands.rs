//! Implementations of the `bcbio-ship` subcommands

use super::{load_document, ARGS_FILE, HANDLE_FILE, OUTPUT_FILE};
use crate::config::StagingConfig;
use crate::reconstitute::{
    prepare_datadir, prepare_workdir_with, Finalizer, PackDescriptor, ParallelDescriptor,
    Reconstitution,
};
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Inputs for `run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pack: PathBuf,
    pub parallel: Option<PathBuf>,
    pub args: PathBuf,
    pub output_name: String,
    pub command: Vec<String>,
}

impl RunOptions {
    pub fn new(pack: PathBuf, args: PathBuf, command: Vec<String>) -> Self {
        Self {
            pack,
            parallel: None,
            args,
            output_name: OUTPUT_FILE.to_string(),
            command,
        }
    }
}

fn load_inputs(
    pack: &Path,
    parallel: Option<&Path>,
    args: &Path,
) -> Result<(PackDescriptor, ParallelDescriptor, Value)> {
    let pack: PackDescriptor = load_document(pack)
        .with_context(|| format!("Failed to load pack descriptor {}", pack.display()))?;
    let parallel: ParallelDescriptor = match parallel {
        Some(path) => load_document(path)
            .with_context(|| format!("Failed to load parallel descriptor {}", path.display()))?,
        None => ParallelDescriptor::default(),
    };
    let args: Value = load_document(args)
        .with_context(|| format!("Failed to load arguments {}", args.display()))?;
    Ok((pack, parallel, args))
}

/// Staging touches the filesystem synchronously; keep it off the runtime threads.
async fn prepare_blocking(
    config: StagingConfig,
    pack: PackDescriptor,
    parallel: ParallelDescriptor,
    args: Value,
) -> Result<Reconstitution> {
    let prepared = tokio::task::spawn_blocking(move || {
        prepare_workdir_with(&config, &pack, &parallel, &args)
    })
    .await
    .context("Preparation task panicked")??;
    Ok(prepared)
}

async fn finalize_blocking(finalizer: Finalizer, output: Option<Value>) -> Result<Option<Value>> {
    let workdir = finalizer.workdir().to_path_buf();
    let shipped = tokio::task::spawn_blocking(move || finalizer.finalize(output))
        .await
        .context("Finalization task panicked")?
        .with_context(|| format!("Failed to finalize {}", workdir.display()))?;
    Ok(shipped)
}

async fn read_output(path: &Path) -> Result<Option<Value>> {
    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Failed to check for output {}", path.display()))?;
    if !exists {
        debug!("No output tree at {}", path.display());
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read output {}", path.display()))?;
    let output = serde_json::from_str(&content)
        .with_context(|| format!("Output {} is not valid JSON", path.display()))?;
    Ok(Some(output))
}

/// `prepare`: stage a task and persist its finalizer handle.
pub async fn run_prepare(
    config: StagingConfig,
    pack: &Path,
    parallel: Option<&Path>,
    args: &Path,
    handle: Option<PathBuf>,
) -> Result<Value> {
    let (pack, parallel, args) = load_inputs(pack, parallel, args)?;
    let prepared = prepare_blocking(config, pack, parallel, args).await?;

    let handle = match handle {
        Some(path) => Some(path),
        None if prepared.finalizer.is_identity() => None,
        None => Some(prepared.workdir.join(HANDLE_FILE)),
    };
    if let Some(path) = &handle {
        prepared
            .finalizer
            .save(path)
            .with_context(|| format!("Failed to write finalizer handle {}", path.display()))?;
        info!("Finalizer handle written to {}", path.display());
    }

    Ok(json!({
        "workdir": prepared.workdir,
        "args": prepared.args,
        "handle": handle,
    }))
}

/// `finalize`: ship outputs back using a saved handle.
pub async fn run_finalize(handle: &Path, output: Option<&Path>) -> Result<Option<Value>> {
    let finalizer = Finalizer::load(handle)
        .with_context(|| format!("Failed to load finalizer handle {}", handle.display()))?;
    let output = match output {
        Some(path) => Some(
            load_document(path)
                .with_context(|| format!("Failed to load output {}", path.display()))?,
        ),
        None => None,
    };
    finalize_blocking(finalizer, output).await
}

/// `run`: prepare, execute a command in the workdir, then finalize.
///
/// The workspace is finalized even when the command fails, so scratch space
/// is reclaimed; the failure is reported afterwards. An output tree that
/// cannot be read leaves the workspace in place, since finalizing without it
/// would delete results that were never shipped back.
pub async fn run_task(config: StagingConfig, opts: RunOptions) -> Result<Option<Value>> {
    let (program, program_args) = opts
        .command
        .split_first()
        .ok_or_else(|| anyhow!("No command given to run"))?;

    let (pack, parallel, args) = load_inputs(&opts.pack, opts.parallel.as_deref(), &opts.args)?;
    let prepared = prepare_blocking(config, pack, parallel, args).await?;

    let args_file = prepared.workdir.join(ARGS_FILE);
    tokio::fs::write(&args_file, serde_json::to_vec_pretty(&prepared.args)?)
        .await
        .with_context(|| format!("Failed to write {}", args_file.display()))?;

    info!("Running {} in {}", opts.command.join(" "), prepared.workdir.display());
    let status = Command::new(program)
        .args(program_args)
        .current_dir(&prepared.workdir)
        .env("BCBIO_SHIP_ARGS", &args_file)
        .env("BCBIO_SHIP_WORKDIR", &prepared.workdir)
        .status()
        .await;

    if let Err(e) = tokio::fs::remove_file(&args_file).await {
        warn!("Could not remove {}: {}", args_file.display(), e);
    }
    let output = read_output(&prepared.workdir.join(&opts.output_name))
        .await
        .with_context(|| {
            format!(
                "Workspace {} kept for recovery",
                prepared.workdir.display()
            )
        })?;
    let shipped = finalize_blocking(prepared.finalizer, output).await?;

    let status = status.with_context(|| format!("Failed to start {program}"))?;
    if !status.success() {
        bail!("Task command exited with {status}");
    }
    Ok(shipped)
}

/// `datadir`: report the reference data directory of a pack.
pub fn run_datadir(pack: &Path) -> Result<PathBuf> {
    let pack: PackDescriptor = load_document(pack)
        .with_context(|| format!("Failed to load pack descriptor {}", pack.display()))?;
    Ok(prepare_datadir(&pack)?)
}
