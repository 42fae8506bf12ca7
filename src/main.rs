use bcbio_ship::cli::{self, RunOptions};
use bcbio_ship::config::StagingConfig;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, error, trace};

/// Stage task inputs into a local workspace and ship results back
#[derive(Parser)]
#[command(name = "bcbio-ship")]
#[command(about = "Reconstitute tasks in a private workdir on top of a shared filesystem", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage inputs into a fresh workdir and print the rewritten arguments
    Prepare {
        /// Pack descriptor (YAML or JSON)
        #[arg(long)]
        pack: PathBuf,
        /// Parallel descriptor (YAML or JSON)
        #[arg(long)]
        parallel: Option<PathBuf>,
        /// Argument tree (YAML or JSON)
        #[arg(long)]
        args: PathBuf,
        /// Where to write the finalizer handle (default: inside the new workdir)
        #[arg(long)]
        handle: Option<PathBuf>,
    },
    /// Ship outputs back to the shared filesystem and remove the workdir
    Finalize {
        /// Finalizer handle written by `prepare`
        #[arg(long)]
        handle: PathBuf,
        /// Output tree produced by the task (YAML or JSON)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Prepare, run a command inside the workdir, then finalize
    Run {
        #[arg(long)]
        pack: PathBuf,
        #[arg(long)]
        parallel: Option<PathBuf>,
        #[arg(long)]
        args: PathBuf,
        /// Output tree file the command writes inside its workdir
        #[arg(long, default_value = cli::OUTPUT_FILE)]
        output_name: String,
        /// Command to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
    /// Print the reference data directory of a pack
    Datadir {
        #[arg(long)]
        pack: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StagingConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.clone().unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level.as_str())
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("bcbio-ship started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match cli.command {
        Commands::Prepare {
            pack,
            parallel,
            args,
            handle,
        } => cli::run_prepare(config, &pack, parallel.as_deref(), &args, handle)
            .await
            .map(|out| print_json(&out)),
        Commands::Finalize { handle, output } => cli::run_finalize(&handle, output.as_deref())
            .await
            .map(|out| print_json(&out.unwrap_or(Value::Null))),
        Commands::Run {
            pack,
            parallel,
            args,
            output_name,
            command,
        } => {
            let opts = RunOptions {
                pack,
                parallel,
                args,
                output_name,
                command,
            };
            cli::run_task(config, opts)
                .await
                .map(|out| print_json(&out.unwrap_or(Value::Null)))
        }
        Commands::Datadir { pack } => {
            cli::run_datadir(&pack).map(|datadir| println!("{}", datadir.display()))
        }
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error: failed to render output: {e}"),
    }
}
