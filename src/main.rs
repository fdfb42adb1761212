mod app;
mod config;
mod deps;
mod error;
mod git;
mod index;
mod model;
mod output;
mod stanza;
mod tags;
mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::app::CliCommand;
use crate::git::GitRefLister;
use crate::index::HttpIndexSource;

#[derive(Parser)]
#[command(name = "jitsi-release-sync")]
#[command(version, about = "Syncs jitsi package dependencies and release tags into JSON files")]
struct Cli {
    /// JSON config file; built-in jitsi sources are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the JSON reports are written to.
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extracts pinned dependencies of each package version from the package indices.
    Deps,

    /// Classifies remote release tags into stable and unstable reports.
    Tags {
        /// Only sync this tracked project.
        #[arg(long)]
        project: Option<String>,
    },

    /// Runs deps and then tags.
    All,
}

fn main() {
    init_tracing();

    if let Err(error) = run_main() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    let index = HttpIndexSource::new()?;
    let refs = GitRefLister::new();

    let command = match cli.command {
        Commands::Deps => CliCommand::Deps,
        Commands::Tags { project } => CliCommand::Tags { project },
        Commands::All => CliCommand::All,
    };

    app::run(&index, &refs, &config, &cli.out_dir, command)
}
