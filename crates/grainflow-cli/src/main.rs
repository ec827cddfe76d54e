//! Grainflow CLI - Command-line interface for the grainflow engine.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grainflow")]
#[command(author, version, about = "Grainflow node graph and granular engine CLI", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered node kinds and their ports
    Nodes(commands::nodes::NodesArgs),

    /// Render a graph preset to a WAV file
    Graph(commands::graph::GraphArgs),

    /// Granular time-stretch a WAV file
    Stretch(commands::stretch::StretchArgs),

    /// Print or write the engine configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Graph(args) => commands::graph::run(args),
        Commands::Stretch(args) => commands::stretch::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
