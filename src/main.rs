//! terragraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use terragraph_core::Direction;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "terragraph")]
#[command(about = "File-level dependency graphs for Terraform repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to terragraph.toml in the root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Parse files in parallel, overriding the config file
    #[arg(long, global = true)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the repository and report counts
    Index,
    /// Print the graph summary as JSON
    Summary,
    /// List the direct neighbors of a file
    Neighbors {
        path: String,

        /// outgoing, incoming or both
        #[arg(short, long, default_value = "outgoing")]
        direction: Direction,
    },
    /// List every file reachable from the seeds
    Expand {
        #[arg(required = true)]
        seeds: Vec<String>,

        /// Maximum number of hops (unbounded when omitted)
        #[arg(long)]
        hops: Option<usize>,

        #[arg(short, long, default_value = "outgoing")]
        direction: Direction,
    },
    /// Write the graph as node and edge lists
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the prompt context for some or all files
    Context { paths: Vec<String> },
    /// Print file texts for an external description generator as JSON
    Describable {
        /// Characters kept per file (config value when omitted)
        #[arg(long)]
        max_chars: Option<usize>,
    },
    /// Write a JSON map of path to new content into the working tree
    Apply {
        changes: PathBuf,

        /// Report the paths without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "7411")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "terragraph={log_level},terragraph_core={log_level},terragraph_indexer={log_level},terragraph_server={log_level}"
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("terragraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Repository root: {}", cli.root.display());

    let session = commands::open_session(&cli.root, cli.config.as_ref(), cli.parallel)?;

    match cli.command {
        Commands::Index => commands::index(session),
        Commands::Summary => commands::summary(session),
        Commands::Neighbors { path, direction } => commands::neighbors(session, &path, direction),
        Commands::Expand { seeds, hops, direction } => commands::expand(session, &seeds, hops, direction),
        Commands::Export { output } => commands::export(session, output),
        Commands::Context { paths } => commands::context(session, &paths),
        Commands::Describable { max_chars } => commands::describable(session, max_chars),
        Commands::Apply { changes, dry_run } => commands::apply(session, &changes, dry_run),
        Commands::Serve { port, host } => commands::serve(session, host, port).await,
    }
}
