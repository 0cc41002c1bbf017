//! Trellis CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Incremental symbol graph extraction with live patch streaming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to trellis.toml under the root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the graph, watch for changes and stream patches to clients
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Quiet period before a rebuild, in milliseconds
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Build the graph once and print it as JSON
    Index {
        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the patch between two graph files
    Diff {
        /// Previous graph, or a file containing `null`
        previous: PathBuf,
        next: PathBuf,
    },
    /// Apply a patch file to a graph file and print the result
    Merge { base: PathBuf, patch: PathBuf },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "trellis={level},trellis_core={level},trellis_indexer={level},trellis_watcher={level},trellis_server={level}",
            level = log_level
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Repository root: {}", cli.root.display());

    match cli.command {
        Commands::Serve { port, host, debounce_ms } => {
            let mut config = Config::load(&cli.root, cli.config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(ms) = debounce_ms {
                config.watch.debounce_ms = ms;
            }
            commands::serve(cli.root, config).await
        }
        Commands::Index { output } => {
            let config = Config::load(&cli.root, cli.config.as_deref())?;
            commands::index(cli.root, config, output).await
        }
        Commands::Diff { previous, next } => commands::diff(&previous, &next),
        Commands::Merge { base, patch } => commands::merge(&base, &patch),
        Commands::Version => {
            println!("Trellis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
