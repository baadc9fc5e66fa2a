use anyhow::Result;
use clap::{Parser, Subcommand};
use simraw_cli::commands;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "simraw")]
#[command(about = "Simraw - Inspect and recover Simrad RAW datagram files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a file and summarize every recoverable datagram
    Scan {
        /// Input file to scan (`-` for stdin)
        #[arg(short, long)]
        input: String,

        /// Output JSON file for datagram summaries
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },

    /// Check that every datagram is intact
    Verify {
        /// Input file to verify (`-` for stdin)
        #[arg(short, long)]
        input: String,
    },

    /// Print datagram headers without decoding payloads
    Headers {
        /// Input file (`-` for stdin)
        #[arg(short, long)]
        input: String,

        /// Stop after this many datagrams
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the number of datagrams in a file
    Count {
        /// Input file (`-` for stdin)
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG overrides the default level
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Scan {
            input,
            output,
            stats_only,
        } => commands::scan::execute(&input, output.as_deref(), stats_only),

        Commands::Verify { input } => commands::verify::execute(&input),

        Commands::Headers { input, limit } => commands::headers::execute(&input, limit),

        Commands::Count { input } => commands::count::execute(&input),
    }
}
