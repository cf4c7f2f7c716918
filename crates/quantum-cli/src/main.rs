//! quantumctl - Command-line client for the quantumd daemon.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use daemon_config_and_utils::init_logging;
use std::path::PathBuf;

/// Control the shared scheduling quantum held by quantumd.
#[derive(Parser)]
#[command(name = "quantumctl")]
#[command(about = "Client for the quantumd control daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Base directory for daemon runtime files (defaults to ~/.quantumd)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Restore the compile-time default quantum
    Reset,

    /// Set the quantum, passing the value by reference
    Set {
        /// New quantum value
        value: i64,
    },

    /// Set the quantum, passing the value directly
    Tell {
        /// New quantum value
        value: i64,
    },

    /// Read the quantum through the argument region
    Get,

    /// Read the quantum as the call result
    Query,

    /// Swap in a new quantum and print the old one (by reference)
    Exchange {
        /// New quantum value
        value: i64,
    },

    /// Swap in a new quantum and print the old one (by value)
    Shift {
        /// New quantum value
        value: i64,
    },

    /// Record this process in the daemon's caller registry
    Identify {
        /// Ask again on the same identity to demonstrate dedup
        #[arg(long, default_value = "1")]
        repeat: u32,
    },

    /// Hammer the daemon from many concurrent callers
    Stress {
        #[command(subcommand)]
        command: StressCommands,
    },
}

#[derive(Subcommand)]
enum StressCommands {
    /// Worker threads sharing this process's thread group
    Threads {
        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        count: usize,
        /// Identify/exchange rounds per worker
        #[arg(short, long, default_value = "2")]
        iterations: usize,
    },
    /// Child processes, each with its own identity
    Procs {
        /// Number of child processes
        #[arg(short, long, default_value = "4")]
        count: usize,
        /// Identify calls per child
        #[arg(short, long, default_value = "2")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    let paths = match commands::resolve_paths(cli.base_dir.clone()) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Reset => commands::reset(&paths, &cli.format).await,
        Commands::Set { value } => commands::set(&paths, value, &cli.format).await,
        Commands::Tell { value } => commands::tell(&paths, value, &cli.format).await,
        Commands::Get => commands::get(&paths, &cli.format).await,
        Commands::Query => commands::query(&paths, &cli.format).await,
        Commands::Exchange { value } => commands::exchange(&paths, value, &cli.format).await,
        Commands::Shift { value } => commands::shift(&paths, value, &cli.format).await,
        Commands::Identify { repeat } => commands::identify(&paths, repeat, &cli.format).await,
        Commands::Stress { command } => match command {
            StressCommands::Threads { count, iterations } => {
                commands::stress_threads(&paths, count, iterations, &cli.format).await
            }
            StressCommands::Procs { count, iterations } => {
                commands::stress_procs(
                    &paths,
                    cli.base_dir.as_deref(),
                    count,
                    iterations,
                    &cli.format,
                )
                .await
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
