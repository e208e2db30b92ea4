//! bubblegrade CLI — grade scanned answer sheets from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "bubblegrade", version, about = "Optical answer sheet grader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade scanned sheets against an exam
    Grade {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,

        /// Scan JSON file or directory of scans
        #[arg(long)]
        scans: PathBuf,

        /// Output directory
        #[arg(long, default_value = "./bubblegrade-results")]
        output: PathBuf,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Print detected options and per-question verdicts
        #[arg(long, short)]
        verbose: bool,
    },

    /// Validate an exam file
    Validate {
        /// Path to the exam .toml file
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create an example exam and scan
    Init,
}

impl Cli {
    /// Log directive used when `RUST_LOG` is unset.
    fn default_log_directive(&self) -> &'static str {
        match self.command {
            Commands::Grade { verbose: true, .. } => "bubblegrade=debug",
            _ => "bubblegrade=info",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_log_directive())),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Grade {
            exam,
            scans,
            output,
            format,
            verbose,
        } => commands::grade::execute(exam, scans, output, format, verbose),
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
