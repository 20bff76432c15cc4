//! CLI for ksdist: empirical RC4 keystream distributions.

mod commands;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ksdist_core::DEFAULT_KEY_LEN;

#[derive(Parser)]
#[command(name = "ksdist")]
#[command(about = "ksdist: count how often keystream byte i equals j across many random keys")]
#[command(
    after_help = "FILE FORMAT\n\n   cnt[i][j]<TAB>count: number of trials where the i^th keystream byte equals j"
)]
#[command(version = ksdist_core::VERSION)]
struct Cli {
    /// Send progress details to standard error
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run trials and create or extend a distribution
    Compute {
        /// Number of trials: an integer (1024) or a power of two (2^10)
        #[arg(long, value_parser = commands::parse_count)]
        trials: u64,

        /// Distribution file to use as the initial distribution
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write the final distribution here (default: standard output)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Worker threads (default: number of cores)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Base seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Random key length in bytes
        #[arg(long, default_value_t = DEFAULT_KEY_LEN)]
        key_len: usize,

        /// Refuse key lengths the generator self-test does not cover
        #[arg(long)]
        strict_key_len: bool,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Read distributions from two or more files and write their sum
    Merge {
        /// Distribution files to merge
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Write the merged distribution here (default: standard output)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check the keystream generator against its reference vectors
    SelfTest,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compute {
            trials,
            input,
            output,
            concurrency,
            seed,
            key_len,
            strict_key_len,
            summary,
        } => commands::compute::run(commands::compute::ComputeCommandConfig {
            trials,
            input: input.as_deref(),
            output: output.as_deref(),
            concurrency,
            seed,
            key_len,
            strict_key_len,
            summary: summary.as_deref(),
        }),
        Commands::Merge { files, output } => commands::merge::run(&files, output.as_deref()),
        Commands::SelfTest => commands::self_test::run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
