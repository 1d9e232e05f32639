use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use fqsync::{MissingPolicy, SyncConfig, Synchronizer};

/// fqsync - (Re-)sync two filtered paired-end FASTQ files
///
/// Given two independently filtered paired-end read files and one of the
/// original read files, keep only the pairs present in both filtered files,
/// in original-file order. Inputs may be plain or gzip compressed; outputs
/// ending in .gz are gzip compressed.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Original (unfiltered) reads: either mate, or interleaved
    #[clap(value_name = "ORIGINAL")]
    original: String,

    /// Filtered reads of the first mate
    #[clap(value_name = "READS_1")]
    reads_1: String,

    /// Filtered reads of the second mate
    #[clap(value_name = "READS_2")]
    reads_2: String,

    /// Output for synced first-mate reads
    #[clap(value_name = "SYNCED_1")]
    synced_1: String,

    /// Output for synced second-mate reads
    #[clap(value_name = "SYNCED_2")]
    synced_2: String,

    /// Filtered reads absent from the original file: "error" or "ignore"
    #[clap(long = "missing", default_value = "error")]
    missing: MissingPolicy,

    /// gzip level for .gz outputs
    #[clap(short = 'z', long = "compression-level", default_value = "6",
           value_parser = clap::value_parser!(u32).range(0..=9))]
    compression_level: u32,

    /// Quiet mode (no summary, errors only)
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
}

fn init_logging(args: &Args) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = SyncConfig {
        missing: args.missing,
        compression_level: args.compression_level,
    };

    let stats = Synchronizer::new(config)
        .run(
            &args.original,
            &args.reads_1,
            &args.reads_2,
            &args.synced_1,
            &args.synced_2,
        )
        .with_context(|| format!("failed to sync {} and {}", args.reads_1, args.reads_2))?;

    if !args.quiet {
        println!("{stats}");
    }

    Ok(())
}
