use hawkeye::{dump, print_info, print_waveform};
use std::{io, path::PathBuf};
use tracing::Level;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 3;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on
    #[arg(short, long, default_value_t = DEFAULT_DEBUG_LEVEL, action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// prints the headers of a HAWKEYE point file
    Info {
        /// The point file (`*_HD.bin` or `*_TD.bin`)
        file: PathBuf,
    },

    /// prints the records of one or more HAWKEYE point files
    Dump {
        /// The point files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// First record to print
        #[arg(short, long, default_value_t = 0)]
        start: i64,

        /// Number of records to print, all if not given
        #[arg(short, long)]
        count: Option<i64>,
    },

    /// prints the waveforms of the shot a record was derived from
    Waveform {
        /// The point file
        file: PathBuf,

        /// The record number
        record: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .init();

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Info { file } => print_info(&file, &mut out)?,
        Commands::Dump {
            files,
            start,
            count,
        } => dump(&files, start, count, &mut out)?,
        Commands::Waveform { file, record } => print_waveform(&file, record, &mut out)?,
    }
    Ok(())
}
