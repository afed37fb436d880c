//! OxiGz CLI - random access to multi-member GZIP files
//!
//! Inspect members, read arbitrary ranges of the uncompressed stream, and
//! extract whole files without external tools.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{cmd_cat, cmd_extract, cmd_info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxigz")]
#[command(author, version, about = "Random-access reader for multi-member GZIP files")]
#[command(long_about = "
OxiGz indexes every member of a GZIP file and reads the concatenated
uncompressed data at any offset.

Examples:
  oxigz info logs.gz
  oxigz info --json logs.gz
  oxigz cat --offset 1048576 --length 4096 logs.gz
  oxigz extract -o out/ logs.gz
")]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Codepage for member names and comments (e.g. latin1, utf-8, shift_jis)
    #[arg(short, long, global = true)]
    codepage: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show members and sizes of a GZIP file
    #[command(alias = "i")]
    Info {
        /// GZIP file to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Write a range of the uncompressed stream to stdout
    Cat {
        /// GZIP file to read
        file: PathBuf,

        /// Logical offset to start at
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Number of bytes to write (default: to the end)
        #[arg(long)]
        length: Option<u64>,
    },

    /// Decompress the whole file
    #[command(alias = "x")]
    Extract {
        /// GZIP file to extract
        file: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let codepage = cli.codepage.as_deref();
    let result = match cli.command {
        Commands::Info { file, json } => cmd_info(&file, codepage, json),
        Commands::Cat {
            file,
            offset,
            length,
        } => cmd_cat(&file, codepage, offset, length),
        Commands::Extract {
            file,
            output,
            progress,
        } => cmd_extract(&file, &output, codepage, progress),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
