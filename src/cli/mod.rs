use std::path::PathBuf;

use clap::Parser;

/// Archive a directory, or extract a `.df` archive — whichever `path` is.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to archive, or `.df` file to extract.
    pub path: PathBuf,

    /// Override the output location (archive path, or extraction directory).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging (equivalent to `RUST_LOG=debug`).
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse() -> Result<Args, clap::Error> {
    Args::try_parse()
}
