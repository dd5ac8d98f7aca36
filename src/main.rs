//! DeCAF command-line driver.
//!
//! Usage: `decaf <path>` — archives `path` if it is a directory, extracts
//! it if it is a `.df` file. See [`cli::Args`] for flags.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use decaf::tree::{FsTreeSink, FsTreeSource};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = match decaf::cli::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    let filter = if args.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let metadata = match std::fs::symlink_metadata(&args.path) {
        Ok(md) => md,
        Err(e) => {
            error!(path = %args.path.display(), error = %e, "failed to stat input path");
            return ExitCode::from(2);
        }
    };

    if metadata.is_dir() {
        run_archive(&args.path, args.output.as_deref())
    } else {
        run_extract(&args.path, args.output.as_deref())
    }
}

fn run_archive(dir: &Path, output: Option<&Path>) -> ExitCode {
    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            PathBuf::from(format!("{name}.df"))
        }
    };

    let source = FsTreeSource::new(dir);
    let bytes = match decaf::archive(&source) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "archive construction failed");
            return ExitCode::from(4);
        }
    };

    if let Err(e) = std::fs::write(&output_path, &bytes) {
        error!(path = %output_path.display(), error = %e, "failed to write archive");
        return ExitCode::from(4);
    }

    info!(path = %output_path.display(), bytes = bytes.len(), "wrote archive");
    ExitCode::SUCCESS
}

fn run_extract(archive_path: &Path, output: Option<&Path>) -> ExitCode {
    let output_dir = match output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = archive_path.file_stem().unwrap_or_default();
            PathBuf::from(stem)
        }
    };

    let bytes = match std::fs::read(archive_path) {
        Ok(b) => b,
        Err(e) => {
            error!(path = %archive_path.display(), error = %e, "failed to read archive");
            return ExitCode::from(5);
        }
    };

    // Extract into a temporary sibling directory and rename it into place
    // once every listing has materialized, so a failed extraction never
    // leaves a half-written output directory behind.
    let staging_parent = output_dir.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let staging = match tempfile::Builder::new().prefix(".decaf-extract-").tempdir_in(staging_parent) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "failed to create staging directory");
            return ExitCode::from(5);
        }
    };

    let mut sink = FsTreeSink::new(staging.path());
    if let Err(e) = decaf::unarchive(&bytes, &mut sink) {
        error!(error = %e, "archive extraction failed");
        return ExitCode::from(5);
    }

    if output_dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&output_dir) {
            error!(path = %output_dir.display(), error = %e, "failed to clear existing output directory");
            return ExitCode::from(5);
        }
    }
    if let Err(e) = std::fs::rename(staging.path(), &output_dir) {
        error!(error = %e, "failed to rename staging directory into place");
        return ExitCode::from(5);
    }
    // The directory now lives at `output_dir`; release the guard so Drop
    // doesn't try to clean up a path that's already been renamed away.
    let _ = staging.into_path();

    info!(path = %output_dir.display(), "extracted archive");
    ExitCode::SUCCESS
}
