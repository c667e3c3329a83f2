//! release_unpack CLI - unpack a downloaded release asset
//!
//! # Examples
//!
//! ```bash
//! # Unpack into the current directory
//! release_unpack tool-1.4.2-linux-amd64.tar.gz
//!
//! # Keep only the binary, replace an older copy, drop the tarball afterwards
//! release_unpack tool.tar.gz --keep '(^|/)tool$' --overwrite --remove-archive
//!
//! # Unpack somewhere else
//! release_unpack tool.zip -d ~/.local/opt/tool
//!
//! # Generate shell completions
//! release_unpack --completions bash > ~/.bash_completion.d/release_unpack
//! ```

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use log::LevelFilter;
use release_unpack::{Driver, Error, FilterSet};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "release_unpack",
    about = "Unpack downloaded release assets (tar, zip, 7z, gz, bz2, xz)",
    version,
    after_help = "EXAMPLES:
    release_unpack tool.tar.gz
    release_unpack tool.tar.xz -d /opt/tool --keep '^bin/'
    release_unpack tool.gz --overwrite --remove-archive"
)]
struct Cli {
    /// Archive file to unpack
    #[arg(required_unless_present = "completions")]
    archive: Option<PathBuf>,

    /// Destination directory (created if missing). Without it, archives unpack
    /// into the current directory and a bare .gz/.bz2/.xz lands next to itself
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// Keep only entries whose path matches this regex (can be repeated; any match keeps)
    #[arg(short, long = "keep", value_name = "REGEX")]
    keep: Vec<String>,

    /// Replace files that already exist
    #[arg(long)]
    overwrite: bool,

    /// Delete the archive after a successful extraction
    #[arg(long)]
    remove_archive: bool,

    /// Generate shell completions for the specified shell
    #[arg(long, value_enum)]
    completions: Option<Shell>,

    /// Quiet mode - only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose logging (repeat for debug output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "release_unpack", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_logging(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", format_error(&e));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let Some(archive) = cli.archive.as_ref() else {
        return Ok(());
    };

    let filters = FilterSet::compile(cli.keep.as_slice())?;
    let driver = match cli.dest.as_ref() {
        Some(dest) => Driver::new_or_create(dest)?.singleton_into_destination(true),
        None => Driver::new(".")?,
    };
    let written = driver
        .filters(filters)
        .overwrite(cli.overwrite)
        .extract_file(archive)?;

    if !cli.quiet {
        for path in &written {
            println!("{}", path.display());
        }
    }

    if cli.remove_archive {
        fs::remove_file(archive)?;
        log::info!("removed archive {}", archive.display());
    }

    Ok(())
}

fn format_error(e: &Error) -> String {
    match e {
        Error::InvalidFilter { pattern, source } => {
            format!("Invalid --keep pattern '{}': {}", pattern, source)
        }
        Error::UnknownFormat { path } => {
            format!("Don't know how to extract '{}' (unrecognized extension)", path)
        }
        Error::NothingExtracted { path } => {
            format!(
                "Nothing extracted from '{}'; check --keep patterns or the archive contents",
                path
            )
        }
        Error::EntryFailed {
            entry,
            written,
            source,
        } => {
            format!(
                "Stopped at '{}' ({} paths already written): {}",
                entry,
                written.len(),
                format_error(source)
            )
        }
        Error::AlreadyExists { entry } => {
            format!("File already exists: {} (use --overwrite to replace)", entry)
        }
        _ => e.to_string(),
    }
}
