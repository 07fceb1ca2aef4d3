//! TypeSync CLI
//!
//! Command-line tools for content-type snapshot folders.
//!
//! # Commands
//!
//! - `hash` - Print the content digest of a definition file
//! - `diff` - Compare a target definition with a live export
//! - `verify` - Parse every snapshot under the sync folder
//! - `versions` - List archived versions of a snapshot

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use typesync_core::SyncSettings;

/// TypeSync command-line snapshot tools.
#[derive(Parser)]
#[command(name = "typesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a settings file (JSON)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Override the snapshot folder from the settings
    #[arg(global = true, long)]
    folder: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the content digest of a definition file
    Hash {
        /// Definition file to hash
        file: PathBuf,

        /// Also print the canonical form
        #[arg(long)]
        canonical: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compare a target definition with a live export
    Diff {
        /// Target definition file
        target: PathBuf,

        /// Live export file
        live: PathBuf,

        /// Alias of the live parent, if any
        #[arg(long)]
        live_parent: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Parse every snapshot under the sync folder
    Verify {
        /// Snapshot type to check
        #[arg(short = 't', long = "type", default_value = typesync_core::DOCUMENT_TYPE)]
        type_name: String,
    },

    /// List archived versions of a snapshot
    Versions {
        /// Folder of the snapshot relative to its type folder, e.g. `base/page`
        relative: PathBuf,

        /// Snapshot file name without extension
        #[arg(short, long, default_value = typesync_core::DEFINITION_FILE)]
        name: String,

        /// Snapshot type
        #[arg(short = 't', long = "type", default_value = typesync_core::DOCUMENT_TYPE)]
        type_name: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = match &cli.config {
        Some(path) => SyncSettings::load(path)?,
        None => SyncSettings::new(),
    };
    if let Some(folder) = cli.folder {
        settings = settings.folder(folder);
    }

    match cli.command {
        Commands::Hash {
            file,
            canonical,
            format,
        } => commands::hash::run(&file, canonical, &format)?,
        Commands::Diff {
            target,
            live,
            live_parent,
            format,
        } => commands::diff::run(&target, &live, live_parent.as_deref(), &format)?,
        Commands::Verify { type_name } => commands::verify::run(&settings, &type_name)?,
        Commands::Versions {
            relative,
            name,
            type_name,
            format,
        } => commands::versions::run(&settings, &type_name, &relative, &name, &format)?,
        Commands::Version => {
            println!("TypeSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("TypeSync Core v{}", typesync_core::VERSION);
        }
    }

    Ok(())
}
