//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "symdex", version, styles = clap_cargo_style())]
#[command(about = "Flat symbol metadata index for content assist")]
pub struct Cli {
    /// Index directory (overrides config)
    #[arg(long, global = true, env = "SYMDEX_INDEX_PATH")]
    pub index_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up .symdex directory
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Write built-in metadata files into a fresh index
    Index {
        /// Metadata files (defaults to indexing.metadata_files)
        files: Vec<PathBuf>,

        /// Rebuild even if an index exists
        #[arg(short, long)]
        force: bool,
    },

    /// Index every metadata document under a directory, one location per file
    IndexDocs {
        /// Directory to walk
        dir: PathBuf,

        /// Number of threads to use (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Query the index
    Retrieve {
        #[command(subcommand)]
        query: RetrieveQuery,
    },

    /// Display active settings
    Config,
}

#[derive(Subcommand, Debug)]
pub enum RetrieveQuery {
    /// List types at a location
    Types {
        /// Location to read (defaults to built-in metadata)
        #[arg(long)]
        location: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one type with its members
    Type {
        name: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List interned user agents
    UserAgents {
        #[arg(long)]
        json: bool,
    },

    /// List locations with records
    Locations,
}
