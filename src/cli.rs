//! Command-line surface: left unspecified by the core, this binary is
//! the thin shell that defines it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "kestrel", version, about = "A local, interactive coding agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Starts an interactive session against a project.
    Start {
        /// Project root; defaults to the current directory.
        path: Option<PathBuf>,
        /// Auto-confirm every edit/run tool without prompting.
        #[arg(long)]
        auto_apply: bool,
        /// Overrides the configured model name.
        #[arg(long)]
        model: Option<String>,
    },
    /// Writes a default `.kestrel/config.toml` into the project root.
    Init {
        path: Option<PathBuf>,
    },
    /// Builds (or rebuilds) the project index without starting a session.
    Index {
        path: Option<PathBuf>,
    },
}
