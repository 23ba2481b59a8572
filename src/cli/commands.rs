//! CLI command definitions using clap.
//!
//! One subcommand per operation, plus:
//! - history: show journaled runs
//! - domains: show the configured domains and attempt ceilings

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use deskloop::domain::{Operation, ParamSet};

/// Deskloop - desktop automation with bounded verify-and-retry loops
#[derive(Parser, Debug)]
#[command(name = "deskloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer every operation with a canned success instead of touching the system
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open an application by name
    OpenApp {
        /// Application name
        name: String,
    },

    /// Read a file
    Read {
        /// File path
        path: String,
    },

    /// List a directory
    List {
        /// Directory path
        path: String,
    },

    /// Write (or append) content to a file
    Write {
        /// File path
        path: String,

        /// Content to write
        content: String,

        /// Append instead of overwriting
        #[arg(short, long)]
        append: bool,
    },

    /// Open a file in the editor, creating it if missing
    Open {
        /// File path
        path: String,
    },

    /// Replace a file's content and open it in the editor
    Edit {
        /// File path
        path: String,

        /// New content
        content: String,
    },

    /// Show journaled runs
    History {
        /// Show the full report for this task id
        id: Option<String>,

        /// Number of recent runs to list
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Show configured domains
    Domains,
}

impl Commands {
    /// Operation, parameters and description for task subcommands
    pub fn to_request(&self) -> Option<(Operation, ParamSet, String)> {
        let request = match self {
            Commands::OpenApp { name } => (
                Operation::OpenApplication,
                ParamSet::new().with("name", name),
                format!("open {}", name),
            ),
            Commands::Read { path } => (
                Operation::ReadFile,
                ParamSet::new().with("file_path", path),
                format!("read {}", path),
            ),
            Commands::List { path } => (
                Operation::ListDirectory,
                ParamSet::new().with("directory_path", path),
                format!("list {}", path),
            ),
            Commands::Write { path, content, append } => {
                let mut params = ParamSet::new().with("file_path", path).with("content", content);
                if *append {
                    params.insert("append", "true");
                }
                let verb = if *append { "append to" } else { "write" };
                (Operation::WriteFile, params, format!("{} {}", verb, path))
            }
            Commands::Open { path } => (
                Operation::OpenInEditor,
                ParamSet::new().with("file_path", path),
                format!("open {} in the editor", path),
            ),
            Commands::Edit { path, content } => (
                Operation::EditInEditor,
                ParamSet::new().with("file_path", path).with("content", content),
                format!("edit {}", path),
            ),
            Commands::History { .. } | Commands::Domains => return None,
        };
        Some(request)
    }
}
