//! Clap derive structures for the `adminkit` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use adminkit_core::MutationMode;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adminkit -- CRUD records from the command line
#[derive(Debug, Parser)]
#[command(
    name = "adminkit",
    version,
    about = "Manage admin records from the command line",
    long_about = "Create, read, update and delete records in a JSON-backed data store.\n\n\
        Mutations run pessimistically, optimistically, or behind an undo window\n\
        (press Ctrl-C while the countdown runs to undo).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "ADMINKIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// JSON data file (overrides profile)
    #[arg(long, short = 'd', env = "ADMINKIT_DATA_FILE", global = true)]
    pub data_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ADMINKIT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// How mutations reach the data store (overrides profile)
    #[arg(long, short = 'm', env = "ADMINKIT_MUTATION_MODE", global = true)]
    pub mutation_mode: Option<MutationModeArg>,

    /// Undo window for undoable mutations, e.g. "5s" (overrides profile)
    #[arg(long, env = "ADMINKIT_UNDO_WINDOW", global = true)]
    pub undo_window: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output, Color & Mode Enums ───────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MutationModeArg {
    /// Wait for the data store before showing the change
    Pessimistic,
    /// Show the change at once, roll back on failure
    Optimistic,
    /// Hold the change behind an undo window
    Undoable,
}

impl From<MutationModeArg> for MutationMode {
    fn from(arg: MutationModeArg) -> Self {
        match arg {
            MutationModeArg::Pessimistic => Self::Pessimistic,
            MutationModeArg::Optimistic => Self::Optimistic,
            MutationModeArg::Undoable => Self::Undoable,
        }
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records of a resource
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    #[command(alias = "get")]
    Show {
        /// Resource name (e.g. "posts")
        resource: String,
        /// Record id
        id: String,
    },

    /// Create a record
    Create {
        resource: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Update a record (shallow merge)
    Update {
        resource: String,
        id: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Apply the same change to several records
    UpdateMany {
        resource: String,
        /// Comma-separated record ids
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete { resource: String, id: String },

    /// Delete several records
    DeleteMany {
        resource: String,
        /// Comma-separated record ids
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },

    /// Export a resource to CSV
    Export(ExportArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Sorting and filtering shared by `list` and `export`.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Sort field, optionally suffixed with ":asc" or ":desc"
    #[arg(long, short = 's')]
    pub sort: Option<String>,

    /// Field filter "field=value"; repeat for several fields.
    /// Suffix the field with _gte, _lte or _neq for comparisons.
    #[arg(long, short = 'f')]
    pub filter: Vec<String>,

    /// Full-text search across all fields
    #[arg(long)]
    pub q: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Resource name (e.g. "posts")
    pub resource: String,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Records per page (defaults to the profile's per_page)
    #[arg(long, short = 'l')]
    pub per_page: Option<u32>,

    #[command(flatten)]
    pub query: QueryArgs,
}

/// Record data, inline or from a file.
#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// Record data as a JSON object
    #[arg(long, conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read record data from a JSON file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Resource name (e.g. "posts")
    pub resource: String,

    /// Output file name without extension (defaults to the resource)
    #[arg(long)]
    pub filename: Option<String>,

    /// Directory to write the CSV into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Embed related records: "field=resource" (e.g. "author_id=authors")
    #[arg(long)]
    pub related: Vec<String>,

    #[command(flatten)]
    pub query: QueryArgs,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key: data_file, mutation_mode, undo_window,
        /// undoable_optimistic, per_page
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
