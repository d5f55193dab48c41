use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `tkt` binary.
#[derive(Debug, Parser)]
#[command(name = "tkt", version, about = "tracekit - reconcile trace writes on a local database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace every read and write is scoped to
    #[arg(short, long, global = true, default_value = "default")]
    pub workspace: String,

    /// User recorded as creator / last updater
    #[arg(short, long, global = true, default_value = "cli")]
    pub user: String,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            workspace: self.workspace.clone(),
            user: self.user.clone(),
        }
    }
}
