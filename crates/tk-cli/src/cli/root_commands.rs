use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create a trace, or complete the placeholder a patch left for its id.
    Create(CreateArgs),
    /// Patch a trace. Writes a placeholder if the id is not known yet.
    Update(UpdateArgs),
    /// Get a trace by id.
    Get { id: String },
    /// Delete a trace with its feedback scores and spans.
    Delete { id: String },
    /// List traces in a project, newest first.
    Find(FindArgs),
    /// Check that every known id belongs to the current workspace.
    ValidateWorkspace { ids: Vec<String> },
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    /// Trace id (UUID v7). Generated when omitted.
    #[arg(long)]
    pub id: Option<String>,
    /// Project name. Blank uses the configured default project.
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub name: String,
    /// RFC 3339 start time. Defaults to now.
    #[arg(long)]
    pub start_time: Option<String>,
    #[arg(long)]
    pub end_time: Option<String>,
    /// JSON value.
    #[arg(long)]
    pub input: Option<String>,
    /// JSON value.
    #[arg(long)]
    pub output: Option<String>,
    /// JSON value.
    #[arg(long)]
    pub metadata: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long, conflicts_with = "project_id")]
    pub project: Option<String>,
    #[arg(long)]
    pub project_id: Option<String>,
    #[arg(long)]
    pub end_time: Option<String>,
    #[arg(long)]
    pub input: Option<String>,
    #[arg(long)]
    pub output: Option<String>,
    #[arg(long)]
    pub metadata: Option<String>,
    /// Replaces the tag set when given at least once.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct FindArgs {
    #[arg(long, conflicts_with = "project_id")]
    pub project: Option<String>,
    #[arg(long)]
    pub project_id: Option<String>,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Page size. 0 uses the configured default.
    #[arg(long, default_value_t = 0)]
    pub size: u32,
    /// Hide placeholder rows.
    #[arg(long)]
    pub realized_only: bool,
}
