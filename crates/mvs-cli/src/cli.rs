use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mvs",
    about = "mvstore: hierarchical schema-driven state for component trees",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the task-list application against the local snapshot directory
    Demo(DemoArgs),
    /// Print the snapshot stored for a root store
    Show(ShowArgs),
    /// Evaluate an expression against JSON data
    Eval(EvalArgs),
    /// List the state paths an expression depends on
    Deps(DepsArgs),
    /// Render a ${...} template against JSON data
    Render(RenderArgs),
}

#[derive(Args)]
pub struct DemoArgs {
    /// Title of the task list
    #[arg(long)]
    pub title: Option<String>,
    /// Description of the task list
    #[arg(long)]
    pub description: Option<String>,
    /// Add a task (repeatable)
    #[arg(long = "task")]
    pub tasks: Vec<String>,
    /// Mark the task with this id completed (repeatable)
    #[arg(long = "complete")]
    pub complete: Vec<String>,
    /// Remove the task with this id (repeatable)
    #[arg(long = "remove")]
    pub remove: Vec<String>,
    /// Reset the task list to its schema defaults first
    #[arg(long)]
    pub reset: bool,
    /// Snapshot directory (defaults to the configured local_dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Read schemas from this directory instead of the built-in ones
    #[arg(long)]
    pub schemas: Option<PathBuf>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Root store name
    pub key: String,
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct DataArgs {
    /// Inline JSON document
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// JSON file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct EvalArgs {
    pub expression: String,
    #[command(flatten)]
    pub input: DataArgs,
}

#[derive(Args)]
pub struct DepsArgs {
    pub expression: String,
}

#[derive(Args)]
pub struct RenderArgs {
    pub template: String,
    #[command(flatten)]
    pub input: DataArgs,
}
