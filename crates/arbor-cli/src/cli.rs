use std::path::PathBuf;

use arbor_sdk::ExtractPolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor, a lightweight content-addressed version control system",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "directory", global = true, default_value = ".")]
    pub directory: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a working copy bound to a new reference
    Init(InitArgs),
    /// Create a reference with an empty tree and switch to it
    Create(CreateArgs),
    /// Record the working directory on the active reference
    Commit(CommitArgs),
    /// Switch the working directory to another reference
    Checkout(CheckoutArgs),
    /// Show changes between two trees
    Diff(DiffArgs),
    /// List references
    Tree(TreeArgs),
    /// Remove a reference
    Destroy(DestroyArgs),
    /// Show uncommitted changes
    Status(StatusArgs),
    /// Show the history of a reference
    Log(LogArgs),
    /// Restore deleted files and remove new ones
    Reset(ResetArgs),
    /// Get or set configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct InitArgs {
    #[arg(default_value = "main")]
    pub reference: String,
}

#[derive(Args)]
pub struct CreateArgs {
    pub reference: String,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct CheckoutArgs {
    pub reference: String,
    /// Proceed even with uncommitted changes
    #[arg(short, long)]
    pub force: bool,
    /// Create the reference if it does not exist
    #[arg(short, long)]
    pub create: bool,
    /// How to treat existing files: keep, replace, backup or new
    #[arg(long)]
    pub policy: Option<ExtractPolicy>,
}

#[derive(Args)]
pub struct DiffArgs {
    /// `from..to`; either side defaults to the committed tree and the
    /// working directory respectively
    pub range: Option<String>,
    /// Show line-level changes of modified files
    #[arg(long)]
    pub content: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// List every reference, marking the active one
    #[arg(short, long)]
    pub all: bool,
    /// Show the tree id of each reference
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    pub reference: String,
}

#[derive(Args)]
pub struct StatusArgs {}

#[derive(Args)]
pub struct LogArgs {
    pub range: Option<String>,
}

#[derive(Args)]
pub struct ResetArgs {}

#[derive(Args)]
pub struct ConfigArgs {
    pub key: String,
    pub value: Option<String>,
}
