use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,               // global --quiet
    pub no_color: bool,            // global --no-color
    pub dry_run: bool,             // global --dry-run
    pub data_dir: Option<PathBuf>, // global --data-dir
}

#[derive(Parser)]
#[command(name = "loom")]
#[command(
    about = "A fast CLI for building AI-generated web app workspaces from delimited replies"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Data directory override (config value, then ~/.codeloom, when omitted)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a workspace seeded with a starter file
    New(NewArgs),

    /// List workspaces, newest first
    List(ListArgs),

    /// Show a workspace's transcript and files
    Show(ShowArgs),

    /// Display a workspace's file tree
    Tree(TreeArgs),

    /// Add an empty starter file to a workspace
    Add(AddArgs),

    /// Rename a file or folder inside a workspace
    Rename(RenameArgs),

    /// Delete a file or folder (and everything under it)
    Delete(DeleteArgs),

    /// Replace one file's content
    Edit(EditArgs),

    /// Run a generation turn and apply the parsed files
    Apply(ApplyArgs),

    /// Run a conversational turn
    Chat(ChatArgs),

    /// Parse a delimited reply without touching any workspace
    Parse(ParseArgs),

    /// Write a workspace's files to a real directory
    Export(ExportArgs),

    /// Manage users and token balances
    User(UserArgs),

    /// Initialize a codeloom.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser)]
pub struct NewArgs {
    /// Owning user's email
    #[arg(long)]
    pub user: String,

    /// First prompt to record in the transcript
    #[arg(long)]
    pub prompt: Option<String>,

    /// Emit the created record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Only this user's workspaces
    #[arg(long)]
    pub user: Option<String>,

    /// Machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Workspace identifier
    pub id: String,

    /// Print this file's raw content instead of the overview
    #[arg(long)]
    pub file: Option<String>,

    /// Emit the full record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct TreeArgs {
    /// Workspace identifier
    pub id: String,
}

#[derive(Parser)]
pub struct AddArgs {
    /// Workspace identifier
    pub id: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Workspace identifier
    pub id: String,

    /// Existing file or folder path
    pub path: String,

    /// Replacement for the last path segment
    pub new_name: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Workspace identifier
    pub id: String,

    /// File or folder path to remove
    pub path: String,
}

#[derive(Parser)]
pub struct EditArgs {
    /// Workspace identifier
    pub id: String,

    /// File path inside the workspace
    pub path: String,

    /// New content, inline
    #[arg(long)]
    pub content: Option<String>,

    /// Read new content from a file; `-` for stdin
    #[arg(long, conflicts_with = "content")]
    pub from_file: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Workspace identifier
    pub id: String,

    /// Extra prompt appended to the transcript before generating
    #[arg(long)]
    pub prompt: Option<String>,

    /// Read the generator reply from a file; `-` for stdin
    #[arg(long)]
    pub reply_from: Option<PathBuf>,

    /// Read the generator reply from the clipboard
    #[arg(long, conflicts_with = "reply_from")]
    pub from_clipboard: bool,

    /// Output results in JSON format (single line)
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ChatArgs {
    /// Workspace identifier
    pub id: String,

    /// Message to send
    pub message: String,

    /// Read the generator reply from a file; `-` for stdin
    #[arg(long)]
    pub reply_from: Option<PathBuf>,

    /// Read the generator reply from the clipboard
    #[arg(long, conflicts_with = "reply_from")]
    pub from_clipboard: bool,

    /// Emit the reply as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ParseArgs {
    /// Reply file to parse; stdin when omitted
    pub input: Option<PathBuf>,

    /// Read the reply from the clipboard
    #[arg(long, conflicts_with = "input")]
    pub from_clipboard: bool,

    /// Emit `{"files": ..., "raw": ...}` instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Workspace identifier
    pub id: String,

    /// Destination directory
    #[arg(short, long, default_value = "export")]
    pub out_dir: PathBuf,

    /// Write into a non-empty directory
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommand,
}

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Register a user (one record per email)
    Create(UserCreateArgs),

    /// Show a user and their token balance
    Show(UserShowArgs),

    /// Add tokens to a user's balance
    Grant(UserGrantArgs),
}

#[derive(Parser, Debug)]
pub struct UserCreateArgs {
    /// Display name
    pub name: String,

    /// Email address (the user's key)
    pub email: String,

    /// Initial token grant; config default when omitted
    #[arg(long)]
    pub grant: Option<u64>,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct UserShowArgs {
    /// Email address
    pub email: String,

    /// JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct UserGrantArgs {
    /// Email address
    pub email: String,

    /// Tokens to add to the current balance
    pub amount: u64,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
