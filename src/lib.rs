//! **codeloom** - CLI for building AI-generated web app workspaces from delimited replies
//!
//! A workspace pairs a chat transcript with a virtual file tree. Generator
//! replies are parsed out of `<<<FILE path>>>` markers and applied as
//! whole-map updates; balances are debited per word of reply text.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core pipeline - reply parsing, workspace state, generation, export
pub mod core {
    /// Delimited reply parsing (`<<<FILE path>>>` sections)
    pub mod parse;
    pub use parse::{DelimitedParser, ParseOutcome};

    /// Virtual file tree state and edit operations
    pub mod workspace;
    pub use workspace::{FileContent, FileMap, Workspace};

    /// Workspace tree rendering with line counts and per-extension color
    pub mod tree;
    pub use tree::run as tree_run;

    /// Token balances: word counts, the low-balance gate, debits
    pub mod meter;

    /// Prompt composition and the generate/chat pipeline
    pub mod generate;
    pub use generate::{ReplySource, TextGenerator};

    /// Workspace-to-disk export with atomic writes
    pub mod export;
    pub use export::export_files;
}

/// Command handlers layered over the core pipeline
pub mod cli_ext {
    /// Workspace, user, and reply-parsing command handlers
    pub mod workspace_cmd;
}

/// Infrastructure - configuration and persistence
pub mod infra {
    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// JSON document store for workspaces and users
    pub mod store;
    pub use store::{ChatMessage, Role, Store, UserRecord, WorkspaceRecord, open_store};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{DelimitedParser, FileContent, FileMap, ParseOutcome, Workspace, tree_run};
pub use infra::{Config, Store, load_config, open_store};
