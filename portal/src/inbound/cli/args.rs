//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::Role;

/// `portal` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "portal",
    about = "Document portal: users, documents and remote attachment storage",
    version
)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start a session.
    Login(LoginArgs),
    /// End the current session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Manage directory entries (admin only).
    #[command(subcommand)]
    Users(UsersCommand),
    /// Browse and manage documents.
    #[command(subcommand)]
    Documents(DocumentsCommand),
    /// Inspect the remote storage backend.
    #[command(subcommand)]
    Storage(StorageCommand),
}

/// `portal login` arguments.
#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    /// Login name.
    #[arg(long, short = 'u')]
    pub username: String,
    /// Password.
    #[arg(long, short = 'p')]
    pub password: String,
}

/// `portal users` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum UsersCommand {
    /// Add a user.
    Add {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Password.
        #[arg(long)]
        password: String,
        /// Access level (`user` or `admin`).
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },
    /// List users.
    List,
}

/// `portal documents` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum DocumentsCommand {
    /// List documents.
    List,
    /// Show one document.
    Show {
        /// Document id.
        id: String,
        /// Write a locally stored attachment to this path.
        #[arg(long, value_name = "path")]
        export: Option<PathBuf>,
    },
    /// Publish a document (admin only).
    Add(AddDocumentArgs),
    /// Remove a document (admin only).
    Remove {
        /// Document id.
        id: String,
    },
    /// Replace the collection with the defaults (admin only).
    Reset,
    /// Restore the bundled certificate document if it is missing (admin only).
    EnsureSeed,
    /// Print the collection whenever it changes.
    Watch {
        /// Re-read interval in seconds.
        #[arg(long, default_value_t = 5)]
        interval_secs: u64,
        /// Stop after this many changes.
        #[arg(long)]
        max_changes: Option<usize>,
    },
}

/// `portal documents add` arguments.
#[derive(Debug, Clone, Args)]
pub struct AddDocumentArgs {
    /// Document title.
    #[arg(long)]
    pub title: String,
    /// Document body.
    #[arg(long, default_value = "")]
    pub content: String,
    /// Creation date (`YYYY-MM-DD`); today when omitted.
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    /// File to attach.
    #[arg(long, value_name = "path")]
    pub file: Option<PathBuf>,
    /// MIME type of the attachment; guessed from the extension when omitted.
    #[arg(long, requires = "file")]
    pub mime_type: Option<String>,
    /// Upload the attachment to remote storage instead of inlining it.
    #[arg(long, requires = "file")]
    pub remote: bool,
}

/// `portal storage` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum StorageCommand {
    /// Verify credentials and the configured bucket.
    Check,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}
