//! Command-line adapter.
//!
//! Parses arguments with clap, resolves the session, and calls domain
//! services. Output goes to any [`std::io::Write`] so commands can be driven
//! from tests.

mod app;
mod args;
mod commands;
mod files;

use std::io;

use thiserror::Error;

use crate::domain::Error;

pub use app::Portal;
pub use args::{AddDocumentArgs, Cli, Command, DocumentsCommand, LoginArgs, StorageCommand, UsersCommand};
pub use commands::run;

/// Failures reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] Error),
    /// The process could not be wired up.
    #[error("setup failed: {0}")]
    Setup(String),
    /// Reading input or writing output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}
