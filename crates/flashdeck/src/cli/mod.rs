//! Command-line interface for flashdeck.
//!
//! This module provides the CLI structure for the `flashdeck` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ClearCommand, ConfigCommand, GenerateCommand, ListCommand, OutputFormat,
    ServeCommand, StatusCommand,
};

use crate::logging::Verbosity;

/// flashdeck - Flashcards you write, and flashcards an AI writes for you
///
/// Serves a small web page for adding, generating and clearing flashcards,
/// and offers the same operations from the command line.
#[derive(Debug, Parser)]
#[command(name = "flashdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server
    Serve(ServeCommand),

    /// Print the stored flashcards
    List(ListCommand),

    /// Add a flashcard
    Add(AddCommand),

    /// Remove every flashcard
    Clear(ClearCommand),

    /// Generate flashcards about a subject
    Generate(GenerateCommand),

    /// Show storage and provider status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}
