//! `flashdeck` - A small flashcard manager with AI-generated decks
//!
//! This library provides the flashcard store, the generation pipeline that
//! turns a subject into cards through an external text-generation provider,
//! and the HTTP front end that ties them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod flashcard;
pub mod generation;
pub mod logging;
pub mod render;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, GenerationError, Result};
pub use extract::extract_flashcards;
pub use flashcard::Flashcard;
pub use generation::{GenerationClient, Generator};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
