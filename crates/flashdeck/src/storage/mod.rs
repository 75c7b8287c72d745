//! Storage layer for flashdeck.
//!
//! The whole collection lives in one JSON document that is read and written
//! in its entirety. Writes go to a sibling temporary file first and are then
//! renamed over the document, so readers never observe a half-written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::MergePolicy;
use crate::error::{Error, Result};
use crate::flashcard::Flashcard;

/// Extension appended to the document name for in-flight writes.
const TEMP_SUFFIX: &str = "tmp";

/// File-backed flashcard collection.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Path to the JSON document.
    path: PathBuf,
}

impl Storage {
    /// Create a storage handle for the document at `path`.
    ///
    /// Nothing is touched on disk until the first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the flashcard document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted collection.
    ///
    /// A missing document is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistedDataCorrupt`] if the document is not a valid
    /// collection, or an I/O error if it cannot be read.
    pub fn load(&self) -> Result<Vec<Flashcard>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No flashcard document at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let cards: Vec<Flashcard> =
            serde_json::from_str(&content).map_err(|source| Error::PersistedDataCorrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} flashcards from {}", cards.len(), self.path.display());
        Ok(cards)
    }

    /// Overwrite the persisted collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// document cannot be written.
    pub fn save(&self, cards: &[Flashcard]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let mut content = serde_json::to_string_pretty(cards)?;
        content.push('\n');

        let temp_path = self.temp_path();
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &self.path)?;

        info!("Saved {} flashcards to {}", cards.len(), self.path.display());
        Ok(())
    }

    /// Append a single card to the collection.
    ///
    /// Returns the new collection.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub fn append(&self, card: Flashcard) -> Result<Vec<Flashcard>> {
        let mut cards = self.load()?;
        cards.push(card);
        self.save(&cards)?;
        Ok(cards)
    }

    /// Store a generated set according to `policy`.
    ///
    /// Returns the new collection.
    ///
    /// # Errors
    ///
    /// Returns an error if loading (for [`MergePolicy::Append`]) or saving fails.
    pub fn merge_generated(
        &self,
        generated: Vec<Flashcard>,
        policy: MergePolicy,
    ) -> Result<Vec<Flashcard>> {
        let cards = match policy {
            MergePolicy::Replace => generated,
            MergePolicy::Append => {
                let mut cards = self.load()?;
                cards.extend(generated);
                cards
            }
        };
        self.save(&cards)?;
        Ok(cards)
    }

    /// Remove every card.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }

    /// Get storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be loaded.
    pub fn stats(&self) -> Result<StorageStats> {
        let cards = self.load()?;
        let metadata = std::fs::metadata(&self.path).ok();

        Ok(StorageStats {
            total_cards: cards.len(),
            error_cards: cards.iter().filter(|c| c.is_error()).count(),
            file_size_bytes: metadata.as_ref().map_or(0, std::fs::Metadata::len),
            last_modified: metadata
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }
}

/// Statistics about the stored collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of cards in the collection.
    pub total_cards: usize,
    /// Number of synthetic error cards.
    pub error_cards: usize,
    /// Size of the document on disk.
    pub file_size_bytes: u64,
    /// Last time the document was written.
    pub last_modified: Option<DateTime<Utc>>,
}
