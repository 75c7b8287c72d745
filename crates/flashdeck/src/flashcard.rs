//! Core flashcard types for flashdeck.
//!
//! A flashcard is a plain term/definition pair. Cards have no identity beyond
//! their position in the collection, and duplicates are allowed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, GenerationError, Result};

/// Term used for synthetic cards that report a failure to the user.
pub const ERROR_TERM: &str = "Error";

/// A single term/definition pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flashcard {
    /// The prompt side of the card.
    pub term: String,
    /// The answer side of the card.
    pub definition: String,
}

impl Flashcard {
    /// Create a card without validation.
    #[must_use]
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }

    /// Create a card from user input.
    ///
    /// Surrounding whitespace is trimmed from both sides of the card.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either field is empty after trimming.
    pub fn from_input(term: &str, definition: &str) -> Result<Self> {
        let term = term.trim();
        let definition = definition.trim();

        if term.is_empty() {
            return Err(Error::invalid_input("term is required"));
        }
        if definition.is_empty() {
            return Err(Error::invalid_input("definition is required"));
        }

        Ok(Self::new(term, definition))
    }

    /// Create a synthetic card carrying an error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ERROR_TERM, message)
    }

    /// Check whether this card is a synthetic error card.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.term == ERROR_TERM
    }
}

impl From<&GenerationError> for Flashcard {
    fn from(err: &GenerationError) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flashcard() {
        let card = Flashcard::new("Photosynthesis", "Process plants use to make food");
        assert_eq!(card.term, "Photosynthesis");
        assert_eq!(card.definition, "Process plants use to make food");
        assert!(!card.is_error());
    }

    #[test]
    fn test_from_input_trims() {
        let card = Flashcard::from_input("  Osmosis ", "\tDiffusion of water\n").unwrap();
        assert_eq!(card, Flashcard::new("Osmosis", "Diffusion of water"));
    }

    #[test]
    fn test_from_input_rejects_empty_term() {
        let err = Flashcard::from_input("   ", "something").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("term"));
    }

    #[test]
    fn test_from_input_rejects_empty_definition() {
        let err = Flashcard::from_input("Mitosis", "").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("definition"));
    }

    #[test]
    fn test_error_card() {
        let card = Flashcard::error("Missing COHERE_API_KEY");
        assert_eq!(card.term, "Error");
        assert!(card.is_error());
    }

    #[test]
    fn test_from_generation_error() {
        let err = GenerationError::MalformedOutput;
        let card = Flashcard::from(&err);
        assert_eq!(card, Flashcard::error("Could not find JSON in AI output"));
    }

    #[test]
    fn test_serialize_shape() {
        let card = Flashcard::new("a", "b");
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, r#"{"term":"a","definition":"b"}"#);
    }

    #[test]
    fn test_duplicates_are_equal_but_distinct_entries() {
        let cards = vec![Flashcard::new("x", "y"), Flashcard::new("x", "y")];
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], cards[1]);
    }
}
