//! Extraction of flashcards from generated text.
//!
//! Language models rarely return a bare JSON document. The array of cards is
//! usually wrapped in prose ("Here are your cards: ... Hope this helps!"), so
//! extraction slices from the first `[` to the *last* `]` and validates what
//! it finds there. A single malformed element fails the whole batch.

use serde_json::Value;
use tracing::debug;

use crate::error::GenerationError;
use crate::flashcard::Flashcard;

/// Result type for extraction.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Extract and validate the flashcard array embedded in `raw`.
///
/// # Errors
///
/// - [`GenerationError::MalformedOutput`] if no `[ ... ]` span exists.
/// - [`GenerationError::Parse`] if the span is not valid JSON.
/// - [`GenerationError::InvalidRecord`] if any element is not a card.
pub fn extract_flashcards(raw: &str) -> Result<Vec<Flashcard>> {
    let span = locate_array(raw)?;
    debug!("Located {} byte array span in generated text", span.len());

    let value: Value = serde_json::from_str(span).map_err(GenerationError::Parse)?;
    validate_collection(&value)
}

/// Find the inclusive slice between the first `[` and the last `]`.
fn locate_array(raw: &str) -> Result<&str> {
    let start = raw.find('[').ok_or(GenerationError::MalformedOutput)?;
    let end = raw.rfind(']').ok_or(GenerationError::MalformedOutput)?;
    if end < start {
        return Err(GenerationError::MalformedOutput);
    }
    Ok(&raw[start..=end])
}

/// Validate that `value` is an array of term/definition records.
///
/// # Errors
///
/// Returns an error describing the first offending element.
pub fn validate_collection(value: &Value) -> Result<Vec<Flashcard>> {
    let items = value
        .as_array()
        .ok_or_else(|| GenerationError::unexpected_shape("expected a JSON array of flashcards"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_record(index, item))
        .collect()
}

fn validate_record(index: usize, item: &Value) -> Result<Flashcard> {
    let Some(record) = item.as_object() else {
        return Err(GenerationError::invalid_record(index, "expected an object"));
    };

    let field = |name: &str| -> Result<String> {
        match record.get(name) {
            None => Err(GenerationError::invalid_record(
                index,
                format!("missing {name}"),
            )),
            Some(Value::String(s)) if s.trim().is_empty() => Err(
                GenerationError::invalid_record(index, format!("{name} is empty")),
            ),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(_) => Err(GenerationError::invalid_record(
                index,
                format!("{name} must be a string"),
            )),
        }
    };

    Ok(Flashcard::new(field("term")?, field("definition")?))
}
