//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::{Error, Result};
use crate::flashcard::Flashcard;
use crate::render::render_index;
use crate::storage::Storage;

/// Form body for `POST /add`.
///
/// Missing fields deserialize as empty strings so they are rejected by the
/// same validation as blank ones.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    /// Card term.
    #[serde(default)]
    pub term: String,
    /// Card definition.
    #[serde(default)]
    pub definition: String,
}

/// Form body for `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    /// Subject to generate cards about.
    #[serde(default)]
    pub subject: String,
}

/// Run a store operation on the blocking pool.
async fn with_storage<T, F>(state: &AppState, op: F) -> Result<T>
where
    F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let storage = Arc::clone(&state.storage);
    tokio::task::spawn_blocking(move || op(&storage))
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
}

/// `GET /` renders the current collection.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let cards = with_storage(&state, Storage::load).await?;
    Ok(Html(render_index(&cards)))
}

/// `POST /add` appends one card.
pub async fn add(State(state): State<AppState>, Form(form): Form<AddForm>) -> Result<Redirect> {
    let card = Flashcard::from_input(&form.term, &form.definition)?;

    let _guard = state.write_lock.lock().await;
    let cards = with_storage(&state, move |storage| storage.append(card)).await?;
    info!("Added flashcard; collection now holds {}", cards.len());

    Ok(Redirect::to("/"))
}

/// `POST /clear` empties the collection.
pub async fn clear(State(state): State<AppState>) -> Result<Redirect> {
    let _guard = state.write_lock.lock().await;
    with_storage(&state, Storage::clear).await?;
    info!("Cleared flashcards");

    Ok(Redirect::to("/"))
}

/// `POST /generate` asks the provider for a set and stores it.
pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Redirect> {
    let subject = form.subject.trim();
    if subject.is_empty() {
        return Err(Error::invalid_input("subject is required"));
    }

    // The provider call happens outside the lock; only the write is serialized.
    let generated = state.generator.generate_flashcards(subject).await;

    let _guard = state.write_lock.lock().await;
    let merge = state.merge;
    let cards = with_storage(&state, move |storage| {
        storage.merge_generated(generated, merge)
    })
    .await?;
    info!(
        "Stored generated set for {:?}; collection now holds {}",
        subject,
        cards.len()
    );

    Ok(Redirect::to("/"))
}

/// `GET /health` liveness probe.
pub async fn health() -> &'static str {
    "ok"
}
