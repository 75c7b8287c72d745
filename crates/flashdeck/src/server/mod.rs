//! HTTP front end for flashdeck.
//!
//! Four user-facing routes map directly onto the store and the generator:
//! `GET /` renders, `POST /add`, `POST /clear` and `POST /generate` mutate and
//! redirect back to `/`. Every read-modify-write against the store holds the
//! same in-process lock, so concurrent requests cannot lose updates.

pub mod handlers;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{Config, MergePolicy};
use crate::error::{Error, Result};
use crate::generation::{GenerationClient, Generator};
use crate::storage::Storage;

/// State shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The flashcard document.
    pub storage: Arc<Storage>,
    /// Source of generated sets.
    pub generator: Arc<dyn Generator>,
    /// How generated sets are combined with existing cards.
    pub merge: MergePolicy,
    /// Serializes read-modify-write cycles on the store.
    write_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Create application state from its parts.
    #[must_use]
    pub fn new(storage: Storage, generator: Arc<dyn Generator>, merge: MergePolicy) -> Self {
        Self {
            storage: Arc::new(storage),
            generator,
            merge,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build state from configuration, wiring in the HTTP generation client.
    ///
    /// # Errors
    ///
    /// Returns an error if the generation client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        let generator = GenerationClient::new(config.provider.clone())?;
        Ok(Self::new(
            Storage::new(config.storage_path()),
            Arc::new(generator),
            config.generate.merge,
        ))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/add", post(handlers::add))
        .route("/clear", post(handlers::clear))
        .route("/generate", post(handlers::generate))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::from_config(config)?;
    let storage_path = state.storage.path().display().to_string();

    let listener = TcpListener::bind(addr).await?;
    info!("Flashcard server listening on http://{}", listener.local_addr()?);
    info!("Flashcards stored at {}", storage_path);
    info!(
        "Generating with {} adapter at {}",
        config.provider.kind,
        config.provider.endpoint()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_invalid_input() {
            warn!("Rejected request: {}", self);
            StatusCode::BAD_REQUEST
        } else {
            error!("Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::flashcard::Flashcard;

    /// Generator that returns a fixed set and records the subjects it saw.
    #[derive(Debug)]
    struct FakeGenerator {
        cards: Vec<Flashcard>,
        subjects: StdMutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(cards: Vec<Flashcard>) -> Self {
            Self {
                cards,
                subjects: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        async fn generate_flashcards(&self, subject: &str) -> Vec<Flashcard> {
            self.subjects.lock().unwrap().push(subject.to_string());
            self.cards.clone()
        }
    }

    fn test_state(
        dir: &tempfile::TempDir,
        generator: Arc<FakeGenerator>,
        merge: MergePolicy,
    ) -> AppState {
        AppState::new(
            Storage::new(dir.path().join("flashcards.json")),
            generator,
            merge,
        )
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_redirects_home(response: &Response) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_index_empty() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace));

        let response = app.oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No flashcards yet."));
    }

    #[tokio::test]
    async fn test_add_appends_and_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace);
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(form("/add", "term=Osmosis&definition=Water+movement"))
            .await
            .unwrap();
        assert_redirects_home(&response);

        app.clone()
            .oneshot(form("/add", "term=Osmosis&definition=Water+movement"))
            .await
            .unwrap();

        let cards = state.storage.load().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0], Flashcard::new("Osmosis", "Water movement"));

        let page = body_text(app.oneshot(get_req("/")).await.unwrap()).await;
        assert!(page.contains("Water movement"));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace);
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(form("/add", "term=+&definition=x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(form("/add", "term=Osmosis")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("definition"));

        assert!(state.storage.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_clear_then_view_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace);
        let app = router(state.clone());

        for i in 0..3 {
            app.clone()
                .oneshot(form("/add", &format!("term=t{i}&definition=d{i}")))
                .await
                .unwrap();
        }

        let response = app.clone().oneshot(form("/clear", "")).await.unwrap();
        assert_redirects_home(&response);
        assert!(state.storage.load().unwrap().is_empty());

        let page = body_text(app.oneshot(get_req("/")).await.unwrap()).await;
        assert!(page.contains("No flashcards yet."));
    }

    #[tokio::test]
    async fn test_generate_replaces_collection() {
        let dir = tempfile::tempdir().unwrap();
        let generated = vec![
            Flashcard::new("Mitosis", "Cell division"),
            Flashcard::new("Meiosis", "Division into gametes"),
        ];
        let generator = Arc::new(FakeGenerator::new(generated.clone()));
        let state = test_state(&dir, generator.clone(), MergePolicy::Replace);
        state.storage.save(&[Flashcard::new("Old", "card")]).unwrap();

        let response = router(state.clone())
            .oneshot(form("/generate", "subject=Cell+biology"))
            .await
            .unwrap();
        assert_redirects_home(&response);

        assert_eq!(state.storage.load().unwrap(), generated);
        assert_eq!(*generator.subjects.lock().unwrap(), vec!["Cell biology"]);
    }

    #[tokio::test]
    async fn test_generate_append_policy_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![Flashcard::new("New", "card")]));
        let state = test_state(&dir, generator, MergePolicy::Append);
        state.storage.save(&[Flashcard::new("Old", "card")]).unwrap();

        router(state.clone())
            .oneshot(form("/generate", "subject=anything"))
            .await
            .unwrap();

        let terms: Vec<_> = state
            .storage
            .load()
            .unwrap()
            .into_iter()
            .map(|c| c.term)
            .collect();
        assert_eq!(terms, vec!["Old", "New"]);
    }

    #[tokio::test]
    async fn test_generate_stores_error_card() {
        crate::logging::init_test_logging();
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![Flashcard::error(
            "Hugging Face API Error: model loading",
        )]));
        let state = test_state(&dir, generator, MergePolicy::Replace);
        let app = router(state.clone());

        app.clone()
            .oneshot(form("/generate", "subject=Chemistry"))
            .await
            .unwrap();

        let cards = state.storage.load().unwrap();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].is_error());

        let page = body_text(app.oneshot(get_req("/")).await.unwrap()).await;
        assert!(page.contains("Hugging Face API Error: model loading"));
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_subject() {
        let dir = tempfile::tempdir().unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![]));
        let state = test_state(&dir, generator.clone(), MergePolicy::Replace);

        let response = router(state)
            .oneshot(form("/generate", "subject=+++"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(generator.subjects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_store_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace);
        std::fs::write(state.storage.path(), "{not json").unwrap();

        let response = router(state).oneshot(get_req("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("corrupt"));
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace));

        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, Arc::new(FakeGenerator::new(vec![])), MergePolicy::Replace);
        let app = router(state.clone());

        let requests = (0..16).map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(form("/add", &format!("term=t{i}&definition=d{i}")))
                    .await
                    .unwrap()
            })
        });
        for handle in requests.collect::<Vec<_>>() {
            handle.await.unwrap();
        }

        assert_eq!(state.storage.load().unwrap().len(), 16);
    }
}
