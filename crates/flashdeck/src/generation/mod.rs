//! Flashcard generation through an external text-generation provider.
//!
//! [`GenerationClient`] turns a subject into a prompt, performs one POST to
//! the configured provider and hands the reply through the adapter and the
//! extractor. Callers that only want something to render use the
//! [`Generator`] trait, which folds every failure into a single error card.

pub mod adapter;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::{Error, GenerationError};
use crate::extract::extract_flashcards;
use crate::flashcard::Flashcard;

pub use adapter::{adapter_for, ProviderAdapter, ProviderReply};

/// Build the instruction sent to the provider.
#[must_use]
pub fn build_prompt(subject: &str, card_count: usize) -> String {
    [
        format!("Generate {card_count} educational flashcards about the topic: \"{subject}\"."),
        "Return ONLY a JSON array, formatted like:".to_string(),
        "[".to_string(),
        r#"  {"term": "Term1", "definition": "Definition1"},"#.to_string(),
        "  ...".to_string(),
        "]".to_string(),
    ]
    .join("\n")
}

/// An unprocessed provider reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    /// HTTP status of the reply.
    pub status: StatusCode,
    /// Body text, exactly as received.
    pub body: String,
}

/// Anything that can produce a renderable set of flashcards for a subject.
#[async_trait]
pub trait Generator: std::fmt::Debug + Send + Sync {
    /// Generate flashcards about `subject`.
    ///
    /// Never fails: problems are reported as a single error card.
    async fn generate_flashcards(&self, subject: &str) -> Vec<Flashcard>;
}

/// HTTP client for the configured generation provider.
#[derive(Debug)]
pub struct GenerationClient {
    http: Client,
    config: ProviderConfig,
    adapter: Box<dyn ProviderAdapter>,
    /// Credential supplied directly instead of through the environment.
    credential: Option<SecretString>,
}

impl GenerationClient {
    /// Create a client for the given provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: ProviderConfig) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            adapter: adapter_for(config.kind),
            config,
            credential: None,
        })
    }

    /// Use `credential` instead of reading the environment.
    #[must_use]
    pub fn with_credential(mut self, credential: SecretString) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Read the provider credential from the environment.
    ///
    /// The environment is consulted on every request so a key exported after
    /// startup is picked up.
    fn env_credential(&self) -> Result<SecretString, GenerationError> {
        match std::env::var(&self.config.api_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
            _ => Err(GenerationError::MissingCredential {
                var: self.config.api_key_env.clone(),
            }),
        }
    }

    /// Send the generation prompt for `subject` and return the raw reply.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::MissingCredential`] without touching the
    /// network when no credential is available, and
    /// [`GenerationError::Transport`] when the request cannot be completed.
    pub async fn request_generation(&self, subject: &str) -> Result<RawReply, GenerationError> {
        let from_env;
        let credential = match &self.credential {
            Some(credential) => credential,
            None => {
                from_env = self.env_credential()?;
                &from_env
            }
        };
        let prompt = build_prompt(subject, self.config.card_count);
        let body = self.adapter.request_body(&prompt, &self.config);
        let endpoint = self.config.endpoint();

        info!(
            "Requesting {} flashcards about {:?} from {} ({})",
            self.config.card_count,
            subject,
            endpoint,
            self.adapter.kind()
        );

        let response = self
            .http
            .post(endpoint)
            .bearer_auth(credential.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(GenerationError::transport)?;
        debug!("Provider replied {}: {}", status, body);

        Ok(RawReply { status, body })
    }

    /// Run the full pipeline: request, unwrap, extract.
    ///
    /// # Errors
    ///
    /// Returns the first [`GenerationError`] raised along the way.
    pub async fn generate(&self, subject: &str) -> Result<Vec<Flashcard>, GenerationError> {
        let reply = self.request_generation(subject).await?;
        let text = self.unwrap(&reply)?;
        let cards = extract_flashcards(&text)?;
        info!("Extracted {} flashcards about {:?}", cards.len(), subject);
        Ok(cards)
    }

    /// Classify a raw reply and let the adapter pull out the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error for provider error payloads and unrecognized shapes.
    pub fn unwrap(&self, reply: &RawReply) -> Result<String, GenerationError> {
        let classified = ProviderReply::classify(reply.status, &reply.body);
        self.adapter.unwrap_reply(classified)
    }
}

#[async_trait]
impl Generator for GenerationClient {
    async fn generate_flashcards(&self, subject: &str) -> Vec<Flashcard> {
        match self.generate(subject).await {
            Ok(cards) => cards,
            Err(e) => {
                if e.is_missing_credential() {
                    info!("Skipping generation for {:?}: {}", subject, e);
                } else if e.is_extraction_error() {
                    warn!("Provider output for {:?} held no usable flashcards: {}", subject, e);
                } else {
                    warn!("Flashcard generation for {:?} failed: {}", subject, e);
                }
                vec![Flashcard::from(&e)]
            }
        }
    }
}
