//! Clients for the hosted services the pipeline consumes.
//!
//! Each collaborator sits behind a small trait so the pipeline never knows
//! which vendor is on the other end — and so tests can inject fakes through
//! [`crate::config::BookConfig`] and exercise every retry/fallback path
//! without a network:
//!
//! * [`IdeaModel`] — one text call returning raw model output (JSON expected,
//!   but parsing is the pipeline's job, not the transport's).
//! * [`ImageModel`] — one text-to-image call returning raw image bytes.
//! * [`PlaceholderSource`] — the last-resort stock image fetch.

use crate::error::ServiceError;
use async_trait::async_trait;

pub mod gemini;
pub mod huggingface;
pub mod placeholder;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;
pub use placeholder::StockImageSource;

/// A hosted language model that answers one prompt with text.
///
/// Implementations return the model's raw text (possibly fenced JSON);
/// [`crate::pipeline::ideas`] owns parsing and fallback.
#[async_trait]
pub trait IdeaModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// A hosted text-to-image model.
///
/// The prompt arrives fully assembled (style preamble already applied).
/// A non-success HTTP status maps to [`ServiceError::Http`] with the code.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, ServiceError>;
}

/// The generic stock-image source used when rendering fails twice for a slot.
#[async_trait]
pub trait PlaceholderSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, ServiceError>;

    /// Where the bytes come from, for error reporting.
    fn url(&self) -> &str;
}
