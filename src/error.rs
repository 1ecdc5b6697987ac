//! Error types for the crayonpress library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`BookError`] — **Fatal**: the generation cannot proceed at all
//!   (missing image-model credentials, placeholder source exhausted, the PDF
//!   could not be written). Returned as `Err(BookError)` from the top-level
//!   `generate*` functions.
//!
//! * [`SlotError`] — **Non-fatal**: one image slot exhausted both render
//!   attempts. Stored inside [`crate::output::SlotResult`] next to the
//!   placeholder bytes that filled the slot, so callers can see which pages
//!   are degraded without the batch ever failing.
//!
//! * [`ServiceError`] — transport-level: what a single call to a hosted model
//!   (or the placeholder source) actually returned. Produced by the provider
//!   clients, consumed by the retry state machine in
//!   [`crate::pipeline::render`].
//!
//! Idea-generation failures have no error type at all: that stage substitutes
//! the deterministic template and never fails (see [`crate::pipeline::ideas`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the crayonpress library.
///
/// Per-slot render failures use [`SlotError`] and are stored in
/// [`crate::output::SlotResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BookError {
    /// A required API key is absent from both config and environment.
    #[error("{service} API key missing.\nSet {var} or provide the key via BookConfig.")]
    MissingApiKey {
        service: &'static str,
        var: &'static str,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The last-resort placeholder source could not be reached.
    ///
    /// This is the only way the slot loop fails: both render attempts AND the
    /// stock-image fallback came back empty-handed, so the slot cannot be
    /// filled and the "always 1 + N images" contract cannot be honoured.
    #[error("Placeholder source '{url}' unavailable: {detail}\nEvery external image service is exhausted.")]
    PlaceholderUnavailable { url: String, detail: String },

    /// The PDF writer itself failed (not a per-page image problem).
    #[error("Document assembly failed: {detail}")]
    AssemblyFailed { detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image slot.
///
/// Recorded in [`crate::output::SlotResult`] when both render attempts failed
/// and the placeholder filled the slot instead. The batch always completes.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlotError {
    /// Both render attempts failed for this slot.
    #[error("Slot {slot}: render failed after {attempts} attempts: {detail}")]
    RenderFailed {
        slot: usize,
        attempts: u8,
        detail: String,
    },
}

/// What a single call to an external service returned.
///
/// The renderer makes no retry decisions itself — it reports one of these and
/// the state machine in [`crate::pipeline::render`] decides what happens next.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service answered with a non-success HTTP status.
    #[error("service returned HTTP {status}")]
    Http { status: u16 },

    /// The request could not complete (DNS, connect, TLS, body read).
    #[error("request failed: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The service answered 2xx but the payload was not usable.
    #[error("unusable response: {0}")]
    BadResponse(String),
}

impl ServiceError {
    /// Classify a reqwest error, preserving the timeout distinction so the
    /// caller's log line says what actually happened.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout { secs: timeout_secs }
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_names_the_env_var() {
        let e = BookError::MissingApiKey {
            service: "Hugging Face",
            var: "HF_API_KEY",
        };
        let msg = e.to_string();
        assert!(msg.contains("HF_API_KEY"), "got: {msg}");
        assert!(msg.contains("Hugging Face"));
    }

    #[test]
    fn slot_error_display() {
        let e = SlotError::RenderFailed {
            slot: 3,
            attempts: 2,
            detail: "service returned HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Slot 3"));
        assert!(msg.contains("2 attempts"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn placeholder_unavailable_display() {
        let e = BookError::PlaceholderUnavailable {
            url: "https://picsum.photos/800/600?grayscale".into(),
            detail: "request timed out after 60s".into(),
        };
        assert!(e.to_string().contains("picsum.photos"));
    }

    #[test]
    fn service_error_timeout_display() {
        let e = ServiceError::Timeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
