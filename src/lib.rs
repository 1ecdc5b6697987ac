//! # crayonpress
//!
//! Generate themed children's coloring books: scene ideas from a language
//! model, line-art images from a text-to-image model, assembled into a
//! printable PDF.
//!
//! ## Why this crate?
//!
//! Hosted generative APIs fail constantly — rate limits, cold models, flaky
//! networks — and a child waiting for a coloring book does not care. The
//! pipeline here is built so that a request that starts always finishes with
//! a complete book: ideas fall back to a deterministic local template,
//! each image gets one retry and then a stock placeholder, and a page whose
//! bytes won't decode is left blank rather than sinking the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! (child name, theme)
//!  │
//!  ├─ 1. Ideas     one LLM call → {coverIdea, pageIdeas[N]};
//!  │               any failure → local template (never fails)
//!  ├─ 2. Render    per slot, sequentially: attempt → retry → placeholder
//!  ├─ 3. Assemble  title page + one page per slot, aspect-fit, centred
//!  └─ 4. Deliver   PDF bytes (library) / file (CLI) / HTTP (server feature)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use crayonpress::{generate, BookConfig, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Keys read from GEMINI_API_KEY (optional) and HF_API_KEY (required)
//!     let config = BookConfig::default();
//!     let request = GenerationRequest::new("Lily", "Space Dinosaurs");
//!     let output = generate(&request, &config).await?;
//!     std::fs::write("lily.pdf", &output.pdf)?;
//!     eprintln!(
//!         "{} pages, {} placeholders",
//!         output.stats.total_slots, output.stats.placeholder_slots
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `crayonpress` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | off     | Enables [`server`]: `POST /generate-book` over actix-web |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! crayonpress = { version = "0.3", default-features = false }
//! ```
//!
//! ## Degradation ladder
//!
//! | Failure | Recovery | Visible as |
//! |---------|----------|------------|
//! | Idea call fails / bad JSON | deterministic template | `stats.idea_fallback` |
//! | Image call fails once | one retry | `SlotResult::retries` |
//! | Image call fails twice | stock placeholder | `SlotResult::used_placeholder` |
//! | Image bytes won't decode | blank page | warn log |
//! | Placeholder source down | **fatal** | `BookError::PlaceholderUnavailable` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BookConfig, BookConfigBuilder};
pub use error::{BookError, ServiceError, SlotError};
pub use generate::{generate, generate_sync, generate_to_file};
pub use output::{BookOutput, ColoringBook, GenerationRequest, GenerationStats, IdeaSet, SlotResult};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{generate_slots, SlotStream};
