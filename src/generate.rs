//! Eager (whole-book) generation entry points.
//!
//! This is the simpler API: block until every slot is filled, assemble the
//! PDF, return everything at once. Use [`crate::stream::generate_slots`]
//! instead when slots should surface one at a time (a UI showing pages as
//! they arrive).
//!
//! The contract from the delivery surface's point of view: partial image
//! failures NEVER surface here — a degraded book comes back as `Ok` with
//! placeholder pages and honest stats. `Err` means the run could not produce
//! a book at all.

use crate::config::BookConfig;
use crate::error::BookError;
use crate::output::{BookOutput, ColoringBook, GenerationRequest, GenerationStats};
use crate::pipeline::{assemble, ideas, render};
use crate::providers::{
    GeminiClient, HuggingFaceClient, IdeaModel, ImageModel, PlaceholderSource, StockImageSource,
};
use crate::providers::huggingface::SamplingOptions;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Generate one coloring book.
///
/// # Returns
/// `Ok(BookOutput)` on success, even if some (or all) slots fell back to the
/// placeholder — check `output.stats.placeholder_slots`.
///
/// # Errors
/// Returns `Err(BookError)` only for fatal conditions:
/// - Image-model API key missing (config and environment)
/// - Placeholder source unreachable after a slot exhausted both attempts
/// - PDF assembly failure
pub async fn generate(
    request: &GenerationRequest,
    config: &BookConfig,
) -> Result<BookOutput, BookError> {
    let total_start = Instant::now();
    info!(
        "Starting book generation: '{}' for {}",
        request.theme, request.child_name
    );

    // ── Step 1: Resolve collaborators ────────────────────────────────────
    let idea_model = resolve_idea_model(config);
    let image_model = resolve_image_model(config)?;
    let placeholder = resolve_placeholder(config)?;

    let total_slots = 1 + config.page_count;
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(total_slots);
    }

    // ── Step 2: Scene ideas (never fails) ────────────────────────────────
    let idea_start = Instant::now();
    let (idea_set, idea_fallback) = ideas::generate_ideas(
        idea_model.as_ref(),
        &request.child_name,
        &request.theme,
        config.page_count,
    )
    .await;
    let idea_duration_ms = idea_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_ideas_ready(idea_set.page_ideas.len(), idea_fallback);
    }

    // ── Step 3: Fill every slot, strictly in order ───────────────────────
    let render_start = Instant::now();
    let mut slots = render::render_slots(&image_model, &placeholder, &idea_set, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let placeholder_slots = slots.iter().filter(|s| s.used_placeholder).count();
    let retried_slots = slots.iter().filter(|s| s.retries > 0).count();
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(slots.len(), placeholder_slots);
    }

    let cover = slots.remove(0);
    let book = ColoringBook {
        child_name: request.child_name.clone(),
        theme: request.theme.clone(),
        ideas: idea_set,
        cover,
        pages: slots,
    };

    // ── Step 4: Assemble the document ────────────────────────────────────
    let assembly_start = Instant::now();
    let pdf = assemble::assemble(&book)?;
    let assembly_duration_ms = assembly_start.elapsed().as_millis() as u64;

    let stats = GenerationStats {
        total_slots,
        rendered_slots: total_slots - placeholder_slots,
        placeholder_slots,
        retried_slots,
        idea_fallback,
        idea_duration_ms,
        render_duration_ms,
        assembly_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Book complete: {} slots ({} placeholder), {} KiB, {}ms total",
        stats.total_slots,
        stats.placeholder_slots,
        pdf.len() / 1024,
        stats.total_duration_ms
    );

    Ok(BookOutput {
        pdf_bytes: pdf.len(),
        pdf,
        book,
        stats,
    })
}

/// Generate a book and write the PDF directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    request: &GenerationRequest,
    output_path: impl AsRef<Path>,
    config: &BookConfig,
) -> Result<GenerationStats, BookError> {
    let output = generate(request, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BookError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| BookError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| BookError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &GenerationRequest,
    config: &BookConfig,
) -> Result<BookOutput, BookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BookError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(request, config))
}

// ── Collaborator resolution ──────────────────────────────────────────────

/// Resolve the language model, most-specific first:
/// injected model → config key → `GEMINI_API_KEY` env → none.
///
/// None is a valid outcome: the idea stage substitutes the local template.
pub(crate) fn resolve_idea_model(config: &BookConfig) -> Option<Arc<dyn IdeaModel>> {
    if let Some(ref model) = config.ideas {
        return Some(Arc::clone(model));
    }

    let key = config
        .gemini_api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
        .filter(|k| !k.is_empty())?;

    match GeminiClient::new(&config.text_model, &key, config.idea_timeout_secs) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("Could not build idea client ({e}); template ideas will be used");
            None
        }
    }
}

/// Resolve the image model: injected model → config key → `HF_API_KEY` env.
///
/// Missing credentials here are fatal — a book where every page is a stock
/// photo is a misconfiguration, not a degraded output.
pub(crate) fn resolve_image_model(config: &BookConfig) -> Result<Arc<dyn ImageModel>, BookError> {
    if let Some(ref model) = config.images {
        return Ok(Arc::clone(model));
    }

    let key = config
        .hf_api_key
        .clone()
        .or_else(|| std::env::var("HF_API_KEY").ok())
        .filter(|k| !k.is_empty())
        .ok_or(BookError::MissingApiKey {
            service: "Hugging Face",
            var: "HF_API_KEY",
        })?;

    let options = SamplingOptions {
        negative_prompt: config.negative_prompt.clone(),
        inference_steps: config.inference_steps,
        guidance_scale: config.guidance_scale,
    };

    let client = HuggingFaceClient::new(
        &config.image_model_url,
        &key,
        options,
        config.render_timeout_secs,
    )
    .map_err(|e| BookError::Internal(format!("image client: {e}")))?;

    Ok(Arc::new(client))
}

/// Resolve the placeholder source: injected source → configured URL.
pub(crate) fn resolve_placeholder(
    config: &BookConfig,
) -> Result<Arc<dyn PlaceholderSource>, BookError> {
    if let Some(ref source) = config.placeholder {
        return Ok(Arc::clone(source));
    }

    let source = StockImageSource::new(&config.placeholder_url, config.render_timeout_secs)
        .map_err(|e| BookError::Internal(format!("placeholder client: {e}")))?;

    Ok(Arc::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::progress::GenerationProgressCallback;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ── Fakes ────────────────────────────────────────────────────────────

    struct EchoImages;

    #[async_trait]
    impl ImageModel for EchoImages {
        async fn render(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
            Ok(prompt.as_bytes().to_vec())
        }
    }

    struct DeadImages;

    #[async_trait]
    impl ImageModel for DeadImages {
        async fn render(&self, _prompt: &str) -> Result<Vec<u8>, ServiceError> {
            Err(ServiceError::Http { status: 500 })
        }
    }

    struct DeadIdeas;

    #[async_trait]
    impl IdeaModel for DeadIdeas {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            Err(ServiceError::Timeout { secs: 30 })
        }
    }

    struct GoodIdeas;

    #[async_trait]
    impl IdeaModel for GoodIdeas {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            Ok(r#"{"coverIdea": "grand cover", "pageIdeas": ["p0","p1","p2","p3","p4"]}"#.into())
        }
    }

    struct GrayPlaceholder;

    #[async_trait]
    impl PlaceholderSource for GrayPlaceholder {
        async fn fetch(&self) -> Result<Vec<u8>, ServiceError> {
            Ok(b"gray".to_vec())
        }

        fn url(&self) -> &str {
            "fake://gray"
        }
    }

    fn base_config() -> crate::config::BookConfigBuilder {
        BookConfig::builder()
            .images(Arc::new(EchoImages))
            .placeholder(Arc::new(GrayPlaceholder))
            .ideas(Arc::new(GoodIdeas))
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Lily", "Space Dinosaurs")
    }

    // ── Tests ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn generate_returns_exactly_one_plus_page_count_images() {
        let config = base_config().build().unwrap();
        let output = generate(&request(), &config).await.unwrap();

        assert_eq!(output.book.slot_count(), 6);
        assert_eq!(output.book.pages.len(), output.book.ideas.page_ideas.len());
        assert_eq!(output.stats.total_slots, 6);
        assert!(output.pdf.starts_with(b"%PDF"));
        assert_eq!(output.pdf_bytes, output.pdf.len());
    }

    #[tokio::test]
    async fn slot_order_matches_idea_order() {
        let config = base_config().build().unwrap();
        let output = generate(&request(), &config).await.unwrap();
        let book = &output.book;

        assert_eq!(book.cover.slot, 0);
        assert_eq!(book.cover.idea, book.ideas.cover_idea);
        for (i, page) in book.pages.iter().enumerate() {
            assert_eq!(page.slot, i + 1);
            assert_eq!(page.idea, book.ideas.page_ideas[i]);
            // The echo model bakes the styled prompt into the bytes.
            assert!(page.image.ends_with(book.ideas.page_ideas[i].as_bytes()));
        }
    }

    #[tokio::test]
    async fn dead_language_model_yields_the_documented_template() {
        let config = base_config().ideas(Arc::new(DeadIdeas)).build().unwrap();
        let output = generate(&request(), &config).await.unwrap();

        assert!(output.stats.idea_fallback);
        assert_eq!(
            output.book.ideas,
            crate::prompts::fallback_ideas("Space Dinosaurs", "Lily", 5)
        );
        assert_eq!(
            output.book.ideas.cover_idea,
            "Big title text Space Dinosaurs coloring book for Lily, simple outlines"
        );
    }

    #[tokio::test]
    async fn all_renders_failing_twice_fills_every_slot_with_placeholder() {
        let config = base_config().images(Arc::new(DeadImages)).build().unwrap();
        let output = generate(&request(), &config).await.unwrap();

        assert_eq!(output.stats.total_slots, 6);
        assert_eq!(output.stats.placeholder_slots, 6);
        assert_eq!(output.stats.rendered_slots, 0);
        assert!(output.book.slots().all(|s| s.used_placeholder));
        assert!(output.book.slots().all(|s| s.image == b"gray"));
        assert!(output.pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn page_count_knob_scales_the_book() {
        let config = base_config()
            .ideas(Arc::new(DeadIdeas)) // template adapts to any count
            .page_count(8)
            .build()
            .unwrap();
        let output = generate(&request(), &config).await.unwrap();
        assert_eq!(output.book.slot_count(), 9);
        assert_eq!(output.book.ideas.page_ideas.len(), 8);
    }

    #[tokio::test]
    async fn progress_events_fire_for_every_slot() {
        struct Counting {
            starts: AtomicUsize,
            completes: AtomicUsize,
        }

        impl GenerationProgressCallback for Counting {
            fn on_slot_start(&self, _s: usize, _t: usize) {
                self.starts.fetch_add(1, Ordering::SeqCst);
            }
            fn on_slot_complete(&self, _s: usize, _t: usize, _b: usize, _p: bool) {
                self.completes.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counting {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
        });

        let config = base_config()
            .progress_callback(counter.clone())
            .build()
            .unwrap();
        generate(&request(), &config).await.unwrap();

        assert_eq!(counter.starts.load(Ordering::SeqCst), 6);
        assert_eq!(counter.completes.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn generate_to_file_writes_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lily.pdf");
        let config = base_config().build().unwrap();

        let stats = generate_to_file(&request(), &path, &config).await.unwrap();
        assert_eq!(stats.total_slots, 6);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // No stray temp file left behind.
        assert!(!path.with_extension("pdf.tmp").exists());
    }

    #[tokio::test]
    async fn missing_image_key_is_fatal() {
        std::env::remove_var("HF_API_KEY");
        let config = BookConfig::builder()
            .placeholder(Arc::new(GrayPlaceholder))
            .build()
            .unwrap();

        let err = generate(&request(), &config).await.unwrap_err();
        assert!(matches!(
            err,
            BookError::MissingApiKey { var: "HF_API_KEY", .. }
        ));
    }
}
