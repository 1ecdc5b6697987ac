//! Streaming generation API: emit slots as they are filled.
//!
//! ## Why stream?
//!
//! A six-image book takes tens of seconds of sequential model calls. A
//! stream-based API lets callers show each page the moment it exists (the
//! interactive UI case) instead of staring at a spinner until the whole PDF
//! is done. Slots arrive strictly in document order — rendering is
//! sequential by design — so no sorting is needed on the consumer side.
//!
//! Document assembly is NOT part of this API: callers that want the PDF
//! should use [`crate::generate::generate`].

use crate::config::BookConfig;
use crate::error::BookError;
use crate::output::{GenerationRequest, SlotResult};
use crate::pipeline::{ideas, render};
use crate::prompts;
use std::pin::Pin;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of slot results, in document order (cover first).
pub type SlotStream = Pin<Box<dyn Stream<Item = Result<SlotResult, BookError>> + Send>>;

/// Fill the book's slots, yielding each as it completes.
///
/// Provider resolution failures (e.g. missing image-model key) surface
/// immediately as `Err`. A fatal error mid-run (placeholder source down) is
/// yielded as the final stream item, after which the stream ends. Per-slot
/// render failures are not errors — they arrive as placeholder-filled slots.
pub async fn generate_slots(
    request: &GenerationRequest,
    config: &BookConfig,
) -> Result<SlotStream, BookError> {
    info!(
        "Starting streaming generation: '{}' for {}",
        request.theme, request.child_name
    );

    let idea_model = crate::generate::resolve_idea_model(config);
    let images = crate::generate::resolve_image_model(config)?;
    let placeholder = crate::generate::resolve_placeholder(config)?;

    let request = request.clone();
    let config = config.clone();

    // Capacity 1: rendering is sequential and slow; there is nothing to
    // buffer ahead of a consumer that keeps up.
    let (tx, rx) = tokio::sync::mpsc::channel(1);

    tokio::spawn(async move {
        let total_slots = 1 + config.page_count;
        if let Some(ref cb) = config.progress_callback {
            cb.on_generation_start(total_slots);
        }

        let (idea_set, fallback) = ideas::generate_ideas(
            idea_model.as_ref(),
            &request.child_name,
            &request.theme,
            config.page_count,
        )
        .await;

        if let Some(ref cb) = config.progress_callback {
            cb.on_ideas_ready(idea_set.page_ideas.len(), fallback);
        }

        let style = config
            .style_preamble
            .as_deref()
            .unwrap_or(prompts::STYLE_PREAMBLE);

        let slot_ideas = std::iter::once(idea_set.cover_idea.clone())
            .chain(idea_set.page_ideas.iter().cloned());

        let mut placeholder_slots = 0usize;
        for (slot, idea) in slot_ideas.enumerate() {
            if let Some(ref cb) = config.progress_callback {
                cb.on_slot_start(slot, total_slots);
            }

            let prompt = prompts::styled_image_prompt(style, &idea);
            match render::fill_slot(&images, &placeholder, slot, &idea, &prompt).await {
                Ok(result) => {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_slot_complete(
                            slot,
                            total_slots,
                            result.image_bytes,
                            result.used_placeholder,
                        );
                    }
                    placeholder_slots += usize::from(result.used_placeholder);
                    if tx.send(Ok(result)).await.is_err() {
                        return; // receiver dropped; stop rendering
                    }
                }
                Err(fatal) => {
                    let _ = tx.send(Err(fatal)).await;
                    return;
                }
            }
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_generation_complete(total_slots, placeholder_slots);
        }
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}
