//! Slot rendering: the one-retry-then-placeholder state machine.
//!
//! ## Why an explicit state machine?
//!
//! The retry policy is the load-bearing contract of this crate, so it is
//! written as states rather than nested error handlers: a slot is in
//! [`Attempt::First`], [`Attempt::Second`], or [`Attempt::Fallback`], and the
//! transitions are visible in one `match`. Fixed policy, no knobs.
//!
//! ## Ordering
//!
//! Slots are filled strictly sequentially — cover, then pages in idea order —
//! with exactly one network call in flight at a time. Slot order maps
//! directly to document page order, so no reordering happens anywhere
//! downstream.
//!
//! [`fill_slot`] always returns a filled slot; the only error it can return
//! is the fatal "placeholder source is down too" case.

use crate::config::BookConfig;
use crate::error::{BookError, SlotError};
use crate::output::{IdeaSet, SlotResult};
use crate::prompts;
use crate::providers::{ImageModel, PlaceholderSource};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Where a slot currently is in the retry ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Second,
    Fallback,
}

/// Fill one image slot: render, retry once, then fetch the placeholder.
///
/// `idea` is the bare scene description (kept for the output record);
/// `prompt` is the styled prompt actually sent to the image model.
pub async fn fill_slot(
    images: &Arc<dyn ImageModel>,
    placeholder: &Arc<dyn PlaceholderSource>,
    slot: usize,
    idea: &str,
    prompt: &str,
) -> Result<SlotResult, BookError> {
    let start = Instant::now();
    let mut attempt = Attempt::First;
    let mut last_err = String::new();

    loop {
        match attempt {
            Attempt::First | Attempt::Second => match images.render(prompt).await {
                Ok(image) => {
                    let retries = u8::from(attempt == Attempt::Second);
                    debug!("Slot {slot}: rendered {} bytes (retries={retries})", image.len());
                    return Ok(SlotResult {
                        slot,
                        idea: idea.to_string(),
                        image_bytes: image.len(),
                        image,
                        retries,
                        used_placeholder: false,
                        duration_ms: start.elapsed().as_millis() as u64,
                        error: None,
                    });
                }
                Err(e) => {
                    last_err = e.to_string();
                    if attempt == Attempt::First {
                        warn!("Slot {slot}: render failed ({last_err}); retrying");
                        attempt = Attempt::Second;
                    } else {
                        warn!("Slot {slot}: retry failed ({last_err}); using placeholder");
                        attempt = Attempt::Fallback;
                    }
                }
            },
            Attempt::Fallback => {
                let image = placeholder.fetch().await.map_err(|e| {
                    BookError::PlaceholderUnavailable {
                        url: placeholder.url().to_string(),
                        detail: e.to_string(),
                    }
                })?;

                return Ok(SlotResult {
                    slot,
                    idea: idea.to_string(),
                    image_bytes: image.len(),
                    image,
                    retries: 1,
                    used_placeholder: true,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: Some(SlotError::RenderFailed {
                        slot,
                        attempts: 2,
                        detail: last_err.clone(),
                    }),
                });
            }
        }
    }
}

/// Fill every slot for the given idea set, in document order.
///
/// Returns exactly `ideas.slot_count()` results: slot 0 (cover) first, then
/// one per page idea. Emits progress events through the config's callback.
pub async fn render_slots(
    images: &Arc<dyn ImageModel>,
    placeholder: &Arc<dyn PlaceholderSource>,
    ideas: &IdeaSet,
    config: &BookConfig,
) -> Result<Vec<SlotResult>, BookError> {
    let style = config
        .style_preamble
        .as_deref()
        .unwrap_or(prompts::STYLE_PREAMBLE);
    let total_slots = ideas.slot_count();

    let mut results = Vec::with_capacity(total_slots);

    let slot_ideas = std::iter::once(ideas.cover_idea.as_str())
        .chain(ideas.page_ideas.iter().map(String::as_str));

    for (slot, idea) in slot_ideas.enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_slot_start(slot, total_slots);
        }

        let prompt = prompts::styled_image_prompt(style, idea);
        let result = fill_slot(images, placeholder, slot, idea, &prompt).await?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_slot_complete(slot, total_slots, result.image_bytes, result.used_placeholder);
        }

        results.push(result);
    }

    Ok(results)
}
