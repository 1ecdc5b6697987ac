//! Progress-callback trait for per-slot generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::BookConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline fills each image slot.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, or a terminal progress bar
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so one config (and therefore one
//! callback) can be shared across server requests.

use std::sync::Arc;

/// Called by the pipeline as it works through a book.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Slots are rendered strictly sequentially, so events
/// for a single request arrive in slot order; a server handling several
/// requests against one shared config may interleave events from different
/// runs, so implementations holding mutable state still need synchronisation.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once, before idea generation, with the number of image slots
    /// the run will fill (cover + pages).
    fn on_generation_start(&self, total_slots: usize) {
        let _ = total_slots;
    }

    /// Called when the idea set is ready.
    ///
    /// `fallback` is true when the language-model path failed and the local
    /// template supplied the ideas.
    fn on_ideas_ready(&self, page_count: usize, fallback: bool) {
        let _ = (page_count, fallback);
    }

    /// Called just before rendering begins for a slot (0 = cover).
    fn on_slot_start(&self, slot: usize, total_slots: usize) {
        let _ = (slot, total_slots);
    }

    /// Called when a slot has been filled.
    ///
    /// `used_placeholder` is true when both render attempts failed and the
    /// stock image filled the slot.
    fn on_slot_complete(
        &self,
        slot: usize,
        total_slots: usize,
        image_bytes: usize,
        used_placeholder: bool,
    ) {
        let _ = (slot, total_slots, image_bytes, used_placeholder);
    }

    /// Called once after every slot has been filled, before PDF assembly.
    fn on_generation_complete(&self, total_slots: usize, placeholder_slots: usize) {
        let _ = (total_slots, placeholder_slots);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BookConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
