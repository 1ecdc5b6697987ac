//! Output types: what one generation run produces.
//!
//! Everything here is a plain data carrier. The pipeline builds these once
//! and never mutates them afterwards — a [`ColoringBook`] exists only for the
//! lifetime of one request. Serde derives exist for the CLI `--json` mode and
//! for callers that want to log a run; raw image/PDF bytes are skipped during
//! serialisation (the JSON view reports sizes, not payloads).

use crate::error::SlotError;
use serde::{Deserialize, Serialize};

/// One coloring-book order: who it is for and what it is about.
///
/// The core pipeline accepts these as-is; non-empty validation is the
/// delivery surface's job (CLI argument parsing, HTTP 400s).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub child_name: String,
    pub theme: String,
}

impl GenerationRequest {
    pub fn new(child_name: impl Into<String>, theme: impl Into<String>) -> Self {
        Self {
            child_name: child_name.into(),
            theme: theme.into(),
        }
    }
}

/// The scene ideas for one book: a cover idea plus one idea per page.
///
/// Produced exactly once per request — either parsed from the language model
/// or interpolated from the local template — and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaSet {
    pub cover_idea: String,
    pub page_ideas: Vec<String>,
}

impl IdeaSet {
    /// Total image slots this idea set requires: cover + one per page idea.
    pub fn slot_count(&self) -> usize {
        1 + self.page_ideas.len()
    }
}

/// One filled image slot.
///
/// Slot 0 is the cover; slots 1..N are content pages in idea order. The
/// image is never empty: if both render attempts failed, `used_placeholder`
/// is true, `image` holds the stock bytes, and `error` records what went
/// wrong with the real renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResult {
    /// 0 = cover, 1..N = content pages.
    pub slot: usize,
    /// The scene idea this slot was rendered from (without the style preamble).
    pub idea: String,
    /// Raw image bytes (PNG or JPEG, whatever the service returned).
    #[serde(skip)]
    pub image: Vec<u8>,
    /// Byte length of `image`, for the serialised view.
    pub image_bytes: usize,
    /// 0 if the first attempt succeeded, 1 if the retry was needed.
    pub retries: u8,
    /// True when the stock placeholder filled this slot.
    pub used_placeholder: bool,
    /// Wall-clock time spent on this slot, including retries and fallback.
    pub duration_ms: u64,
    /// The failure that forced the placeholder, if any.
    pub error: Option<SlotError>,
}

/// The finished book content, in page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColoringBook {
    pub child_name: String,
    pub theme: String,
    pub ideas: IdeaSet,
    pub cover: SlotResult,
    pub pages: Vec<SlotResult>,
}

impl ColoringBook {
    /// Total image slots: cover + pages. Always `1 + ideas.page_ideas.len()`.
    pub fn slot_count(&self) -> usize {
        1 + self.pages.len()
    }

    /// All slots in document order, cover first.
    pub fn slots(&self) -> impl Iterator<Item = &SlotResult> {
        std::iter::once(&self.cover).chain(self.pages.iter())
    }

    /// Slots filled by the stock placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.slots().filter(|s| s.used_placeholder).count()
    }
}

/// Aggregate counters for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Image slots in the book (cover + pages).
    pub total_slots: usize,
    /// Slots filled by the image model (first try or retry).
    pub rendered_slots: usize,
    /// Slots filled by the stock placeholder.
    pub placeholder_slots: usize,
    /// Slots that needed the second attempt (whether or not it succeeded).
    pub retried_slots: usize,
    /// True when the language model path failed and the local template was used.
    pub idea_fallback: bool,
    pub idea_duration_ms: u64,
    pub render_duration_ms: u64,
    pub assembly_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything `generate` returns: the PDF, the book content behind it, and
/// the run counters.
#[derive(Debug, Clone, Serialize)]
pub struct BookOutput {
    /// The finished printable document.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// Byte length of `pdf`, for the serialised view.
    pub pdf_bytes: usize,
    pub book: ColoringBook,
    pub stats: GenerationStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(i: usize, placeholder: bool) -> SlotResult {
        SlotResult {
            slot: i,
            idea: format!("idea {i}"),
            image: vec![0u8; 8],
            image_bytes: 8,
            retries: 0,
            used_placeholder: placeholder,
            duration_ms: 1,
            error: None,
        }
    }

    #[test]
    fn slots_iterate_cover_first() {
        let book = ColoringBook {
            child_name: "Lily".into(),
            theme: "Space Dinosaurs".into(),
            ideas: IdeaSet {
                cover_idea: "c".into(),
                page_ideas: vec!["a".into(), "b".into()],
            },
            cover: slot(0, false),
            pages: vec![slot(1, true), slot(2, false)],
        };

        let order: Vec<usize> = book.slots().map(|s| s.slot).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(book.slot_count(), 3);
        assert_eq!(book.placeholder_count(), 1);
    }

    #[test]
    fn idea_set_slot_count_includes_cover() {
        let ideas = IdeaSet {
            cover_idea: "cover".into(),
            page_ideas: vec!["p1".into(); 5],
        };
        assert_eq!(ideas.slot_count(), 6);
    }

    #[test]
    fn serialised_slot_omits_image_bytes() {
        let json = serde_json::to_string(&slot(1, false)).unwrap();
        assert!(json.contains("\"image_bytes\":8"));
        assert!(!json.contains("\"image\":"));
    }
}
