//! Prompt text and fallback templates for book generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the house style (e.g. tightening
//!    the line-art preamble) requires editing exactly one place.
//!
//! 2. **Testability** — the fallback templates are pure functions of
//!    `(theme, child_name)`, so the degraded-mode output is asserted exactly
//!    in unit tests without any network mocking.
//!
//! Callers can override the style preamble and negative prompt via
//! [`crate::config::BookConfig`]; the constants here apply when no override
//! is provided.

use crate::output::IdeaSet;

/// Style preamble prepended to every image prompt.
///
/// The image model is biased hard toward flat, printable line art. Some
/// backends ignore negative prompts, so the positive prompt also carries the
/// "no shading / monochrome" constraints.
pub const STYLE_PREAMBLE: &str = "kids coloring book page, heavy black outlines, \
stark white background, simple line art, vector style, no shading, no grayscale, \
monochrome, 2d, flat design, minimalist, cute, masterpiece. Subject: ";

/// Default negative prompt, sent where the image service supports one.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "color, shading, gradients, photorealistic, \
background clutter, text, watermark, signature";

/// Build the idea-generation prompt for the language model.
///
/// The model is asked for strict JSON (`coverIdea` + `pageIdeas`); the
/// response MIME type is additionally pinned to JSON at the request level by
/// [`crate::providers::gemini`]. The five scene archetypes keep page subjects
/// varied without dictating content.
pub fn idea_prompt(child_name: &str, theme: &str, page_count: usize) -> String {
    format!(
        r#"Create a coloring book for a child named {child_name}. Theme: "{theme}".
Generate {page_count} UNIQUE scene ideas plus one cover idea.
IMPORTANT: The descriptions must be for SIMPLE LINE ART. Focus on shapes, ignore lighting.
Vary the scenes across these archetypes:
1. Landscape/Background (Simple)
2. Object/Vehicle (Iconic)
3. Character close-up (Cute)
4. Action scene (Clear)
5. Pattern/Items (Simple)
Return ONLY a JSON object: {{"coverIdea": string, "pageIdeas": [{page_count} strings]}}."#
    )
}

/// Canned page-scene templates, interpolated with the theme.
///
/// Exactly five archetypes; [`fallback_ideas`] cycles them when more pages
/// are requested, so any page count yields a deterministic idea set.
const FALLBACK_PAGE_TEMPLATES: [&str; 5] = [
    "Simple landscape of {theme} world, thick lines",
    "Cute {theme} character face, simple vector",
    "A single {theme} object in the center, white background",
    "{theme} running fast, motion lines, simple",
    "Pattern of small {theme} icons, minimalist",
];

/// Deterministic idea set used when the language model path fails.
///
/// Pure string interpolation of `(theme, child_name)` — the pipeline never
/// stalls on text generation, and tests can assert the degraded output
/// byte-for-byte.
pub fn fallback_ideas(theme: &str, child_name: &str, page_count: usize) -> IdeaSet {
    let page_ideas = FALLBACK_PAGE_TEMPLATES
        .iter()
        .cycle()
        .take(page_count)
        .map(|t| t.replace("{theme}", theme))
        .collect();

    IdeaSet {
        cover_idea: format!("Big title text {theme} coloring book for {child_name}, simple outlines"),
        page_ideas,
    }
}

/// Wrap one scene idea in the style preamble for the image model.
pub fn styled_image_prompt(style_preamble: &str, idea: &str) -> String {
    format!("{style_preamble}{idea}")
}
