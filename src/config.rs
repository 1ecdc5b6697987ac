//! Configuration for coloring-book generation.
//!
//! All behaviour is controlled through [`BookConfig`], built via its
//! [`BookConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share a config across requests (the server holds one per process) and
//! to see in one place what a run will do.
//!
//! The retry policy is deliberately NOT configurable: one retry, then the
//! placeholder. That contract is part of the pipeline's shape, not a knob.

use crate::error::BookError;
use crate::progress::ProgressCallback;
use crate::providers::{IdeaModel, ImageModel, PlaceholderSource};
use std::fmt;
use std::sync::Arc;

/// Default number of content pages per book (cover excluded).
pub const DEFAULT_PAGE_COUNT: usize = 5;

/// Default language model for scene ideas.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";

/// Default text-to-image endpoint.
pub const DEFAULT_IMAGE_MODEL_URL: &str =
    "https://router.huggingface.co/hf-inference/models/black-forest-labs/FLUX.1-schnell";

/// Default stock-image source used when rendering fails twice for a slot.
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://picsum.photos/800/600?grayscale";

/// Configuration for one or many generation runs.
///
/// Built via [`BookConfig::builder()`] or [`BookConfig::default()`].
///
/// # Example
/// ```rust
/// use crayonpress::BookConfig;
///
/// let config = BookConfig::builder()
///     .page_count(6)
///     .render_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BookConfig {
    /// Content pages per book, cover excluded. Range: 1–12. Default: 5.
    ///
    /// Twelve is a practical ceiling: image models are the slow, billable
    /// part, and the sequential pipeline renders one slot at a time.
    pub page_count: usize,

    /// Language-model identifier for scene ideas. Default: `gemini-1.5-flash`.
    pub text_model: String,

    /// Full URL of the text-to-image inference endpoint.
    pub image_model_url: String,

    /// Unauthenticated GET returning a generic grayscale image; last-resort
    /// filler for a slot whose render failed twice.
    pub placeholder_url: String,

    /// Override for the style preamble prepended to every image prompt.
    /// If None, [`crate::prompts::STYLE_PREAMBLE`] is used.
    pub style_preamble: Option<String>,

    /// Negative prompt passed to the image service where supported.
    /// Default: [`crate::prompts::DEFAULT_NEGATIVE_PROMPT`].
    pub negative_prompt: Option<String>,

    /// Sampling steps for the image service, where supported. Default: unset.
    pub inference_steps: Option<u32>,

    /// Guidance scale for the image service, where supported. Default: unset.
    pub guidance_scale: Option<f32>,

    /// Language-model API key. Falls back to `GEMINI_API_KEY`. A missing text
    /// key is NOT fatal: the idea stage substitutes the local template.
    pub gemini_api_key: Option<String>,

    /// Image-model API key. Falls back to `HF_API_KEY`. Missing is fatal —
    /// without it every page would be a stock photo, which is a
    /// misconfiguration, not a book.
    pub hf_api_key: Option<String>,

    /// Timeout for the single idea-generation call. Default: 30.
    pub idea_timeout_secs: u64,

    /// Per-image-call timeout. A timeout counts as a render failure and
    /// enters the retry/fallback path. Default: 60.
    pub render_timeout_secs: u64,

    /// Pre-constructed idea model. Takes precedence over `gemini_api_key`.
    pub ideas: Option<Arc<dyn IdeaModel>>,

    /// Pre-constructed image model. Takes precedence over `hf_api_key`.
    pub images: Option<Arc<dyn ImageModel>>,

    /// Pre-constructed placeholder source. Takes precedence over
    /// `placeholder_url`.
    pub placeholder: Option<Arc<dyn PlaceholderSource>>,

    /// Progress events for each slot; None means no events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            page_count: DEFAULT_PAGE_COUNT,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model_url: DEFAULT_IMAGE_MODEL_URL.to_string(),
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            style_preamble: None,
            negative_prompt: Some(crate::prompts::DEFAULT_NEGATIVE_PROMPT.to_string()),
            inference_steps: None,
            guidance_scale: None,
            gemini_api_key: None,
            hf_api_key: None,
            idea_timeout_secs: 30,
            render_timeout_secs: 60,
            ideas: None,
            images: None,
            placeholder: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookConfig")
            .field("page_count", &self.page_count)
            .field("text_model", &self.text_model)
            .field("image_model_url", &self.image_model_url)
            .field("placeholder_url", &self.placeholder_url)
            .field("style_preamble", &self.style_preamble)
            .field("negative_prompt", &self.negative_prompt)
            .field("inference_steps", &self.inference_steps)
            .field("guidance_scale", &self.guidance_scale)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("hf_api_key", &self.hf_api_key.as_ref().map(|_| "<set>"))
            .field("idea_timeout_secs", &self.idea_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("ideas", &self.ideas.as_ref().map(|_| "<dyn IdeaModel>"))
            .field("images", &self.images.as_ref().map(|_| "<dyn ImageModel>"))
            .field(
                "placeholder",
                &self.placeholder.as_ref().map(|_| "<dyn PlaceholderSource>"),
            )
            .finish()
    }
}

impl BookConfig {
    /// Create a new builder for `BookConfig`.
    pub fn builder() -> BookConfigBuilder {
        BookConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BookConfig`].
#[derive(Debug)]
pub struct BookConfigBuilder {
    config: BookConfig,
}

impl BookConfigBuilder {
    pub fn page_count(mut self, n: usize) -> Self {
        self.config.page_count = n.clamp(1, 12);
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn image_model_url(mut self, url: impl Into<String>) -> Self {
        self.config.image_model_url = url.into();
        self
    }

    pub fn placeholder_url(mut self, url: impl Into<String>) -> Self {
        self.config.placeholder_url = url.into();
        self
    }

    pub fn style_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.config.style_preamble = Some(preamble.into());
        self
    }

    pub fn negative_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.negative_prompt = Some(prompt.into());
        self
    }

    /// Send no negative prompt at all (some backends reject the parameter).
    pub fn no_negative_prompt(mut self) -> Self {
        self.config.negative_prompt = None;
        self
    }

    pub fn inference_steps(mut self, steps: u32) -> Self {
        self.config.inference_steps = Some(steps);
        self
    }

    pub fn guidance_scale(mut self, scale: f32) -> Self {
        self.config.guidance_scale = Some(scale);
        self
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn hf_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.hf_api_key = Some(key.into());
        self
    }

    pub fn idea_timeout_secs(mut self, secs: u64) -> Self {
        self.config.idea_timeout_secs = secs.max(1);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn ideas(mut self, model: Arc<dyn IdeaModel>) -> Self {
        self.config.ideas = Some(model);
        self
    }

    pub fn images(mut self, model: Arc<dyn ImageModel>) -> Self {
        self.config.images = Some(model);
        self
    }

    pub fn placeholder(mut self, source: Arc<dyn PlaceholderSource>) -> Self {
        self.config.placeholder = Some(source);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BookConfig, BookError> {
        let c = &self.config;
        if c.page_count == 0 || c.page_count > 12 {
            return Err(BookError::InvalidConfig(format!(
                "page_count must be 1–12, got {}",
                c.page_count
            )));
        }
        if c.image_model_url.is_empty() {
            return Err(BookError::InvalidConfig(
                "image_model_url must not be empty".into(),
            ));
        }
        if c.placeholder_url.is_empty() && c.placeholder.is_none() {
            return Err(BookError::InvalidConfig(
                "placeholder_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_policy() {
        let c = BookConfig::default();
        assert_eq!(c.page_count, 5);
        assert_eq!(c.text_model, "gemini-1.5-flash");
        assert!(c.negative_prompt.is_some());
        assert!(c.inference_steps.is_none());
        assert_eq!(c.idea_timeout_secs, 30);
        assert_eq!(c.render_timeout_secs, 60);
    }

    #[test]
    fn builder_clamps_page_count() {
        let c = BookConfig::builder().page_count(99).build().unwrap();
        assert_eq!(c.page_count, 12);
        let c = BookConfig::builder().page_count(0).build().unwrap();
        assert_eq!(c.page_count, 1);
    }

    #[test]
    fn builder_clamps_timeouts() {
        let c = BookConfig::builder()
            .idea_timeout_secs(0)
            .render_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.idea_timeout_secs, 1);
        assert_eq!(c.render_timeout_secs, 1);
    }

    #[test]
    fn build_rejects_empty_image_endpoint() {
        let err = BookConfig::builder().image_model_url("").build().unwrap_err();
        assert!(err.to_string().contains("image_model_url"));
    }

    #[test]
    fn debug_redacts_keys() {
        let c = BookConfig::builder().hf_api_key("hf_secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hf_secret"));
        assert!(dbg.contains("<set>"));
    }

    #[test]
    fn no_negative_prompt_clears_default() {
        let c = BookConfig::builder().no_negative_prompt().build().unwrap();
        assert!(c.negative_prompt.is_none());
    }
}
