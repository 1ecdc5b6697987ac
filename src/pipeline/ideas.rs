//! Idea generation: one language-model call with a deterministic net under it.
//!
//! The contract is that this stage ALWAYS produces an [`IdeaSet`]. Every
//! failure mode — no API key, network error, non-JSON answer, missing fields,
//! fewer page ideas than requested — lands on the same local template
//! (`prompts::fallback_ideas`), so the rest of the pipeline never has to
//! reason about missing text. The degraded path is a warn-level log line,
//! not an error.

use crate::output::IdeaSet;
use crate::prompts;
use crate::providers::IdeaModel;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Wire shape the model is asked to produce.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdeas {
    cover_idea: String,
    page_ideas: Vec<String>,
}

/// Produce the idea set for one request.
///
/// `model` is None when no language-model credentials are configured — the
/// template is used directly. Returns the ideas and whether the fallback
/// supplied them.
pub async fn generate_ideas(
    model: Option<&Arc<dyn IdeaModel>>,
    child_name: &str,
    theme: &str,
    page_count: usize,
) -> (IdeaSet, bool) {
    let Some(model) = model else {
        warn!("No language model configured; using template ideas");
        return (prompts::fallback_ideas(theme, child_name, page_count), true);
    };

    let prompt = prompts::idea_prompt(child_name, theme, page_count);

    match model.complete(&prompt).await {
        Ok(raw) => match parse_ideas(&raw, page_count) {
            Some(ideas) => {
                debug!("Model produced {} page ideas", ideas.page_ideas.len());
                (ideas, false)
            }
            None => {
                warn!("Idea response unusable; using template ideas");
                (prompts::fallback_ideas(theme, child_name, page_count), true)
            }
        },
        Err(e) => {
            warn!("Idea generation failed ({e}); using template ideas");
            (prompts::fallback_ideas(theme, child_name, page_count), true)
        }
    }
}

/// Parse the model's answer into an [`IdeaSet`] holding exactly `page_count`
/// page ideas.
///
/// Models that return extra ideas are truncated; fewer than requested (or an
/// empty cover) is treated the same as a parse failure so the
/// `pages == page_count` invariant holds without padding.
fn parse_ideas(raw: &str, page_count: usize) -> Option<IdeaSet> {
    let cleaned = strip_code_fences(raw);
    let wire: WireIdeas = serde_json::from_str(cleaned).ok()?;

    if wire.cover_idea.trim().is_empty() || wire.page_ideas.len() < page_count {
        return None;
    }

    let mut page_ideas = wire.page_ideas;
    page_ideas.truncate(page_count);

    Some(IdeaSet {
        cover_idea: wire.cover_idea,
        page_ideas,
    })
}

/// Strip a surrounding ``` fence (with or without a `json` tag).
///
/// Models wrap JSON in fences despite instructions not to; everything before
/// the first fence line and after the closing fence is discarded.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", …) up to the first newline.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;

    struct CannedModel(Result<String, ()>);

    #[async_trait]
    impl IdeaModel for CannedModel {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            self.0
                .clone()
                .map_err(|_| ServiceError::Http { status: 503 })
        }
    }

    fn ideas_json(pages: usize) -> String {
        let page_ideas: Vec<String> = (0..pages).map(|i| format!("\"scene {i}\"")).collect();
        format!(
            r#"{{"coverIdea": "a grand cover", "pageIdeas": [{}]}}"#,
            page_ideas.join(",")
        )
    }

    #[test]
    fn fences_stripped_with_and_without_tag() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn parse_accepts_exact_count() {
        let ideas = parse_ideas(&ideas_json(5), 5).unwrap();
        assert_eq!(ideas.cover_idea, "a grand cover");
        assert_eq!(ideas.page_ideas.len(), 5);
    }

    #[test]
    fn parse_truncates_extra_ideas() {
        let ideas = parse_ideas(&ideas_json(8), 5).unwrap();
        assert_eq!(ideas.page_ideas.len(), 5);
        assert_eq!(ideas.page_ideas[4], "scene 4");
    }

    #[test]
    fn parse_rejects_short_or_empty_sets() {
        assert!(parse_ideas(&ideas_json(3), 5).is_none());
        assert!(parse_ideas(r#"{"coverIdea": "", "pageIdeas": ["a","b","c","d","e"]}"#, 5).is_none());
        assert!(parse_ideas("not json at all", 5).is_none());
    }

    #[tokio::test]
    async fn model_success_is_used_verbatim() {
        let model: Arc<dyn IdeaModel> = Arc::new(CannedModel(Ok(ideas_json(5))));
        let (ideas, fallback) = generate_ideas(Some(&model), "Lily", "Space Dinosaurs", 5).await;
        assert!(!fallback);
        assert_eq!(ideas.cover_idea, "a grand cover");
    }

    #[tokio::test]
    async fn model_failure_yields_exact_template() {
        let model: Arc<dyn IdeaModel> = Arc::new(CannedModel(Err(())));
        let (ideas, fallback) = generate_ideas(Some(&model), "Lily", "Space Dinosaurs", 5).await;
        assert!(fallback);
        assert_eq!(ideas, prompts::fallback_ideas("Space Dinosaurs", "Lily", 5));
    }

    #[tokio::test]
    async fn fenced_response_still_parses() {
        let fenced = format!("```json\n{}\n```", ideas_json(5));
        let model: Arc<dyn IdeaModel> = Arc::new(CannedModel(Ok(fenced)));
        let (ideas, fallback) = generate_ideas(Some(&model), "Lily", "Robots", 5).await;
        assert!(!fallback);
        assert_eq!(ideas.page_ideas.len(), 5);
    }

    #[tokio::test]
    async fn missing_model_uses_template() {
        let (ideas, fallback) = generate_ideas(None, "Lily", "Space Dinosaurs", 5).await;
        assert!(fallback);
        assert_eq!(
            ideas.cover_idea,
            "Big title text Space Dinosaurs coloring book for Lily, simple outlines"
        );
        assert_eq!(ideas.page_ideas.len(), 5);
    }
}
