//! Script generation for the pipeline's first stage.
//!
//! The pipeline treats content generation as an external collaborator behind
//! the [`ContentGenerator`] trait; an LLM-backed implementation plugs in at
//! this seam. [`TemplateContentGenerator`] is the built-in deterministic
//! implementation: a hook/body/call-to-action script split into one scene per
//! segment.

use async_trait::async_trait;
use reelforge_common::ReelStyle;
use serde::{Deserialize, Serialize};

/// One timed segment of a generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub text: String,
    pub duration_seconds: f64,
}

/// The result of content generation for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScript {
    /// Full narration text.
    pub script: String,
    /// Ordered scenes, used by the render worker for overlay timing.
    pub scenes: Vec<Scene>,
}

/// Async trait for script generators.
///
/// Implementations are expected to be cheaply shareable behind an `Arc`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce a narration script for a topic in a given style.
    async fn generate(
        &self,
        topic: &str,
        style: ReelStyle,
        duration_seconds: u32,
    ) -> anyhow::Result<GeneratedScript>;
}

/// Deterministic template-based generator.
///
/// Three segments (hook, body, call to action) with style-flavoured wording;
/// scene durations split the requested duration evenly.
#[derive(Debug, Default)]
pub struct TemplateContentGenerator;

impl TemplateContentGenerator {
    fn segments(topic: &str, style: ReelStyle) -> [String; 3] {
        match style {
            ReelStyle::Modern => [
                format!("Here's what nobody tells you about {topic}."),
                format!(
                    "{topic} is changing faster than most people realize, \
                     and the gap between those who adapt and those who don't keeps growing."
                ),
                format!("Follow for more on {topic} before everyone else catches up."),
            ],
            ReelStyle::Tech => [
                format!("The tech behind {topic}, explained in under a minute."),
                format!(
                    "Under the hood, {topic} combines a handful of simple ideas \
                     that compound into something genuinely powerful."
                ),
                format!("Save this if you're building with {topic}."),
            ],
            ReelStyle::Educational => [
                format!("Three things worth knowing about {topic}."),
                format!(
                    "Start with the fundamentals of {topic}, practice deliberately, \
                     and the advanced material follows naturally."
                ),
                format!("Share this with someone learning about {topic}."),
            ],
            ReelStyle::Business => [
                format!("Why {topic} matters for your bottom line."),
                format!(
                    "Teams that invest in {topic} early consistently outpace \
                     competitors who wait for the trend to prove itself."
                ),
                format!("Let's talk about bringing {topic} to your business."),
            ],
        }
    }
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(
        &self,
        topic: &str,
        style: ReelStyle,
        duration_seconds: u32,
    ) -> anyhow::Result<GeneratedScript> {
        if topic.trim().is_empty() {
            anyhow::bail!("topic is empty");
        }

        let segments = Self::segments(topic.trim(), style);
        let per_scene = f64::from(duration_seconds.max(3)) / segments.len() as f64;

        let scenes: Vec<Scene> = segments
            .iter()
            .map(|text| Scene {
                text: text.clone(),
                duration_seconds: per_scene,
            })
            .collect();

        Ok(GeneratedScript {
            script: segments.join(" "),
            scenes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generates_three_scenes() {
        let generated = TemplateContentGenerator
            .generate("AI tools", ReelStyle::Modern, 30)
            .await
            .unwrap();

        assert_eq!(generated.scenes.len(), 3);
        assert!(generated.script.contains("AI tools"));
        for scene in &generated.scenes {
            assert!((scene.duration_seconds - 10.0).abs() < f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn is_deterministic() {
        let a = TemplateContentGenerator
            .generate("rust", ReelStyle::Tech, 15)
            .await
            .unwrap();
        let b = TemplateContentGenerator
            .generate("rust", ReelStyle::Tech, 15)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let result = TemplateContentGenerator
            .generate("   ", ReelStyle::Modern, 30)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn styles_produce_distinct_scripts() {
        let modern = TemplateContentGenerator
            .generate("design", ReelStyle::Modern, 30)
            .await
            .unwrap();
        let business = TemplateContentGenerator
            .generate("design", ReelStyle::Business, 30)
            .await
            .unwrap();
        assert_ne!(modern.script, business.script);
    }
}
