//! Feedback generation: merge analysis results into a prompt and call the
//! generative model.
//!
//! The orchestration is a strict sequential chain: resolve the effective
//! system prompt, merge emotions + sentiment + insights into a
//! [`PromptContext`], render the fixed feedback template, and submit a
//! two-message conversation to the generative model. The first failure
//! propagates unchanged; no partial feedback is ever returned.

use crate::error::{JournalError, Result};
use crate::inference::{ChatMessage, InferenceClient};
use crate::insight::InsightEntry;
use crate::template::{EmotionItem, PromptContext, Template};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Topic rendered for an emotion with no matching insight.
const FALLBACK_TOPIC: &str = "Unknown";

/// The fixed feedback template. `$prompt` and `$sentiment` are filled
/// from the request; the emotion block renders once per reported emotion.
const FEEDBACK_TEMPLATE: &str = "\
$prompt

User's input detected sentiment: $sentiment.

(Background insights for reference; use only if relevant)
{foreach emotion}
- $emotion ($score) [Topic: $topic]
  Possible redirections:
{foreach redirection}
  → $redirection
{/foreach redirection}
{/foreach emotion}
";

/// An emotion as echoed back by the client in a feedback request.
///
/// The score is optional: clients round-trip analysis results through
/// local storage and may drop it. A missing score renders as `"N/A"`,
/// never a fabricated number.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportedEmotion {
    /// Emotion label.
    pub emotion: String,
    /// Score from the original analysis, if still known.
    #[serde(default)]
    pub score: Option<f32>,
}

/// Load the default system prompt from a text resource.
///
/// # Errors
///
/// Returns a config error if the file cannot be read. This is fatal at
/// boot; the prompt is never reloaded per request.
pub fn load_default_prompt(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        JournalError::Config(format!(
            "failed to read default prompt {}: {e}",
            path.display()
        ))
    })?;
    Ok(content.trim().to_owned())
}

/// The feedback-generation engine: the parsed template, the default
/// prompt, and the generative-model settings, all fixed at boot.
pub struct FeedbackEngine {
    template: Template,
    default_prompt: String,
    model: String,
    max_tokens: u32,
}

impl FeedbackEngine {
    /// Build an engine for the given model with an already-loaded default
    /// prompt. Parses the feedback template once.
    ///
    /// # Errors
    ///
    /// Returns an error if the feedback template fails to parse.
    pub fn new(
        model: impl Into<String>,
        max_tokens: u32,
        default_prompt: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            template: Template::parse(FEEDBACK_TEMPLATE)?,
            default_prompt: default_prompt.into(),
            model: model.into(),
            max_tokens,
        })
    }

    /// The default system prompt, as served by `GET /api/prompt`.
    #[must_use]
    pub fn default_prompt(&self) -> &str {
        &self.default_prompt
    }

    /// Generate feedback for a transcript.
    ///
    /// The caller must reject empty transcripts before invoking this; an
    /// empty transcript here is a contract violation, not a recoverable
    /// case. A non-empty `custom_prompt` always overrides the default,
    /// even when equal to it; callers wanting "equal means no override"
    /// compare against [`default_prompt`](Self::default_prompt) first.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of the chain (prompt resolution,
    /// template rendering, remote call); no partial feedback is returned.
    pub async fn generate(
        &self,
        client: &InferenceClient,
        transcript: &str,
        sentiment_label: &str,
        emotions: &[ReportedEmotion],
        insights: &HashMap<String, InsightEntry>,
        custom_prompt: Option<&str>,
        credential: &str,
    ) -> Result<String> {
        debug_assert!(
            !transcript.trim().is_empty(),
            "caller must reject empty transcripts"
        );

        let prompt = self.effective_prompt(custom_prompt);
        let context = build_context(prompt, sentiment_label, emotions, insights);
        let system = self.template.render(&context);

        debug!(
            emotions = context.emotions.len(),
            sentiment = sentiment_label,
            "generating feedback"
        );

        let messages = [ChatMessage::system(system), ChatMessage::user(transcript)];
        client
            .chat_completion(&self.model, &messages, self.max_tokens, credential)
            .await
    }

    fn effective_prompt(&self, custom_prompt: Option<&str>) -> String {
        match custom_prompt.map(str::trim) {
            Some(custom) if !custom.is_empty() => custom.to_owned(),
            _ => self.default_prompt.clone(),
        }
    }
}

/// Merge reported emotions with their insights into a render context.
///
/// Entries keep their input order but are unique by emotion label (first
/// occurrence wins). An emotion with no insight renders with the fallback
/// topic and an empty redirection list rather than being omitted.
#[must_use]
pub fn build_context(
    prompt: String,
    sentiment_label: &str,
    emotions: &[ReportedEmotion],
    insights: &HashMap<String, InsightEntry>,
) -> PromptContext {
    let mut items: Vec<EmotionItem> = Vec::with_capacity(emotions.len());

    for reported in emotions {
        if items.iter().any(|i| i.emotion == reported.emotion) {
            continue;
        }

        let (topic, redirection) = match insights.get(&reported.emotion) {
            Some(entry) => (entry.topic.clone(), entry.redirection.clone()),
            None => (FALLBACK_TOPIC.to_owned(), Vec::new()),
        };

        items.push(EmotionItem {
            emotion: reported.emotion.clone(),
            score: reported.score,
            topic,
            redirection,
        });
    }

    PromptContext {
        prompt,
        sentiment_label: sentiment_label.to_owned(),
        emotions: items,
    }
}
