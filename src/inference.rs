//! HTTP client for the hosted inference endpoints.
//!
//! All three analysis steps are forwarded calls to remote models behind
//! one gateway: text classification for emotion and sentiment, and an
//! OpenAI-style chat completion for feedback generation. The caller's
//! credential is passed through per request and never stored.

use crate::config::InferenceConfig;
use crate::error::{JournalError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A raw label/score pair as returned by a classification model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Model-assigned label.
    pub label: String,
    /// Confidence score in `[0, 1]`.
    pub score: f32,
}

/// A single message in a chat-completion conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message author role (`system` or `user`).
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    /// Create a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────────

/// Classification responses arrive either flat (`[{label, score}]`) or
/// nested one level (`[[{label, score}]]`) depending on the model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn flatten(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(groups) => groups.into_iter().flatten().collect(),
            Self::Flat(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

// ── Client ──────────────────────────────────────────────────────────────

/// Shared HTTP client for the inference gateway.
///
/// One instance serves all requests; remote calls carry an explicit
/// timeout so a stalled upstream surfaces as an error instead of hanging
/// the request chain.
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    /// Build a client from the inference configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| JournalError::Inference(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Run a text-classification model over `text`.
    ///
    /// Flattens nested response shapes; the returned list is the model's
    /// raw label/score output, unfiltered and unsorted.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-2xx status, or
    /// an unparseable response body.
    pub async fn text_classification(
        &self,
        model: &str,
        text: &str,
        credential: &str,
    ) -> Result<Vec<LabelScore>> {
        let url = format!("{}/models/{}", self.base_url, model);
        let body = serde_json::json!({ "inputs": text });

        let response: ClassificationResponse = self.post_json(&url, &body, credential).await?;
        Ok(response.flatten())
    }

    /// Run a chat-completion model over `messages` and return the first
    /// choice's trimmed content.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, timeout, non-2xx status,
    /// an unparseable body, or an empty choice list.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        credential: &str,
    ) -> Result<String> {
        let url = format!("{}/models/{}/v1/chat/completions", self.base_url, model);
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
        });

        let response: ChatCompletionResponse = self.post_json(&url, &body, credential).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                JournalError::Inference("chat completion returned no choices".to_owned())
            })?;

        Ok(content.trim().to_owned())
    }

    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
        credential: &str,
    ) -> Result<R> {
        debug!(url, "sending inference request");

        let response = self
            .http
            .post(url)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    JournalError::Inference(format!("inference request timed out: {url}"))
                } else {
                    JournalError::Inference(format!("inference request failed: {e}"))
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            JournalError::Inference(format!("failed to read inference response: {e}"))
        })?;

        if !status.is_success() {
            return Err(JournalError::Inference(format!(
                "inference endpoint returned {status}: {}",
                excerpt(&text)
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            JournalError::Inference(format!(
                "malformed inference response: {e} (body: {})",
                excerpt(&text)
            ))
        })
    }
}

/// First 200 bytes of a response body, for error messages. Backs off to
/// the nearest char boundary so slicing never panics.
fn excerpt(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
