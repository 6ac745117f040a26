//! Sentiment classification over a hosted text-classification model.
//!
//! Unlike emotion analysis, sentiment keeps exactly one result: the
//! highest-scoring label. Ties resolve to the first entry in the model's
//! output order.

use crate::error::{JournalError, Result};
use crate::inference::{InferenceClient, LabelScore};
use serde::{Deserialize, Serialize};

/// The single top-scoring sentiment of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Sentiment label (`positive`, `negative`, `neutral`, ...).
    pub sentiment: String,
    /// Confidence score of that label.
    pub score: f32,
}

/// Classify the sentiment of `text` using the given model.
///
/// # Errors
///
/// Returns an error if the remote call fails or the response is empty.
pub async fn classify_sentiment(
    client: &InferenceClient,
    model: &str,
    text: &str,
    credential: &str,
) -> Result<SentimentResult> {
    let raw = client.text_classification(model, text, credential).await?;
    top_sentiment(&raw)
}

/// Select the highest-scoring label; ties resolve to the first in order.
///
/// # Errors
///
/// Returns an error if `raw` is empty.
pub fn top_sentiment(raw: &[LabelScore]) -> Result<SentimentResult> {
    let best = raw
        .iter()
        .reduce(|best, item| if item.score > best.score { item } else { best })
        .ok_or_else(|| {
            JournalError::Inference("empty sentiment classification response".to_owned())
        })?;

    Ok(SentimentResult {
        sentiment: best.label.clone(),
        score: best.score,
    })
}
