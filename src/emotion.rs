//! Emotion classification over a hosted text-classification model.
//!
//! The remote model returns a score for every label it knows. This module
//! normalizes that output (3-decimal rounding, descending sort) and splits
//! off the significant subset the client actually displays.

use crate::error::{JournalError, Result};
use crate::inference::{InferenceClient, LabelScore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Minimum score for an emotion to count as significant.
pub const SIGNIFICANCE_THRESHOLD: f32 = 0.15;

/// A normalized emotion/score pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    /// Emotion label, unique within one analysis.
    pub emotion: String,
    /// Score in `[0, 1]`, rounded to 3 decimals.
    pub score: f32,
}

/// Full result of one emotion analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    /// Emotions with score ≥ [`SIGNIFICANCE_THRESHOLD`], descending.
    pub significant_emotions: Vec<EmotionScore>,
    /// The model's raw label/score output, untouched.
    pub raw_emotions: Vec<LabelScore>,
}

/// Classify the emotions in `text` using the given model.
///
/// # Errors
///
/// Returns an error if the remote call fails or the response is empty.
pub async fn classify_emotions(
    client: &InferenceClient,
    model: &str,
    text: &str,
    credential: &str,
) -> Result<EmotionAnalysis> {
    let raw = client.text_classification(model, text, credential).await?;
    let emotions = normalize_emotions(&raw)?;
    let significant = significant_emotions(&emotions);

    Ok(EmotionAnalysis {
        significant_emotions: significant,
        raw_emotions: raw,
    })
}

/// Normalize raw label/score pairs: round scores to 3 decimals and sort
/// descending by score. The sort is stable, so equal scores keep their
/// input order.
///
/// # Errors
///
/// Returns an error if `raw` is empty.
pub fn normalize_emotions(raw: &[LabelScore]) -> Result<Vec<EmotionScore>> {
    if raw.is_empty() {
        return Err(JournalError::Inference(
            "empty emotion classification response".to_owned(),
        ));
    }

    let mut emotions: Vec<EmotionScore> = raw
        .iter()
        .map(|pair| EmotionScore {
            emotion: pair.label.clone(),
            score: round3(pair.score),
        })
        .collect();

    emotions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(emotions)
}

/// Filter to the significant subset, preserving order.
#[must_use]
pub fn significant_emotions(emotions: &[EmotionScore]) -> Vec<EmotionScore> {
    emotions
        .iter()
        .filter(|e| e.score >= SIGNIFICANCE_THRESHOLD)
        .cloned()
        .collect()
}

fn round3(score: f32) -> f32 {
    (score * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn pair(label: &str, score: f32) -> LabelScore {
        LabelScore {
            label: label.to_owned(),
            score,
        }
    }

    #[test]
    fn normalize_sorts_descending() {
        let raw = vec![pair("neutral", 0.1), pair("joy", 0.8), pair("fear", 0.3)];
        let emotions = normalize_emotions(&raw).unwrap();
        let labels: Vec<&str> = emotions.iter().map(|e| e.emotion.as_str()).collect();
        assert_eq!(labels, ["joy", "fear", "neutral"]);
    }

    #[test]
    fn normalize_rounds_to_three_decimals() {
        let raw = vec![pair("joy", 0.876_543)];
        let emotions = normalize_emotions(&raw).unwrap();
        assert!((emotions[0].score - 0.877).abs() < 1e-6);
    }

    #[test]
    fn normalize_empty_is_error() {
        assert!(normalize_emotions(&[]).is_err());
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let raw = vec![pair("joy", 0.5), pair("pride", 0.5), pair("awe", 0.5)];
        let emotions = normalize_emotions(&raw).unwrap();
        let labels: Vec<&str> = emotions.iter().map(|e| e.emotion.as_str()).collect();
        assert_eq!(labels, ["joy", "pride", "awe"]);
    }

    #[test]
    fn significant_filters_below_threshold() {
        let emotions = normalize_emotions(&[
            pair("joy", 0.8),
            pair("fear", 0.15),
            pair("neutral", 0.149),
        ])
        .unwrap();
        let significant = significant_emotions(&emotions);
        let labels: Vec<&str> = significant.iter().map(|e| e.emotion.as_str()).collect();
        assert_eq!(labels, ["joy", "fear"]);
    }

    #[test]
    fn significant_preserves_descending_order() {
        let emotions = normalize_emotions(&[
            pair("neutral", 0.2),
            pair("joy", 0.9),
            pair("sadness", 0.4),
        ])
        .unwrap();
        let significant = significant_emotions(&emotions);
        let labels: Vec<&str> = significant.iter().map(|e| e.emotion.as_str()).collect();
        assert_eq!(labels, ["joy", "sadness", "neutral"]);
    }

    #[test]
    fn all_below_threshold_yields_empty_significant() {
        let emotions = normalize_emotions(&[pair("joy", 0.1), pair("fear", 0.05)]).unwrap();
        assert!(significant_emotions(&emotions).is_empty());
    }
}
