//! Curated insight lookup: emotion label → topic + redirections.
//!
//! The catalog is a static JSON dataset loaded once at boot and read-only
//! afterwards. A label with no entry is simply absent from a lookup
//! result; downstream rendering supplies the fallback.

use crate::error::{JournalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A curated insight associated with one emotion label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightEntry {
    /// Short topic describing the emotion's territory.
    pub topic: String,
    /// Suggested redirections, in display order.
    pub redirection: Vec<String>,
}

/// One record of the on-disk dataset.
#[derive(Debug, Deserialize)]
struct InsightRecord {
    emotion: String,
    topic: String,
    #[serde(default)]
    redirection: Vec<String>,
}

/// The full insight dataset, keyed by emotion label.
#[derive(Debug, Clone)]
pub struct InsightCatalog {
    entries: HashMap<String, InsightEntry>,
}

impl InsightCatalog {
    /// Load the catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read or parsed. This
    /// is fatal at boot; the catalog is never reloaded per request.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            JournalError::Config(format!(
                "failed to read insight dataset {}: {e}",
                path.display()
            ))
        })?;

        let records: Vec<InsightRecord> = serde_json::from_str(&raw).map_err(|e| {
            JournalError::Config(format!("invalid insight dataset {}: {e}", path.display()))
        })?;

        let mut entries = HashMap::with_capacity(records.len());
        for record in records {
            entries.insert(
                record.emotion,
                InsightEntry {
                    topic: record.topic,
                    redirection: record.redirection,
                },
            );
        }

        Ok(Self { entries })
    }

    /// Number of catalogued emotions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry for a single emotion label.
    #[must_use]
    pub fn get(&self, emotion: &str) -> Option<&InsightEntry> {
        self.entries.get(emotion)
    }

    /// Collect the matching entries for a set of emotion labels.
    ///
    /// Labels with no entry are omitted from the result, not errors.
    pub fn lookup<'a, I>(&self, labels: I) -> HashMap<String, InsightEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut matched = HashMap::new();
        for label in labels {
            match self.entries.get(label) {
                Some(entry) => {
                    matched.insert(label.to_owned(), entry.clone());
                }
                None => debug!(emotion = label, "no insight for emotion"),
            }
        }
        matched
    }
}
