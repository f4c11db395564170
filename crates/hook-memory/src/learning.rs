//! Persisted learning records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a persisted learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningKind {
    /// High-signal fragment captured from a memory-area write
    Insight,
}

/// A learning record as written to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learning {
    /// Record category
    #[serde(rename = "type")]
    pub kind: LearningKind,

    /// Learning content
    pub content: String,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,

    /// Tags for categorization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Learning {
    /// Create a new insight learning.
    pub fn insight(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: LearningKind::Insight,
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
