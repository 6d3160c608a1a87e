//! Topic model - a unit of study content extracted from an upload.

use serde::{Deserialize, Deserializer, Serialize};
use crate::id::{TopicId, UploadId};

/// Difficulty label attached to a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Light material
    Easy,
    /// Regular material
    Medium,
    /// Dense material that needs practice and review
    Hard,
}

impl Difficulty {
    /// Parse a difficulty label, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Workload multiplier applied to a topic's estimated hours.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.3,
        }
    }

    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic as stored by the topic store.
///
/// Topics are immutable inputs to the planner. Fields that upstream extraction
/// may leave out (`difficulty`, `estimated_hours`) are optional here and get
/// defaulted when a plan is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Unique identifier
    pub id: TopicId,

    /// Source document
    pub upload_id: UploadId,

    /// Topic name
    #[serde(default, alias = "topic_name")]
    pub name: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    /// Difficulty label; unknown labels read as `None`
    #[serde(
        default,
        alias = "difficulty_level",
        deserialize_with = "lenient_difficulty"
    )]
    pub difficulty: Option<Difficulty>,

    /// Estimated study hours
    #[serde(default)]
    pub estimated_hours: Option<f64>,

    /// Position within the source document
    #[serde(default)]
    pub sequence_order: i64,
}

impl Topic {
    /// Create a topic with a fresh id.
    pub fn new(
        upload_id: UploadId,
        name: impl Into<String>,
        difficulty: Difficulty,
        estimated_hours: f64,
        sequence_order: i64,
    ) -> Self {
        Self {
            id: TopicId::new(),
            upload_id,
            name: name.into(),
            description: String::new(),
            difficulty: Some(difficulty),
            estimated_hours: Some(estimated_hours),
            sequence_order,
        }
    }
}

fn lenient_difficulty<'de, D>(deserializer: D) -> Result<Option<Difficulty>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Difficulty::parse))
}
