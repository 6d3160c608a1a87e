//! Topic import from a JSON file.
//!
//! Stands in for the upload pipeline that normally extracts topics from a
//! document: the file holds an array of topic drafts which are stored under a
//! fresh upload id.

use anyhow::{Context, Result};
use serde::Deserialize;
use studyplan_core::{Difficulty, Topic, TopicId, UploadId};

/// A topic as written in an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicDraft {
    #[serde(default, alias = "topic_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "difficulty_level")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub sequence_order: Option<i64>,
}

/// Parse drafts and assign ids. Drafts without an order keep their position.
pub fn parse_topics(json: &str, upload_id: UploadId) -> Result<Vec<Topic>> {
    let drafts: Vec<TopicDraft> = serde_json::from_str(json).context("Expected a JSON array of topics")?;
    Ok(drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Topic {
            id: TopicId::new(),
            upload_id,
            name: draft.name,
            description: draft.description,
            difficulty: draft.difficulty.as_deref().and_then(Difficulty::parse),
            estimated_hours: draft.estimated_hours,
            sequence_order: draft.sequence_order.unwrap_or(i as i64),
        })
        .collect())
}
