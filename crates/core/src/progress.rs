//! Progress model - per-user, per-topic study status.

use serde::{Deserialize, Serialize};
use crate::id::{TopicId, UserId};
use crate::topic::Topic;
use crate::Time;

/// Study status of a topic for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Not touched yet
    NotStarted,
    /// Being studied
    InProgress,
    /// Finished
    Completed,
}

impl ProgressStatus {
    /// Parse a status label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "not_started" => Some(ProgressStatus::NotStarted),
            "in_progress" => Some(ProgressStatus::InProgress),
            "completed" => Some(ProgressStatus::Completed),
            _ => None,
        }
    }

    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Position in the not_started -> in_progress -> completed order.
    pub fn rank(self) -> u8 {
        match self {
            ProgressStatus::NotStarted => 0,
            ProgressStatus::InProgress => 1,
            ProgressStatus::Completed => 2,
        }
    }

    /// Whether the topic still needs work.
    pub fn is_open(self) -> bool {
        !matches!(self, ProgressStatus::Completed)
    }
}

impl Default for ProgressStatus {
    fn default() -> Self {
        ProgressStatus::NotStarted
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one user on one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Learner
    pub user_id: UserId,

    /// Topic being tracked
    pub topic_id: TopicId,

    /// Current status
    pub status: ProgressStatus,

    /// Accumulated study hours
    pub hours_spent: f64,

    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Last update timestamp
    pub updated_at: Time,
}

impl ProgressRecord {
    /// A fresh `not_started` record.
    pub fn new(user_id: UserId, topic_id: TopicId) -> Self {
        Self {
            user_id,
            topic_id,
            status: ProgressStatus::NotStarted,
            hours_spent: 0.0,
            notes: None,
            updated_at: chrono::Utc::now(),
        }
    }
}

/// An explicit progress update from the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// New status
    pub status: ProgressStatus,

    /// Hours studied since the last update
    #[serde(default)]
    pub hours_delta: f64,

    /// Replacement notes; `None` keeps existing notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Summary statistics over a user's progress records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressStats {
    /// Number of tracked topics
    pub total_topics: usize,

    /// Topics completed
    pub completed: usize,

    /// Topics in progress
    pub in_progress: usize,

    /// Topics not started
    pub not_started: usize,

    /// Completed share in percent, one decimal
    pub completion_percentage: f64,

    /// Total hours spent, one decimal
    pub total_hours: f64,
}

/// A topic joined with the user's progress on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProgress {
    /// The topic
    pub topic: Topic,

    /// Current status (`not_started` when no record exists)
    pub status: ProgressStatus,

    /// Hours spent so far
    pub hours_spent: f64,
}

/// An unfinished topic shown in the "up next" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingTopic {
    /// Topic id
    pub topic_id: TopicId,

    /// Topic name
    pub name: String,

    /// Current status
    pub status: ProgressStatus,

    /// Hours spent so far
    pub hours_spent: f64,

    /// Raw estimate from the topic store
    pub estimated_hours: f64,
}
