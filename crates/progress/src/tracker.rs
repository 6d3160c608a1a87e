//! Progress tracking service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studyplan_core::{
    ProgressRecord, ProgressStats, ProgressStatus, ProgressUpdate, TopicId, TopicProgress,
    UpcomingTopic, UploadId, UserId,
};
use studyplan_storage::{Storage, StorageError};
use tracing::{debug, info};
use crate::aggregator;

/// Errors returned by a [`ProgressTracker`].
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// The store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Hours delta is negative or not a number
    #[error("Invalid hours delta: {0}")]
    InvalidHours(f64),

    /// The transition policy forbids moving backwards
    #[error("Cannot move topic {topic} from {from} back to {to}")]
    Regression {
        /// Topic being updated
        topic: TopicId,
        /// Current status
        from: ProgressStatus,
        /// Requested status
        to: ProgressStatus,
    },
}

/// Result alias for tracker calls.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Which status changes an update may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may replace any other
    Permissive,
    /// Status may only move forward (not_started -> in_progress -> completed)
    Monotonic,
}

impl TransitionPolicy {
    /// Check a transition.
    pub fn allows(self, from: ProgressStatus, to: ProgressStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Monotonic => to.rank() >= from.rank(),
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        TransitionPolicy::Permissive
    }
}

/// Tracker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Status transition policy
    pub policy: TransitionPolicy,

    /// Default length of the upcoming-topics list
    pub upcoming_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            policy: TransitionPolicy::Permissive,
            upcoming_limit: 5,
        }
    }
}

/// Progress tracking service.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Apply an update, creating the record on first use.
    async fn update_progress(
        &self,
        user_id: &UserId,
        topic_id: TopicId,
        update: ProgressUpdate,
    ) -> Result<ProgressRecord>;

    /// Summary statistics over all of a user's records.
    async fn stats(&self, user_id: &UserId) -> Result<ProgressStats>;

    /// Topics of an upload joined with the user's progress.
    async fn topic_progress(&self, user_id: &UserId, upload_id: UploadId) -> Result<Vec<TopicProgress>>;

    /// Unfinished topics of an upload, `limit` defaulting to the configured one.
    async fn upcoming(
        &self,
        user_id: &UserId,
        upload_id: UploadId,
        limit: Option<usize>,
    ) -> Result<Vec<UpcomingTopic>>;
}

/// Basic progress tracker implementation.
pub struct BasicProgressTracker<S: Storage> {
    storage: std::sync::Arc<S>,
    config: TrackerConfig,
}

impl<S: Storage> BasicProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(storage: std::sync::Arc<S>) -> Self {
        Self {
            storage,
            config: TrackerConfig::default(),
        }
    }

    /// Replace the settings.
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<S: Storage + 'static> ProgressTracker for BasicProgressTracker<S> {
    async fn update_progress(
        &self,
        user_id: &UserId,
        topic_id: TopicId,
        update: ProgressUpdate,
    ) -> Result<ProgressRecord> {
        if !update.hours_delta.is_finite() || update.hours_delta < 0.0 {
            return Err(ProgressError::InvalidHours(update.hours_delta));
        }

        let policy = self.config.policy;
        let record = self
            .storage
            .upsert_progress(user_id, topic_id, |current| {
                let mut record = match current {
                    Some(existing) => existing,
                    None => {
                        debug!(user = %user_id, topic = %topic_id, "creating progress record");
                        ProgressRecord::new(user_id.clone(), topic_id)
                    }
                };

                if !policy.allows(record.status, update.status) {
                    return Err(ProgressError::Regression {
                        topic: topic_id,
                        from: record.status,
                        to: update.status,
                    });
                }

                debug!(topic = %topic_id, from = %record.status, to = %update.status, "status transition");
                record.status = update.status;
                record.hours_spent += update.hours_delta;
                if update.notes.is_some() {
                    record.notes = update.notes;
                }
                record.updated_at = chrono::Utc::now();
                Ok(record)
            })
            .await?;

        info!(
            user = %user_id,
            topic = %topic_id,
            status = %record.status,
            hours = record.hours_spent,
            "updated progress"
        );
        Ok(record)
    }

    async fn stats(&self, user_id: &UserId) -> Result<ProgressStats> {
        let records = self.storage.list_progress(user_id).await?;
        Ok(aggregator::aggregate(&records))
    }

    async fn topic_progress(&self, user_id: &UserId, upload_id: UploadId) -> Result<Vec<TopicProgress>> {
        let topics = self.storage.list_topics(upload_id).await?;
        let records = self.storage.list_progress(user_id).await?;
        Ok(aggregator::join_topics(&topics, &records))
    }

    async fn upcoming(
        &self,
        user_id: &UserId,
        upload_id: UploadId,
        limit: Option<usize>,
    ) -> Result<Vec<UpcomingTopic>> {
        let topics = self.storage.list_topics(upload_id).await?;
        let records = self.storage.list_progress(user_id).await?;
        let limit = limit.unwrap_or(self.config.upcoming_limit);
        Ok(aggregator::upcoming(&topics, &records, limit))
    }
}
