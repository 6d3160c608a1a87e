//! Storage trait abstraction.

use async_trait::async_trait;
use studyplan_core::{PlanId, PlanRecord, ProgressRecord, Topic, TopicId, UploadId, UserId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for topics, plans and progress.
///
/// Implementations are handed to the services that need them; nothing in the
/// planner reaches for a global connection. Writes take `&self` so a single
/// store can serve concurrent requests; implementations serialize their own
/// read-modify-write cycles.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Topic operations ===

    /// Replace the topics of an upload.
    async fn save_topics(&self, upload_id: UploadId, topics: &[Topic]) -> Result<()>;

    /// List the topics of an upload ordered by `sequence_order`.
    ///
    /// An unknown upload yields an empty list.
    async fn list_topics(&self, upload_id: UploadId) -> Result<Vec<Topic>>;

    // === Plan operations ===

    /// Persist a generated plan.
    async fn save_plan(&self, record: &PlanRecord) -> Result<()>;

    /// Load a plan by ID.
    async fn load_plan(&self, id: PlanId) -> Result<Option<PlanRecord>>;

    /// List a user's plans, newest first.
    async fn list_plans(&self, user_id: &UserId) -> Result<Vec<PlanRecord>>;

    /// Most recently created plan of a user.
    async fn load_latest_plan(&self, user_id: &UserId) -> Result<Option<PlanRecord>> {
        Ok(self.list_plans(user_id).await?.into_iter().next())
    }

    // === Progress operations ===

    /// Insert or replace the record for `(record.user_id, record.topic_id)`.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<()>;

    /// Load, change and store the record for a (user, topic) pair as one step.
    ///
    /// `apply` receives the current record, if any, and returns the record to
    /// store. No other progress write for the same store runs in between. An
    /// error from `apply` leaves the stored record untouched.
    async fn upsert_progress<F, E>(
        &self,
        user_id: &UserId,
        topic_id: TopicId,
        apply: F,
    ) -> std::result::Result<ProgressRecord, E>
    where
        F: FnOnce(Option<ProgressRecord>) -> std::result::Result<ProgressRecord, E> + Send,
        E: From<StorageError> + Send;

    /// Create a `not_started` record for each topic the user has none for.
    ///
    /// Existing records are left as they are. Returns how many were created.
    async fn seed_progress(&self, user_id: &UserId, topic_ids: &[TopicId]) -> Result<usize>;

    /// Load the record for a (user, topic) pair.
    async fn load_progress(&self, user_id: &UserId, topic_id: TopicId) -> Result<Option<ProgressRecord>>;

    /// All progress records of a user.
    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>>;
}
