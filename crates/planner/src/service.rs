//! Plan service - generation on top of an injected store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use studyplan_core::{PlanError, PlanRecord, UploadId, UserId};
use studyplan_storage::{Storage, StorageError};
use tracing::{info, warn};
use crate::generator::{PlanGenerator, PlanRequest};

/// Errors returned by [`PlanService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request was rejected by validation
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Another generation for this user has not finished yet
    #[error("A plan is already being generated for {0}")]
    GenerationInProgress(UserId),
}

/// Result alias for service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Generates, persists and serves study plans.
///
/// Allows at most one in-flight generation per user; a concurrent request for
/// the same user fails with [`ServiceError::GenerationInProgress`].
pub struct PlanService<S: Storage> {
    storage: Arc<S>,
    generator: PlanGenerator,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl<S: Storage> Clone for PlanService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            generator: self.generator.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S: Storage> PlanService<S> {
    /// Create a service over a shared store.
    pub fn new(storage: Arc<S>, generator: PlanGenerator) -> Self {
        Self {
            storage,
            generator,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Generate a plan for the topics of `upload_id` and persist it.
    ///
    /// Also creates a `not_started` progress record for every scheduled topic
    /// the user has no record for yet. Records are seeded before the plan is
    /// stored, so a failed seed leaves no plan behind.
    pub async fn generate_plan(
        &self,
        user_id: &UserId,
        upload_id: UploadId,
        request: &PlanRequest,
    ) -> Result<PlanRecord> {
        let _slot = InFlight::claim(&self.in_flight, user_id)?;

        let topics = self.storage.list_topics(upload_id).await?;
        let plan = self.generator.generate(&topics, request)?;
        let record = PlanRecord::new(user_id.clone(), upload_id, plan);

        let seeded = self.storage.seed_progress(user_id, &record.plan.topic_ids()).await?;
        self.storage.save_plan(&record).await?;

        info!(
            plan = %record.id,
            user = %user_id,
            buckets = record.plan.total_buckets,
            seeded,
            "saved plan"
        );
        Ok(record)
    }

    /// Most recent plan of a user.
    pub async fn latest_plan(&self, user_id: &UserId) -> Result<Option<PlanRecord>> {
        Ok(self.storage.load_latest_plan(user_id).await?)
    }

    /// Every plan of a user, newest first.
    pub async fn plan_history(&self, user_id: &UserId) -> Result<Vec<PlanRecord>> {
        Ok(self.storage.list_plans(user_id).await?)
    }
}

/// Marks a user as having a generation in flight until dropped.
struct InFlight {
    set: Arc<Mutex<HashSet<UserId>>>,
    user_id: UserId,
}

impl InFlight {
    fn claim(set: &Arc<Mutex<HashSet<UserId>>>, user_id: &UserId) -> Result<Self> {
        let mut guard = set.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(user_id.clone()) {
            warn!(user = %user_id, "rejected concurrent plan generation");
            return Err(ServiceError::GenerationInProgress(user_id.clone()));
        }
        Ok(Self {
            set: Arc::clone(set),
            user_id: user_id.clone(),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut guard = self.set.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&self.user_id);
    }
}
