//! Study plan core data models.
//!
//! This crate defines the data structures shared by the planner, the
//! progress tracker and the storage backends.

#![warn(missing_docs)]

// Core identities
mod id;

// Inputs and outputs of plan generation
mod topic;
mod plan;
mod error;

// Progress tracking
mod progress;

// Re-exports
pub use id::*;

pub use topic::{Topic, Difficulty};
pub use plan::{Plan, PlanRecord, ScheduleBucket, Assignment, Granularity, ScheduleStrategy};
pub use error::{PlanError, PlanResult, DateRangeError};
pub use progress::{
    ProgressRecord, ProgressStatus, ProgressStats, ProgressUpdate, TopicProgress, UpcomingTopic,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Round to one decimal place for display.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
