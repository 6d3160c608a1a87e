//! Progress Tracking
//!
//! Per-topic status updates and summary statistics.

#![warn(missing_docs)]

pub mod aggregator;
pub mod tracker;

pub use aggregator::{aggregate, join_topics, upcoming};
pub use tracker::{
    ProgressTracker, BasicProgressTracker, ProgressError, TrackerConfig, TransitionPolicy,
};
