//! Planning layer - workload estimation, scheduling and plan generation.

#![warn(missing_docs)]

pub mod config;
pub mod calendar;
pub mod estimator;
pub mod scheduler;
pub mod tasks;
pub mod generator;
pub mod service;

pub use config::PlannerConfig;
pub use calendar::{DateRange, CalendarBucket, parse_date, validate_budget, MAX_SPAN_DAYS};
pub use estimator::{estimate, WorkloadEstimate, ScaledTopic};
pub use scheduler::{Scheduler, OVERFLOW_TOLERANCE};
pub use tasks::tasks_for;
pub use generator::{PlanGenerator, PlanRequest};
pub use service::{PlanService, ServiceError};
