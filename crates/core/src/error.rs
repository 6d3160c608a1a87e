//! Validation errors raised by plan generation.

use chrono::NaiveDate;

/// Errors that reject a plan request before any scheduling happens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Unusable start/end dates
    #[error("Invalid date range: {0}")]
    InvalidDateRange(#[from] DateRangeError),

    /// Daily budget is zero, negative or not a number
    #[error("Invalid daily budget: {0} hours")]
    InvalidBudget(f64),

    /// Nothing to schedule
    #[error("No topics to schedule")]
    EmptyTopicSet,
}

/// Why a date range was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateRangeError {
    /// A date could not be parsed as `YYYY-MM-DD`
    #[error("'{0}' is not a YYYY-MM-DD date")]
    Unparsable(String),

    /// Start date falls after end date
    #[error("start {start} is after end {end}")]
    StartAfterEnd {
        /// Requested start
        start: NaiveDate,
        /// Requested end
        end: NaiveDate,
    },

    /// Span longer than the allowed maximum
    #[error("{days} days exceeds the {max_days}-day limit")]
    SpanTooLong {
        /// Requested span, inclusive
        days: i64,
        /// Configured limit
        max_days: i64,
    },
}

/// Result alias for plan validation.
pub type PlanResult<T> = std::result::Result<T, PlanError>;
