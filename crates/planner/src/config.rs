//! Planner configuration.

use serde::{Deserialize, Serialize};
use studyplan_core::{Granularity, ScheduleStrategy};
use crate::calendar::MAX_SPAN_DAYS;
use crate::scheduler::OVERFLOW_TOLERANCE;

/// Defaults applied to plan requests.
///
/// Missing keys fall back to [`PlannerConfig::default`] when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Daily study hours when a request omits them
    pub default_daily_hours: f64,

    /// Longest accepted plan span in days (inclusive)
    pub max_span_days: i64,

    /// Fraction of a bucket's capacity that may be filled before rolling over
    pub overflow_tolerance: f64,

    /// Bucket size when a request omits it
    pub granularity: Granularity,

    /// Distribution strategy when a request omits it
    pub strategy: ScheduleStrategy,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_daily_hours: 2.0,
            max_span_days: MAX_SPAN_DAYS,
            overflow_tolerance: OVERFLOW_TOLERANCE,
            granularity: Granularity::Day,
            strategy: ScheduleStrategy::BudgetPacking,
        }
    }
}

impl PlannerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default daily hours.
    pub fn with_default_daily_hours(mut self, hours: f64) -> Self {
        self.default_daily_hours = hours;
        self
    }

    /// Set the maximum span.
    pub fn with_max_span_days(mut self, days: i64) -> Self {
        self.max_span_days = days;
        self
    }

    /// Set the overflow tolerance.
    pub fn with_overflow_tolerance(mut self, tolerance: f64) -> Self {
        self.overflow_tolerance = tolerance;
        self
    }

    /// Set the default granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the default strategy.
    pub fn with_strategy(mut self, strategy: ScheduleStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
