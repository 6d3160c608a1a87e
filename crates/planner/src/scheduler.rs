//! Bucket scheduling.
//!
//! Topics are placed into calendar buckets strictly in sequence order. Two
//! strategies share the same bucket enumeration and output shape:
//!
//! - [`ScheduleStrategy::BudgetPacking`] fills each bucket greedily until the
//!   next topic would push it past `capacity * overflow_tolerance`. An empty
//!   bucket always takes the next topic, however large.
//! - [`ScheduleStrategy::EvenSpread`] gives every bucket the same number of
//!   topics, `max(1, topics / buckets)`.
//!
//! With either strategy the last calendar bucket absorbs whatever is left, so
//! every topic is scheduled exactly once. Buckets that receive nothing are
//! left out of the result.

use std::ops::Range;
use chrono::NaiveDate;
use studyplan_core::{
    round1, Assignment, Granularity, PlanResult, ScheduleBucket, ScheduleStrategy,
};
use tracing::{debug, warn};
use crate::calendar::{validate_budget, CalendarBucket, DateRange, MAX_SPAN_DAYS};
use crate::config::PlannerConfig;
use crate::estimator::ScaledTopic;
use crate::tasks::tasks_for;

/// Default overflow tolerance: buckets may be filled to 120% of capacity.
pub const OVERFLOW_TOLERANCE: f64 = 1.2;

/// Slack for float noise when comparing a running total with the ceiling.
const EPSILON: f64 = 1e-9;

/// Assigns scaled topics to calendar buckets.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    strategy: ScheduleStrategy,
    overflow_tolerance: f64,
    max_span_days: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            strategy: ScheduleStrategy::BudgetPacking,
            overflow_tolerance: OVERFLOW_TOLERANCE,
            max_span_days: MAX_SPAN_DAYS,
        }
    }
}

impl Scheduler {
    /// Create a budget-packing scheduler with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler from planner configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            strategy: config.strategy,
            overflow_tolerance: config.overflow_tolerance,
            max_span_days: config.max_span_days,
        }
    }

    /// Set the distribution strategy.
    pub fn with_strategy(mut self, strategy: ScheduleStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the overflow tolerance.
    pub fn with_overflow_tolerance(mut self, tolerance: f64) -> Self {
        self.overflow_tolerance = tolerance;
        self
    }

    /// Set the maximum span.
    pub fn with_max_span_days(mut self, days: i64) -> Self {
        self.max_span_days = days;
        self
    }

    /// Validate the range and budget, then schedule.
    pub fn schedule(
        &self,
        topics: &[ScaledTopic],
        start: NaiveDate,
        end: NaiveDate,
        daily_budget: f64,
        granularity: Granularity,
    ) -> PlanResult<Vec<ScheduleBucket>> {
        let range = DateRange::new(start, end, self.max_span_days)?;
        let daily_budget = validate_budget(daily_budget)?;
        Ok(self.schedule_range(topics, &range, daily_budget, granularity))
    }

    /// Schedule over an already validated range with a validated budget.
    pub fn schedule_range(
        &self,
        topics: &[ScaledTopic],
        range: &DateRange,
        daily_budget: f64,
        granularity: Granularity,
    ) -> Vec<ScheduleBucket> {
        if topics.is_empty() {
            return Vec::new();
        }

        let calendar = range.buckets(granularity);
        let slices = match self.strategy {
            ScheduleStrategy::BudgetPacking => self.pack(topics, &calendar, daily_budget),
            ScheduleStrategy::EvenSpread => spread(topics.len(), calendar.len()),
        };

        calendar
            .iter()
            .zip(slices)
            .filter(|(_, slice)| !slice.is_empty())
            .map(|(cal, slice)| build_bucket(cal, &topics[slice], daily_budget))
            .collect()
    }

    /// Greedy fill. Returns one topic index range per calendar bucket.
    fn pack(
        &self,
        topics: &[ScaledTopic],
        calendar: &[CalendarBucket],
        daily_budget: f64,
    ) -> Vec<Range<usize>> {
        let mut slices = Vec::with_capacity(calendar.len());
        let mut cursor = 0;

        for (i, cal) in calendar.iter().enumerate() {
            let first = cursor;
            let is_last = i + 1 == calendar.len();
            let ceiling = daily_budget * cal.length_days() as f64 * self.overflow_tolerance;
            let mut running = 0.0;
            let mut absorbed = 0;

            while cursor < topics.len() {
                let next = running + topics[cursor].hours;
                if cursor > first && next > ceiling + EPSILON {
                    if !is_last {
                        break;
                    }
                    absorbed += 1;
                }
                running = next;
                cursor += 1;
            }

            if absorbed > 0 {
                warn!(bucket = cal.number, absorbed, "last bucket absorbed topics beyond its capacity");
            }
            debug!(bucket = cal.number, topics = cursor - first, hours = running, ceiling, "filled bucket");
            slices.push(first..cursor);
        }

        slices
    }
}

/// Fixed quota per bucket, the last bucket taking the remainder.
fn spread(topic_count: usize, bucket_count: usize) -> Vec<Range<usize>> {
    if bucket_count == 0 {
        return Vec::new();
    }
    let quota = std::cmp::max(1, topic_count / bucket_count);
    let mut slices = Vec::with_capacity(bucket_count);
    let mut cursor = 0;

    for i in 0..bucket_count {
        let end = if i + 1 == bucket_count {
            topic_count
        } else {
            std::cmp::min(cursor + quota, topic_count)
        };
        slices.push(cursor..end);
        cursor = end;
    }

    slices
}

fn build_bucket(cal: &CalendarBucket, topics: &[ScaledTopic], daily_budget: f64) -> ScheduleBucket {
    let assignments: Vec<Assignment> = topics
        .iter()
        .map(|t| Assignment {
            topic_id: t.id,
            topic_name: t.name.clone(),
            description: t.description.clone(),
            hours: round1(t.hours),
            difficulty: t.difficulty,
            tasks: tasks_for(t.difficulty),
        })
        .collect();
    let total: f64 = topics.iter().map(|t| t.hours).sum();

    ScheduleBucket {
        number: cal.number,
        start_date: cal.start,
        end_date: cal.end,
        capacity: daily_budget * cal.length_days() as f64,
        assignments,
        total_hours: round1(total),
    }
}
