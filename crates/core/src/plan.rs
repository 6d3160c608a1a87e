//! Plan model - the scheduled output of plan generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::id::{PlanId, TopicId, UploadId, UserId};
use crate::topic::Difficulty;
use crate::Time;

/// Size of a calendar bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One bucket per calendar day
    Day,
    /// One bucket per 7-day window, the last one clipped to the end date
    Week,
}

impl Granularity {
    /// Nominal bucket length in days.
    pub fn days(self) -> i64 {
        match self {
            Granularity::Day => 1,
            Granularity::Week => 7,
        }
    }

    /// Parse a granularity label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Some(Granularity::Day),
            "week" | "weekly" => Some(Granularity::Week),
            _ => None,
        }
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Day
    }
}

/// How topics are distributed over buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// Greedy fill up to the bucket's tolerance-adjusted capacity
    BudgetPacking,
    /// Fixed number of topics per bucket, regardless of hours
    EvenSpread,
}

impl ScheduleStrategy {
    /// Parse a strategy label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "budget_packing" | "packed" | "budget" => Some(ScheduleStrategy::BudgetPacking),
            "even_spread" | "even" | "spread" => Some(ScheduleStrategy::EvenSpread),
            _ => None,
        }
    }
}

impl Default for ScheduleStrategy {
    fn default() -> Self {
        ScheduleStrategy::BudgetPacking
    }
}

/// A topic placed into a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Scheduled topic
    pub topic_id: TopicId,

    /// Topic name
    pub topic_name: String,

    /// Topic description
    pub description: String,

    /// Allocated hours after difficulty weighting and scaling, one decimal
    pub hours: f64,

    /// Difficulty used for weighting
    pub difficulty: Difficulty,

    /// Study checklist
    pub tasks: Vec<String>,
}

/// A day or week slot holding assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBucket {
    /// 1-based position of this bucket in the calendar span
    pub number: u32,

    /// First day of the bucket
    pub start_date: NaiveDate,

    /// Last day of the bucket (same as `start_date` for day buckets)
    pub end_date: NaiveDate,

    /// Nominal capacity in hours
    pub capacity: f64,

    /// Assignments in topic order
    pub assignments: Vec<Assignment>,

    /// Allocated hours, one decimal
    pub total_hours: f64,
}

/// A generated study plan.
///
/// Contains only values derived from the request and topics, so generating
/// twice from identical input yields identical plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// First day of the plan
    pub start_date: NaiveDate,

    /// Last day of the plan (inclusive)
    pub end_date: NaiveDate,

    /// Study hours available per day
    pub daily_hours: f64,

    /// Bucket size
    pub granularity: Granularity,

    /// Distribution strategy
    pub strategy: ScheduleStrategy,

    /// Factor applied to every topic's weighted hours
    pub scale_factor: f64,

    /// Non-empty buckets in chronological order
    pub buckets: Vec<ScheduleBucket>,

    /// Scheduled hours across all buckets, one decimal
    pub total_hours: f64,

    /// Number of buckets in `buckets`
    pub total_buckets: usize,
}

impl Plan {
    /// Iterate every assignment in plan order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.buckets.iter().flat_map(|b| b.assignments.iter())
    }

    /// Topic ids in plan order.
    pub fn topic_ids(&self) -> Vec<TopicId> {
        self.assignments().map(|a| a.topic_id).collect()
    }
}

/// A plan as persisted by the plan store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    /// Unique identifier
    pub id: PlanId,

    /// Owner
    pub user_id: UserId,

    /// Source document of the scheduled topics
    pub upload_id: UploadId,

    /// The generated plan
    pub plan: Plan,

    /// When created
    pub created_at: Time,
}

impl PlanRecord {
    /// Wrap a freshly generated plan.
    pub fn new(user_id: UserId, upload_id: UploadId, plan: Plan) -> Self {
        Self {
            id: PlanId::new(),
            user_id,
            upload_id,
            plan,
            created_at: chrono::Utc::now(),
        }
    }
}
