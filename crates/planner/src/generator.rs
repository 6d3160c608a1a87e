//! Plan generation: validation, estimation, scheduling and assembly.

use serde::{Deserialize, Serialize};
use studyplan_core::{
    round1, Granularity, Plan, PlanError, PlanResult, ScheduleStrategy, Topic,
};
use tracing::info;
use crate::calendar::{validate_budget, DateRange};
use crate::config::PlannerConfig;
use crate::estimator::estimate;
use crate::scheduler::Scheduler;

/// Parameters of a plan generation request.
///
/// Optional fields fall back to the generator's [`PlannerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// First day, `YYYY-MM-DD`
    pub start_date: String,

    /// Last day (inclusive), `YYYY-MM-DD`
    pub end_date: String,

    /// Study hours per day
    #[serde(default, alias = "hours_per_day")]
    pub daily_hours: Option<f64>,

    /// Bucket size
    #[serde(default)]
    pub granularity: Option<Granularity>,

    /// Distribution strategy
    #[serde(default)]
    pub strategy: Option<ScheduleStrategy>,
}

impl PlanRequest {
    /// Request a plan over `start..=end` using configured defaults.
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            daily_hours: None,
            granularity: None,
            strategy: None,
        }
    }

    /// Set the daily hours.
    pub fn with_daily_hours(mut self, hours: f64) -> Self {
        self.daily_hours = Some(hours);
        self
    }

    /// Set the granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: ScheduleStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Builds plans from topics. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    config: PlannerConfig,
}

impl PlanGenerator {
    /// Create a generator.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Generate a plan.
    ///
    /// Rejects bad dates and budgets before looking at the topics, then
    /// reports [`PlanError::EmptyTopicSet`] when there is nothing to schedule.
    pub fn generate(&self, topics: &[Topic], request: &PlanRequest) -> PlanResult<Plan> {
        let range = DateRange::parse(&request.start_date, &request.end_date, self.config.max_span_days)?;
        let daily_hours = validate_budget(request.daily_hours.unwrap_or(self.config.default_daily_hours))?;
        if topics.is_empty() {
            return Err(PlanError::EmptyTopicSet);
        }

        let granularity = request.granularity.unwrap_or(self.config.granularity);
        let strategy = request.strategy.unwrap_or(self.config.strategy);

        let workload = estimate(topics, daily_hours, range.total_days());
        let buckets = Scheduler::from_config(&self.config)
            .with_strategy(strategy)
            .schedule_range(&workload.topics, &range, daily_hours, granularity);

        info!(
            topics = topics.len(),
            buckets = buckets.len(),
            scale_factor = workload.scale_factor,
            "generated plan {} .. {}",
            range.start(),
            range.end()
        );

        Ok(Plan {
            start_date: range.start(),
            end_date: range.end(),
            daily_hours,
            granularity,
            strategy,
            scale_factor: workload.scale_factor,
            total_hours: round1(workload.scheduled_hours()),
            total_buckets: buckets.len(),
            buckets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use studyplan_core::{DateRangeError, Difficulty, UploadId};

    fn medium_topics(count: usize, hours: f64) -> Vec<Topic> {
        let upload = UploadId::new();
        (0..count)
            .map(|i| Topic::new(upload, format!("Chapter {}", i + 1), Difficulty::Medium, hours, i as i64))
            .collect()
    }

    #[test]
    fn test_overloaded_five_day_plan() {
        let topics = medium_topics(5, 5.0);
        let request = PlanRequest::new("2024-01-01", "2024-01-05").with_daily_hours(2.0);

        let plan = PlanGenerator::default().generate(&topics, &request).unwrap();

        assert!((plan.scale_factor - 0.4).abs() < 1e-12);
        assert_eq!(plan.total_buckets, 5);
        assert_eq!(plan.total_hours, 10.0);
        for bucket in &plan.buckets {
            assert_eq!(bucket.assignments.len(), 1);
            assert_eq!(bucket.assignments[0].hours, 2.0);
            assert_eq!(bucket.assignments[0].tasks.len(), 4);
        }
    }

    #[test]
    fn test_every_topic_scheduled_once_in_order() {
        let upload = UploadId::new();
        let topics: Vec<Topic> = (0..40)
            .map(|i| {
                let difficulty = match i % 3 {
                    0 => Difficulty::Easy,
                    1 => Difficulty::Medium,
                    _ => Difficulty::Hard,
                };
                Topic::new(upload, format!("T{}", i), difficulty, 0.5 + (i % 7) as f64, i)
            })
            .collect();

        for granularity in [Granularity::Day, Granularity::Week] {
            for strategy in [ScheduleStrategy::BudgetPacking, ScheduleStrategy::EvenSpread] {
                let request = PlanRequest::new("2024-03-01", "2024-03-20")
                    .with_daily_hours(3.0)
                    .with_granularity(granularity)
                    .with_strategy(strategy);
                let plan = PlanGenerator::default().generate(&topics, &request).unwrap();

                let ids = plan.topic_ids();
                let expected: Vec<_> = topics.iter().map(|t| t.id).collect();
                assert_eq!(ids, expected);
                assert_eq!(ids.iter().collect::<HashSet<_>>().len(), topics.len());
                assert_eq!(plan.total_buckets, plan.buckets.len());
                assert!(plan.buckets.windows(2).all(|w| w[0].end_date < w[1].start_date));
            }
        }
    }

    #[test]
    fn test_request_defaults_come_from_config() {
        let config = PlannerConfig::default()
            .with_default_daily_hours(4.0)
            .with_granularity(Granularity::Week);
        let plan = PlanGenerator::new(config)
            .generate(&medium_topics(3, 1.0), &PlanRequest::new("2024-01-01", "2024-01-14"))
            .unwrap();

        assert_eq!(plan.daily_hours, 4.0);
        assert_eq!(plan.granularity, Granularity::Week);
        assert_eq!(plan.buckets.len(), 1);
        assert_eq!(plan.buckets[0].capacity, 28.0);
    }

    #[test]
    fn test_validation_precedes_empty_check() {
        let generator = PlanGenerator::default();

        let err = generator
            .generate(&[], &PlanRequest::new("2024-01-10", "2024-01-01"))
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidDateRange(DateRangeError::StartAfterEnd { .. })));

        let err = generator
            .generate(&[], &PlanRequest::new("2024-01-01", "2025-02-04"))
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidDateRange(DateRangeError::SpanTooLong { days: 401, .. })));

        let err = generator
            .generate(&[], &PlanRequest::new("2024-01-01", "2024-01-02").with_daily_hours(-1.0))
            .unwrap_err();
        assert_eq!(err, PlanError::InvalidBudget(-1.0));

        let err = generator
            .generate(&[], &PlanRequest::new("2024-01-01", "2024-01-02"))
            .unwrap_err();
        assert_eq!(err, PlanError::EmptyTopicSet);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let topics = medium_topics(9, 2.7);
        let request = PlanRequest::new("2024-06-01", "2024-06-09").with_daily_hours(1.5);
        let generator = PlanGenerator::default();

        let a = generator.generate(&topics, &request).unwrap();
        let b = generator.generate(&topics, &request).unwrap();
        assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
    }

    #[test]
    fn test_request_accepts_source_field_name() {
        let request: PlanRequest = serde_json::from_str(
            r#"{ "start_date": "2024-01-01", "end_date": "2024-01-31", "hours_per_day": 3 }"#,
        )
        .unwrap();
        assert_eq!(request.daily_hours, Some(3.0));
        assert_eq!(request.granularity, None);
    }
}
