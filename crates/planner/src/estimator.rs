//! Workload estimation.
//!
//! Turns raw topic estimates into difficulty-weighted hours and shrinks them
//! uniformly when the plan window cannot hold the total demand.

use studyplan_core::{Difficulty, Topic, TopicId};
use tracing::{debug, warn};

/// Name shown for topics stored without one.
pub const UNTITLED_TOPIC: &str = "Untitled Topic";

/// A topic normalized for scheduling.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledTopic {
    /// Source topic
    pub id: TopicId,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Difficulty, defaulted to medium when missing
    pub difficulty: Difficulty,
    /// Position within the source document
    pub sequence_order: i64,
    /// Weighted and scaled hours, full precision
    pub hours: f64,
}

/// Result of [`estimate`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadEstimate {
    /// Topics in sequence order with scaled hours
    pub topics: Vec<ScaledTopic>,
    /// Factor applied to every weighted estimate (1.0 when demand fits)
    pub scale_factor: f64,
    /// Sum of weighted hours before scaling
    pub total_demand: f64,
    /// `total_days * daily_budget`
    pub total_capacity: f64,
}

impl WorkloadEstimate {
    /// Sum of scaled hours.
    pub fn scheduled_hours(&self) -> f64 {
        self.topics.iter().map(|t| t.hours).sum()
    }
}

/// Weight each topic by difficulty and scale the set down if it overflows
/// `total_days * daily_budget`.
///
/// Topics missing an estimate (or carrying a negative or non-finite one) are
/// assumed to take one day's budget. Missing difficulty counts as medium.
/// Callers validate `daily_budget` and `total_days` beforehand.
pub fn estimate(topics: &[Topic], daily_budget: f64, total_days: i64) -> WorkloadEstimate {
    let mut weighted: Vec<ScaledTopic> = topics
        .iter()
        .map(|topic| normalize(topic, daily_budget))
        .collect();
    weighted.sort_by_key(|t| t.sequence_order);

    let total_demand: f64 = weighted.iter().map(|t| t.hours).sum();
    let total_capacity = total_days as f64 * daily_budget;

    let scale_factor = if total_demand <= 0.0 || total_demand <= total_capacity {
        1.0
    } else {
        total_capacity / total_demand
    };

    if scale_factor < 1.0 {
        for topic in &mut weighted {
            topic.hours *= scale_factor;
        }
    }

    debug!(
        topics = weighted.len(),
        total_demand,
        total_capacity,
        scale_factor,
        "estimated workload"
    );

    WorkloadEstimate {
        topics: weighted,
        scale_factor,
        total_demand,
        total_capacity,
    }
}

fn normalize(topic: &Topic, daily_budget: f64) -> ScaledTopic {
    let difficulty = match topic.difficulty {
        Some(d) => d,
        None => {
            warn!(topic = %topic.id, "missing or unknown difficulty, assuming medium");
            Difficulty::Medium
        }
    };

    let raw_hours = match topic.estimated_hours {
        Some(h) if h.is_finite() && h >= 0.0 => h,
        other => {
            warn!(topic = %topic.id, hours = ?other, "unusable hour estimate, assuming one day's budget");
            daily_budget
        }
    };

    let name = if topic.name.trim().is_empty() {
        UNTITLED_TOPIC.to_string()
    } else {
        topic.name.clone()
    };

    ScaledTopic {
        id: topic.id,
        name,
        description: topic.description.clone(),
        difficulty,
        sequence_order: topic.sequence_order,
        hours: raw_hours * difficulty.multiplier(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_core::UploadId;

    fn topics(inputs: &[(Difficulty, f64)]) -> Vec<Topic> {
        let upload = UploadId::new();
        inputs
            .iter()
            .enumerate()
            .map(|(i, (d, h))| Topic::new(upload, format!("Topic {}", i + 1), *d, *h, i as i64))
            .collect()
    }

    #[test]
    fn test_overloaded_plan_is_scaled_to_capacity() {
        let input = topics(&[(Difficulty::Medium, 5.0); 5]);
        let estimate = estimate(&input, 2.0, 5);

        assert_eq!(estimate.total_demand, 25.0);
        assert_eq!(estimate.total_capacity, 10.0);
        assert!((estimate.scale_factor - 0.4).abs() < 1e-12);
        for topic in &estimate.topics {
            assert!((topic.hours - 2.0).abs() < 1e-9);
        }
        assert!((estimate.scheduled_hours() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_fitting_plan_is_not_scaled() {
        let input = topics(&[(Difficulty::Easy, 5.0), (Difficulty::Hard, 10.0)]);
        let estimate = estimate(&input, 3.0, 10);

        assert_eq!(estimate.scale_factor, 1.0);
        assert!((estimate.topics[0].hours - 4.0).abs() < 1e-9);
        assert!((estimate.topics[1].hours - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_demand_equal_to_capacity_is_not_scaled() {
        let input = topics(&[(Difficulty::Medium, 4.0), (Difficulty::Medium, 6.0)]);
        let estimate = estimate(&input, 2.0, 5);
        assert_eq!(estimate.scale_factor, 1.0);
    }

    #[test]
    fn test_zero_demand_short_circuits() {
        let input = topics(&[(Difficulty::Hard, 0.0), (Difficulty::Easy, 0.0)]);
        let estimate = estimate(&input, 2.0, 3);

        assert_eq!(estimate.scale_factor, 1.0);
        assert!(estimate.topics.iter().all(|t| t.hours == 0.0));
    }

    #[test]
    fn test_malformed_topics_get_defaults() {
        let upload = UploadId::new();
        let mut missing = Topic::new(upload, "", Difficulty::Hard, 1.0, 0);
        missing.difficulty = None;
        missing.estimated_hours = None;
        let mut negative = Topic::new(upload, "Negative", Difficulty::Easy, -3.0, 1);
        negative.estimated_hours = Some(-3.0);

        let estimate = estimate(&[missing, negative], 2.5, 30);

        assert_eq!(estimate.topics[0].name, UNTITLED_TOPIC);
        assert_eq!(estimate.topics[0].difficulty, Difficulty::Medium);
        assert_eq!(estimate.topics[0].hours, 2.5);
        assert!((estimate.topics[1].hours - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_topics_sorted_by_sequence_order() {
        let upload = UploadId::new();
        let input = vec![
            Topic::new(upload, "C", Difficulty::Medium, 1.0, 3),
            Topic::new(upload, "A", Difficulty::Medium, 1.0, 1),
            Topic::new(upload, "B", Difficulty::Medium, 1.0, 2),
        ];
        let estimate = estimate(&input, 2.0, 3);
        let names: Vec<_> = estimate.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
