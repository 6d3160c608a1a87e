//! Progress aggregation.

use std::collections::HashMap;
use studyplan_core::{
    round1, ProgressRecord, ProgressStats, ProgressStatus, Topic, TopicId, TopicProgress,
    UpcomingTopic,
};

/// Summarize a user's progress records.
///
/// Order-independent; an empty slice yields all-zero stats.
pub fn aggregate(records: &[ProgressRecord]) -> ProgressStats {
    let total = records.len();
    if total == 0 {
        return ProgressStats::default();
    }

    let count = |status: ProgressStatus| records.iter().filter(|r| r.status == status).count();
    let completed = count(ProgressStatus::Completed);
    let hours: f64 = records.iter().map(|r| r.hours_spent).sum();

    ProgressStats {
        total_topics: total,
        completed,
        in_progress: count(ProgressStatus::InProgress),
        not_started: count(ProgressStatus::NotStarted),
        completion_percentage: round1(completed as f64 / total as f64 * 100.0),
        total_hours: round1(hours),
    }
}

/// Join topics with their progress; topics without a record are `not_started`.
pub fn join_topics(topics: &[Topic], records: &[ProgressRecord]) -> Vec<TopicProgress> {
    let by_topic: HashMap<TopicId, &ProgressRecord> =
        records.iter().map(|r| (r.topic_id, r)).collect();

    topics
        .iter()
        .map(|topic| {
            let record = by_topic.get(&topic.id);
            TopicProgress {
                topic: topic.clone(),
                status: record.map(|r| r.status).unwrap_or_default(),
                hours_spent: record.map(|r| r.hours_spent).unwrap_or(0.0),
            }
        })
        .collect()
}

/// Unfinished topics in topic order, at most `limit` of them.
pub fn upcoming(topics: &[Topic], records: &[ProgressRecord], limit: usize) -> Vec<UpcomingTopic> {
    join_topics(topics, records)
        .into_iter()
        .filter(|tp| tp.status.is_open())
        .take(limit)
        .map(|tp| UpcomingTopic {
            topic_id: tp.topic.id,
            name: tp.topic.name,
            status: tp.status,
            hours_spent: tp.hours_spent,
            estimated_hours: tp.topic.estimated_hours.unwrap_or(0.0),
        })
        .collect()
}
