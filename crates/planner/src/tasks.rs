//! Per-topic study checklist.

use studyplan_core::Difficulty;

/// Study checklist for a topic of the given difficulty.
pub fn tasks_for(difficulty: Difficulty) -> Vec<String> {
    let mut tasks = vec![
        "read and understand core concepts",
        "create summary notes",
    ];

    if matches!(difficulty, Difficulty::Medium | Difficulty::Hard) {
        tasks.push("practice problems and examples");
    }

    if difficulty == Difficulty::Hard {
        tasks.push("review prior questions and attempt a quiz");
        tasks.push("deep dive into complex sub-topics");
    }

    tasks.push("quick revision before moving forward");

    tasks.into_iter().map(String::from).collect()
}
