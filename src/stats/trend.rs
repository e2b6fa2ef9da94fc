use serde::Serialize;

use super::aggregator::StatValues;
use super::round_half_up;

/// Percentage change from `previous` to `current`.
///
/// A zero baseline reports 100 for any new activity and 0 otherwise.
pub fn percent_change(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return if current > 0 { 100 } else { 0 };
    }
    round_half_up(100.0 * (current - previous) as f64 / previous as f64)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatTrends {
    pub total_habits: i64,
    pub completed_today: i64,
    pub weekly_progress: i64,
    pub current_streak: i64,
}

impl StatTrends {
    pub fn between(current: &StatValues, previous: &StatValues) -> Self {
        Self {
            total_habits: percent_change(current.total_habits, previous.total_habits),
            completed_today: percent_change(current.completed_today, previous.completed_today),
            weekly_progress: percent_change(current.weekly_progress, previous.weekly_progress),
            current_streak: percent_change(current.current_streak, previous.current_streak),
        }
    }
}
