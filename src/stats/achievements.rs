//! Achievement catalog and evaluation.
//!
//! The catalog is plain data; [`evaluate`] knows nothing about individual
//! achievements and only reads the metric each definition points at.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::{latest_per_day, period, streak};
use crate::models::habit_log::HabitLog;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AchievementIcon {
    Trophy,
    Star,
    Flame,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalCompleted,
    LongestStreak,
    PerfectWeeks,
}

#[derive(Debug, Clone, Copy)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: AchievementIcon,
    pub metric: Metric,
    pub target: u32,
}

pub const CATALOG: [AchievementDefinition; 4] = [
    AchievementDefinition {
        id: "getting_started",
        title: "Getting Started",
        description: "Complete your first habit",
        icon: AchievementIcon::Trophy,
        metric: Metric::TotalCompleted,
        target: 1,
    },
    AchievementDefinition {
        id: "habit_master",
        title: "Habit Master",
        description: "Complete 100 habits",
        icon: AchievementIcon::Star,
        metric: Metric::TotalCompleted,
        target: 100,
    },
    AchievementDefinition {
        id: "perfect_week",
        title: "Perfect Week",
        description: "Complete all habits for a week",
        icon: AchievementIcon::Flame,
        metric: Metric::PerfectWeeks,
        target: 1,
    },
    AchievementDefinition {
        id: "consistency_king",
        title: "Consistency King",
        description: "Maintain a 30-day streak",
        icon: AchievementIcon::Target,
        metric: Metric::LongestStreak,
        target: 30,
    },
];

/// Aggregates the catalog is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementInputs {
    pub total_completed: u32,
    pub longest_streak: u32,
    pub perfect_weeks: u32,
}

impl AchievementInputs {
    pub fn from_logs(logs: &[HabitLog], total_habits: i64, today: NaiveDate) -> Self {
        let total_completed = latest_per_day(logs)
            .into_iter()
            .filter(|log| log.is_completed() && log.date <= today)
            .count() as u32;

        Self {
            total_completed,
            longest_streak: streak::longest_streak(logs, today),
            perfect_weeks: perfect_week_count(logs, total_habits, today),
        }
    }

    fn value(&self, metric: Metric) -> u32 {
        match metric {
            Metric::TotalCompleted => self.total_completed,
            Metric::LongestStreak => self.longest_streak,
            Metric::PerfectWeeks => self.perfect_weeks,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: AchievementIcon,
    pub target: u32,
    /// Metric value capped at `target`.
    pub progress: u32,
    pub unlocked: bool,
}

pub fn evaluate(catalog: &[AchievementDefinition], inputs: &AchievementInputs) -> Vec<Achievement> {
    catalog
        .iter()
        .map(|def| {
            let value = inputs.value(def.metric);
            Achievement {
                id: def.id,
                title: def.title,
                description: def.description,
                icon: def.icon,
                target: def.target,
                progress: value.min(def.target),
                unlocked: value >= def.target,
            }
        })
        .collect()
}

/// Perfect weeks in the history up to and including the week containing `today`.
///
/// A week is perfect when its completed logs cover every habit on every day.
pub fn perfect_week_count(logs: &[HabitLog], total_habits: i64, today: NaiveDate) -> u32 {
    if total_habits <= 0 {
        return 0;
    }
    let mut per_week: HashMap<NaiveDate, i64> = HashMap::new();
    for log in latest_per_day(logs) {
        if log.is_completed() && log.date <= period::week_end(today) {
            *per_week.entry(period::week_start(log.date)).or_default() += 1;
        }
    }
    per_week
        .values()
        .filter(|&&completed| completed >= total_habits * 7)
        .count() as u32
}
