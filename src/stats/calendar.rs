use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{latest_per_day, period};
use crate::models::habit_log::{HabitLog, LogStatus};

/// Days shown in the activity heatmap, today included.
pub const ACTIVITY_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DayCounts {
    pub completed: u32,
    pub partial: u32,
    pub skipped: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DayLevel {
    /// Every log that day is completed.
    Complete,
    /// At least half completed.
    Mostly,
    Started,
    /// Nothing completed and something skipped.
    Missed,
    Empty,
}

impl DayCounts {
    fn record(&mut self, status: LogStatus) {
        match status {
            LogStatus::Completed => self.completed += 1,
            LogStatus::Partial => self.partial += 1,
            LogStatus::Skipped => self.skipped += 1,
        }
        self.total += 1;
    }

    pub fn level(&self) -> DayLevel {
        if self.total == 0 {
            DayLevel::Empty
        } else if self.completed == self.total {
            DayLevel::Complete
        } else if self.completed * 2 >= self.total {
            DayLevel::Mostly
        } else if self.completed > 0 {
            DayLevel::Started
        } else if self.skipped > 0 {
            DayLevel::Missed
        } else {
            DayLevel::Empty
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub counts: DayCounts,
    pub level: DayLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthCalendar {
    /// `yyyy-MM`
    pub month: String,
    /// Blank cells before the 1st in a Monday-first grid.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

pub fn month_calendar(logs: &[HabitLog], any_day_in_month: NaiveDate) -> MonthCalendar {
    let first = period::month_start(any_day_in_month);
    let last = period::month_end(any_day_in_month);

    let mut counts: BTreeMap<NaiveDate, DayCounts> = BTreeMap::new();
    for log in latest_per_day(logs) {
        if (first..=last).contains(&log.date) {
            counts.entry(log.date).or_default().record(log.status);
        }
    }

    let days = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| {
            let counts = counts.get(&date).copied().unwrap_or_default();
            CalendarDay {
                date,
                counts,
                level: counts.level(),
            }
        })
        .collect();

    MonthCalendar {
        month: first.format("%Y-%m").to_string(),
        leading_blanks: first.weekday().num_days_from_monday(),
        days,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub count: u32,
    pub intensity: u8,
}

/// Heatmap shade for a day's completed count: 0 none, then 1-2, 3-4, 5+.
pub fn intensity(count: u32) -> u8 {
    match count {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        _ => 3,
    }
}

/// Completed counts for every day of the trailing window ending at `today`, oldest first.
pub fn activity_heatmap(logs: &[HabitLog], today: NaiveDate, window_days: i64) -> Vec<ActivityDay> {
    let start = today - Duration::days(window_days - 1);

    let mut completed: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for log in latest_per_day(logs) {
        if log.is_completed() && (start..=today).contains(&log.date) {
            *completed.entry(log.date).or_default() += 1;
        }
    }

    start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| {
            let count = completed.get(&date).copied().unwrap_or(0);
            ActivityDay {
                date,
                count,
                intensity: intensity(count),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::*;
    use uuid::Uuid;

    fn counts(completed: u32, partial: u32, skipped: u32) -> DayCounts {
        DayCounts {
            completed,
            partial,
            skipped,
            total: completed + partial + skipped,
        }
    }

    #[test]
    fn test_day_levels() {
        assert_eq!(counts(0, 0, 0).level(), DayLevel::Empty);
        assert_eq!(counts(3, 0, 0).level(), DayLevel::Complete);
        assert_eq!(counts(1, 1, 0).level(), DayLevel::Mostly);
        assert_eq!(counts(1, 1, 1).level(), DayLevel::Started);
        assert_eq!(counts(0, 1, 2).level(), DayLevel::Missed);
        assert_eq!(counts(0, 2, 0).level(), DayLevel::Empty);
    }

    #[test]
    fn test_month_calendar_covers_whole_month() {
        let habit = Uuid::new_v4();
        let logs = vec![
            log(habit, day(2024, 2, 1), LogStatus::Completed),
            log(habit, day(2024, 2, 29), LogStatus::Skipped),
            log(habit, day(2024, 3, 1), LogStatus::Completed),
        ];
        let cal = month_calendar(&logs, day(2024, 2, 14));
        assert_eq!(cal.month, "2024-02");
        assert_eq!(cal.days.len(), 29);
        // 2024-02-01 is a Thursday
        assert_eq!(cal.leading_blanks, 3);
        assert_eq!(cal.days[0].level, DayLevel::Complete);
        assert_eq!(cal.days[28].counts, counts(0, 0, 1));
        assert_eq!(cal.days[28].level, DayLevel::Missed);
        assert_eq!(cal.days[10].counts.total, 0);
    }

    #[test]
    fn test_calendar_day_serializes_flat() {
        let entry = CalendarDay {
            date: day(2024, 2, 1),
            counts: counts(1, 0, 0),
            level: DayLevel::Complete,
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["date"], "2024-02-01");
        assert_eq!(json["completed"], 1);
        assert_eq!(json["level"], "complete");
    }

    #[test]
    fn test_intensity_thresholds() {
        assert_eq!(intensity(0), 0);
        assert_eq!(intensity(2), 1);
        assert_eq!(intensity(4), 2);
        assert_eq!(intensity(5), 3);
    }

    #[test]
    fn test_activity_heatmap_window() {
        let today = day(2024, 5, 15);
        let logs: Vec<HabitLog> = (0..3)
            .map(|_| log(Uuid::new_v4(), today, LogStatus::Completed))
            .chain(std::iter::once(log(
                Uuid::new_v4(),
                today - Duration::days(ACTIVITY_WINDOW_DAYS),
                LogStatus::Completed,
            )))
            .collect();

        let heatmap = activity_heatmap(&logs, today, ACTIVITY_WINDOW_DAYS);
        assert_eq!(heatmap.len(), ACTIVITY_WINDOW_DAYS as usize);
        assert_eq!(heatmap[0].date, today - Duration::days(ACTIVITY_WINDOW_DAYS - 1));
        assert_eq!(heatmap[0].count, 0);
        let last = heatmap.last().unwrap();
        assert_eq!((last.date, last.count, last.intensity), (today, 3, 2));
    }
}
