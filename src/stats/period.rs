//! Calendar helpers. Weeks start on Monday (ISO 8601).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

pub fn week_end(day: NaiveDate) -> NaiveDate {
    week_start(day) + Duration::days(6)
}

pub fn in_week_of(date: NaiveDate, day: NaiveDate) -> bool {
    week_start(date) == week_start(day)
}

/// The seven days of the week containing `day`, Monday first.
pub fn week_days(day: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let start = week_start(day);
    (0..7).map(move |offset| start + Duration::days(offset))
}

/// Accepts `yyyy-MM-dd`, RFC 3339, or a naive `yyyy-MM-ddTHH:MM:SS` timestamp.
/// Timestamps keep the calendar day they carry; the time of day is dropped.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

/// First day of a `yyyy-MM` month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let (year, month) = raw.trim().split_once('-')?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub fn month_end(day: NaiveDate) -> NaiveDate {
    let first = month_start(day);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|n| n.pred_opt()).unwrap_or(first)
}

pub fn deserialize_optional_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_day(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {:?}, expected yyyy-MM-dd", raw))),
    }
}
