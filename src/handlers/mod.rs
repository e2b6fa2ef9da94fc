pub mod auth;
pub mod habits;
pub mod health;
pub mod logs;
pub mod stats;
pub mod ws;

use chrono::{NaiveDate, Utc};

/// The server's calendar day. All day comparisons run in UTC.
pub(crate) fn server_today() -> NaiveDate {
    Utc::now().date_naive()
}
