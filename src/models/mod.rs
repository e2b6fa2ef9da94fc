pub mod habit;
pub mod habit_log;
pub mod user;
