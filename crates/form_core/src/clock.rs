use chrono::{DateTime, Local};

/// Matches `Date::toLocaleString` in the en-US locale, e.g. `10/19/2026, 3:04:05 PM`.
pub const SUBMITTED_AT_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(SUBMITTED_AT_FORMAT).to_string()
}
