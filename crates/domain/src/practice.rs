use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, Duration};
use tracing::warn;

const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Practice seconds per calendar day, keyed `YYYY-MM-DD`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PracticeLog {
    days: BTreeMap<String, u64>,
}

impl PracticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn day_key(date: Date) -> String {
        date.format(DAY_FORMAT).unwrap_or_else(|_| {
            let month = u8::from(date.month());
            format!("{:04}-{:02}-{:02}", date.year(), month, date.day())
        })
    }

    pub fn add_seconds(&mut self, date: Date, seconds: u64) {
        *self.days.entry(Self::day_key(date)).or_insert(0) += seconds;
    }

    pub fn seconds_on(&self, date: Date) -> u64 {
        self.days.get(&Self::day_key(date)).copied().unwrap_or(0)
    }

    pub fn total_seconds(&self) -> u64 {
        self.days.values().sum()
    }

    /// Seconds practiced since the start of the week (Sunday) containing `today`.
    pub fn week_seconds(&self, today: Date) -> u64 {
        let week_start = start_of_week(today);
        self.days
            .iter()
            .filter_map(|(key, seconds)| match Date::parse(key, DAY_FORMAT) {
                Ok(date) => (date >= week_start).then_some(*seconds),
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping unparseable practice day");
                    None
                }
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

pub fn start_of_week(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_sunday()))
}
