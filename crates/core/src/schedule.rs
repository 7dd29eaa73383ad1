//! Wall-clock schedules for the daily jobs (Asia/Manila local time).
//!
//! Manila observes no daylight saving, so a fixed UTC+8 offset is exact.
//! A [`DailyAt`] is evaluated on every runner tick: it is due once the
//! local target time has passed and no run has been recorded for the
//! current local date. Because the "last run" date is persisted, the
//! decision survives process restarts.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::types::Timestamp;

/// Asia/Manila offset from UTC in seconds.
pub const MANILA_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Admin digest fires at 08:00 Manila.
pub const DIGEST_TIME: DailyAt = DailyAt { hour: 8, minute: 0 };

/// Re-engagement sweep fires at 10:00 Manila.
pub const REENGAGEMENT_TIME: DailyAt = DailyAt { hour: 10, minute: 0 };

/// The fixed Asia/Manila offset.
pub fn manila() -> FixedOffset {
    FixedOffset::east_opt(MANILA_UTC_OFFSET_SECS).expect("UTC+8 is a valid offset")
}

/// A time of day in Manila local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAt {
    hour: u32,
    minute: u32,
}

impl DailyAt {
    /// Returns `None` for out-of-range hours or minutes.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|_| Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The Manila calendar date `now` falls on.
    pub fn local_date(now: Timestamp) -> NaiveDate {
        now.with_timezone(&manila()).date_naive()
    }

    /// Today's target (Manila date of `now`) expressed in UTC.
    pub fn target_on(&self, date: NaiveDate) -> Timestamp {
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN);
        let local = date.and_time(time);
        let utc = local - Duration::seconds(i64::from(MANILA_UTC_OFFSET_SECS));
        Utc.from_utc_datetime(&utc)
    }

    /// The next occurrence strictly after `now`, rolling to tomorrow when
    /// today's target has already passed (or is exactly now).
    pub fn next_after(&self, now: Timestamp) -> Timestamp {
        let today = self.target_on(Self::local_date(now));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Time remaining until [`Self::next_after`]; never negative.
    pub fn delay_from(&self, now: Timestamp) -> std::time::Duration {
        (self.next_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }

    /// Whether a run should start now, given the Manila date of the last
    /// recorded run.
    pub fn is_due(&self, now: Timestamp, last_run: Option<NaiveDate>) -> bool {
        let today = Self::local_date(now);
        now >= self.target_on(today) && last_run != Some(today)
    }
}

/// Next occurrence of `hour:minute` Manila time strictly after `now`.
///
/// Returns `None` when the time of day is out of range.
pub fn next_daily_occurrence(
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    DailyAt::new(hour, minute).map(|at| at.next_after(now))
}
