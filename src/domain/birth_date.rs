use chrono::{DateTime, Datelike, NaiveDate, Utc};

// Any leap year works here: it only decides whether a month/day pair exists.
const LEAP_YEAR: i32 = 2000;

/// Month and day of a celebrant's birthday. The birth year plays no part in
/// reminders and is not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDate {
    month: u32,
    day: u32,
}

impl BirthDate {
    pub fn parse(month: u32, day: u32) -> Result<BirthDate, String> {
        if NaiveDate::from_ymd_opt(LEAP_YEAR, month, day).is_none() {
            return Err(format!("{:02}-{:02} is not a valid birthday", month, day));
        }

        Ok(Self { month, day })
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Date on which the birthday is celebrated in `year`. February 29
    /// birthdays are celebrated on February 28 outside leap years.
    pub fn observed_in(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, self.day - 1))
    }

    /// Whole days from `now` until the next time this birthday comes around.
    ///
    /// `now` is normalized to midnight UTC, so the answer depends only on the
    /// calendar day it falls on: tomorrow is `1`, and a birthday that is today
    /// has already passed and counts towards next year. The result is always
    /// at least `1`. `None` is only returned when the next occurrence falls
    /// outside the range of dates `chrono` can represent.
    pub fn days_until(&self, now: DateTime<Utc>) -> Option<u32> {
        let today = now.date_naive();
        let mut next = self.observed_in(today.year())?;

        if next <= today {
            next = self.observed_in(today.year() + 1)?;
        }

        u32::try_from((next - today).num_days()).ok()
    }
}
