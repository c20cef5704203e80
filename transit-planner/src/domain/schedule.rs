//! Transit line operating calendars.
//!
//! A [`Schedule`] describes when a line departs from its first stop. The
//! service day is split into two departure bands:
//!
//! - the *day* band starts at `day_hours.0` and repeats every
//!   `day_interval_mins` until `day_hours.1`;
//! - the *night* band picks up at the first day-cadence slot at or after the
//!   end of the day band (never before `night_hours.0`) and repeats every
//!   `night_interval_mins` until `night_hours.1`, wrapping past midnight when
//!   `night_hours.1 < night_hours.0`. Equal night hours mean no night service.
//!
//! A service day only runs if its weekday is in `operating_days`. Night
//! departures after midnight still belong to the previous service day.

use std::fmt;
use std::ops::BitOr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

const MINS_PER_DAY: i64 = 24 * 60;

/// How many service days either side of a query are inspected.
const LOOKBACK_DAYS: i64 = 1;
const LOOKAHEAD_DAYS: i64 = 8;

/// A set of weekdays, stored as a bitmask with Sunday in the lowest bit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weekdays(u8);

impl Weekdays {
    pub const NONE: Weekdays = Weekdays(0);
    pub const SUNDAY: Weekdays = Weekdays(0x01);
    pub const MONDAY: Weekdays = Weekdays(0x02);
    pub const TUESDAY: Weekdays = Weekdays(0x04);
    pub const WEDNESDAY: Weekdays = Weekdays(0x08);
    pub const THURSDAY: Weekdays = Weekdays(0x10);
    pub const FRIDAY: Weekdays = Weekdays(0x20);
    pub const SATURDAY: Weekdays = Weekdays(0x40);
    pub const WEEKENDS: Weekdays = Weekdays(0x41);
    pub const WORKDAYS: Weekdays = Weekdays(0x3e);
    pub const ALL: Weekdays = Weekdays(0x7f);

    pub fn from_bits(bits: u8) -> Self {
        Weekdays(bits & Self::ALL.0)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Weekdays {
    type Output = Weekdays;

    fn bitor(self, rhs: Weekdays) -> Weekdays {
        Weekdays(self.0 | rhs.0)
    }
}

impl fmt::Debug for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weekdays({:#04x})", self.0)
    }
}

/// Which headway band is in effect at a given moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSchedule {
    None,
    Day,
    Night,
}

/// A half-open run of departures, in minutes from the service day's midnight.
#[derive(Debug, Clone, Copy)]
struct Band {
    start: i64,
    end: i64,
    interval: i64,
}

impl Band {
    /// The first departure of this band at or after `after_ms`
    /// (milliseconds from the service day's midnight).
    fn next_at_or_after(&self, after_ms: i64) -> Option<i64> {
        if self.start >= self.end {
            return None;
        }
        let start_ms = self.start * 60_000;
        let interval_ms = self.interval * 60_000;
        let k = if after_ms <= start_ms {
            0
        } else {
            (after_ms - start_ms + interval_ms - 1) / interval_ms
        };
        let dep = self.start + k * self.interval;
        (dep < self.end).then_some(dep)
    }

    fn contains_minute(&self, minute: f64) -> bool {
        minute >= self.start as f64 && minute < self.end as f64
    }
}

/// A day/night headway calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Hours (0-24) during which the day headway applies.
    pub day_hours: (u8, u8),

    /// Hours (0-24) during which the night headway applies.
    pub night_hours: (u8, u8),

    /// Days on which the line runs.
    #[serde(default = "all_days")]
    pub operating_days: Weekdays,

    /// Minutes between departures during the day.
    pub day_interval_mins: u32,

    /// Minutes between departures at night.
    pub night_interval_mins: u32,
}

fn all_days() -> Weekdays {
    Weekdays::ALL
}

impl Schedule {
    /// Create a schedule running every day of the week.
    pub fn new(
        day_hours: (u8, u8),
        night_hours: (u8, u8),
        day_interval_mins: u32,
        night_interval_mins: u32,
    ) -> Self {
        Self {
            day_hours,
            night_hours,
            operating_days: Weekdays::ALL,
            day_interval_mins,
            night_interval_mins,
        }
    }

    /// Restrict the schedule to the given weekdays.
    pub fn on_days(mut self, days: Weekdays) -> Self {
        self.operating_days = days;
        self
    }

    /// Check hour ranges and intervals.
    pub fn validate(&self) -> Result<(), DomainError> {
        let (d0, d1) = self.day_hours;
        let (n0, n1) = self.night_hours;
        if d0 > 23 || d1 > 24 || n0 > 24 || n1 > 24 {
            return Err(DomainError::InvalidSchedule("hours must be within 0-24"));
        }
        if d0 == d1 {
            return Err(DomainError::InvalidSchedule("day hours must not be empty"));
        }
        if self.day_interval_mins == 0 || self.night_interval_mins == 0 {
            return Err(DomainError::InvalidSchedule("intervals must be positive"));
        }
        Ok(())
    }

    fn day_band(&self) -> Band {
        let start = i64::from(self.day_hours.0) * 60;
        let mut end = i64::from(self.day_hours.1) * 60;
        if end <= start {
            end += MINS_PER_DAY;
        }
        Band {
            start,
            end,
            interval: i64::from(self.day_interval_mins.max(1)),
        }
    }

    /// First day-cadence slot at or after the end of the day band.
    fn day_end_minute(&self) -> i64 {
        let day = self.day_band();
        let trips = (day.end - day.start + day.interval - 1) / day.interval;
        day.start + trips * day.interval
    }

    /// Night hours as minutes from the service day's midnight, if any.
    fn night_window(&self) -> Option<(i64, i64)> {
        let (n0, n1) = self.night_hours;
        if n0 == n1 {
            return None;
        }
        let mut start = i64::from(n0) * 60;
        if n0 < self.day_hours.0 {
            start += MINS_PER_DAY;
        }
        let mut end = i64::from(n1) * 60;
        while end <= start {
            end += MINS_PER_DAY;
        }
        Some((start, end))
    }

    fn night_band(&self) -> Option<Band> {
        let (start, end) = self.night_window()?;
        Some(Band {
            start: start.max(self.day_end_minute()),
            end,
            interval: i64::from(self.night_interval_mins.max(1)),
        })
    }

    fn runs_on(&self, date: NaiveDate) -> bool {
        self.operating_days.contains(date.weekday())
    }

    /// The next departure at or after `after`, or `None` if the line never runs.
    pub fn next_departure(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.operating_days.is_empty() {
            return None;
        }
        let bands: Vec<Band> = std::iter::once(self.day_band())
            .chain(self.night_band())
            .collect();

        let mut best: Option<NaiveDateTime> = None;
        for offset in -LOOKBACK_DAYS..=LOOKAHEAD_DAYS {
            let date = after.date() + Duration::days(offset);
            if !self.runs_on(date) {
                continue;
            }
            let midnight = date.and_time(NaiveTime::MIN);
            let after_ms = (after - midnight).num_milliseconds();
            for band in &bands {
                if let Some(minute) = band.next_at_or_after(after_ms) {
                    let dep = midnight + Duration::minutes(minute);
                    if best.is_none_or(|b| dep < b) {
                        best = Some(dep);
                    }
                }
            }
            // Later service days only start later.
            if best.is_some_and(|b| b < midnight + Duration::days(1)) {
                break;
            }
        }
        best
    }

    /// The next `count` departures at or after `after`, at least a minute apart.
    pub fn next_departures(&self, after: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
        let mut out = Vec::with_capacity(count);
        let mut current = after;
        while out.len() < count {
            let Some(dep) = self.next_departure(current) else {
                break;
            };
            out.push(dep);
            current = dep + Duration::minutes(1);
        }
        out
    }

    /// Which headway band covers `time`.
    pub fn active_schedule_at(&self, time: NaiveDateTime) -> ActiveSchedule {
        let day = self.day_band();
        let night = self.night_window().map(|(start, end)| Band {
            start,
            end,
            interval: 1,
        });
        for offset in [0, -1] {
            let date = time.date() + Duration::days(offset);
            if !self.runs_on(date) {
                continue;
            }
            let midnight = date.and_time(NaiveTime::MIN);
            let minute = (time - midnight).num_seconds() as f64 / 60.0;
            if day.contains_minute(minute) {
                return ActiveSchedule::Day;
            }
            if night.is_some_and(|n| n.contains_minute(minute)) {
                return ActiveSchedule::Night;
            }
        }
        ActiveSchedule::None
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "every {} min {:02}-{:02}h, every {} min {:02}-{:02}h",
            self.day_interval_mins,
            self.day_hours.0,
            self.day_hours.1,
            self.night_interval_mins,
            self.night_hours.0,
            self.night_hours.1
        )
    }
}

/// Departures at a fixed interval from a first departure, forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousSchedule {
    pub first_departure: NaiveDateTime,
    pub interval_secs: u32,
}

impl ContinuousSchedule {
    pub fn new(first_departure: NaiveDateTime, interval: Duration) -> Self {
        Self {
            first_departure,
            interval_secs: interval.num_seconds().max(1) as u32,
        }
    }

    pub fn next_departure(&self, after: NaiveDateTime) -> NaiveDateTime {
        if after <= self.first_departure {
            return self.first_departure;
        }
        let interval_ms = i64::from(self.interval_secs.max(1)) * 1000;
        let diff_ms = (after - self.first_departure).num_milliseconds();
        let k = (diff_ms + interval_ms - 1) / interval_ms;
        self.first_departure + Duration::milliseconds(k * interval_ms)
    }
}

/// Any schedule a line can run on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineSchedule {
    Calendar(Schedule),
    Continuous(ContinuousSchedule),
}

impl LineSchedule {
    pub fn next_departure(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            LineSchedule::Calendar(s) => s.next_departure(after),
            LineSchedule::Continuous(s) => Some(s.next_departure(after)),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            LineSchedule::Calendar(s) => s.validate(),
            LineSchedule::Continuous(s) if s.interval_secs == 0 => {
                Err(DomainError::InvalidSchedule("intervals must be positive"))
            }
            LineSchedule::Continuous(_) => Ok(()),
        }
    }
}

impl From<Schedule> for LineSchedule {
    fn from(s: Schedule) -> Self {
        LineSchedule::Calendar(s)
    }
}

impl From<ContinuousSchedule> for LineSchedule {
    fn from(s: ContinuousSchedule) -> Self {
        LineSchedule::Continuous(s)
    }
}
