//! Calendar conversions and fixed-offset local time
//!
//! Timestamps are Unix seconds. Local time is UTC plus a fixed offset (the
//! station's zone plus an optional daylight offset); there is no zone
//! database on the device.
//!
//! Date math uses Howard Hinnant's `civil_from_days` algorithm, which is
//! O(1) and correct for every date in the proleptic Gregorian calendar.

/// Seconds since 1970-01-01T00:00:00Z.
pub type Timestamp = i64;

pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3600;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Weekday for a count of days since the Unix epoch (a Thursday).
    pub fn from_days_since_epoch(days: i64) -> Self {
        match days.rem_euclid(7) {
            0 => Self::Thursday,
            1 => Self::Friday,
            2 => Self::Saturday,
            3 => Self::Sunday,
            4 => Self::Monday,
            5 => Self::Tuesday,
            _ => Self::Wednesday,
        }
    }

    /// Three-letter label for display
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Sunday => "Sun",
        }
    }
}

/// A calendar date in the station's local zone.
///
/// Used as the grouping key for daily forecast buckets, so two samples that
/// fall on the same local day compare equal regardless of time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CivilDate {
    pub year: i32,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
}

impl CivilDate {
    /// Three-letter month label for display
    pub const fn month_name(&self) -> &'static str {
        match self.month {
            1 => "Jan",
            2 => "Feb",
            3 => "Mar",
            4 => "Apr",
            5 => "May",
            6 => "Jun",
            7 => "Jul",
            8 => "Aug",
            9 => "Sep",
            10 => "Oct",
            11 => "Nov",
            _ => "Dec",
        }
    }
}

/// Wall-clock time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    /// Seconds elapsed since local midnight
    pub const fn seconds_since_midnight(&self) -> i64 {
        self.hour as i64 * SECONDS_PER_HOUR
            + self.minute as i64 * SECONDS_PER_MINUTE
            + self.second as i64
    }
}

/// A timestamp broken down in the station's local zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    pub date: CivilDate,
    pub time: TimeOfDay,
    pub weekday: Weekday,
}

/// Fixed UTC offset used to derive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeZone {
    offset_secs: i32,
}

impl TimeZone {
    /// UTC itself
    pub const UTC: Self = Self { offset_secs: 0 };

    /// Zone from a standard offset plus a daylight-saving offset, both in seconds.
    pub const fn new(utc_offset_secs: i32, daylight_offset_secs: i32) -> Self {
        Self {
            offset_secs: utc_offset_secs + daylight_offset_secs,
        }
    }

    /// Total offset from UTC in seconds
    pub const fn offset_secs(&self) -> i32 {
        self.offset_secs
    }

    /// Break a timestamp down into local date and time.
    pub fn to_local(&self, ts: Timestamp) -> LocalDateTime {
        let local = ts + self.offset_secs as i64;
        let days = local.div_euclid(SECONDS_PER_DAY);
        let secs_today = local.rem_euclid(SECONDS_PER_DAY);

        LocalDateTime {
            date: civil_from_days(days),
            time: TimeOfDay {
                hour: (secs_today / SECONDS_PER_HOUR) as u8,
                minute: ((secs_today % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u8,
                second: (secs_today % SECONDS_PER_MINUTE) as u8,
            },
            weekday: Weekday::from_days_since_epoch(days),
        }
    }

    /// Local calendar date of a timestamp
    pub fn local_date(&self, ts: Timestamp) -> CivilDate {
        self.to_local(ts).date
    }
}

/// Convert days since the Unix epoch to a civil date.
pub fn civil_from_days(days_since_epoch: i64) -> CivilDate {
    // Shift the epoch to 0000-03-01 so the leap day is the last day of the year
    let z = days_since_epoch + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097); // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11], March = 0
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };

    CivilDate {
        year: year as i32,
        month,
        day,
    }
}

/// Convert a civil date to days since the Unix epoch.
pub fn days_from_civil(date: CivilDate) -> i64 {
    let (y, m) = if date.month <= 2 {
        (date.year as i64 - 1, date.month as i64 + 9)
    } else {
        (date.year as i64, date.month as i64 - 3)
    };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let doy = (153 * m + 2) / 5 + date.day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146_097 + doe - 719_468
}

/// Unix timestamp for a UTC date and time. Mostly useful for building test fixtures.
pub fn timestamp_from_utc(date: CivilDate, time: TimeOfDay) -> Timestamp {
    days_from_civil(date) * SECONDS_PER_DAY + time.seconds_since_midnight()
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn date(year: i32, month: u8, day: u8) -> CivilDate {
        CivilDate { year, month, day }
    }

    #[test]
    fn test_epoch_is_thursday_jan_first() {
        let local = TimeZone::UTC.to_local(0);
        assert_eq!(local.date, date(1970, 1, 1));
        assert_eq!(local.time, TimeOfDay::new(0, 0, 0));
        assert_eq!(local.weekday, Weekday::Thursday);
    }

    #[test]
    fn test_sync_threshold_date() {
        let local = TimeZone::UTC.to_local(1_577_836_800);
        assert_eq!(local.date, date(2020, 1, 1));
        assert_eq!(local.weekday, Weekday::Wednesday);
    }

    #[test]
    fn test_leap_day_round_trip() {
        let leap = date(2024, 2, 29);
        let days = days_from_civil(leap);
        assert_eq!(civil_from_days(days), leap);
        assert_eq!(civil_from_days(days + 1), date(2024, 3, 1));
    }

    #[test]
    fn test_century_non_leap_year() {
        let days = days_from_civil(date(2100, 2, 28));
        assert_eq!(civil_from_days(days + 1), date(2100, 3, 1));
    }

    #[test]
    fn test_negative_offset_moves_to_previous_day() {
        // 2024-06-01 03:00 UTC is still May 31st in Mountain Time
        let ts = timestamp_from_utc(date(2024, 6, 1), TimeOfDay::new(3, 0, 0));
        let mountain = TimeZone::new(-7 * 3600, 0);
        let local = mountain.to_local(ts);
        assert_eq!(local.date, date(2024, 5, 31));
        assert_eq!(local.time, TimeOfDay::new(20, 0, 0));
        assert_eq!(local.weekday, Weekday::Friday);
    }

    #[test]
    fn test_daylight_offset_adds_to_zone() {
        let zone = TimeZone::new(-7 * 3600, 3600);
        assert_eq!(zone.offset_secs(), -6 * 3600);
    }

    #[test]
    fn test_time_of_day_seconds() {
        assert_eq!(TimeOfDay::new(14, 10, 5).seconds_since_midnight(), 51_005);
    }
}
