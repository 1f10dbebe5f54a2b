//! Wake scheduling
//!
//! Turns the fixed daily refresh hours and the current local time into a
//! deep-sleep duration. The scheduler fails closed: with no trustworthy clock,
//! or a result that is not a positive duration, the caller sleeps for the
//! fixed retry interval instead.

use log::{info, warn};
use thiserror_no_std::Error;

use crate::clock::ClockState;
use crate::config::Schedule;
use crate::time::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Added to every scheduled sleep so the device wakes just after the
/// target boundary, never before it.
pub const GUARD_OFFSET_SECS: i64 = 30;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Clock not synchronized")]
    ClockNotSynced,
    #[error("Computed sleep of {0}s is not a positive duration")]
    InvalidResult(i64),
}

/// Why the device is going to sleep for the chosen duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepReason {
    /// Next scheduled refresh
    Scheduled,
    /// Fixed backoff after a failure
    Retry,
}

/// Duration handed to the power controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    pub secs: u32,
    pub reason: SleepReason,
}

#[derive(Debug, Clone)]
pub struct WakeScheduler {
    schedule: Schedule,
}

impl WakeScheduler {
    pub const fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// First wake hour strictly after `hour`.
    ///
    /// Wraps to the earliest hour plus 24 when `hour` is at or past every
    /// configured hour, so the result can be 24 or more (tomorrow).
    pub fn next_update_hour(&self, hour: u8) -> Option<u8> {
        let hours = self.schedule.hours();
        hours
            .iter()
            .copied()
            .find(|&h| h > hour)
            .or_else(|| hours.first().map(|&h| h + 24))
    }

    /// Seconds from now until just after the next wake hour.
    pub fn seconds_until_next_update(&self, clock: &ClockState) -> Result<u32, ScheduleError> {
        let Some(now) = clock.time_of_day() else {
            warn!("Time not synced, cannot calculate sleep duration");
            return Err(ScheduleError::ClockNotSynced);
        };

        let next_hour = self
            .next_update_hour(now.hour)
            .ok_or(ScheduleError::InvalidResult(0))?;

        let mut hours_until = next_hour as i64 - now.hour as i64;
        if hours_until <= 0 {
            hours_until += 24;
        }

        let secs = hours_until * SECONDS_PER_HOUR
            - now.minute as i64 * SECONDS_PER_MINUTE
            - now.second as i64
            + GUARD_OFFSET_SECS;

        info!(
            "Current time: {:02}:{:02}:{:02}, next update at {:02}:00:00 (in {} hours)",
            now.hour,
            now.minute,
            now.second,
            next_hour % 24,
            hours_until
        );

        if secs <= 0 {
            return Err(ScheduleError::InvalidResult(secs));
        }
        u32::try_from(secs).map_err(|_| ScheduleError::InvalidResult(secs))
    }

    /// Fixed backoff used after any failure
    pub const fn retry(&self) -> SleepRequest {
        SleepRequest {
            secs: self.schedule.retry_secs(),
            reason: SleepReason::Retry,
        }
    }

    /// Sleep until the next refresh, or for the retry interval if that
    /// cannot be computed.
    pub fn plan(&self, clock: &ClockState) -> SleepRequest {
        match self.seconds_until_next_update(clock) {
            Ok(secs) => {
                info!("Sleep duration: {} seconds ({} minutes)", secs, secs / 60);
                SleepRequest {
                    secs,
                    reason: SleepReason::Scheduled,
                }
            }
            Err(e) => {
                warn!("{}; using retry interval", e);
                self.retry()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SYNC_THRESHOLD;
    use crate::time::{CivilDate, LocalDateTime, TimeOfDay, TimeZone, Weekday, timestamp_from_utc};

    fn clock_at(hour: u8, minute: u8, second: u8) -> ClockState {
        let ts = timestamp_from_utc(
            CivilDate {
                year: 2024,
                month: 3,
                day: 10,
            },
            TimeOfDay::new(hour, minute, second),
        );
        ClockState::at(ts, &TimeZone::UTC)
    }

    fn default_scheduler() -> WakeScheduler {
        WakeScheduler::new(Schedule::default())
    }

    #[test]
    fn test_afternoon_sleeps_until_evening() {
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock_at(14, 10, 0)),
            Ok(13_830)
        );
    }

    #[test]
    fn test_late_evening_wraps_to_midnight() {
        assert_eq!(default_scheduler().next_update_hour(23), Some(24));
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock_at(23, 50, 0)),
            Ok(630)
        );
    }

    #[test]
    fn test_exactly_on_boundary_targets_next_slot() {
        // 18:00:00 is not strictly before 18, so the next slot is midnight
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock_at(18, 0, 0)),
            Ok(6 * 3600 + 30)
        );
    }

    #[test]
    fn test_one_second_before_boundary() {
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock_at(17, 59, 59)),
            Ok(31)
        );
    }

    #[test]
    fn test_single_hour_schedule_waits_a_day() {
        let scheduler = WakeScheduler::new(Schedule::new(&[6], 300).unwrap());
        assert_eq!(scheduler.next_update_hour(6), Some(30));
        assert_eq!(
            scheduler.seconds_until_next_update(&clock_at(6, 30, 0)),
            Ok(24 * 3600 - 30 * 60 + 30)
        );
    }

    #[test]
    fn test_unsynced_clock_is_an_error() {
        let clock = ClockState::at(SYNC_THRESHOLD - 1, &TimeZone::UTC);
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock),
            Err(ScheduleError::ClockNotSynced)
        );
    }

    #[test]
    fn test_malformed_time_is_invalid_result() {
        let clock = ClockState::Synced {
            now: SYNC_THRESHOLD,
            local: LocalDateTime {
                date: CivilDate {
                    year: 2024,
                    month: 1,
                    day: 1,
                },
                time: TimeOfDay::new(23, 200, 0),
                weekday: Weekday::Monday,
            },
        };
        assert_eq!(
            default_scheduler().seconds_until_next_update(&clock),
            Err(ScheduleError::InvalidResult(3600 - 12_000 + 30))
        );
    }

    #[test]
    fn test_plan_falls_back_to_retry() {
        let scheduler = default_scheduler();
        let unsynced = ClockState::Unsynced;
        assert_eq!(
            scheduler.plan(&unsynced),
            SleepRequest {
                secs: 300,
                reason: SleepReason::Retry
            }
        );
        assert_eq!(
            scheduler.plan(&clock_at(14, 10, 0)),
            SleepRequest {
                secs: 13_830,
                reason: SleepReason::Scheduled
            }
        );
    }

    #[test]
    fn test_scheduled_sleep_is_always_positive() {
        let scheduler = WakeScheduler::new(Schedule::new(&[0, 5, 11, 23], 60).unwrap());
        for hour in 0..24 {
            for minute in [0, 1, 30, 59] {
                let secs = scheduler
                    .seconds_until_next_update(&clock_at(hour, minute, 59))
                    .unwrap();
                assert!(secs > 0);
                assert!(secs <= 24 * 3600 + 30);
            }
        }
    }
}
