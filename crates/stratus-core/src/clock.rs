//! Wall-clock access and validity
//!
//! The device has no battery-backed calendar it can trust after a cold boot:
//! until SNTP has run the RTC counts up from zero. [`ClockState`] separates a
//! plausible wall time from a not-yet-synchronized one.

use crate::time::{LocalDateTime, TimeOfDay, TimeZone, Timestamp};

/// Earliest wall time treated as synchronized (2020-01-01T00:00:00Z).
///
/// Anything before this is an unsynchronized RTC, never a real historical time.
pub const SYNC_THRESHOLD: Timestamp = 1_577_836_800;

/// Source of wall-clock time
pub trait ClockSource {
    /// Current Unix time in seconds
    fn now(&self) -> Timestamp;
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Clock pinned to a single instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl ClockSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Whether a raw timestamp is plausible wall time.
pub const fn is_synced(ts: Timestamp) -> bool {
    ts >= SYNC_THRESHOLD
}

/// Derived clock validity plus local time of day.
///
/// Recompute this on every use with [`ClockState::read`]; the underlying
/// clock changes when SNTP completes mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    /// Wall time is not known yet
    Unsynced,
    /// Wall time is plausible
    Synced {
        now: Timestamp,
        local: LocalDateTime,
    },
}

impl ClockState {
    /// Sample the clock and break it down in the given zone.
    pub fn read<C: ClockSource + ?Sized>(clock: &C, zone: &TimeZone) -> Self {
        Self::at(clock.now(), zone)
    }

    /// Clock state for a specific instant
    pub fn at(now: Timestamp, zone: &TimeZone) -> Self {
        if is_synced(now) {
            Self::Synced {
                now,
                local: zone.to_local(now),
            }
        } else {
            Self::Unsynced
        }
    }

    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }

    /// Local time of day, if synced
    pub const fn time_of_day(&self) -> Option<TimeOfDay> {
        match self {
            Self::Synced { local, .. } => Some(local.time),
            Self::Unsynced => None,
        }
    }
}
