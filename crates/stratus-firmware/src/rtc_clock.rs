//! Wall clock on the RTC timer
//!
//! The RTC keeps counting through deep sleep, so a time set by SNTP on one
//! wake is still valid on the next. After a cold boot it starts near zero,
//! which [`ClockState`](stratus_core::clock::ClockState) reports as unsynced.

use esp_hal::rtc_cntl::Rtc;
use log::info;
use stratus_core::clock::ClockSource;
use stratus_core::sntp::NtpTime;
use stratus_core::time::Timestamp;

pub struct RtcClock<'r> {
    rtc: &'r Rtc<'static>,
}

impl<'r> RtcClock<'r> {
    pub const fn new(rtc: &'r Rtc<'static>) -> Self {
        Self { rtc }
    }

    pub fn set(&self, time: NtpTime) {
        self.rtc.set_current_time_us(time.as_unix_micros());
        info!("RTC set to {}.{:06}", time.unix_secs, time.micros);
    }
}

impl ClockSource for RtcClock<'_> {
    fn now(&self) -> Timestamp {
        (self.rtc.current_time_us() / 1_000_000) as Timestamp
    }
}
