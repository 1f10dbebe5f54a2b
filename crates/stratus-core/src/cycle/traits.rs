//! Collaborators the wake cycle drives
//!
//! Each board-facing step is a trait so the same sequence runs against the
//! ESP32 radio and RTC, the desktop simulator, and in-memory test fakes.

use core::fmt::Display;
use core::future::Future;

use crate::clock::ClockState;
use crate::config::Units;
use crate::forecast::WeatherReport;
use crate::time::TimeZone;

/// Station uplink (WiFi association and IP configuration)
pub trait Network {
    type Error: Display;

    /// Bring the link up, giving up after the configured timeout.
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Drop the link to save power. Never fails.
    fn disconnect(&mut self) -> impl Future<Output = ()>;
}

/// Sets the wall clock from a time server
pub trait TimeSync {
    type Error: Display;

    fn sync(&mut self) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Everything the weather page draws
#[derive(Debug, Clone, Copy)]
pub struct WeatherView<'a> {
    pub report: &'a WeatherReport,
    pub location: &'a str,
    pub units: Units,
    pub zone: TimeZone,
    /// Clock at render time; drives the "Updated" line
    pub clock: ClockState,
    /// Next scheduled refresh, 0-23
    pub next_update_hour: Option<u8>,
    /// Hourly columns to draw
    pub hourly_display: usize,
    /// Daily rows to draw
    pub daily_display: usize,
}

/// Draws the cycle's screens
pub trait Presenter {
    type Error: Display;

    /// Single centered line such as "Syncing time..."
    fn show_status(&mut self, message: &str) -> Result<(), Self::Error>;

    fn show_weather(&mut self, view: &WeatherView<'_>) -> Result<(), Self::Error>;

    /// Error screen; `retry_secs` is when the device will try again.
    fn show_error(&mut self, message: &str, retry_secs: u32) -> Result<(), Self::Error>;
}
