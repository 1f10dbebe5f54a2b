//! ESP32-S3 firmware-specific modules for stratus
//!
//! Board implementations of the wake-cycle collaborators defined in
//! `stratus_core`: WiFi association, SNTP over UDP, plain-HTTP fetches over
//! TCP, the RTC-backed wall clock, power rails and the LCD panel.

#![no_std]

extern crate alloc;

use core::fmt::{Debug, Write};

use stratus_core::provider::ErrorMessage;

pub mod display;
pub mod http;
pub mod i2c_bus;
pub mod power;
pub mod rtc_clock;
pub mod secrets;
pub mod sntp;
pub mod wifi;

/// Bounded `{:?}` rendering for driver errors that lack `Display`
pub fn debug_message(value: impl Debug) -> ErrorMessage {
    let mut msg = ErrorMessage::new();
    let _ = write!(msg, "{:?}", value);
    msg
}
