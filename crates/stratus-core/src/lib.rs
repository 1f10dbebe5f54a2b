//! Hardware-independent core library for stratus
//!
//! This crate contains all platform-agnostic logic for the stratus e-ink
//! weather station: configuration types, calendar math, clock validity,
//! forecast aggregation, wake scheduling, the wake-cycle state machine,
//! weather-provider response parsing, SNTP packets and page rendering.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bounded;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod display;
pub mod forecast;
pub mod provider;
pub mod scheduler;
pub mod sntp;
pub mod time;
