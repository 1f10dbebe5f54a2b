//! Weather provider access
//!
//! The wake cycle asks a [`WeatherSource`] for the current conditions and the
//! raw 3-hour sample stream. [`owm::OwmSource`] is the OpenWeatherMap
//! implementation; it speaks plain HTTP through any [`HttpTransport`], which
//! the firmware backs with a TCP socket and the simulator with canned files.

use alloc::vec::Vec;
use core::fmt::Write;
use core::future::Future;

use thiserror_no_std::Error;

use crate::forecast::{CurrentConditions, Sample};

pub mod http;
pub mod owm;

pub use owm::OwmSource;

/// Short error text that fits without allocation
pub type ErrorMessage = heapless::String<64>;

/// Format an error into a bounded message, truncating if needed.
pub fn error_message(err: impl core::fmt::Display) -> ErrorMessage {
    let mut msg = ErrorMessage::new();
    let _ = write!(msg, "{}", err);
    msg
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    #[error("Malformed HTTP response")]
    MalformedResponse,
    #[error("JSON parse error: {0}")]
    Json(ErrorMessage),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Transport error: {0}")]
    Transport(ErrorMessage),
}

/// Everything one fetch produces, before aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct RawWeather {
    pub current: CurrentConditions,
    /// Chronological forecast samples
    pub samples: Vec<Sample>,
}

/// Source of current conditions and forecast samples
pub trait WeatherSource {
    fn fetch(&mut self) -> impl Future<Output = Result<RawWeather, ProviderError>>;
}

/// Performs one HTTP GET and returns the complete raw response
/// (status line, headers and body).
pub trait HttpTransport {
    fn get(&mut self, host: &str, path: &str) -> impl Future<Output = Result<Vec<u8>, ProviderError>>;
}
