//! Forecast data types
//!
//! [`Sample`] is what the provider hands over; [`HourlySummary`] and
//! [`DailySummary`] are what the page draws. All of them live for a single
//! wake cycle.

use core::fmt::Write;

use crate::bounded::BoundedVec;
use crate::time::Timestamp;

/// Longest condition description kept, in bytes
pub const LABEL_CAPACITY: usize = 32;

/// Short condition text such as "light rain"
pub type Label = heapless::String<LABEL_CAPACITY>;

/// Provider icon identifier such as "10d"
pub type IconCode = heapless::String<4>;

/// Copy `text` into a bounded string, cutting at a character boundary if
/// it does not fit.
pub fn bounded_text<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Convenience for [`bounded_text`] at label size
pub fn label(text: &str) -> Label {
    bounded_text(text)
}

/// Precipitation probability (0.0-1.0) as a whole percent, truncated toward zero.
pub fn probability_percent(probability: f32) -> u8 {
    (probability * 100.0).clamp(0.0, 100.0) as u8
}

/// One raw forecast point from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub temperature: f32,
    /// Relative humidity, 0-100
    pub humidity: u8,
    /// 0.0-1.0
    pub precipitation_probability: f32,
    pub condition_code: u16,
    pub condition_text: Label,
}

/// A near-term forecast point; a verbatim copy of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySummary {
    pub timestamp: Timestamp,
    pub temperature: f32,
    pub humidity: u8,
    pub condition_code: u16,
    pub condition_text: Label,
}

impl From<&Sample> for HourlySummary {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp,
            temperature: sample.temperature,
            humidity: sample.humidity,
            condition_code: sample.condition_code,
            condition_text: sample.condition_text.clone(),
        }
    }
}

/// One local calendar day of forecast.
///
/// The condition is the one reported by the first sample of the day; later
/// samples only move the extrema.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    /// Timestamp of the day's first sample
    pub day_timestamp: Timestamp,
    pub temperature_min: f32,
    pub temperature_max: f32,
    pub condition_code: u16,
    pub condition_text: Label,
    /// Peak precipitation probability, whole percent
    pub precipitation_probability_max: u8,
    /// Not aggregated; always zero
    pub humidity: u8,
}

impl DailySummary {
    /// Start a day from its first sample
    pub fn seed(sample: Sample) -> Self {
        Self {
            day_timestamp: sample.timestamp,
            temperature_min: sample.temperature,
            temperature_max: sample.temperature,
            precipitation_probability_max: probability_percent(sample.precipitation_probability),
            condition_code: sample.condition_code,
            condition_text: sample.condition_text,
            humidity: 0,
        }
    }

    /// Fold a later sample of the same day into the extrema
    pub fn absorb(&mut self, sample: &Sample) {
        self.temperature_min = self.temperature_min.min(sample.temperature);
        self.temperature_max = self.temperature_max.max(sample.temperature);
        self.precipitation_probability_max = self
            .precipitation_probability_max
            .max(probability_percent(sample.precipitation_probability));
    }
}

/// Observed conditions at fetch time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrentConditions {
    pub timestamp: Timestamp,
    pub temperature: f32,
    pub feels_like: f32,
    pub humidity: u8,
    /// hPa
    pub pressure: u16,
    pub wind_speed: f32,
    /// Degrees, meteorological
    pub wind_direction: u16,
    /// Metres
    pub visibility: u32,
    pub sunrise: Timestamp,
    pub sunset: Timestamp,
    pub condition_code: u16,
    pub condition_text: Label,
    pub icon: IconCode,
}

impl CurrentConditions {
    /// Whether `ts` falls outside today's daylight window.
    pub fn is_night_at(&self, ts: Timestamp) -> bool {
        if self.sunrise == 0 && self.sunset == 0 {
            return false;
        }
        ts < self.sunrise || ts > self.sunset
    }

    /// Sixteen-point compass label for the wind direction
    pub fn wind_compass(&self) -> &'static str {
        const POINTS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
            "NW", "NNW",
        ];
        let idx = ((self.wind_direction as u32 % 360) * 16 + 180) / 360;
        POINTS[idx as usize % 16]
    }
}

/// Aggregated forecast for one wake cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub hourly: BoundedVec<HourlySummary>,
    pub daily: BoundedVec<DailySummary>,
}

/// Everything the weather page needs
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: Forecast,
}

impl WeatherReport {
    /// One-line summary for logs
    pub fn summary(&self) -> heapless::String<96> {
        let mut line = heapless::String::new();
        // Overflow only truncates a log line
        let _ = write!(
            line,
            "{:.1} {} | {} hourly | {} daily",
            self.current.temperature,
            self.current.condition_text,
            self.forecast.hourly.len(),
            self.forecast.daily.len()
        );
        line
    }
}
