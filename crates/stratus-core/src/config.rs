//! Station configuration
//!
//! Everything here is fixed at build or load time and never mutated while a
//! wake cycle runs. Defaults reproduce the station's stock setup; secrets
//! (WiFi credentials, API key) are empty by default and supplied by the
//! firmware build or the simulator's config file.

use heapless::Vec;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::time::TimeZone;

/// Default refresh hours (local time)
pub const DEFAULT_WAKE_HOURS: [u8; 4] = [0, 6, 12, 18];

/// Default sleep after any failed step (5 minutes)
pub const DEFAULT_RETRY_SECS: u32 = 300;

/// Default number of near-term forecast points kept (H_MAX)
pub const DEFAULT_HOURLY_CAPACITY: usize = 12;

/// Default number of days kept (D_MAX)
pub const DEFAULT_DAILY_CAPACITY: usize = 8;

/// Upper bound on configured wake hours, one per hour of the day
pub const MAX_WAKE_HOURS: usize = 24;

/// Upper bound on configured NTP servers
pub const MAX_NTP_SERVERS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Schedule has no wake hours")]
    EmptySchedule,
    #[error("Wake hour {0} is outside 0..24")]
    HourOutOfRange(u8),
    #[error("Wake hour {0} is duplicated or out of order")]
    HourNotAscending(u8),
    #[error("Retry interval must be positive")]
    ZeroRetryInterval,
    #[error("Forecast capacity must be positive")]
    ZeroCapacity,
    #[error("Config parse error")]
    Parse,
}

/// Daily refresh schedule plus the fixed failure backoff.
///
/// Hours are validated on construction: non-empty, each in `0..24`, strictly
/// ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleConfig", into = "ScheduleConfig")]
pub struct Schedule {
    hours: Vec<u8, MAX_WAKE_HOURS>,
    retry_secs: u32,
}

impl Schedule {
    pub fn new(hours: &[u8], retry_secs: u32) -> Result<Self, ConfigError> {
        if hours.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if retry_secs == 0 {
            return Err(ConfigError::ZeroRetryInterval);
        }

        let mut validated = Vec::new();
        for &hour in hours {
            if hour >= 24 {
                return Err(ConfigError::HourOutOfRange(hour));
            }
            if validated.last().is_some_and(|&prev| prev >= hour) {
                return Err(ConfigError::HourNotAscending(hour));
            }
            // 24 distinct ascending hours always fit
            validated
                .push(hour)
                .map_err(|_| ConfigError::HourNotAscending(hour))?;
        }

        Ok(Self {
            hours: validated,
            retry_secs,
        })
    }

    /// Wake hours, ascending
    pub fn hours(&self) -> &[u8] {
        &self.hours
    }

    /// Fixed sleep used after any failure
    pub const fn retry_secs(&self) -> u32 {
        self.retry_secs
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            hours: Vec::from_slice(&DEFAULT_WAKE_HOURS).unwrap_or_default(),
            retry_secs: DEFAULT_RETRY_SECS,
        }
    }
}

/// Unvalidated wire form of [`Schedule`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub hours: Vec<u8, MAX_WAKE_HOURS>,
    pub retry_secs: u32,
}

impl TryFrom<ScheduleConfig> for Schedule {
    type Error = ConfigError;

    fn try_from(value: ScheduleConfig) -> Result<Self, Self::Error> {
        Schedule::new(&value.hours, value.retry_secs)
    }
}

impl From<Schedule> for ScheduleConfig {
    fn from(value: Schedule) -> Self {
        Self {
            hours: value.hours,
            retry_secs: value.retry_secs,
        }
    }
}

/// Capacities for the aggregated forecast sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastLimits {
    /// H_MAX: near-term points kept
    pub hourly: usize,
    /// D_MAX: days kept
    pub daily: usize,
}

impl ForecastLimits {
    pub fn new(hourly: usize, daily: usize) -> Result<Self, ConfigError> {
        if hourly == 0 || daily == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self { hourly, daily })
    }
}

impl Default for ForecastLimits {
    fn default() -> Self {
        Self {
            hourly: DEFAULT_HOURLY_CAPACITY,
            daily: DEFAULT_DAILY_CAPACITY,
        }
    }
}

/// Measurement system requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value of the provider's `units` query parameter
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
        }
    }

    pub const fn temperature_suffix(self) -> &'static str {
        match self {
            Self::Imperial => "\u{b0}F",
            Self::Metric => "\u{b0}C",
        }
    }

    pub const fn wind_suffix(self) -> &'static str {
        match self {
            Self::Imperial => "mph",
            Self::Metric => "m/s",
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    /// Give up on association after this long
    pub connect_timeout_ms: u32,
}

impl Default for InternetConfig<'_> {
    fn default() -> Self {
        Self {
            ssid: "",
            password: "",
            connect_timeout_ms: 30_000,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WeatherConfig<'a> {
    pub api_key: &'a str,
    pub host: &'a str,
    pub latitude: f32,
    pub longitude: f32,
    pub units: Units,
    pub location_name: &'a str,
}

impl Default for WeatherConfig<'_> {
    fn default() -> Self {
        Self {
            api_key: "",
            host: "api.openweathermap.org",
            latitude: 40.1672,
            longitude: -105.1019,
            units: Units::Imperial,
            location_name: "Longmont, CO",
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct TimeConfig<'a> {
    pub utc_offset_secs: i32,
    pub daylight_offset_secs: i32,
    /// Tried in order until one answers
    pub ntp_servers: Vec<&'a str, MAX_NTP_SERVERS>,
}

impl TimeConfig<'_> {
    pub const fn zone(&self) -> TimeZone {
        TimeZone::new(self.utc_offset_secs, self.daylight_offset_secs)
    }
}

impl Default for TimeConfig<'_> {
    fn default() -> Self {
        Self {
            utc_offset_secs: -7 * 3600,
            daylight_offset_secs: 0,
            ntp_servers: Vec::from_slice(&["pool.ntp.org", "time.nist.gov", "time.google.com"])
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ForecastConfig {
    pub hourly_capacity: usize,
    pub daily_capacity: usize,
    /// Hourly entries drawn on the page
    pub hourly_display: usize,
    /// Daily rows drawn on the page
    pub daily_display: usize,
}

impl ForecastConfig {
    pub fn limits(&self) -> Result<ForecastLimits, ConfigError> {
        ForecastLimits::new(self.hourly_capacity, self.daily_capacity)
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            hourly_capacity: DEFAULT_HOURLY_CAPACITY,
            daily_capacity: DEFAULT_DAILY_CAPACITY,
            hourly_display: 5,
            daily_display: 7,
        }
    }
}

/// Complete station configuration
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct StationConfig<'a> {
    #[serde(default)]
    pub internet: InternetConfig<'a>,
    #[serde(default)]
    pub weather: WeatherConfig<'a>,
    #[serde(default)]
    pub time: TimeConfig<'a>,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

impl<'a> StationConfig<'a> {
    /// Parse a JSON config, borrowing strings from the input.
    ///
    /// Missing sections fall back to their defaults. Schedule and capacity
    /// validation happens here so a bad file is rejected before a cycle starts.
    pub fn from_json(json: &'a str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::error!("Config parse error: {}", e);
            ConfigError::Parse
        })?;
        config.forecast.limits()?;
        Ok(config)
    }

    pub const fn zone(&self) -> TimeZone {
        self.time.zone()
    }
}
