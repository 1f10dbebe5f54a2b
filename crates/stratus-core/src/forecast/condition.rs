//! Condition code classification
//!
//! Provider condition codes are grouped by hundreds (2xx thunderstorm,
//! 5xx rain, 8xx clear/clouds). The page only needs the coarse group to
//! pick an icon.

/// Coarse weather category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCategory {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    /// Mist, smoke, haze, dust, fog
    Atmosphere,
    Clear,
    /// 801 (few clouds) and 802 (scattered) read as partly cloudy
    PartlyCloudy,
    Clouds,
    Unknown,
}

impl ConditionCategory {
    pub const fn from_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            500..=599 => Self::Rain,
            600..=699 => Self::Snow,
            700..=799 => Self::Atmosphere,
            800 => Self::Clear,
            801 | 802 => Self::PartlyCloudy,
            803..=899 => Self::Clouds,
            _ => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Thunderstorm => "thunderstorm",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Atmosphere => "atmosphere",
            Self::Clear => "clear",
            Self::PartlyCloudy | Self::Clouds => "clouds",
            Self::Unknown => "unknown",
        }
    }
}
