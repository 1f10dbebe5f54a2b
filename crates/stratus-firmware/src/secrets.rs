//! Build-time secrets
//!
//! `build.rs` copies these from `.env` (or the build environment). Missing
//! values compile to empty strings; the cycle then fails at the step that
//! needs them and shows it on screen.

use stratus_core::config::StationConfig;

const fn or_empty(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => "",
    }
}

pub const WIFI_SSID: &str = or_empty(option_env!("WIFI_SSID"));
pub const WIFI_PASSWORD: &str = or_empty(option_env!("WIFI_PASSWORD"));
pub const OWM_API_KEY: &str = or_empty(option_env!("OWM_API_KEY"));

/// Stock station configuration with this build's secrets filled in
pub fn station_config() -> StationConfig<'static> {
    let mut config = StationConfig::default();
    config.internet.ssid = WIFI_SSID;
    config.internet.password = WIFI_PASSWORD;
    config.weather.api_key = OWM_API_KEY;
    config
}
