//! HTTP transports for the simulator
//!
//! | Mode      | Source                                            |
//! |-----------|---------------------------------------------------|
//! | Live      | real OpenWeatherMap over a blocking `TcpStream`   |
//! | Fixtures  | `weather.json` / `forecast.json` from a directory |
//! | Synthetic | generated responses around the simulated clock    |

use std::f64::consts::PI;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde_json::{Value, json};
use stratus_core::clock::ClockSource;
use stratus_core::config::Units;
use stratus_core::provider::http::get_request;
use stratus_core::provider::{HttpTransport, ProviderError, error_message};

use crate::board::SimClock;

const HTTP_PORT: u16 = 80;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(15);
const SAMPLE_STEP_SECS: i64 = 3 * 3600;
const SAMPLE_COUNT: i64 = 40;

/// (code, description, icon) cycled through by the synthetic forecast
const CONDITIONS: [(u16, &str, &str); 8] = [
    (800, "clear sky", "01d"),
    (801, "few clouds", "02d"),
    (803, "broken clouds", "04d"),
    (500, "light rain", "10d"),
    (211, "thunderstorm with rain", "11d"),
    (601, "snow", "13d"),
    (741, "fog", "50d"),
    (804, "overcast clouds", "04d"),
];

pub enum SimTransport {
    Live,
    Fixtures(PathBuf),
    Synthetic { clock: SimClock, units: Units },
}

impl HttpTransport for SimTransport {
    async fn get(&mut self, host: &str, path: &str) -> Result<Vec<u8>, ProviderError> {
        match self {
            Self::Live => live_get(host, path),
            Self::Fixtures(dir) => fixture_get(dir, path),
            Self::Synthetic { clock, units } => {
                let body = if is_forecast(path) {
                    synthetic_forecast(clock.now(), *units)
                } else {
                    synthetic_current(clock.now(), *units)
                };
                Ok(ok_response(&body.to_string()))
            }
        }
    }
}

fn is_forecast(path: &str) -> bool {
    path.starts_with("/data/2.5/forecast")
}

fn transport_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Transport(error_message(e))
}

fn ok_response(body: &str) -> Vec<u8> {
    format!("HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{body}").into_bytes()
}

fn live_get(host: &str, path: &str) -> Result<Vec<u8>, ProviderError> {
    info!("GET http://{}{}", host, path.split('?').next().unwrap_or(path));
    let mut stream = TcpStream::connect((host, HTTP_PORT)).map_err(transport_error)?;
    stream
        .set_read_timeout(Some(SOCKET_TIMEOUT))
        .map_err(transport_error)?;
    stream
        .write_all(get_request(host, path).as_bytes())
        .map_err(transport_error)?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).map_err(transport_error)?;
    debug!("Read {} bytes", response.len());
    Ok(response)
}

fn fixture_get(dir: &PathBuf, path: &str) -> Result<Vec<u8>, ProviderError> {
    let file = dir.join(if is_forecast(path) {
        "forecast.json"
    } else {
        "weather.json"
    });
    info!("Serving {}", file.display());
    let body = std::fs::read_to_string(&file).map_err(transport_error)?;
    Ok(ok_response(&body))
}

fn base_temperature(units: Units) -> (f64, f64) {
    match units {
        Units::Imperial => (50.0, 12.0),
        Units::Metric => (10.0, 7.0),
    }
}

/// Temperature peaking mid-afternoon UTC, drifting a little each day
fn temperature_at(ts: i64, units: Units) -> f64 {
    let (base, swing) = base_temperature(units);
    let hours = ts as f64 / 3600.0;
    let day = (hours / 24.0).floor();
    base + swing * (2.0 * PI * (hours - 9.0) / 24.0).sin() + 3.0 * (day * 0.9).sin()
}

fn condition_json(index: usize) -> Value {
    let (id, description, icon) = CONDITIONS[index % CONDITIONS.len()];
    json!([{ "id": id, "main": "", "description": description, "icon": icon }])
}

pub fn synthetic_current(now: i64, units: Units) -> Value {
    let midnight = now - now.rem_euclid(86_400);
    let temp = temperature_at(now, units);
    json!({
        "dt": now,
        "main": {
            "temp": temp,
            "feels_like": temp - 3.0,
            "humidity": 48,
            "pressure": 1016
        },
        "wind": { "speed": 6.5, "deg": 250 },
        "visibility": 10000,
        "sys": { "sunrise": midnight + 13 * 3600, "sunset": midnight + 25 * 3600 },
        "weather": condition_json((now / 86_400) as usize),
        "name": "Simulated"
    })
}

pub fn synthetic_forecast(now: i64, units: Units) -> Value {
    let first = (now / SAMPLE_STEP_SECS + 1) * SAMPLE_STEP_SECS;
    let list: Vec<Value> = (0..SAMPLE_COUNT)
        .map(|i| {
            let dt = first + i * SAMPLE_STEP_SECS;
            let day = (dt / 86_400) as usize;
            let pop = ((dt as f64 / 40_000.0).sin() * 0.5 + 0.5).clamp(0.0, 1.0);
            json!({
                "dt": dt,
                "main": { "temp": temperature_at(dt, units), "humidity": 40 + (i % 6) * 8 },
                "weather": condition_json(day + (i as usize % 3) / 2),
                "pop": (pop * 100.0).round() / 100.0
            })
        })
        .collect();
    json!({ "cod": "200", "cnt": SAMPLE_COUNT, "list": list })
}
