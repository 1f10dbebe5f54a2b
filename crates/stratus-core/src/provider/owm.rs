//! OpenWeatherMap free-tier client
//!
//! Two requests per cycle: `/data/2.5/weather` for current conditions and
//! `/data/2.5/forecast` for the 5-day / 3-hour sample list.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, info};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::http::parse_response;
use super::{HttpTransport, ProviderError, RawWeather, WeatherSource, error_message};
use crate::config::WeatherConfig;
use crate::forecast::{CurrentConditions, Sample, bounded_text, label};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    const fn resource(self) -> &'static str {
        match self {
            Self::Current => "weather",
            Self::Forecast => "forecast",
        }
    }
}

/// Request path (with query) for `endpoint`; coordinates use 4 decimals.
pub fn request_path(endpoint: Endpoint, weather: &WeatherConfig<'_>) -> String {
    format!(
        "/data/2.5/{}?lat={:.4}&lon={:.4}&units={}&appid={}",
        endpoint.resource(),
        weather.latitude,
        weather.longitude,
        weather.units.as_query(),
        weather.api_key
    )
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Condition {
    id: u16,
    description: String,
    icon: String,
}

#[derive(Deserialize)]
struct ForecastMain {
    temp: f32,
    #[serde(default)]
    humidity: u8,
}

#[derive(Deserialize)]
struct ForecastItem {
    dt: Option<i64>,
    main: Option<ForecastMain>,
    #[serde(default)]
    pop: f32,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    list: Option<Vec<ForecastItem>>,
}

#[derive(Deserialize)]
struct CurrentMain {
    temp: f32,
    #[serde(default)]
    feels_like: f32,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u16,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Wind {
    speed: f32,
    deg: u16,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Sys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Deserialize)]
struct CurrentResponse {
    dt: Option<i64>,
    main: Option<CurrentMain>,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    visibility: u32,
    #[serde(default)]
    sys: Sys,
    #[serde(default)]
    weather: Vec<Condition>,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|e| ProviderError::Json(error_message(e)))
}

fn first_condition(weather: Vec<Condition>) -> Condition {
    weather.into_iter().next().unwrap_or_default()
}

/// Parse a `/data/2.5/forecast` body into the chronological sample stream.
///
/// An item without a `weather` entry keeps condition 0 and an empty label;
/// a missing `pop` reads as 0.
pub fn parse_forecast(body: &[u8]) -> Result<Vec<Sample>, ProviderError> {
    let response: ForecastResponse = decode(body)?;
    let list = response.list.ok_or(ProviderError::MissingField("list"))?;

    list.into_iter()
        .map(|item| {
            let timestamp = item.dt.ok_or(ProviderError::MissingField("dt"))?;
            let main = item.main.ok_or(ProviderError::MissingField("main"))?;
            let condition = first_condition(item.weather);
            Ok(Sample {
                timestamp,
                temperature: main.temp,
                humidity: main.humidity,
                precipitation_probability: item.pop,
                condition_code: condition.id,
                condition_text: label(&condition.description),
            })
        })
        .collect()
}

/// Parse a `/data/2.5/weather` body.
pub fn parse_current(body: &[u8]) -> Result<CurrentConditions, ProviderError> {
    let response: CurrentResponse = decode(body)?;
    let timestamp = response.dt.ok_or(ProviderError::MissingField("dt"))?;
    let main = response.main.ok_or(ProviderError::MissingField("main"))?;
    let condition = first_condition(response.weather);

    Ok(CurrentConditions {
        timestamp,
        temperature: main.temp,
        feels_like: main.feels_like,
        humidity: main.humidity,
        pressure: main.pressure,
        wind_speed: response.wind.speed,
        wind_direction: response.wind.deg,
        visibility: response.visibility,
        sunrise: response.sys.sunrise,
        sunset: response.sys.sunset,
        condition_code: condition.id,
        condition_text: label(&condition.description),
        icon: bounded_text(&condition.icon),
    })
}

/// [`WeatherSource`] backed by the OpenWeatherMap HTTP API
pub struct OwmSource<'a, T> {
    transport: T,
    host: &'a str,
    current_path: String,
    forecast_path: String,
}

impl<'a, T: HttpTransport> OwmSource<'a, T> {
    pub fn new(transport: T, weather: &WeatherConfig<'a>) -> Self {
        Self {
            transport,
            host: weather.host,
            current_path: request_path(Endpoint::Current, weather),
            forecast_path: request_path(Endpoint::Forecast, weather),
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn get_ok(&mut self, endpoint: Endpoint) -> Result<Vec<u8>, ProviderError> {
        let path = match endpoint {
            Endpoint::Current => &self.current_path,
            Endpoint::Forecast => &self.forecast_path,
        };
        info!("Fetching {} from {}", endpoint.resource(), self.host);
        let raw = self.transport.get(self.host, path).await?;
        let body = parse_response(&raw)?.ok_body()?;
        debug!("{} body: {} bytes", endpoint.resource(), body.len());
        Ok(body.to_vec())
    }
}

impl<T: HttpTransport> WeatherSource for OwmSource<'_, T> {
    async fn fetch(&mut self) -> Result<RawWeather, ProviderError> {
        let current = parse_current(&self.get_ok(Endpoint::Current).await?)?;
        let samples = parse_forecast(&self.get_ok(Endpoint::Forecast).await?)?;

        info!(
            "Weather parsed: {:.1}, {} forecast samples",
            current.temperature,
            samples.len()
        );
        Ok(RawWeather { current, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    const FORECAST: &str = r#"{
        "cod": "200",
        "cnt": 3,
        "list": [
            {"dt": 1710093600, "main": {"temp": 41.5, "humidity": 62},
             "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
             "pop": 0.37},
            {"dt": 1710104400, "main": {"temp": 44.2, "humidity": 55},
             "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]},
            {"dt": 1710115200, "main": {"temp": 39.0, "humidity": 70}, "weather": [], "pop": 0.0}
        ],
        "city": {"name": "Longmont"}
    }"#;

    const CURRENT: &str = r#"{
        "coord": {"lon": -105.1019, "lat": 40.1672},
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02n"}],
        "main": {"temp": 38.6, "feels_like": 33.1, "humidity": 48, "pressure": 1018},
        "visibility": 10000,
        "wind": {"speed": 6.9, "deg": 250},
        "dt": 1710090000,
        "sys": {"sunrise": 1710076200, "sunset": 1710118500},
        "name": "Longmont"
    }"#;

    #[test]
    fn test_request_path_matches_provider_format() {
        let weather = WeatherConfig {
            api_key: "KEY",
            ..Default::default()
        };
        assert_eq!(
            request_path(Endpoint::Forecast, &weather),
            "/data/2.5/forecast?lat=40.1672&lon=-105.1019&units=imperial&appid=KEY"
        );
        assert!(request_path(Endpoint::Current, &weather).starts_with("/data/2.5/weather?"));
    }

    #[test]
    fn test_parse_forecast() {
        let samples = parse_forecast(FORECAST.as_bytes()).unwrap();
        assert_eq!(samples.len(), 3);

        assert_eq!(samples[0].timestamp, 1_710_093_600);
        assert_eq!(samples[0].temperature, 41.5);
        assert_eq!(samples[0].humidity, 62);
        assert_eq!(samples[0].precipitation_probability, 0.37);
        assert_eq!(samples[0].condition_code, 500);
        assert_eq!(samples[0].condition_text.as_str(), "light rain");
    }

    #[test]
    fn test_forecast_missing_pop_and_weather() {
        let samples = parse_forecast(FORECAST.as_bytes()).unwrap();
        assert_eq!(samples[1].precipitation_probability, 0.0);
        assert_eq!(samples[2].condition_code, 0);
        assert!(samples[2].condition_text.is_empty());
    }

    #[test]
    fn test_forecast_errors() {
        assert_eq!(
            parse_forecast(br#"{"cod": "401"}"#),
            Err(ProviderError::MissingField("list"))
        );
        assert_eq!(
            parse_forecast(br#"{"list": [{"main": {"temp": 1.0}}]}"#),
            Err(ProviderError::MissingField("dt"))
        );
        assert_eq!(
            parse_forecast(br#"{"list": [{"dt": 1}]}"#),
            Err(ProviderError::MissingField("main"))
        );
        assert!(matches!(parse_forecast(b"{\"list\": ["), Err(ProviderError::Json(_))));
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert_eq!(parse_forecast(br#"{"list": []}"#), Ok(Vec::new()));
    }

    #[test]
    fn test_parse_current() {
        let current = parse_current(CURRENT.as_bytes()).unwrap();
        assert_eq!(current.timestamp, 1_710_090_000);
        assert_eq!(current.temperature, 38.6);
        assert_eq!(current.feels_like, 33.1);
        assert_eq!(current.humidity, 48);
        assert_eq!(current.pressure, 1018);
        assert_eq!(current.wind_speed, 6.9);
        assert_eq!(current.wind_direction, 250);
        assert_eq!(current.visibility, 10_000);
        assert_eq!(current.sunrise, 1_710_076_200);
        assert_eq!(current.sunset, 1_710_118_500);
        assert_eq!(current.condition_code, 801);
        assert_eq!(current.condition_text.as_str(), "few clouds");
        assert_eq!(current.icon.as_str(), "02n");
    }

    #[test]
    fn test_current_optional_sections() {
        let current = parse_current(br#"{"dt": 5, "main": {"temp": 70.0}}"#).unwrap();
        assert_eq!(current.wind_speed, 0.0);
        assert_eq!(current.sunrise, 0);
        assert_eq!(current.condition_code, 0);
        assert!(current.icon.is_empty());
    }

    struct CannedTransport {
        current: Vec<u8>,
        forecast: Vec<u8>,
        requests: Vec<String>,
    }

    impl CannedTransport {
        fn ok(current: &str, forecast: &str) -> Self {
            Self {
                current: format!("HTTP/1.1 200 OK\r\n\r\n{}", current).into_bytes(),
                forecast: format!("HTTP/1.1 200 OK\r\n\r\n{}", forecast).into_bytes(),
                requests: Vec::new(),
            }
        }
    }

    impl HttpTransport for CannedTransport {
        async fn get(&mut self, host: &str, path: &str) -> Result<Vec<u8>, ProviderError> {
            self.requests.push(format!("{}{}", host, path));
            if path.starts_with("/data/2.5/weather") {
                Ok(self.current.clone())
            } else {
                Ok(self.forecast.clone())
            }
        }
    }

    fn config() -> WeatherConfig<'static> {
        WeatherConfig {
            api_key: "KEY",
            ..Default::default()
        }
    }

    #[test]
    fn test_source_fetches_both_endpoints() {
        let mut source = OwmSource::new(CannedTransport::ok(CURRENT, FORECAST), &config());
        let raw = embassy_futures::block_on(source.fetch()).unwrap();
        assert_eq!(raw.current.condition_code, 801);
        assert_eq!(raw.samples.len(), 3);

        let transport = source.into_transport();
        assert_eq!(transport.requests.len(), 2);
        assert!(transport.requests[0].starts_with("api.openweathermap.org/data/2.5/weather?"));
        assert!(transport.requests[1].starts_with("api.openweathermap.org/data/2.5/forecast?"));
    }

    #[test]
    fn test_source_reports_http_status() {
        let mut transport = CannedTransport::ok(CURRENT, FORECAST);
        transport.forecast = b"HTTP/1.1 401 Unauthorized\r\n\r\n{}".to_vec();
        let mut source = OwmSource::new(transport, &config());
        assert_eq!(
            embassy_futures::block_on(source.fetch()),
            Err(ProviderError::HttpStatus(401))
        );
    }

    #[test]
    fn test_json_error_message_is_bounded() {
        let err = parse_current(b"not json").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("JSON parse error: "));
    }
}
