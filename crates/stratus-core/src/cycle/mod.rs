//! One boot-to-sleep wake cycle
//!
//! ```text
//! Boot -> ConnectingNetwork -> SyncingClock -> FetchingData -> Rendering -> Sleeping
//!              |                    |               |             |
//!              +--------------------+---------------+-------------+--> ReportingError -> Sleeping
//! ```
//!
//! The happy path sleeps until the next scheduled hour. Any failure shows the
//! error screen and sleeps for the fixed retry interval; there is no failure
//! counter and no backoff. The link is dropped after a failed time sync and
//! after every fetch, whether it succeeded or not.

use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::clock::{ClockSource, ClockState};
use crate::config::{ConfigError, StationConfig, Units};
use crate::forecast::{ForecastAggregator, WeatherReport};
use crate::provider::{ErrorMessage, ProviderError, WeatherSource, error_message};
use crate::scheduler::{SleepRequest, WakeScheduler};
use crate::time::TimeZone;

mod traits;

pub use traits::{Network, Presenter, TimeSync, WeatherView};

pub const STATUS_STARTING: &str = "Starting...";
pub const STATUS_CONNECTING: &str = "Connecting WiFi...";
pub const STATUS_SYNCING: &str = "Syncing time...";
pub const STATUS_FETCHING: &str = "Fetching weather...";

/// Longest possible phase trail: every phase visited once
const MAX_TRAIL: usize = 7;

/// Where the cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Boot,
    ConnectingNetwork,
    SyncingClock,
    FetchingData,
    Rendering,
    ReportingError,
    Sleeping,
}

impl CyclePhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::ConnectingNetwork => "connecting network",
            Self::SyncingClock => "syncing clock",
            Self::FetchingData => "fetching data",
            Self::Rendering => "rendering",
            Self::ReportingError => "reporting error",
            Self::Sleeping => "sleeping",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("WiFi failed: {0}")]
    Network(ErrorMessage),
    #[error("Time sync failed: {0}")]
    TimeSync(ErrorMessage),
    #[error("{0}")]
    Fetch(ProviderError),
    #[error("Display error: {0}")]
    Render(ErrorMessage),
}

impl CycleError {
    /// Phase the failure happened in
    pub const fn phase(&self) -> CyclePhase {
        match self {
            Self::Network(_) => CyclePhase::ConnectingNetwork,
            Self::TimeSync(_) => CyclePhase::SyncingClock,
            Self::Fetch(_) => CyclePhase::FetchingData,
            Self::Render(_) => CyclePhase::Rendering,
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Last phase before sleeping: `Rendering` or `ReportingError`
    pub phase: CyclePhase,
    pub sleep: SleepRequest,
    pub error: Option<CycleError>,
    /// Every phase entered, in order
    pub trail: heapless::Vec<CyclePhase, MAX_TRAIL>,
}

/// The board-facing collaborators of a cycle
pub struct Collaborators<N, T, W, P, C> {
    pub network: N,
    pub time_sync: T,
    pub source: W,
    pub presenter: P,
    pub clock: C,
}

pub struct WakeCycle<'a, N, T, W, P, C> {
    parts: Collaborators<N, T, W, P, C>,
    location: &'a str,
    units: Units,
    zone: TimeZone,
    hourly_display: usize,
    daily_display: usize,
    scheduler: WakeScheduler,
    aggregator: ForecastAggregator,
    trail: heapless::Vec<CyclePhase, MAX_TRAIL>,
}

impl<'a, N, T, W, P, C> WakeCycle<'a, N, T, W, P, C>
where
    N: Network,
    T: TimeSync,
    W: WeatherSource,
    P: Presenter,
    C: ClockSource,
{
    pub fn new(
        config: &StationConfig<'a>,
        parts: Collaborators<N, T, W, P, C>,
    ) -> Result<Self, ConfigError> {
        let zone = config.zone();
        Ok(Self {
            parts,
            location: config.weather.location_name,
            units: config.weather.units,
            zone,
            hourly_display: config.forecast.hourly_display,
            daily_display: config.forecast.daily_display,
            scheduler: WakeScheduler::new(config.schedule.clone()),
            aggregator: ForecastAggregator::new(config.forecast.limits()?, zone),
            trail: heapless::Vec::new(),
        })
    }

    pub fn phase(&self) -> CyclePhase {
        self.trail.last().copied().unwrap_or(CyclePhase::Boot)
    }

    pub fn parts(&self) -> &Collaborators<N, T, W, P, C> {
        &self.parts
    }

    pub fn into_parts(self) -> Collaborators<N, T, W, P, C> {
        self.parts
    }

    /// Run the cycle to the point of sleeping and report how long to sleep.
    ///
    /// The caller owns the actual suspend.
    pub async fn run(&mut self) -> CycleOutcome {
        self.trail.clear();
        self.enter(CyclePhase::Boot);
        self.status(STATUS_STARTING);

        let result = self.attempt().await;

        let (phase, sleep, error) = match result {
            Ok(()) => {
                let clock = ClockState::read(&self.parts.clock, &self.zone);
                (CyclePhase::Rendering, self.scheduler.plan(&clock), None)
            }
            Err(e) => {
                error!("Cycle failed while {}: {}", e.phase().label(), e);
                self.enter(CyclePhase::ReportingError);
                let retry = self.scheduler.retry();
                let message = error_message(&e);
                if let Err(render_err) = self.parts.presenter.show_error(&message, retry.secs) {
                    error!("Failed to draw error screen: {}", render_err);
                }
                (CyclePhase::ReportingError, retry, Some(e))
            }
        };

        self.enter(CyclePhase::Sleeping);
        info!("Sleeping for {} seconds ({:?})", sleep.secs, sleep.reason);

        CycleOutcome {
            phase,
            sleep,
            error,
            trail: self.trail.clone(),
        }
    }

    async fn attempt(&mut self) -> Result<(), CycleError> {
        self.enter(CyclePhase::ConnectingNetwork);
        self.status(STATUS_CONNECTING);
        self.parts
            .network
            .connect()
            .await
            .map_err(|e| CycleError::Network(error_message(e)))?;
        info!("Network connected");

        self.enter(CyclePhase::SyncingClock);
        self.status(STATUS_SYNCING);
        if let Err(e) = self.parts.time_sync.sync().await {
            let err = CycleError::TimeSync(error_message(e));
            self.parts.network.disconnect().await;
            return Err(err);
        }

        self.enter(CyclePhase::FetchingData);
        self.status(STATUS_FETCHING);
        let fetched = self.parts.source.fetch().await;
        self.parts.network.disconnect().await;
        info!("Network disconnected");
        let raw = fetched.map_err(CycleError::Fetch)?;

        let report = WeatherReport {
            current: raw.current,
            forecast: self.aggregator.aggregate(raw.samples),
        };
        info!("Weather: {}", report.summary());

        self.enter(CyclePhase::Rendering);
        let clock = ClockState::read(&self.parts.clock, &self.zone);
        let next_update_hour = clock
            .time_of_day()
            .and_then(|now| self.scheduler.next_update_hour(now.hour))
            .map(|h| h % 24);

        let view = WeatherView {
            report: &report,
            location: self.location,
            units: self.units,
            zone: self.zone,
            clock,
            next_update_hour,
            hourly_display: self.hourly_display,
            daily_display: self.daily_display,
        };
        self.parts
            .presenter
            .show_weather(&view)
            .map_err(|e| CycleError::Render(error_message(e)))
    }

    fn enter(&mut self, phase: CyclePhase) {
        info!("Phase: {}", phase.label());
        let _ = self.trail.push(phase);
    }

    /// Status screens are best effort; a failure here never aborts the cycle.
    fn status(&mut self, message: &str) {
        if let Err(e) = self.parts.presenter.show_status(message) {
            warn!("Failed to draw status '{}': {}", message, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SYNC_THRESHOLD;
    use crate::forecast::{CurrentConditions, Sample, label};
    use crate::provider::RawWeather;
    use crate::scheduler::SleepReason;
    use crate::time::{CivilDate, TimeOfDay, Timestamp, timestamp_from_utc};
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::cell::Cell;
    use embassy_futures::block_on;

    /// 2024-03-10 14:10:00 local at UTC-7
    fn afternoon() -> Timestamp {
        timestamp_from_utc(
            CivilDate {
                year: 2024,
                month: 3,
                day: 10,
            },
            TimeOfDay::new(21, 10, 0),
        )
    }

    #[derive(Clone, Default)]
    struct SharedClock(Rc<Cell<Timestamp>>);

    impl ClockSource for SharedClock {
        fn now(&self) -> Timestamp {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct FakeNetwork {
        fail: bool,
        connects: usize,
        disconnects: usize,
    }

    impl Network for FakeNetwork {
        type Error = &'static str;

        async fn connect(&mut self) -> Result<(), Self::Error> {
            self.connects += 1;
            if self.fail { Err("timeout") } else { Ok(()) }
        }

        async fn disconnect(&mut self) {
            self.disconnects += 1;
        }
    }

    struct FakeTimeSync {
        clock: SharedClock,
        set_to: Option<Timestamp>,
    }

    impl TimeSync for FakeTimeSync {
        type Error = &'static str;

        async fn sync(&mut self) -> Result<(), Self::Error> {
            match self.set_to {
                Some(ts) => {
                    self.clock.0.set(ts);
                    Ok(())
                }
                None => Err("all servers failed"),
            }
        }
    }

    struct FakeSource {
        result: Result<RawWeather, ProviderError>,
        calls: usize,
    }

    impl WeatherSource for FakeSource {
        async fn fetch(&mut self) -> Result<RawWeather, ProviderError> {
            self.calls += 1;
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        fail_weather: bool,
        statuses: Vec<String>,
        errors: Vec<(String, u32)>,
        weather: Option<(usize, usize, Option<u8>)>,
    }

    impl Presenter for RecordingPresenter {
        type Error = &'static str;

        fn show_status(&mut self, message: &str) -> Result<(), Self::Error> {
            self.statuses.push(message.to_string());
            Ok(())
        }

        fn show_weather(&mut self, view: &WeatherView<'_>) -> Result<(), Self::Error> {
            if self.fail_weather {
                return Err("bus fault");
            }
            self.weather = Some((
                view.report.forecast.hourly.len(),
                view.report.forecast.daily.len(),
                view.next_update_hour,
            ));
            Ok(())
        }

        fn show_error(&mut self, message: &str, retry_secs: u32) -> Result<(), Self::Error> {
            self.errors.push((message.to_string(), retry_secs));
            Ok(())
        }
    }

    fn samples(count: i64) -> Vec<Sample> {
        (0..count)
            .map(|i| Sample {
                timestamp: afternoon() + i * 3 * 3600,
                temperature: 50.0 + i as f32,
                humidity: 40,
                precipitation_probability: 0.2,
                condition_code: 800,
                condition_text: label("clear sky"),
            })
            .collect()
    }

    type TestCycle = WakeCycle<'static, FakeNetwork, FakeTimeSync, FakeSource, RecordingPresenter, SharedClock>;

    fn cycle(network: FakeNetwork, sync_ok: bool, fetch: Result<RawWeather, ProviderError>) -> TestCycle {
        let clock = SharedClock::default();
        let parts = Collaborators {
            network,
            time_sync: FakeTimeSync {
                clock: clock.clone(),
                set_to: sync_ok.then(afternoon),
            },
            source: FakeSource {
                result: fetch,
                calls: 0,
            },
            presenter: RecordingPresenter::default(),
            clock,
        };
        WakeCycle::new(&StationConfig::default(), parts).unwrap()
    }

    fn weather_ok() -> Result<RawWeather, ProviderError> {
        Ok(RawWeather {
            current: CurrentConditions {
                timestamp: afternoon(),
                temperature: 52.0,
                ..Default::default()
            },
            samples: samples(40),
        })
    }

    #[test]
    fn test_happy_path_sleeps_until_next_slot() {
        let mut cycle = cycle(FakeNetwork::default(), true, weather_ok());
        let outcome = block_on(cycle.run());

        assert_eq!(outcome.phase, CyclePhase::Rendering);
        assert_eq!(outcome.error, None);
        assert_eq!(
            outcome.sleep,
            SleepRequest {
                secs: 13_830,
                reason: SleepReason::Scheduled
            }
        );
        assert_eq!(
            outcome.trail.as_slice(),
            &[
                CyclePhase::Boot,
                CyclePhase::ConnectingNetwork,
                CyclePhase::SyncingClock,
                CyclePhase::FetchingData,
                CyclePhase::Rendering,
                CyclePhase::Sleeping,
            ]
        );
        assert_eq!(cycle.phase(), CyclePhase::Sleeping);

        let parts = cycle.into_parts();
        assert_eq!(parts.network.disconnects, 1);
        assert_eq!(
            parts.presenter.statuses,
            [STATUS_STARTING, STATUS_CONNECTING, STATUS_SYNCING, STATUS_FETCHING]
        );
        assert_eq!(parts.presenter.weather, Some((12, 6, Some(18))));
        assert!(parts.presenter.errors.is_empty());
    }

    #[test]
    fn test_network_failure_skips_everything_else() {
        let network = FakeNetwork {
            fail: true,
            ..Default::default()
        };
        let mut cycle = cycle(network, true, weather_ok());
        let outcome = block_on(cycle.run());

        assert_eq!(outcome.phase, CyclePhase::ReportingError);
        assert_eq!(outcome.sleep.secs, 300);
        assert_eq!(outcome.sleep.reason, SleepReason::Retry);
        let error = outcome.error.unwrap();
        assert_eq!(error.phase(), CyclePhase::ConnectingNetwork);
        assert_eq!(
            outcome.trail.as_slice(),
            &[
                CyclePhase::Boot,
                CyclePhase::ConnectingNetwork,
                CyclePhase::ReportingError,
                CyclePhase::Sleeping,
            ]
        );

        let parts = cycle.into_parts();
        assert_eq!(parts.network.disconnects, 0);
        assert_eq!(parts.source.calls, 0);
        assert_eq!(parts.presenter.errors, [("WiFi failed: timeout".to_string(), 300)]);
    }

    #[test]
    fn test_time_sync_failure_disconnects() {
        let mut cycle = cycle(FakeNetwork::default(), false, weather_ok());
        let outcome = block_on(cycle.run());

        assert_eq!(
            outcome.error.as_ref().map(CycleError::phase),
            Some(CyclePhase::SyncingClock)
        );
        assert_eq!(outcome.sleep.reason, SleepReason::Retry);

        let parts = cycle.into_parts();
        assert_eq!(parts.network.disconnects, 1);
        assert_eq!(parts.source.calls, 0);
        assert_eq!(parts.presenter.errors[0].0, "Time sync failed: all servers failed");
    }

    #[test]
    fn test_fetch_failure_still_disconnects() {
        let mut cycle = cycle(FakeNetwork::default(), true, Err(ProviderError::HttpStatus(401)));
        let outcome = block_on(cycle.run());

        assert_eq!(outcome.error, Some(CycleError::Fetch(ProviderError::HttpStatus(401))));
        assert_eq!(outcome.sleep.secs, 300);

        let parts = cycle.into_parts();
        assert_eq!(parts.network.disconnects, 1);
        assert!(parts.presenter.weather.is_none());
        assert_eq!(parts.presenter.errors[0].0, "HTTP error: 401");
    }

    #[test]
    fn test_render_failure_uses_retry() {
        let mut cycle = cycle(FakeNetwork::default(), true, weather_ok());
        cycle.parts.presenter.fail_weather = true;
        let outcome = block_on(cycle.run());

        assert_eq!(
            outcome.error,
            Some(CycleError::Render(error_message("bus fault")))
        );
        assert_eq!(outcome.phase, CyclePhase::ReportingError);
        assert_eq!(outcome.sleep.reason, SleepReason::Retry);
    }

    #[test]
    fn test_empty_forecast_still_renders() {
        let fetch = Ok(RawWeather {
            current: CurrentConditions::default(),
            samples: Vec::new(),
        });
        let mut cycle = cycle(FakeNetwork::default(), true, fetch);
        let outcome = block_on(cycle.run());

        assert_eq!(outcome.error, None);
        assert_eq!(cycle.into_parts().presenter.weather, Some((0, 0, Some(18))));
    }

    #[test]
    fn test_cycle_can_run_again() {
        let mut cycle = cycle(FakeNetwork::default(), true, weather_ok());
        block_on(cycle.run());
        let second = block_on(cycle.run());
        assert_eq!(second.trail.len(), 6);
        assert_eq!(cycle.into_parts().network.connects, 2);
    }

    #[test]
    fn test_unsynced_clock_after_render_falls_back() {
        // Sync "succeeds" but leaves the clock before the threshold
        let mut cycle = cycle(FakeNetwork::default(), true, weather_ok());
        cycle.parts.time_sync.set_to = Some(SYNC_THRESHOLD - 10);
        let outcome = block_on(cycle.run());

        assert_eq!(outcome.error, None);
        assert_eq!(outcome.sleep.reason, SleepReason::Retry);
    }
}
