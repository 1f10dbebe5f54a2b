//! Desktop simulator for the stratus weather station.
//!
//! Runs the real wake cycle from stratus-core against simulated WiFi, SNTP
//! and RTC, and renders the result in an SDL2 window via
//! `embedded-graphics-simulator`.
//!
//! # Options
//!
//! | Flag              | Effect                                             |
//! |-------------------|----------------------------------------------------|
//! | `--config <file>` | station config JSON (defaults otherwise)           |
//! | `--fixtures <dir>`| serve `weather.json` / `forecast.json` from `dir`  |
//! | `--offline`       | WiFi never associates                              |
//! | `--no-ntp`        | every time server fails                            |
//! | `--lcd`           | 320x240 panel instead of the 540x960 page          |
//! | `--png <path>`    | render one cycle to a PNG and exit                 |
//!
//! Live OpenWeatherMap data is used when `OWM_API_KEY` (or the config's
//! `api_key`) is set; otherwise responses are synthesized.
//!
//! # Key bindings
//!
//! | Key    | Action                                     |
//! |--------|--------------------------------------------|
//! | N      | Sleep as requested, then run the next wake |
//! | Q, Esc | Quit                                       |

mod board;
mod transport;

use std::path::PathBuf;
use std::time::Duration;

use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};

use stratus_core::clock::ClockSource;
use stratus_core::config::StationConfig;
use stratus_core::cycle::{Collaborators, CycleOutcome, WakeCycle};
use stratus_core::display::{DisplayManager, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
use stratus_core::provider::OwmSource;

use board::{SimClock, SimNetwork, SimTimeSync};
use transport::SimTransport;

/// Pixel scale factor for the 320x240 window
const LCD_SCALE: u32 = 2;

/// The full page is taller than most screens
const PAGE_SCALE: u32 = 1;

const LCD_SIZE: Size = Size::new(320, 240);

/// Event polling interval
const FRAME_DURATION: Duration = Duration::from_millis(33);

#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    fixtures: Option<PathBuf>,
    offline: bool,
    no_ntp: bool,
    lcd: bool,
    png: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--config" => options.config = Some(value("--config")?.into()),
            "--fixtures" => options.fixtures = Some(value("--fixtures")?.into()),
            "--png" => options.png = Some(value("--png")?.into()),
            "--offline" => options.offline = true,
            "--no-ntp" => options.no_ntp = true,
            "--lcd" => options.lcd = true,
            other => return Err(format!("Unknown option {other}")),
        }
    }
    Ok(options)
}

type SimPresenter = DisplayManager<SimulatorDisplay<Gray4>, fn(Gray4) -> Gray4>;
type SimCycle<'a> =
    WakeCycle<'a, SimNetwork, SimTimeSync, OwmSource<'a, SimTransport>, SimPresenter, SimClock>;

fn report(outcome: &CycleOutcome) {
    match &outcome.error {
        Some(e) => warn!("Cycle ended in {:?}: {}", outcome.phase, e),
        None => info!("Cycle ended in {:?}", outcome.phase),
    }
    info!("Phases: {:?}", outcome.trail);
    info!("Requested sleep: {} s", outcome.sleep.secs);
}

fn run_window(cycle: &mut SimCycle<'_>, clock: &SimClock, scale: u32) {
    let output_settings = OutputSettingsBuilder::new().scale(scale).build();
    let mut window = Window::new("Stratus Simulator", &output_settings);

    let mut outcome = embassy_futures::block_on(cycle.run());
    report(&outcome);

    // The SDL window is lazily initialized on the first `update()` call.
    window.update(cycle.parts().presenter.panel());

    'running: loop {
        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,
                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::N => {
                        clock.advance(outcome.sleep.secs);
                        info!("Woke at {}", clock.now());
                        outcome = embassy_futures::block_on(cycle.run());
                        report(&outcome);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        window.update(cycle.parts().presenter.panel());
        std::thread::sleep(FRAME_DURATION);
    }
}

fn main() {
    env_logger::init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let config_text = match &options.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => None,
    };
    let env_key = std::env::var("OWM_API_KEY").unwrap_or_default();

    let mut config = match config_text.as_deref().map(StationConfig::from_json) {
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
        None => StationConfig::default(),
    };
    if !env_key.is_empty() {
        config.weather.api_key = &env_key;
    }

    let clock = SimClock::default();
    let units = config.weather.units;
    let transport = match (&options.fixtures, config.weather.api_key.is_empty()) {
        (Some(dir), _) => SimTransport::Fixtures(dir.clone()),
        (None, false) => SimTransport::Live,
        (None, true) => {
            info!("No API key set, synthesizing weather");
            SimTransport::Synthetic {
                clock: clock.clone(),
                units,
            }
        }
    };

    let (size, scale) = if options.lcd {
        (LCD_SIZE, LCD_SCALE)
    } else {
        (Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX), PAGE_SCALE)
    };
    info!("Display: {}x{} (scale {}x)", size.width, size.height, scale);

    let identity: fn(Gray4) -> Gray4 = |c| c;
    let parts = Collaborators {
        network: SimNetwork {
            offline: options.offline,
        },
        time_sync: SimTimeSync {
            clock: clock.clone(),
            fail: options.no_ntp,
        },
        source: OwmSource::new(transport, &config.weather),
        presenter: DisplayManager::new(SimulatorDisplay::<Gray4>::new(size), identity),
        clock: clock.clone(),
    };

    let mut cycle = match WakeCycle::new(&config, parts) {
        Ok(cycle) => cycle,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    match &options.png {
        Some(path) => {
            let outcome = embassy_futures::block_on(cycle.run());
            report(&outcome);
            let settings = OutputSettingsBuilder::new().scale(scale).build();
            let image = cycle
                .parts()
                .presenter
                .panel()
                .to_grayscale_output_image(&settings);
            match image.save_png(path) {
                Ok(()) => info!("Wrote {}", path.display()),
                Err(e) => {
                    error!("Cannot write {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            info!("Keys: N=next wake  Q=Quit");
            run_window(&mut cycle, &clock, scale);
        }
    }

    info!("Simulator exiting");
}
