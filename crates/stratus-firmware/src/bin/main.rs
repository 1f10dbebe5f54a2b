#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::time::Duration as CoreDuration;

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::rtc_cntl::Rtc;
use esp_hal::rtc_cntl::sleep::TimerWakeupSource;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::Controller;
use esp_radio::wifi::WifiDevice;
use log::{error, info};
use static_cell::StaticCell;

use stratus_core::config::{DEFAULT_RETRY_SECS, StationConfig};
use stratus_core::cycle::{Collaborators, WakeCycle};
use stratus_core::display::DisplayManager;
use stratus_core::provider::OwmSource;
use stratus_firmware::display::{PanelPins, init_panel, to_rgb565};
use stratus_firmware::http::TcpTransport;
use stratus_firmware::power::{create_i2c_bus, power_up_display};
use stratus_firmware::rtc_clock::RtcClock;
use stratus_firmware::secrets::station_config;
use stratus_firmware::sntp::SntpTimeSync;
use stratus_firmware::wifi::WifiNetwork;

/// DHCP, DNS, one UDP and one TCP socket, plus headroom
const NET_SOCKETS: usize = 5;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

/// Suspend until the next wake. The chip resets on wake-up.
fn deep_sleep(rtc: &mut Rtc<'static>, secs: u32) -> ! {
    let secs = if secs == 0 { DEFAULT_RETRY_SECS } else { secs };
    info!("Entering deep sleep for {} s", secs);
    let timer = TimerWakeupSource::new(CoreDuration::from_secs(secs as u64));
    rtc.sleep_deep(&[&timer])
}

/// Hardware bring-up failed before a cycle could start
fn fail(rtc: &mut Rtc<'static>, config: &StationConfig<'_>, what: &str) -> ! {
    error!("{} failed, retrying after sleep", what);
    deep_sleep(rtc, config.schedule.retry_secs())
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // Framebuffer and HTTP bodies live in PSRAM
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);
    info!("Embassy initialized");

    let mut rtc = Rtc::new(peripherals.LPWR);
    let config = station_config();

    // Display power and panel
    let Ok(i2c) = create_i2c_bus(peripherals.I2C0, peripherals.GPIO12, peripherals.GPIO11) else {
        fail(&mut rtc, &config, "I2C bus");
    };
    if power_up_display(i2c).await.is_err() {
        fail(&mut rtc, &config, "Display power");
    }
    let mut spi_buffer = [0u8; 512];
    let pins = PanelPins {
        spi: peripherals.SPI2,
        sck: peripherals.GPIO36,
        mosi: peripherals.GPIO37,
        cs: peripherals.GPIO35,
        dc: peripherals.GPIO34,
    };
    let Ok(panel) = init_panel(pins, &mut spi_buffer) else {
        fail(&mut rtc, &config, "Display");
    };

    // Radio and network stack
    static RADIO: StaticCell<Controller<'static>> = StaticCell::new();
    let Ok(radio) = esp_radio::init() else {
        fail(&mut rtc, &config, "Radio");
    };
    let radio = RADIO.init(radio);
    let Ok((controller, interfaces)) =
        esp_radio::wifi::new(radio, peripherals.WIFI, Default::default())
    else {
        fail(&mut rtc, &config, "WiFi controller");
    };

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    static RESOURCES: StaticCell<StackResources<NET_SOCKETS>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    match net_task(runner) {
        Ok(token) => spawner.spawn(token),
        Err(_) => fail(&mut rtc, &config, "Network task"),
    }

    let sleep = {
        let clock = RtcClock::new(&rtc);
        let parts = Collaborators {
            network: WifiNetwork::new(controller, stack, &config.internet),
            time_sync: SntpTimeSync::new(stack, &config.time.ntp_servers, &clock),
            source: OwmSource::new(TcpTransport::new(stack), &config.weather),
            presenter: DisplayManager::new(panel, to_rgb565),
            clock: &clock,
        };

        match WakeCycle::new(&config, parts) {
            Ok(mut cycle) => cycle.run().await.sleep.secs,
            Err(e) => {
                error!("Invalid configuration: {}", e);
                config.schedule.retry_secs()
            }
        }
    };

    deep_sleep(&mut rtc, sleep)
}
