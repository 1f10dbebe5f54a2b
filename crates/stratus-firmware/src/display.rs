//! LCD panel
//!
//! ILI9342C 320x240 on SPI2. Pages render in 16-level gray; [`to_rgb565`]
//! spreads each level across the panel's color channels.

use embedded_graphics::pixelcolor::{Gray4, GrayColor, Rgb565};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use esp_hal::Blocking;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::peripherals::{GPIO34, GPIO35, GPIO36, GPIO37, SPI2};
use esp_hal::spi::master::{Config, Spi};
use esp_hal::time::Rate;
use log::{error, info};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ILI9342CRgb565;
use mipidsi::{Builder as MipidsiBuilder, NoResetPin};
use thiserror_no_std::Error;

pub const DISPLAY_WIDTH: u16 = 320;
pub const DISPLAY_HEIGHT: u16 = 240;

pub type PanelSpi = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, NoDelay>;
pub type Panel<'b> =
    mipidsi::Display<SpiInterface<'b, PanelSpi, Output<'static>>, ILI9342CRgb565, NoResetPin>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError {
    #[error("SPI configuration rejected")]
    Spi,
    #[error("Panel init failed")]
    Init,
}

/// Pins and bus wired to the LCD
pub struct PanelPins {
    pub spi: SPI2<'static>,
    pub sck: GPIO36<'static>,
    pub mosi: GPIO37<'static>,
    pub cs: GPIO35<'static>,
    pub dc: GPIO34<'static>,
}

/// Bring up the panel. `buffer` batches SPI writes; larger is faster.
pub fn init_panel(pins: PanelPins, buffer: &mut [u8]) -> Result<Panel<'_>, PanelError> {
    let spi_bus = Spi::new(pins.spi, Config::default().with_frequency(Rate::from_mhz(40)))
        .map_err(|e| {
            error!("SPI config: {:?}", e);
            PanelError::Spi
        })?
        .with_sck(pins.sck)
        .with_mosi(pins.mosi);

    // Chip select is driven in software
    let cs = Output::new(pins.cs, Level::High, OutputConfig::default());
    let Ok(spi_device) = ExclusiveDevice::new_no_delay(spi_bus, cs);
    let dc = Output::new(pins.dc, Level::Low, OutputConfig::default());
    let interface = SpiInterface::new(spi_device, dc, buffer);

    let panel = MipidsiBuilder::new(ILI9342CRgb565, interface)
        .display_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        .init(&mut embassy_time::Delay)
        .map_err(|e| {
            error!("Panel init: {:?}", e);
            PanelError::Init
        })?;
    info!("Display initialized");
    Ok(panel)
}

/// Gray level to the closest neutral RGB565 color
pub fn to_rgb565(gray: Gray4) -> Rgb565 {
    let level = gray.luma() as u16;
    let red_blue = (level * 31 / 15) as u8;
    Rgb565::new(red_blue, (level * 63 / 15) as u8, red_blue)
}
