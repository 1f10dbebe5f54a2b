//! Power rails
//!
//! On the CoreS3 the LCD, its backlight and the level shifters hang off the
//! AXP2101 LDOs, and the panel reset line goes through the AW9523 expander.
//! Both must be configured before the SPI panel will respond.

use aw9523_embedded::r#async::Aw9523Async;
use axp2101_embedded::AsyncAxp2101;
use embedded_hal::i2c::SevenBitAddress;
use esp_hal::Async;
use esp_hal::i2c::master::{Config as I2cConfig, ConfigError, I2c};
use esp_hal::peripherals::{GPIO11, GPIO12, I2C0};
use esp_hal::time::Rate;
use log::{error, info};
use static_cell::StaticCell;
use thiserror_no_std::Error;

use crate::i2c_bus::{AsyncI2cDevice, SharedBus};

const AW9523_ADDRESS: u8 = 0x58;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    #[error("PMIC setup failed")]
    Pmic,
    #[error("IO expander setup failed")]
    Expander,
}

/// 400 kHz internal I2C bus
pub fn create_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO12<'static>,
    scl: GPIO11<'static>,
) -> Result<I2c<'static, Async>, ConfigError> {
    Ok(I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400)))?
        .with_sda(sda)
        .with_scl(scl)
        .into_async())
}

fn pmic_error(e: impl core::fmt::Debug) -> PowerError {
    error!("AXP2101: {:?}", e);
    PowerError::Pmic
}

/// Enable every rail the display path needs.
pub async fn power_up_display(i2c: I2c<'static, Async>) -> Result<(), PowerError> {
    static I2C0_BUS: StaticCell<SharedBus<I2c<'static, Async>>> = StaticCell::new();
    let bus = I2C0_BUS.init(SharedBus::new(i2c));

    info!("Configuring power management");
    let mut pmic = AsyncAxp2101::new(AsyncI2cDevice::new(bus));
    pmic.init().await.map_err(pmic_error)?;
    pmic.enable_aldo1().await.map_err(pmic_error)?;
    pmic.enable_aldo2().await.map_err(pmic_error)?;
    pmic.enable_aldo3().await.map_err(pmic_error)?;
    pmic.enable_aldo4().await.map_err(pmic_error)?;
    pmic.enable_bldo1().await.map_err(pmic_error)?;
    pmic.enable_bldo2().await.map_err(pmic_error)?;
    // Backlight
    pmic.enable_dldo1().await.map_err(pmic_error)?;
    // ALDO4 feeds the LCD logic at 3.3 V
    pmic.set_aldo4_voltage(3300).await.map_err(pmic_error)?;

    info!("Configuring GPIO expander");
    let mut expander: Aw9523Async<SevenBitAddress, _> =
        Aw9523Async::new(AsyncI2cDevice::new(bus), AW9523_ADDRESS);
    expander.init().await.map_err(|e| {
        error!("AW9523: {:?}", e);
        PowerError::Expander
    })?;

    info!("Display power ready");
    Ok(())
}
