//! WiFi station link
//!
//! Association is retried until the configured timeout; the link counts as up
//! once DHCP has handed out an address. Disconnecting also stops the radio.

use alloc::string::String;

use embassy_net::Stack;
use embassy_time::{Duration, Timer, with_timeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use log::{info, warn};
use stratus_core::config::InternetConfig;
use stratus_core::cycle::Network;
use stratus_core::provider::ErrorMessage;
use thiserror_no_std::Error;

use crate::debug_message;

const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("no SSID configured")]
    NoCredentials,
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Radio(ErrorMessage),
}

pub struct WifiNetwork<'a> {
    controller: WifiController<'static>,
    stack: Stack<'static>,
    ssid: &'a str,
    password: &'a str,
    timeout: Duration,
}

impl<'a> WifiNetwork<'a> {
    pub fn new(
        controller: WifiController<'static>,
        stack: Stack<'static>,
        internet: &InternetConfig<'a>,
    ) -> Self {
        Self {
            controller,
            stack,
            ssid: internet.ssid,
            password: internet.password,
            timeout: Duration::from_millis(internet.connect_timeout_ms as u64),
        }
    }

    async fn associate(&mut self) -> Result<(), LinkError> {
        if !matches!(self.controller.is_started(), Ok(true)) {
            let config = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(String::from(self.ssid))
                    .with_password(String::from(self.password)),
            );
            self.controller
                .set_config(&config)
                .map_err(|e| LinkError::Radio(debug_message(e)))?;
            self.controller
                .start_async()
                .await
                .map_err(|e| LinkError::Radio(debug_message(e)))?;
            info!("WiFi started");
        }

        info!("Connecting to {}", self.ssid);
        while let Err(e) = self.controller.connect_async().await {
            warn!("WiFi connect failed: {:?}, retrying", e);
            Timer::after(RETRY_DELAY).await;
        }

        info!("WiFi associated, waiting for DHCP");
        self.stack.wait_config_up().await;
        if let Some(config) = self.stack.config_v4() {
            info!("Got IP: {}", config.address);
        }
        Ok(())
    }
}

impl Network for WifiNetwork<'_> {
    type Error = LinkError;

    async fn connect(&mut self) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        with_timeout(self.timeout, self.associate())
            .await
            .map_err(|_| LinkError::Timeout)?
    }

    async fn disconnect(&mut self) {
        if let Err(e) = self.controller.disconnect_async().await {
            warn!("WiFi disconnect: {:?}", e);
        }
        if let Err(e) = self.controller.stop_async().await {
            warn!("WiFi stop: {:?}", e);
        }
        info!("WiFi stopped");
    }
}
