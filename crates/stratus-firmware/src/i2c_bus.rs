//! Shared async I2C bus
//!
//! The PMIC and the IO expander sit on the same bus. Each driver gets its own
//! [`AsyncI2cDevice`] handle; transactions are serialized by an embassy
//! `Mutex` that is held across the awaited transfer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

pub type SharedBus<T> = Mutex<CriticalSectionRawMutex, T>;

pub struct AsyncI2cDevice<'a, T> {
    bus: &'a SharedBus<T>,
}

impl<'a, T> AsyncI2cDevice<'a, T> {
    #[inline]
    pub const fn new(bus: &'a SharedBus<T>) -> Self {
        Self { bus }
    }
}

impl<T: ErrorType> ErrorType for AsyncI2cDevice<'_, T> {
    type Error = T::Error;
}

impl<T: I2c> I2c for AsyncI2cDevice<'_, T> {
    #[inline]
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.read(address, read).await
    }

    #[inline]
    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.bus.lock().await.write(address, write).await
    }

    #[inline]
    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.write_read(address, write, read).await
    }

    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.lock().await.transaction(address, operations).await
    }
}
