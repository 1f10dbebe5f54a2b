//! Desktop stand-ins for the radio, SNTP and the RTC.
//!
//! The simulated RTC starts at zero like a cold-booted board, so the first
//! cycle really exercises the unsynced-clock path until "SNTP" copies the
//! host time into it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;
use stratus_core::clock::ClockSource;
use stratus_core::cycle::{Network, TimeSync};
use stratus_core::time::Timestamp;

/// Shared simulated RTC
#[derive(Clone, Default)]
pub struct SimClock(Rc<Cell<Timestamp>>);

impl SimClock {
    pub fn set(&self, ts: Timestamp) {
        self.0.set(ts);
    }

    /// Pretend the board slept for `secs`
    pub fn advance(&self, secs: u32) {
        self.0.set(self.0.get() + secs as Timestamp);
    }
}

impl ClockSource for SimClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

pub fn host_time() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or_default()
}

pub struct SimNetwork {
    pub offline: bool,
}

impl Network for SimNetwork {
    type Error = &'static str;

    async fn connect(&mut self) -> Result<(), Self::Error> {
        if self.offline {
            return Err("timeout");
        }
        info!("Simulated WiFi up");
        Ok(())
    }

    async fn disconnect(&mut self) {
        info!("Simulated WiFi down");
    }
}

/// "SNTP" that copies the host clock once, then keeps the simulated time.
///
/// After the first sync the simulated clock only moves by [`SimClock::advance`],
/// so replayed wakes land on the scheduled hours.
pub struct SimTimeSync {
    pub clock: SimClock,
    pub fail: bool,
}

impl TimeSync for SimTimeSync {
    type Error = &'static str;

    async fn sync(&mut self) -> Result<(), Self::Error> {
        if self.fail {
            return Err("all servers failed");
        }
        if self.clock.now() < stratus_core::clock::SYNC_THRESHOLD {
            self.clock.set(host_time());
        }
        info!("Simulated clock at {}", self.clock.now());
        Ok(())
    }
}
