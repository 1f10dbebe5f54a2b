//! SNTP (RFC 4330) packet encoding
//!
//! Only the client side of a single request/reply exchange: build the 48-byte
//! request, validate the reply and pull out its transmit timestamp. Sockets
//! and server fallback live with the board.

use thiserror_no_std::Error;

use crate::clock::is_synced;
use crate::time::Timestamp;

pub const SNTP_PORT: u16 = 123;
pub const PACKET_LEN: usize = 48;

/// Seconds from 1900-01-01 (NTP era 0) to 1970-01-01
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// LI = 0, VN = 3, Mode = 3 (client)
const CLIENT_HEADER: u8 = 0x1B;
const MODE_SERVER: u8 = 4;
const MODE_BROADCAST: u8 = 5;
const LEAP_ALARM: u8 = 3;
const MAX_STRATUM: u8 = 15;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SntpError {
    #[error("Short reply ({0} bytes)")]
    ShortReply(usize),
    #[error("Unexpected mode {0}")]
    BadMode(u8),
    #[error("Server not synchronized")]
    Unsynchronized,
    #[error("Kiss-of-death from server")]
    KissOfDeath,
    #[error("Implausible server time")]
    BadTimestamp,
}

/// Wall time carried by a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpTime {
    pub unix_secs: Timestamp,
    pub micros: u32,
}

impl NtpTime {
    /// Microseconds since the Unix epoch
    pub const fn as_unix_micros(&self) -> u64 {
        self.unix_secs as u64 * 1_000_000 + self.micros as u64
    }

    /// Shift forward by half the measured round trip, capped at one second.
    pub fn corrected(self, round_trip_micros: u64) -> Self {
        let half = (round_trip_micros / 2).min(1_000_000) as u32;
        let micros = self.micros + half;
        Self {
            unix_secs: self.unix_secs + (micros / 1_000_000) as i64,
            micros: micros % 1_000_000,
        }
    }
}

pub const fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Validate a server reply and return its transmit timestamp.
pub fn parse_reply(reply: &[u8]) -> Result<NtpTime, SntpError> {
    if reply.len() < PACKET_LEN {
        return Err(SntpError::ShortReply(reply.len()));
    }

    let leap = reply[0] >> 6;
    let mode = reply[0] & 0x07;
    if mode != MODE_SERVER && mode != MODE_BROADCAST {
        return Err(SntpError::BadMode(mode));
    }
    if leap == LEAP_ALARM {
        return Err(SntpError::Unsynchronized);
    }
    match reply[1] {
        0 => return Err(SntpError::KissOfDeath),
        s if s > MAX_STRATUM => return Err(SntpError::Unsynchronized),
        _ => {}
    }

    let secs = u32::from_be_bytes([reply[40], reply[41], reply[42], reply[43]]);
    let frac = u32::from_be_bytes([reply[44], reply[45], reply[46], reply[47]]);

    // Era 1 starts in 2036; seconds with the top bit clear belong to it
    let ntp_secs = if secs & 0x8000_0000 == 0 {
        secs as i64 + (1i64 << 32)
    } else {
        secs as i64
    };
    let unix_secs = ntp_secs - NTP_UNIX_OFFSET;
    if !is_synced(unix_secs) {
        return Err(SntpError::BadTimestamp);
    }

    Ok(NtpTime {
        unix_secs,
        micros: ((frac as u64 * 1_000_000) >> 32) as u32,
    })
}
