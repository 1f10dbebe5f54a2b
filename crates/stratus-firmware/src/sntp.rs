//! SNTP time sync over UDP
//!
//! Servers are tried in configured order, each with its own timeout. The
//! first valid reply, corrected by half the round trip, is written to the
//! RTC.

use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Instant, with_timeout};
use log::{error, info, warn};
use stratus_core::cycle::TimeSync;
use stratus_core::sntp::{self, NtpTime, PACKET_LEN, SNTP_PORT, SntpError};
use thiserror_no_std::Error;

use crate::rtc_clock::RtcClock;

/// Per-server budget for DNS plus the exchange
const SERVER_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSyncError {
    #[error("no NTP servers configured")]
    NoServers,
    #[error("all NTP servers failed")]
    AllServersFailed,
}

#[derive(Error, Debug)]
enum QueryError {
    #[error("DNS lookup failed")]
    Dns,
    #[error("socket error")]
    Socket,
    #[error("reply from unexpected address")]
    WrongPeer,
    #[error("{0}")]
    Reply(SntpError),
}

pub struct SntpTimeSync<'a, 'r> {
    stack: Stack<'static>,
    servers: &'a [&'a str],
    clock: &'r RtcClock<'r>,
}

impl<'a, 'r> SntpTimeSync<'a, 'r> {
    pub const fn new(stack: Stack<'static>, servers: &'a [&'a str], clock: &'r RtcClock<'r>) -> Self {
        Self {
            stack,
            servers,
            clock,
        }
    }

    async fn query(&self, server: &str) -> Result<NtpTime, QueryError> {
        let addr = self
            .stack
            .dns_query(server, DnsQueryType::A)
            .await
            .map_err(|_| QueryError::Dns)?
            .first()
            .copied()
            .ok_or(QueryError::Dns)?;
        let endpoint = IpEndpoint::new(addr, SNTP_PORT);

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; 64];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_buffer = [0u8; 64];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| QueryError::Socket)?;

        let sent_at = Instant::now();
        socket
            .send_to(&sntp::request(), endpoint)
            .await
            .map_err(|_| QueryError::Socket)?;

        let mut reply = [0u8; PACKET_LEN];
        let (len, meta) = socket
            .recv_from(&mut reply)
            .await
            .map_err(|_| QueryError::Socket)?;
        let round_trip = sent_at.elapsed().as_micros();

        if meta.endpoint.addr != addr {
            return Err(QueryError::WrongPeer);
        }
        let time = sntp::parse_reply(&reply[..len]).map_err(QueryError::Reply)?;
        Ok(time.corrected(round_trip))
    }
}

impl TimeSync for SntpTimeSync<'_, '_> {
    type Error = TimeSyncError;

    async fn sync(&mut self) -> Result<(), TimeSyncError> {
        if self.servers.is_empty() {
            return Err(TimeSyncError::NoServers);
        }

        for server in self.servers {
            info!("SNTP query to {}", server);
            match with_timeout(SERVER_TIMEOUT, self.query(server)).await {
                Ok(Ok(time)) => {
                    self.clock.set(time);
                    return Ok(());
                }
                Ok(Err(e)) => warn!("SNTP {} failed: {}", server, e),
                Err(_) => warn!("SNTP {} timed out", server),
            }
        }

        error!("All SNTP servers failed");
        Err(TimeSyncError::AllServersFailed)
    }
}
