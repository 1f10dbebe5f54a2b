//! Plain HTTP over an embassy-net TCP socket
//!
//! One connection per request. Requests ask for `Connection: close`, so the
//! response is everything read until the server closes.

use alloc::vec::Vec;
use core::fmt::{Debug, Write};

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpEndpoint, Stack};
use embassy_time::Duration;
use log::{debug, info};
use stratus_core::provider::http::get_request;
use stratus_core::provider::{ErrorMessage, HttpTransport, ProviderError};

const HTTP_PORT: u16 = 80;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(15);
/// A full 5-day forecast is about 16 KiB
const MAX_RESPONSE_BYTES: usize = 48 * 1024;

fn transport_error(step: &str, e: impl Debug) -> ProviderError {
    let mut msg = ErrorMessage::new();
    let _ = write!(msg, "{}: {:?}", step, e);
    ProviderError::Transport(msg)
}

pub struct TcpTransport {
    stack: Stack<'static>,
    rx_buffer: [u8; 4096],
    tx_buffer: [u8; 1024],
}

impl TcpTransport {
    pub const fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            rx_buffer: [0; 4096],
            tx_buffer: [0; 1024],
        }
    }
}

impl HttpTransport for TcpTransport {
    async fn get(&mut self, host: &str, path: &str) -> Result<Vec<u8>, ProviderError> {
        let addr = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| transport_error("dns", e))?
            .first()
            .copied()
            .ok_or_else(|| transport_error("dns", "no address"))?;
        info!("Resolved {} to {}", host, addr);

        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        socket
            .connect(IpEndpoint::new(addr, HTTP_PORT))
            .await
            .map_err(|e| transport_error("connect", e))?;

        let request = get_request(host, path);
        let mut pending = request.as_bytes();
        while !pending.is_empty() {
            let sent = socket
                .write(pending)
                .await
                .map_err(|e| transport_error("write", e))?;
            if sent == 0 {
                return Err(transport_error("write", "connection closed"));
            }
            pending = &pending[sent..];
        }
        socket.flush().await.map_err(|e| transport_error("flush", e))?;

        let mut response = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket
                .read(&mut chunk)
                .await
                .map_err(|e| transport_error("read", e))?;
            if n == 0 {
                break;
            }
            if response.len() + n > MAX_RESPONSE_BYTES {
                socket.abort();
                return Err(transport_error("read", "response too large"));
            }
            response.extend_from_slice(&chunk[..n]);
        }
        socket.close();
        debug!("Read {} bytes from {}", response.len(), host);

        Ok(response)
    }
}
