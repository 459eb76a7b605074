//! UDP datagram transport
//!
//! One packet per datagram to a single `udp://host:port` destination.
//! Datagrams are atomic, so a non-blocking send either queues the whole
//! packet or reports `WouldBlock`.

use super::{SendStatus, Transport, UDP_SCHEME};
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Connected, non-blocking UDP socket
#[derive(Default)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    target: Option<SocketAddr>,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination after a successful connect
    pub fn target(&self) -> Option<SocketAddr> {
        self.target
    }

    fn resolve(address: &str) -> Result<SocketAddr> {
        let host_port = address.strip_prefix(UDP_SCHEME).unwrap_or(address);
        host_port
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Other(format!("{} resolved to no address", host_port)))
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self, address: &str) -> Result<()> {
        let connect = || -> Result<(UdpSocket, SocketAddr)> {
            let target = Self::resolve(address)?;
            let bind_addr = if target.is_ipv4() {
                "0.0.0.0:0"
            } else {
                "[::]:0"
            };
            // Bind to any available port (we only send, not receive)
            let socket = UdpSocket::bind(bind_addr)?;
            socket.connect(target)?;
            socket.set_nonblocking(true)?;
            Ok((socket, target))
        };

        let (socket, target) = connect().map_err(|e| Error::Connect {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        log::info!("UDP streaming to {}", target);
        self.socket = Some(socket);
        self.target = Some(target);
        Ok(())
    }

    fn try_send(&mut self, payload: &[u8]) -> Result<SendStatus> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;

        match socket.send(payload) {
            Ok(n) if n == payload.len() => Ok(SendStatus::Accepted),
            Ok(n) => Err(Error::Transport(format!(
                "short datagram: {} of {} bytes",
                n,
                payload.len()
            ))),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(SendStatus::WouldBlock),
            // ICMP port unreachable from a previous datagram; the next one may land
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                Err(Error::Transport(format!("destination refused: {}", e)))
            }
            Err(e) => Err(Error::Transport(e.to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            log::debug!("UDP socket closed");
        }
        self.target = None;
        Ok(())
    }
}
