//! ZeroMQ PUSH transport
//!
//! Connects (never binds) a PUSH socket to the consumer's PULL endpoint and
//! sends each packet as one single-part message with `DONTWAIT`.

use super::{SendStatus, Transport};
use crate::config::TransportConfig;
use crate::error::{Error, Result};

/// PUSH socket plus the context that owns it
pub struct ZmqPushTransport {
    context: Option<zmq::Context>,
    socket: Option<zmq::Socket>,
    connected: bool,
}

impl ZmqPushTransport {
    /// Create the context and an unconnected PUSH socket
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let context = zmq::Context::new();
        let socket = context
            .socket(zmq::PUSH)
            .map_err(|e| Error::Transport(format!("Failed to create PUSH socket: {}", e)))?;

        socket
            .set_sndhwm(config.send_hwm)
            .map_err(|e| Error::Transport(format!("Failed to set send HWM: {}", e)))?;
        socket
            .set_linger(config.linger_ms)
            .map_err(|e| Error::Transport(format!("Failed to set linger: {}", e)))?;

        Ok(Self {
            context: Some(context),
            socket: Some(socket),
            connected: false,
        })
    }
}

impl Transport for ZmqPushTransport {
    fn connect(&mut self, address: &str) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(Error::NotConnected)?;
        socket.connect(address).map_err(|e| Error::Connect {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
        self.connected = true;
        log::info!("PUSH socket connected to {}", address);
        Ok(())
    }

    fn try_send(&mut self, payload: &[u8]) -> Result<SendStatus> {
        let socket = match (&self.socket, self.connected) {
            (Some(socket), true) => socket,
            _ => return Err(Error::NotConnected),
        };

        match socket.send(payload, zmq::DONTWAIT) {
            Ok(()) => Ok(SendStatus::Accepted),
            Err(zmq::Error::EAGAIN) => Ok(SendStatus::WouldBlock),
            Err(e @ (zmq::Error::ETERM | zmq::Error::ENOTSOCK)) => {
                Err(Error::TransportClosed(e.to_string()))
            }
            Err(e) => Err(Error::Transport(e.to_string())),
        }
    }

    fn close(&mut self) -> Result<()> {
        // Socket first: the context blocks on term until its sockets are gone
        if let Some(socket) = self.socket.take() {
            drop(socket);
            log::debug!("PUSH socket closed");
        }
        self.connected = false;

        // Dropping the last handle terminates the context exactly once
        if let Some(context) = self.context.take() {
            drop(context);
            log::debug!("ZeroMQ context terminated");
        }
        Ok(())
    }
}

impl Drop for ZmqPushTransport {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("ZeroMQ cleanup failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_before_connect() {
        let mut transport = ZmqPushTransport::new(&TransportConfig::default()).unwrap();
        assert!(matches!(
            transport.try_send(&[0u8; 4]),
            Err(Error::NotConnected)
        ));
        transport.close().unwrap();
        transport.close().unwrap();
    }

    #[test]
    fn test_invalid_endpoint_fails_connect() {
        let mut transport = ZmqPushTransport::new(&TransportConfig::default()).unwrap();
        assert!(matches!(
            transport.connect("bogus://endpoint"),
            Err(Error::Connect { .. })
        ));
    }

    #[test]
    fn test_inproc_delivery() {
        let mut transport = ZmqPushTransport::new(&TransportConfig::default()).unwrap();
        // inproc endpoints are scoped to a context, so bind on the transport's own
        let pull = transport
            .context
            .as_ref()
            .unwrap()
            .socket(zmq::PULL)
            .unwrap();
        pull.bind("inproc://tarang-test").unwrap();

        transport.connect("inproc://tarang-test").unwrap();
        assert_eq!(transport.try_send(&[7u8; 64]).unwrap(), SendStatus::Accepted);

        let msg = pull.recv_bytes(0).unwrap();
        assert_eq!(msg, vec![7u8; 64]);
        drop(pull);
        transport.close().unwrap();
    }

    #[test]
    fn test_close_releases_context_once() {
        let mut transport = ZmqPushTransport::new(&TransportConfig::default()).unwrap();
        transport.connect("tcp://127.0.0.1:5599").unwrap();
        // No peer listening: the message is queued or refused, never an error
        assert!(transport.try_send(&[1u8; 16]).is_ok());

        // Linger bounds how long the queued message can hold up close
        transport.close().unwrap();
        assert!(transport.context.is_none());
        assert!(transport.socket.is_none());
        assert!(matches!(transport.try_send(&[0u8; 4]), Err(Error::NotConnected)));

        // Second close and the drop that follows must not touch the context again
        transport.close().unwrap();
        drop(transport);
    }
}
