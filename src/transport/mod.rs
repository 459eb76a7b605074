//! Transport layer for packet delivery
//!
//! A transport is a send-only, connect-based channel. Sends never wait for
//! readiness: a full outbound queue is reported as [`SendStatus::WouldBlock`].
//!
//! | Scheme | Transport |
//! |--------|-----------|
//! | `tcp://`, `ipc://`, `inproc://` | [`ZmqPushTransport`] (feature `zmq`) |
//! | `udp://host:port` | [`UdpTransport`] |

use crate::config::TransportConfig;
use crate::error::{Error, Result};

mod mock;
mod udp;
#[cfg(feature = "zmq")]
mod zmq_push;

pub use mock::{MockResponse, MockTransport};
pub use udp::UdpTransport;
#[cfg(feature = "zmq")]
pub use zmq_push::ZmqPushTransport;

/// Outcome of a non-blocking send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// The transport queued the whole message
    Accepted,
    /// Outbound buffer full; the message was not queued
    WouldBlock,
}

/// Send-only packet channel
pub trait Transport: Send {
    /// Connect to the destination endpoint
    fn connect(&mut self, address: &str) -> Result<()>;

    /// Offer one message without blocking
    ///
    /// Errors of kind [`Error::TransportClosed`] mean the channel is unusable
    /// for the rest of the run; any other error is transient.
    fn try_send(&mut self, payload: &[u8]) -> Result<SendStatus>;

    /// Release the send endpoint, then any owning context
    ///
    /// Must be idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Address schemes handled by the ZeroMQ transport
const ZMQ_SCHEMES: [&str; 3] = ["tcp://", "ipc://", "inproc://"];

/// Address scheme handled by the UDP transport
pub const UDP_SCHEME: &str = "udp://";

/// Check that an address names a scheme this build can send to
pub fn validate_address(address: &str) -> Result<()> {
    if address.starts_with(UDP_SCHEME) {
        return Ok(());
    }
    if ZMQ_SCHEMES.iter().any(|s| address.starts_with(s)) {
        if cfg!(feature = "zmq") {
            return Ok(());
        }
        return Err(Error::Config(format!(
            "'{}' needs the ZeroMQ transport, which this build does not include (feature `zmq`)",
            address
        )));
    }
    Err(Error::Config(format!(
        "unsupported address '{}' (expected tcp://, ipc://, inproc:// or udp://)",
        address
    )))
}

/// Create an unconnected transport for `address`
pub fn create_transport(address: &str, config: &TransportConfig) -> Result<Box<dyn Transport>> {
    validate_address(address)?;

    if address.starts_with(UDP_SCHEME) {
        return Ok(Box::new(UdpTransport::new()));
    }

    create_zmq_transport(address, config)
}

#[cfg(feature = "zmq")]
fn create_zmq_transport(_address: &str, config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Ok(Box::new(ZmqPushTransport::new(config)?))
}

#[cfg(not(feature = "zmq"))]
fn create_zmq_transport(address: &str, _config: &TransportConfig) -> Result<Box<dyn Transport>> {
    Err(Error::Config(format!("no transport for '{}'", address)))
}
