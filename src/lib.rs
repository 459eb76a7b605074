//! Tarang - synthetic multichannel sensor traffic emitter
//!
//! Reproduces the wire format and pacing of a 128-channel acquisition
//! front-end so downstream consumers can be exercised without hardware.
//!
//! ## Pipeline
//!
//! ```text
//! SignalModel ──▶ wire::encode ──▶ Sender ──try_send──▶ Transport (ZeroMQ PUSH / UDP)
//!  (or ReplaySource of captured .bin files)
//! ```
//!
//! ## Features
//!
//! - `zmq` (default): ZeroMQ PUSH transport for `tcp://`, `ipc://` and `inproc://`

pub mod config;
pub mod core;
pub mod error;
pub mod sender;
pub mod signal;
pub mod source;
pub mod transport;
pub mod wire;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use sender::{LoopState, Sender, SenderSettings, SenderState, TickOutcome};
pub use signal::{Mode, SignalModel};
