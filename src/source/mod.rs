//! Packet sources feeding the send loop
//!
//! - [`SyntheticSource`]: signal model + wire encoder, one fresh packet per tick
//! - [`ReplaySource`]: packets read back from `.bin` capture files

mod replay;
mod synthetic;

pub use replay::{ReplaySource, REPLAY_QUEUE_CAPACITY};
pub use synthetic::SyntheticSource;

use crate::core::Packet;
use crate::error::Result;

/// Result of asking a source for the next packet
#[derive(Debug)]
pub enum SourcePoll {
    /// Packet ready to send
    Ready(Packet),
    /// Nothing available yet; ask again next iteration
    Pending,
    /// Source will never produce another packet
    Exhausted,
}

/// Producer of wire packets
pub trait PacketSource {
    /// Next packet for a tick starting at `time` seconds after `sequence` send attempts
    fn next_packet(&mut self, time: f64, sequence: u64) -> Result<SourcePoll>;

    /// Short label for startup logging
    fn describe(&self) -> String;
}
