//! Synthetic packets from the signal model

use super::{PacketSource, SourcePoll};
use crate::error::Result;
use crate::signal::{Mode, SignalModel};
use crate::wire;

/// Generates and encodes one matrix per tick
pub struct SyntheticSource {
    model: SignalModel,
}

impl SyntheticSource {
    pub fn new(mode: Mode, seed: u64) -> Self {
        Self {
            model: SignalModel::new(mode, seed),
        }
    }

    pub fn mode(&self) -> Mode {
        self.model.mode()
    }
}

impl PacketSource for SyntheticSource {
    fn next_packet(&mut self, time: f64, sequence: u64) -> Result<SourcePoll> {
        let matrix = self.model.generate(time, sequence);
        Ok(SourcePoll::Ready(wire::encode(&matrix)?))
    }

    fn describe(&self) -> String {
        format!("synthetic ({} mode)", self.model.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PACKET_BYTE_SIZE;

    #[test]
    fn test_always_ready() {
        let mut source = SyntheticSource::new(Mode::Noisy, 3);
        for seq in 0..5 {
            match source.next_packet(seq as f64 * 0.001, seq).unwrap() {
                SourcePoll::Ready(packet) => assert_eq!(packet.len(), PACKET_BYTE_SIZE),
                other => panic!("expected a packet, got {:?}", other),
            }
        }
        assert_eq!(source.describe(), "synthetic (noisy mode)");
    }
}
