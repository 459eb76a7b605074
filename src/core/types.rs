//! Packet geometry and the data carried by one tick.
//!
//! Key types:
//! - [`SampleMatrix`]: 128 channels × 8 samples of f32, produced once per tick
//! - [`Packet`]: the validated 4096-byte wire buffer

use crate::error::{Error, Result};

/// Number of signal channels (array elements)
pub const CHANNEL_COUNT: usize = 128;

/// Samples per channel carried by one packet
pub const SAMPLES_PER_PACKET: usize = 8;

/// Bytes per sample (f32)
pub const SAMPLE_WIDTH: usize = 4;

/// Fixed wire size of one packet (128 × 8 × 4 = 4096 bytes)
pub const PACKET_BYTE_SIZE: usize = CHANNEL_COUNT * SAMPLES_PER_PACKET * SAMPLE_WIDTH;

/// Acquisition sample rate (Hz)
pub const SAMPLE_RATE_HZ: u32 = 22_500;

/// Channel × sample amplitude matrix
///
/// Row `k` holds the `SAMPLES_PER_PACKET` consecutive samples of channel `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    rows: [[f32; SAMPLES_PER_PACKET]; CHANNEL_COUNT],
}

impl SampleMatrix {
    /// All-zero matrix
    pub fn zeroed() -> Self {
        Self {
            rows: [[0.0; SAMPLES_PER_PACKET]; CHANNEL_COUNT],
        }
    }

    /// Value of channel `channel`, sample `sample`
    #[inline]
    pub fn get(&self, channel: usize, sample: usize) -> f32 {
        self.rows[channel][sample]
    }

    #[inline]
    pub fn set(&mut self, channel: usize, sample: usize, value: f32) {
        self.rows[channel][sample] = value;
    }

    /// Every value in wire order (channel-major)
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }
}

impl Default for SampleMatrix {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Immutable wire packet of exactly [`PACKET_BYTE_SIZE`] bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: Vec<u8>,
}

impl Packet {
    /// Wrap a buffer, rejecting anything that is not exactly one packet long
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != PACKET_BYTE_SIZE {
            return Err(Error::PacketSize {
                expected: PACKET_BYTE_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_geometry() {
        assert_eq!(PACKET_BYTE_SIZE, 4096);
    }

    #[test]
    fn test_packet_rejects_wrong_size() {
        let err = Packet::from_vec(vec![0u8; PACKET_BYTE_SIZE - 1]).unwrap_err();
        match err {
            Error::PacketSize { expected, actual } => {
                assert_eq!(expected, 4096);
                assert_eq!(actual, 4095);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(Packet::from_vec(vec![0u8; PACKET_BYTE_SIZE]).is_ok());
    }

    #[test]
    fn test_matrix_values_channel_major() {
        let mut m = SampleMatrix::zeroed();
        m.set(0, 1, 1.0);
        m.set(1, 0, 2.0);
        let values: Vec<f32> = m.values().collect();
        assert_eq!(values.len(), CHANNEL_COUNT * SAMPLES_PER_PACKET);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[SAMPLES_PER_PACKET], 2.0);
    }
}
