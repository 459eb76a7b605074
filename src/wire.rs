//! Packet wire format
//!
//! # Layout
//!
//! Every message is a bare 4096-byte buffer, no header or length prefix,
//! matching the hardware sender's in-memory sample block:
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────┬─────┬────────────────────────────┐
//! │ Channel 0: samples 0..7  │ Channel 1: samples 0..7  │ ... │ Channel 127: samples 0..7  │
//! │ 8 × f32 LE (32 bytes)    │ 8 × f32 LE (32 bytes)    │     │ 8 × f32 LE (32 bytes)      │
//! └──────────────────────────┴──────────────────────────┴─────┴────────────────────────────┘
//! ```
//!
//! - **Byte order**: little-endian IEEE-754 single precision
//! - **Offset of (channel k, sample s)**: `(k * 8 + s) * 4`
//! - **Size**: always exactly [`PACKET_BYTE_SIZE`]; anything else is a defect

use crate::core::{
    Packet, SampleMatrix, CHANNEL_COUNT, PACKET_BYTE_SIZE, SAMPLES_PER_PACKET, SAMPLE_WIDTH,
};
use crate::error::{Error, Result};

/// Byte offset of one sample inside a packet
#[inline]
pub const fn sample_offset(channel: usize, sample: usize) -> usize {
    (channel * SAMPLES_PER_PACKET + sample) * SAMPLE_WIDTH
}

/// Encode a matrix into its wire packet
///
/// Fails with [`Error::PacketSize`] only if the packet geometry constants are
/// inconsistent; callers treat that as fatal.
pub fn encode(matrix: &SampleMatrix) -> Result<Packet> {
    let mut buffer = Vec::with_capacity(PACKET_BYTE_SIZE);
    for value in matrix.values() {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
    Packet::from_vec(buffer)
}

/// Decode a wire packet back into a matrix
///
/// Used to verify encoded output; the emitter itself never receives.
pub fn decode(bytes: &[u8]) -> Result<SampleMatrix> {
    if bytes.len() != PACKET_BYTE_SIZE {
        return Err(Error::PacketSize {
            expected: PACKET_BYTE_SIZE,
            actual: bytes.len(),
        });
    }

    let mut matrix = SampleMatrix::zeroed();
    for channel in 0..CHANNEL_COUNT {
        for sample in 0..SAMPLES_PER_PACKET {
            let offset = sample_offset(channel, sample);
            let mut raw = [0u8; SAMPLE_WIDTH];
            raw.copy_from_slice(&bytes[offset..offset + SAMPLE_WIDTH]);
            matrix.set(channel, sample, f32::from_le_bytes(raw));
        }
    }
    Ok(matrix)
}
