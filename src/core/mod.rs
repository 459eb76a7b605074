//! Core types shared by the signal model, the wire encoder and the sender

pub mod types;

pub use types::{
    Packet, SampleMatrix, CHANNEL_COUNT, PACKET_BYTE_SIZE, SAMPLES_PER_PACKET, SAMPLE_RATE_HZ,
    SAMPLE_WIDTH,
};
