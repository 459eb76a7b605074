//! Signal model for the synthetic acquisition front-end
//!
//! Fills one [`SampleMatrix`] per tick. Every channel carries a sinusoid whose
//! frequency, amplitude and phase depend on the channel index and the selected
//! [`Mode`]; some modes add uniform noise or occasional saturation spikes.
//!
//! | Mode | Frequency (Hz) | Amplitude | Extra |
//! |------|----------------|-----------|-------|
//! | normal | 100 + 0.5k | 1.0 + 0.01k | U(-0.1, 0.1) |
//! | noisy | 200 + 1.0k | 0.8 + 0.02k | U(-0.5, 0.5) |
//! | extreme | 150 + 0.8k | 1.2 + 0.015k | 1% of samples forced to ±10.0 |
//! | step | 120 + 0.6k | 0.5 / 1.0 / 1.5 / 2.0 every 100 sends | none |
//! | sine | 80 | 1.0, phase k·2π/128 | none |
//!
//! Sample `s` of a tick starting at `time` is evaluated at `time + s / FS`.
//! All arithmetic is f64; values are stored as f32.

mod noise;

pub use noise::NoiseGenerator;

use crate::core::{SampleMatrix, CHANNEL_COUNT, SAMPLES_PER_PACKET, SAMPLE_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Half-width of the uniform noise added in normal mode
pub const NORMAL_NOISE: f64 = 0.1;

/// Half-width of the uniform noise added in noisy mode
pub const NOISY_NOISE: f64 = 0.5;

/// Per-sample probability of a saturation spike in extreme mode
pub const SPIKE_PROBABILITY: f64 = 0.01;

/// Magnitude of an extreme-mode spike
pub const SPIKE_VALUE: f32 = 10.0;

/// Sends per amplitude level in step mode
pub const STEP_PERIOD: u64 = 100;

/// Amplitude levels cycled by step mode
pub const STEP_AMPLITUDES: [f64; 4] = [0.5, 1.0, 1.5, 2.0];

/// Carrier frequency shared by all channels in sine mode
pub const SINE_FREQUENCY_HZ: f64 = 80.0;

/// Waveform regime, fixed for a run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Smooth per-channel tones with light noise
    #[default]
    Normal,
    /// Higher tones with heavy noise
    Noisy,
    /// Clean tones with occasional ±10.0 spikes
    Extreme,
    /// Amplitude steps every 100 sends
    Step,
    /// One 80 Hz sine, phase spread evenly across channels
    #[serde(rename = "sine")]
    #[value(name = "sine")]
    SineWave,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Normal,
        Mode::Noisy,
        Mode::Extreme,
        Mode::Step,
        Mode::SineWave,
    ];

    /// Name used on the command line and in config files
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Noisy => "noisy",
            Mode::Extreme => "extreme",
            Mode::Step => "step",
            Mode::SineWave => "sine",
        }
    }

    /// Clean sinusoid parameters for `channel`
    ///
    /// `sequence` only matters in step mode, where it selects the amplitude level.
    pub fn tone(self, channel: usize, sequence: u64) -> Tone {
        let k = channel as f64;
        match self {
            Mode::Normal => Tone::new(100.0 + 0.5 * k, 1.0 + 0.01 * k),
            Mode::Noisy => Tone::new(200.0 + k, 0.8 + 0.02 * k),
            Mode::Extreme => Tone::new(150.0 + 0.8 * k, 1.2 + 0.015 * k),
            Mode::Step => Tone::new(120.0 + 0.6 * k, step_amplitude(sequence)),
            Mode::SineWave => Tone {
                frequency_hz: SINE_FREQUENCY_HZ,
                amplitude: 1.0,
                phase: k * (TAU / CHANNEL_COUNT as f64),
            },
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown mode '{s}' (expected normal, noisy, extreme, step or sine)")
            })
    }
}

/// Amplitude level for step mode at a given send count
pub fn step_amplitude(sequence: u64) -> f64 {
    STEP_AMPLITUDES[((sequence / STEP_PERIOD) % STEP_AMPLITUDES.len() as u64) as usize]
}

/// Time of sample `sample` within a tick starting at `time` (seconds)
#[inline]
pub fn sample_time(time: f64, sample: usize) -> f64 {
    time + sample as f64 / SAMPLE_RATE_HZ as f64
}

/// Sinusoid parameters for one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f64,
    pub amplitude: f64,
    /// Phase offset (radians)
    pub phase: f64,
}

impl Tone {
    fn new(frequency_hz: f64, amplitude: f64) -> Self {
        Self {
            frequency_hz,
            amplitude,
            phase: 0.0,
        }
    }

    /// Noise-free value at `t` seconds
    #[inline]
    pub fn value_at(&self, t: f64) -> f64 {
        self.amplitude * (TAU * self.frequency_hz * t + self.phase).sin()
    }
}

/// Per-tick matrix generator
#[derive(Clone)]
pub struct SignalModel {
    mode: Mode,
    noise: NoiseGenerator,
}

impl SignalModel {
    /// Create a model for `mode`; a `seed` of 0 draws noise from OS entropy
    pub fn new(mode: Mode, seed: u64) -> Self {
        Self {
            mode,
            noise: NoiseGenerator::new(seed),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Generate the matrix for a tick starting at `time` seconds
    ///
    /// `sequence` is the number of send attempts made so far.
    pub fn generate(&mut self, time: f64, sequence: u64) -> SampleMatrix {
        let mut matrix = SampleMatrix::zeroed();
        let mode = self.mode;
        let noise = &mut self.noise;

        match mode {
            Mode::Normal => fill(&mut matrix, mode, time, sequence, |clean| {
                clean + noise.symmetric(NORMAL_NOISE)
            }),
            Mode::Noisy => fill(&mut matrix, mode, time, sequence, |clean| {
                clean + noise.symmetric(NOISY_NOISE)
            }),
            Mode::Extreme => fill(&mut matrix, mode, time, sequence, |clean| {
                if noise.chance(SPIKE_PROBABILITY) {
                    if noise.coin() {
                        SPIKE_VALUE as f64
                    } else {
                        -SPIKE_VALUE as f64
                    }
                } else {
                    clean
                }
            }),
            Mode::Step | Mode::SineWave => fill(&mut matrix, mode, time, sequence, |clean| clean),
        }

        matrix
    }
}

/// Evaluate every (channel, sample) cell, passing the clean tone value through `shape`
fn fill(
    matrix: &mut SampleMatrix,
    mode: Mode,
    time: f64,
    sequence: u64,
    mut shape: impl FnMut(f64) -> f64,
) {
    for channel in 0..CHANNEL_COUNT {
        let tone = mode.tone(channel, sequence);
        for sample in 0..SAMPLES_PER_PACKET {
            let clean = tone.value_at(sample_time(time, sample));
            matrix.set(channel, sample, shape(clean) as f32);
        }
    }
}
