//! Configuration for the Tarang emitter
//!
//! Loaded from an optional TOML file; every field has a default, so an empty
//! file (or no file at all) yields the stock sender behaviour. Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! [sender]
//! address = "tcp://127.0.0.1:5555"
//! mode = "sine"
//! interval = 0.001      # seconds; omit for the hardware rate
//! count = 10000         # stop after this many send attempts; omit to run until Ctrl-C
//! seed = 42             # 0 = fresh entropy each run
//!
//! [transport]
//! send_hwm = 1000
//! linger_ms = 100
//!
//! [replay]
//! folder = "captures/"  # replay .bin files instead of synthesising
//! loop_data = true
//!
//! [logging]
//! level = "info"
//! ```

use crate::core::{SAMPLES_PER_PACKET, SAMPLE_RATE_HZ};
use crate::error::{Error, Result};
use crate::signal::Mode;
use crate::transport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default destination endpoint
pub const DEFAULT_ADDRESS: &str = "tcp://127.0.0.1:5555";

/// Packet period of the hardware sender
///
/// Whole nanoseconds per packet at `FS / S` packets per second, with the
/// packet rate truncated to an integer (22500 / 8 → 2812 Hz → 355 618 ns).
pub fn hardware_interval() -> Duration {
    let packets_per_sec = u64::from(SAMPLE_RATE_HZ) / SAMPLES_PER_PACKET as u64;
    Duration::from_nanos(1_000_000_000 / packets_per_sec)
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub sender: SenderConfig,
    pub transport: TransportConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

/// Send loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Destination endpoint (`tcp://`, `ipc://`, `inproc://` or `udp://`)
    pub address: String,
    /// Waveform regime
    pub mode: Mode,
    /// Packet interval override in seconds
    ///
    /// Replaces the hardware period verbatim; also the time step of the signal.
    pub interval: Option<f64>,
    /// Stop after this many send attempts
    pub count: Option<u64>,
    /// Noise seed (0 = entropy)
    pub seed: u64,
    /// Log a progress line every N accepted packets (0 = never)
    pub report_every: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            mode: Mode::default(),
            interval: None,
            count: None,
            seed: 0,
            report_every: 1000,
        }
    }
}

impl SenderConfig {
    /// Signal time step per accepted packet, in seconds
    pub fn interval_secs(&self) -> f64 {
        self.interval
            .unwrap_or_else(|| hardware_interval().as_secs_f64())
    }

    /// Wall-clock sleep between ticks
    pub fn interval(&self) -> Result<Duration> {
        match self.interval {
            None => Ok(hardware_interval()),
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|e| {
                Error::Config(format!("invalid interval {}: {}", secs, e))
            }),
        }
    }
}

/// ZeroMQ socket options
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Outbound queue limit (messages) before sends report WouldBlock
    pub send_hwm: i32,
    /// How long unsent messages may delay shutdown (ms, -1 = forever)
    pub linger_ms: i32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            send_hwm: 1000,
            linger_ms: 100,
        }
    }
}

/// Capture replay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Folder of `.bin` captures; synthetic generation when unset
    pub folder: Option<PathBuf>,
    /// Start over after the last file
    pub loop_data: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use tarang::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("tarang.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the sender cannot run with
    pub fn validate(&self) -> Result<()> {
        transport::validate_address(&self.sender.address)?;
        self.sender.interval()?;
        if self.transport.send_hwm < 0 {
            return Err(Error::Config(format!(
                "send_hwm must be >= 0, got {}",
                self.transport.send_hwm
            )));
        }
        if matches!(self.sender.count, Some(0)) {
            return Err(Error::Config("count must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sender.address, "tcp://127.0.0.1:5555");
        assert_eq!(config.sender.mode, Mode::Normal);
        assert!(config.sender.interval.is_none());
        assert!(config.sender.count.is_none());
        assert_eq!(config.transport.send_hwm, 1000);
        assert!(config.replay.folder.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_hardware_interval() {
        assert_eq!(hardware_interval(), Duration::from_nanos(355_618));
        let secs = SenderConfig::default().interval_secs();
        assert!((secs - 8.0 / 22_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_interval_override_is_verbatim() {
        let sender = SenderConfig {
            interval: Some(0.0125),
            ..SenderConfig::default()
        };
        assert_eq!(sender.interval_secs(), 0.0125);
        assert_eq!(sender.interval().unwrap(), Duration::from_secs_f64(0.0125));

        let zero = SenderConfig {
            interval: Some(0.0),
            ..SenderConfig::default()
        };
        assert_eq!(zero.interval().unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let mut config = AppConfig::default();
            config.sender.address = "udp://127.0.0.1:5555".to_string();
            config.sender.interval = Some(bad);
            assert!(matches!(config.validate(), Err(Error::Config(_))), "{}", bad);
        }
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[sender]
address = "udp://10.0.0.2:6000"
mode = "sine"
interval = 0.001
seed = 7

[replay]
folder = "captures"
loop_data = true

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sender.address, "udp://10.0.0.2:6000");
        assert_eq!(config.sender.mode, Mode::SineWave);
        assert_eq!(config.sender.interval, Some(0.001));
        assert_eq!(config.sender.seed, 7);
        assert_eq!(config.sender.report_every, 1000);
        assert_eq!(config.transport.linger_ms, 100);
        assert_eq!(config.replay.folder, Some(PathBuf::from("captures")));
        assert!(config.replay.loop_data);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: std::result::Result<AppConfig, _> = toml::from_str("[sender]\nmode = \"square\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = AppConfig::default();
        config.sender.mode = Mode::Step;
        let toml_string = config.to_toml().unwrap();

        assert!(toml_string.contains("[sender]"));
        assert!(toml_string.contains("[transport]"));
        assert!(toml_string.contains("mode = \"step\""));

        let parsed: AppConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.sender.mode, Mode::Step);
    }

    #[test]
    fn test_zero_count_rejected() {
        let mut config = AppConfig::default();
        config.sender.address = "udp://127.0.0.1:5555".to_string();
        config.sender.count = Some(0);
        assert!(config.validate().is_err());
    }
}
