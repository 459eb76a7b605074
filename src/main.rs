//! Tarang - multichannel sensor traffic emitter
//!
//! Sends 4096-byte packets (128 channels × 8 f32 samples, little-endian,
//! channel-major) to a downstream consumer at the acquisition hardware's
//! packet rate.
//!
//! # Usage
//!
//! ```bash
//! tarang --address tcp://127.0.0.1:5555 --mode sine
//! tarang --address udp://192.168.1.20:6000 --mode extreme --interval 0.01
//! tarang --replay captures/ --loop-replay
//! tarang --config tarang.toml --print-config
//! ```
//!
//! Ctrl-C (or SIGTERM) stops the loop after the current tick, closes the
//! transport and prints the total number of packets sent.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tarang::config::AppConfig;
use tarang::core::{CHANNEL_COUNT, PACKET_BYTE_SIZE, SAMPLES_PER_PACKET};
use tarang::source::{PacketSource, ReplaySource, SyntheticSource};
use tarang::transport::create_transport;
use tarang::{Error, Mode, Result, Sender, SenderSettings};

#[derive(Parser, Debug)]
#[command(name = "tarang", version)]
#[command(about = "Multichannel sensor traffic emitter (128 ch × 8 samples, 4096-byte packets)")]
struct Args {
    /// TOML configuration file (command-line flags take precedence)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Destination endpoint: tcp://, ipc://, inproc:// (ZeroMQ PUSH) or udp://
    #[arg(short, long)]
    address: Option<String>,

    /// Data generation mode
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Send interval in seconds (default: hardware rate, 8 samples at 22.5 kHz)
    #[arg(short, long)]
    interval: Option<f64>,

    /// Stop after this many send attempts
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Noise seed (0 = random each run)
    #[arg(long)]
    seed: Option<u64>,

    /// Replay .bin captures from this folder instead of synthesising
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Start the replay over after the last file
    #[arg(long, requires = "replay")]
    loop_replay: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// File (or defaults) overridden by whatever flags were given
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(address) = &self.address {
            config.sender.address = address.clone();
        }
        if let Some(mode) = self.mode {
            config.sender.mode = mode;
        }
        if let Some(interval) = self.interval {
            config.sender.interval = Some(interval);
        }
        if let Some(count) = self.count {
            config.sender.count = Some(count);
        }
        if let Some(seed) = self.seed {
            config.sender.seed = seed;
        }
        if let Some(folder) = &self.replay {
            config.replay.folder = Some(folder.clone());
        }
        if self.loop_replay {
            config.replay.loop_data = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

fn main() {
    let args = Args::parse();

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Initialize logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if args.print_config {
        match config.to_toml() {
            Ok(toml) => print!("{}", toml),
            Err(e) => {
                log::error!("{}", e);
                process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(config) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(config: AppConfig) -> Result<()> {
    log::info!("Tarang v{} starting...", env!("CARGO_PKG_VERSION"));
    config.validate()?;

    let settings = SenderSettings::from_config(&config.sender)?;
    let source: Box<dyn PacketSource> = match &config.replay.folder {
        Some(folder) => Box::new(ReplaySource::spawn(folder, config.replay.loop_data)?),
        None => Box::new(SyntheticSource::new(config.sender.mode, config.sender.seed)),
    };
    let transport = create_transport(&settings.address, &config.transport)?;

    log::info!("Target address: {}", settings.address);
    log::info!("Data source: {}", source.describe());
    log::info!("Send interval: {:.6} seconds", settings.interval_secs);
    log::info!(
        "Packet size: {} bytes ({} channels × {} samples)",
        PACKET_BYTE_SIZE,
        CHANNEL_COUNT,
        SAMPLES_PER_PACKET
    );
    if let Some(count) = settings.count {
        log::info!("Packet limit: {}", count);
    }

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut sender = Sender::new(settings, source, transport);
    if let Err(e) = sender.connect() {
        // Nothing was sent; release the unconnected channel before exiting
        let _ = sender.shutdown();
        return Err(e);
    }

    log::info!("Tarang running. Press Ctrl-C to stop.");
    sender.run_until_stopped(&running)?;

    log::info!("Tarang stopped");
    Ok(())
}
