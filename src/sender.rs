//! Transmission loop
//!
//! Drives one packet per tick from a [`PacketSource`] into a [`Transport`]:
//!
//! ```text
//! Connecting ──connect ok──▶ Running ──stop / limit / exhausted / fatal──▶ Stopping ──close──▶ Closed
//! ```
//!
//! # Tick
//!
//! 1. Ask the source for a packet at the current time counter and sequence count
//! 2. Offer it to the transport without blocking
//!    - accepted: sequence +1, time += interval
//!    - would block: sequence +1, time unchanged, packet dropped (no retry)
//!    - transient error: sequence +1, time unchanged, loop continues
//!    - permanent closure / bad packet size: fatal
//! 3. Sleep for the interval, whatever the outcome
//!
//! The stop flag is only checked between ticks, so shutdown latency is at
//! most one interval.

use crate::config::SenderConfig;
use crate::error::{Error, Result};
use crate::source::{PacketSource, SourcePoll};
use crate::transport::{SendStatus, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Lifecycle of the send loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Connecting,
    Running,
    Stopping,
    Closed,
}

/// Mutable loop state, owned by the sender for the whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopState {
    /// Signal time (seconds); advances only on accepted sends
    pub time: f64,
    /// Send attempts so far, whatever their outcome
    pub sequence: u64,
    /// Packets the transport accepted
    pub sent: u64,
    /// Packets dropped because the transport would block
    pub dropped: u64,
    /// Packets lost to transient transport errors
    pub failed: u64,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Sent { sequence: u64, bytes: usize },
    Dropped { sequence: u64 },
    Failed { sequence: u64 },
    /// Source had nothing ready; no send attempted
    Idle,
    /// Source is finished
    Exhausted,
}

/// Fixed parameters of a run
#[derive(Debug, Clone)]
pub struct SenderSettings {
    pub address: String,
    /// Wall-clock sleep after each tick
    pub interval: Duration,
    /// Signal time step per accepted packet (seconds)
    pub interval_secs: f64,
    /// Stop after this many send attempts
    pub count: Option<u64>,
    /// Progress line period in accepted packets (0 = never)
    pub report_every: u64,
}

impl SenderSettings {
    pub fn from_config(config: &SenderConfig) -> Result<Self> {
        Ok(Self {
            address: config.address.clone(),
            interval: config.interval()?,
            interval_secs: config.interval_secs(),
            count: config.count,
            report_every: config.report_every,
        })
    }
}

/// Packet sender owning the source, the transport and the loop state
pub struct Sender {
    settings: SenderSettings,
    source: Box<dyn PacketSource>,
    transport: Box<dyn Transport>,
    state: LoopState,
    phase: SenderState,
}

impl Sender {
    pub fn new(
        settings: SenderSettings,
        source: Box<dyn PacketSource>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            settings,
            source,
            transport,
            state: LoopState::default(),
            phase: SenderState::Connecting,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn phase(&self) -> SenderState {
        self.phase
    }

    /// Connect the transport (Connecting → Running)
    pub fn connect(&mut self) -> Result<()> {
        if self.phase != SenderState::Connecting {
            return Err(Error::Other(format!(
                "connect called in state {:?}",
                self.phase
            )));
        }
        self.transport.connect(&self.settings.address)?;
        self.phase = SenderState::Running;
        log::info!("Connected to {}", self.settings.address);
        Ok(())
    }

    /// Run one tick without sleeping
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.phase != SenderState::Running {
            return Err(Error::NotConnected);
        }

        let packet = match self
            .source
            .next_packet(self.state.time, self.state.sequence)?
        {
            SourcePoll::Ready(packet) => packet,
            SourcePoll::Pending => return Ok(TickOutcome::Idle),
            SourcePoll::Exhausted => return Ok(TickOutcome::Exhausted),
        };

        let result = self.transport.try_send(packet.as_bytes());
        self.state.sequence += 1;
        let sequence = self.state.sequence;

        match result {
            Ok(SendStatus::Accepted) => {
                self.state.sent += 1;
                self.state.time += self.settings.interval_secs;
                log::debug!("[SEND] Packet #{} | Size: {} bytes", sequence, packet.len());
                if self.settings.report_every > 0 && self.state.sent % self.settings.report_every == 0
                {
                    log::info!(
                        "Sent {} packets ({} dropped, {} failed, t={:.3}s)",
                        self.state.sent,
                        self.state.dropped,
                        self.state.failed,
                        self.state.time
                    );
                }
                Ok(TickOutcome::Sent {
                    sequence,
                    bytes: packet.len(),
                })
            }
            Ok(SendStatus::WouldBlock) => {
                self.state.dropped += 1;
                log::warn!("Send would block, skipping packet #{}", sequence);
                Ok(TickOutcome::Dropped { sequence })
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.state.failed += 1;
                log::error!("Failed to send packet #{}: {}", sequence, e);
                Ok(TickOutcome::Failed { sequence })
            }
        }
    }

    /// Tick until `running` clears, the packet limit is hit, the source runs
    /// dry, or a fatal error occurs (Running → Stopping)
    pub fn run(&mut self, running: &AtomicBool) -> Result<()> {
        if self.phase != SenderState::Running {
            return Err(Error::NotConnected);
        }

        let result = loop {
            if !running.load(Ordering::Relaxed) {
                log::info!("Stop requested");
                break Ok(());
            }
            if let Some(limit) = self.settings.count {
                if self.state.sequence >= limit {
                    log::info!("Reached packet limit ({})", limit);
                    break Ok(());
                }
            }

            match self.tick() {
                Ok(TickOutcome::Exhausted) => {
                    log::info!("Packet source exhausted");
                    break Ok(());
                }
                // The source already waited for data
                Ok(TickOutcome::Idle) => continue,
                Ok(_) => {}
                Err(e) => {
                    log::error!("Fatal error in send loop: {}", e);
                    break Err(e);
                }
            }

            if !self.settings.interval.is_zero() {
                thread::sleep(self.settings.interval);
            }
        };

        self.phase = SenderState::Stopping;
        result
    }

    /// Close the transport (→ Closed) and report totals
    ///
    /// Safe to call from any state and more than once.
    pub fn shutdown(&mut self) -> Result<LoopState> {
        if self.phase == SenderState::Closed {
            return Ok(self.state.clone());
        }
        self.phase = SenderState::Stopping;
        let closed = self.transport.close();
        self.phase = SenderState::Closed;

        log::info!("Sender finished. Total packets sent: {}", self.state.sent);
        log::info!(
            "Attempted {}, dropped {}, failed {}",
            self.state.sequence,
            self.state.dropped,
            self.state.failed
        );
        if let Err(ref e) = closed {
            log::warn!("Transport cleanup failed: {}", e);
        }
        closed.map(|()| self.state.clone())
    }

    /// [`run`](Self::run) followed by [`shutdown`](Self::shutdown), whatever the run result
    pub fn run_until_stopped(&mut self, running: &AtomicBool) -> Result<LoopState> {
        let run_result = self.run(running);
        let shutdown_result = self.shutdown();
        run_result?;
        shutdown_result
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        if self.phase != SenderState::Closed {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SenderConfig;
    use crate::signal::Mode;
    use crate::source::SyntheticSource;
    use crate::transport::{MockResponse, MockTransport};
    use std::sync::Arc;

    fn settings(interval: f64, count: Option<u64>) -> SenderSettings {
        SenderSettings::from_config(&SenderConfig {
            address: "mock://sink".to_string(),
            interval: Some(interval),
            count,
            ..SenderConfig::default()
        })
        .unwrap()
    }

    fn sender(mock: &MockTransport, interval: f64, count: Option<u64>) -> Sender {
        Sender::new(
            settings(interval, count),
            Box::new(SyntheticSource::new(Mode::SineWave, 1)),
            Box::new(mock.clone()),
        )
    }

    #[test]
    fn test_state_transitions() {
        let mock = MockTransport::new();
        let mut s = sender(&mock, 0.0, Some(3));
        assert_eq!(s.phase(), SenderState::Connecting);
        assert!(matches!(s.tick(), Err(Error::NotConnected)));

        s.connect().unwrap();
        assert_eq!(s.phase(), SenderState::Running);
        assert_eq!(mock.connected_to().as_deref(), Some("mock://sink"));

        s.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(s.phase(), SenderState::Stopping);

        let totals = s.shutdown().unwrap();
        assert_eq!(s.phase(), SenderState::Closed);
        assert_eq!(totals.sent, 3);
        assert_eq!(mock.close_calls(), 1);

        // Idempotent
        s.shutdown().unwrap();
        assert_eq!(mock.close_calls(), 1);
    }

    #[test]
    fn test_accepted_send_advances_time() {
        let mock = MockTransport::new();
        let mut s = sender(&mock, 0.5, None);
        s.connect().unwrap();

        assert_eq!(
            s.tick().unwrap(),
            TickOutcome::Sent {
                sequence: 1,
                bytes: 4096
            }
        );
        assert_eq!(s.state().time, 0.5);
        s.tick().unwrap();
        assert_eq!(s.state().time, 1.0);
        assert_eq!(s.state().sequence, 2);
        assert_eq!(s.state().sent, 2);
    }

    #[test]
    fn test_would_block_keeps_time() {
        let mock = MockTransport::new();
        mock.script(vec![MockResponse::WouldBlock; 5]);
        let mut s = sender(&mock, 0.25, None);
        s.connect().unwrap();

        for n in 1..=5u64 {
            assert_eq!(s.tick().unwrap(), TickOutcome::Dropped { sequence: n });
            assert_eq!(s.state().time, 0.0);
        }
        assert_eq!(s.state().sequence, 5);
        assert_eq!(s.state().dropped, 5);
        assert_eq!(s.state().sent, 0);

        assert!(matches!(s.tick().unwrap(), TickOutcome::Sent { sequence: 6, .. }));
        assert_eq!(s.state().time, 0.25);
    }

    #[test]
    fn test_transient_error_continues() {
        let mock = MockTransport::new();
        mock.script([MockResponse::Fail("EHOSTUNREACH".into())]);
        let mut s = sender(&mock, 0.0, Some(4));
        s.connect().unwrap();

        let totals = s.run_until_stopped(&AtomicBool::new(true)).unwrap();
        assert_eq!(totals.sequence, 4);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.sent, 3);
        assert_eq!(mock.sent().len(), 3);
    }

    #[test]
    fn test_closed_transport_is_fatal_and_still_closes() {
        let mock = MockTransport::new();
        mock.script([MockResponse::Accept, MockResponse::Closed("ETERM".into())]);
        let mut s = sender(&mock, 0.0, Some(10));
        s.connect().unwrap();

        let err = s.run_until_stopped(&AtomicBool::new(true)).unwrap_err();
        assert!(matches!(err, Error::TransportClosed(_)));
        assert_eq!(s.phase(), SenderState::Closed);
        assert_eq!(s.state().sent, 1);
        assert_eq!(s.state().sequence, 2);
        assert_eq!(mock.close_calls(), 1);
    }

    #[test]
    fn test_stop_flag_checked_before_first_tick() {
        let mock = MockTransport::new();
        let mut s = sender(&mock, 0.0, None);
        s.connect().unwrap();

        let totals = s.run_until_stopped(&AtomicBool::new(false)).unwrap();
        assert_eq!(totals, LoopState::default());
        assert_eq!(mock.attempts(), 0);
        assert_eq!(mock.close_calls(), 1);
    }

    /// Clears the run flag once `stop_after` sends have been accepted
    struct StopAfter {
        inner: MockTransport,
        running: Arc<AtomicBool>,
        stop_after: usize,
    }

    impl Transport for StopAfter {
        fn connect(&mut self, address: &str) -> Result<()> {
            self.inner.connect(address)
        }

        fn try_send(&mut self, payload: &[u8]) -> Result<SendStatus> {
            let status = self.inner.try_send(payload)?;
            if self.inner.sent().len() >= self.stop_after {
                self.running.store(false, Ordering::Relaxed);
            }
            Ok(status)
        }

        fn close(&mut self) -> Result<()> {
            self.inner.close()
        }
    }

    #[test]
    fn test_stop_flag_cleared_mid_run() {
        let mock = MockTransport::new();
        let running = Arc::new(AtomicBool::new(true));
        let transport = StopAfter {
            inner: mock.clone(),
            running: Arc::clone(&running),
            stop_after: 4,
        };
        let mut s = Sender::new(
            settings(0.0, None),
            Box::new(SyntheticSource::new(Mode::SineWave, 1)),
            Box::new(transport),
        );
        s.connect().unwrap();

        let totals = s.run_until_stopped(&running).unwrap();
        assert_eq!(totals.sent, 4);
        assert_eq!(totals.sequence, 4);
        assert_eq!(mock.attempts(), 4);
        assert_eq!(mock.sent().len(), 4);
        assert_eq!(s.phase(), SenderState::Closed);
        assert_eq!(mock.close_calls(), 1);

        drop(s);
        assert_eq!(mock.close_calls(), 1);
    }

    #[test]
    fn test_connect_failure_leaves_connecting() {
        let mock = MockTransport::new();
        mock.fail_connect("connection refused");
        let mut s = sender(&mock, 0.0, None);

        assert!(matches!(s.connect(), Err(Error::Connect { .. })));
        assert_eq!(s.phase(), SenderState::Connecting);
        assert!(s.run(&AtomicBool::new(true)).is_err());
        assert_eq!(mock.attempts(), 0);
    }

    #[test]
    fn test_drop_closes_transport() {
        let mock = MockTransport::new();
        {
            let mut s = sender(&mock, 0.0, None);
            s.connect().unwrap();
            s.tick().unwrap();
        }
        assert_eq!(mock.close_calls(), 1);
    }

    #[test]
    fn test_step_mode_follows_attempts() {
        // Drops still advance the step cadence
        let mock = MockTransport::new();
        mock.script(vec![MockResponse::WouldBlock; 100]);
        let mut s = Sender::new(
            settings(0.0, Some(101)),
            Box::new(SyntheticSource::new(Mode::Step, 1)),
            Box::new(mock.clone()),
        );
        s.connect().unwrap();
        s.run_until_stopped(&AtomicBool::new(true)).unwrap();

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        let matrix = crate::wire::decode(&sent[0]).unwrap();
        let expected = Mode::Step.tone(5, 100).value_at(crate::signal::sample_time(0.0, 3));
        assert_eq!(matrix.get(5, 3), expected as f32);
        assert_eq!(Mode::Step.tone(5, 100).amplitude, 1.0);
    }
}
