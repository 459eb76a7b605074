//! Scriptable transport for testing the send loop without a network

use super::{SendStatus, Transport};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Scripted reply to one `try_send`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Accept,
    WouldBlock,
    /// Transient transport error
    Fail(String),
    /// Permanent closure
    Closed(String),
}

/// Mock transport for unit testing
///
/// Clones share state, so a test can keep one handle for inspection while the
/// sender owns another. Unscripted sends are accepted.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    script: VecDeque<MockResponse>,
    sent: Vec<Vec<u8>>,
    attempts: usize,
    connected_to: Option<String>,
    connect_error: Option<String>,
    close_calls: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `connect` fail with `reason`
    pub fn fail_connect(&self, reason: &str) {
        self.inner.lock().connect_error = Some(reason.to_string());
    }

    /// Queue replies for upcoming sends
    pub fn script<I: IntoIterator<Item = MockResponse>>(&self, responses: I) {
        self.inner.lock().script.extend(responses);
    }

    /// Payloads that were accepted, in order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.lock().sent.clone()
    }

    /// Number of `try_send` calls, whatever their outcome
    pub fn attempts(&self) -> usize {
        self.inner.lock().attempts
    }

    pub fn connected_to(&self) -> Option<String> {
        self.inner.lock().connected_to.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.inner.lock().close_calls
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected_to.is_some()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, address: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(reason) = inner.connect_error.take() {
            return Err(Error::Connect {
                address: address.to_string(),
                reason,
            });
        }
        inner.connected_to = Some(address.to_string());
        Ok(())
    }

    fn try_send(&mut self, payload: &[u8]) -> Result<SendStatus> {
        let mut inner = self.inner.lock();
        if inner.connected_to.is_none() {
            return Err(Error::NotConnected);
        }
        inner.attempts += 1;

        match inner.script.pop_front().unwrap_or(MockResponse::Accept) {
            MockResponse::Accept => {
                inner.sent.push(payload.to_vec());
                Ok(SendStatus::Accepted)
            }
            MockResponse::WouldBlock => Ok(SendStatus::WouldBlock),
            MockResponse::Fail(reason) => Err(Error::Transport(reason)),
            MockResponse::Closed(reason) => Err(Error::TransportClosed(reason)),
        }
    }

    fn close(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.close_calls += 1;
        inner.connected_to = None;
        Ok(())
    }
}
