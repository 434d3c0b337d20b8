//! Mock transport implementation for testing
//!
//! This module provides a mock transport that records link configurations and
//! transmitted requests and replays queued responses, so the scan and monitoring
//! paths can be exercised without hardware.

use super::{LinkSettings, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    configurations: Vec<LinkSettings>,
    transmissions: Vec<Vec<u8>>,
    responses: VecDeque<Vec<u8>>,
    next_error: Option<TransportError>,
}

/// Mock transport. Clones share state, so a test can keep a handle after moving
/// one into a gateway.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the bytes returned by the next response collection
    pub fn queue_response(&self, response: &[u8]) {
        self.state().responses.push_back(response.to_vec());
    }

    /// Queue an empty response (device silent)
    pub fn queue_silence(&self) {
        self.state().responses.push_back(Vec::new());
    }

    /// Fail the next transport operation with `error`
    pub fn fail_next(&self, error: TransportError) {
        self.state().next_error = Some(error);
    }

    /// Link settings applied so far, oldest first
    pub fn configurations(&self) -> Vec<LinkSettings> {
        self.state().configurations.clone()
    }

    /// Requests transmitted so far, oldest first
    pub fn transmissions(&self) -> Vec<Vec<u8>> {
        self.state().transmissions.clone()
    }

    pub fn transmit_count(&self) -> usize {
        self.state().transmissions.len()
    }

    /// Responses still queued
    pub fn pending_responses(&self) -> usize {
        self.state().responses.len()
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.configurations.clear();
        state.transmissions.clear();
        state.responses.clear();
        state.next_error = None;
    }

    fn take_error(&self) -> Result<(), TransportError> {
        match self.state().next_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn configure_link(&mut self, settings: &LinkSettings) -> Result<(), TransportError> {
        self.take_error()?;
        self.state().configurations.push(*settings);
        Ok(())
    }

    async fn transmit(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.take_error()?;
        self.state().transmissions.push(frame.to_vec());
        Ok(())
    }

    async fn collect_response(
        &mut self,
        _window: Duration,
        _frame_gap: Option<Duration>,
    ) -> Result<Vec<u8>, TransportError> {
        self.take_error()?;
        Ok(self.state().responses.pop_front().unwrap_or_default())
    }
}
