//! Shared test fixtures for the communication crate.

#![allow(dead_code)]

use rigkit_communication::{ReadableSink, Teardown, Transport};
use rigkit_core::{ConnectionConfig, ConnectionError, EventDispatcher, EventFilter, LinkEvent};
use std::sync::{Arc, Mutex};

/// What the mock transport has seen, shared with the test body
#[derive(Default)]
pub struct MockState {
    pub open_calls: usize,
    pub close_calls: usize,
    pub is_open: bool,
    pub fail_open: Option<String>,
    /// Reject writes once this many have succeeded
    pub fail_after: Option<usize>,
    pub written: Vec<Vec<u8>>,
    pub sink: Option<Arc<dyn ReadableSink>>,
    pub last_config: Option<ConnectionConfig>,
}

/// In-memory transport recording opens and writes
#[derive(Clone, Default)]
pub struct MockTransport {
    pub state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following open fail with `reason`
    pub fn failing(reason: &str) -> Self {
        let mock = Self::new();
        mock.state.lock().unwrap().fail_open = Some(reason.to_string());
        mock
    }

    pub fn open_calls(&self) -> usize {
        self.state.lock().unwrap().open_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    /// Every write so far, decoded as text
    pub fn written_text(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .written
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Deliver a chunk as if the port had bytes available
    pub fn inject(&self, chunk: &[u8]) {
        let sink = self.state.lock().unwrap().sink.clone();
        sink.expect("transport not open").on_readable(chunk);
    }

    /// Report a driver fault
    pub fn fault(&self, reason: &str) {
        let sink = self.state.lock().unwrap().sink.clone();
        sink.expect("transport not open").on_fault(reason);
    }
}

impl Transport for MockTransport {
    fn open(
        &mut self,
        config: &ConnectionConfig,
        sink: Arc<dyn ReadableSink>,
    ) -> Result<(), ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.open_calls += 1;
        if let Some(reason) = state.fail_open.clone() {
            return Err(ConnectionError::FailedToOpen {
                port: config.port_name.clone(),
                reason,
            });
        }
        state.is_open = true;
        state.sink = Some(sink);
        state.last_config = Some(config.clone());
        Ok(())
    }

    fn detach(&mut self) -> Teardown {
        let mut state = self.state.lock().unwrap();
        if state.is_open {
            state.close_calls += 1;
        }
        state.is_open = false;
        state.sink = None;
        Teardown::none()
    }

    fn is_open(&self) -> bool {
        self.state.lock().unwrap().is_open
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        if !state.is_open {
            return Err(ConnectionError::NotConnected);
        }
        if state.fail_after.is_some_and(|limit| state.written.len() >= limit) {
            return Err(ConnectionError::WriteFailed {
                reason: "Broken pipe".to_string(),
            });
        }
        state.written.push(data.to_vec());
        Ok(data.len())
    }
}

/// Record every event published on `events`
pub fn record(events: &EventDispatcher) -> Arc<Mutex<Vec<LinkEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    events.subscribe(EventFilter::All, move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    log
}
