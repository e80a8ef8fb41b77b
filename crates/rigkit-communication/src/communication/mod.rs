//! Byte transports for the controller link
//!
//! A [`Transport`] owns the physical channel. It reports incoming bytes by
//! calling a [`ReadableSink`] as data arrives rather than being polled.

pub mod serial;

use rigkit_core::{ConnectionConfig, ConnectionError};
use std::sync::Arc;

/// Receiver of readiness notifications from a transport.
///
/// `on_readable` is called once per notification with every byte that was
/// available at that moment. Calls for one transport never overlap.
pub trait ReadableSink: Send + Sync {
    /// Bytes were received
    fn on_readable(&self, chunk: &[u8]);

    /// The driver reported a fault while the channel was open
    fn on_fault(&self, reason: &str);
}

/// Blocking cleanup left over after [`Transport::detach`].
///
/// Run it after releasing any lock the transport sits behind: it may wait
/// for a reader thread that is itself waiting on that lock.
#[must_use = "the detached channel is not released until `finish` runs"]
pub struct Teardown(Option<Box<dyn FnOnce() + Send>>);

impl Teardown {
    /// Nothing left to do
    pub fn none() -> Self {
        Self(None)
    }

    /// Run `cleanup` when finished
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(cleanup)))
    }

    /// Run the cleanup
    pub fn finish(self) {
        if let Some(cleanup) = self.0 {
            cleanup();
        }
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Teardown").field(&self.0.is_some()).finish()
    }
}

/// Physical byte channel to the controller
pub trait Transport: Send {
    /// Open the channel with the given settings.
    ///
    /// Succeeds without side effects if the channel is already open. On
    /// failure the error carries the driver's diagnostic string.
    fn open(
        &mut self,
        config: &ConnectionConfig,
        sink: Arc<dyn ReadableSink>,
    ) -> Result<(), ConnectionError>;

    /// Mark the channel closed and stop its I/O without blocking.
    ///
    /// After this returns `is_open` is false and writes fail. Returns the
    /// cleanup still pending, such as joining a reader thread. No-op if
    /// already closed.
    fn detach(&mut self) -> Teardown;

    /// Release the channel and wait for its cleanup. No-op if already closed.
    fn close(&mut self) {
        self.detach().finish();
    }

    /// Check if the channel is open
    fn is_open(&self) -> bool;

    /// Write bytes without queuing or retrying.
    ///
    /// Fails with [`ConnectionError::NotConnected`] if the channel is closed.
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError>;
}
