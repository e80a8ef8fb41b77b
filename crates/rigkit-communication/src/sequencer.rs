//! Ordered multi-step command sequences.
//!
//! Steps are sent one after another with no wait for a reply. The first step
//! that fails aborts the sequence; steps already sent are not rolled back.

use crate::controller::RigController;
use crate::protocol::Command;
use rigkit_core::{ConnectionError, TestParameters, DEFAULT_HOMING_AXIS};

/// Composes test-run operations on top of a [`RigController`]
#[derive(Debug)]
pub struct TestSequencer<'a> {
    controller: &'a RigController,
    homing_axis: String,
}

impl<'a> TestSequencer<'a> {
    /// Create a sequencer homing the default axis during preparation
    pub fn new(controller: &'a RigController) -> Self {
        Self {
            controller,
            homing_axis: DEFAULT_HOMING_AXIS.to_string(),
        }
    }

    /// Use `axis` for homing during preparation
    pub fn with_homing_axis(mut self, axis: impl Into<String>) -> Self {
        self.homing_axis = axis.into();
        self
    }

    /// Get the homing axis
    pub fn homing_axis(&self) -> &str {
        &self.homing_axis
    }

    /// Send `steps` in order, stopping at the first failure.
    pub fn run(&self, steps: &[Command]) -> Result<(), ConnectionError> {
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = self.controller.send(step) {
                tracing::warn!(
                    "Sequence aborted at step {}/{} ({}): {}",
                    index + 1,
                    steps.len(),
                    step.verb(),
                    e
                );
                return Err(e);
            }
        }
        tracing::debug!("Sequence of {} step(s) sent", steps.len());
        Ok(())
    }

    /// Steps that bring the rig to its starting position: carriage out of
    /// the water, then home.
    pub fn preparation_steps(&self) -> Vec<Command> {
        vec![
            Command::set_carriage(false),
            Command::home(self.homing_axis.as_str()),
        ]
    }

    /// Bring the rig to its starting position
    pub fn prepare_test_run(&self) -> Result<(), ConnectionError> {
        tracing::info!("Preparing test run (homing axis {})", self.homing_axis);
        self.run(&self.preparation_steps())
    }

    /// Start a test run
    pub fn start_test(&self, params: &TestParameters) -> Result<(), ConnectionError> {
        tracing::info!(
            "Starting test run: {} cycle(s) at {:.2} cm/s",
            params.cycles,
            params.speed_cm_s
        );
        self.run(&[Command::test_start(params)])
    }

    /// Pause the test run
    pub fn pause_test(&self) -> Result<(), ConnectionError> {
        tracing::info!("Pausing test run");
        self.run(&[Command::TestPause])
    }

    /// Stop the test run
    pub fn stop_test(&self) -> Result<(), ConnectionError> {
        tracing::info!("Stopping test run");
        self.run(&[Command::TestStop])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::{ReadableSink, Teardown, Transport};
    use rigkit_core::ConnectionConfig;
    use std::sync::Arc;

    struct ClosedTransport;

    impl Transport for ClosedTransport {
        fn open(
            &mut self,
            _config: &ConnectionConfig,
            _sink: Arc<dyn ReadableSink>,
        ) -> Result<(), ConnectionError> {
            Err(ConnectionError::FailedToOpen {
                port: "none".to_string(),
                reason: "closed".to_string(),
            })
        }

        fn detach(&mut self) -> Teardown {
            Teardown::none()
        }

        fn is_open(&self) -> bool {
            false
        }

        fn write(&mut self, _data: &[u8]) -> Result<usize, ConnectionError> {
            Err(ConnectionError::NotConnected)
        }
    }

    #[test]
    fn test_preparation_steps_default_axis() {
        let controller = RigController::new(ClosedTransport, ConnectionConfig::default());
        let sequencer = TestSequencer::new(&controller);
        let lines: Vec<String> = sequencer
            .preparation_steps()
            .iter()
            .map(Command::to_command_string)
            .collect();
        assert_eq!(lines, vec!["CMD SET_CARRIAGE state=0", "CMD HOME axis=Z"]);
    }

    #[test]
    fn test_preparation_steps_custom_axis() {
        let controller = RigController::new(ClosedTransport, ConnectionConfig::default());
        let sequencer = TestSequencer::new(&controller).with_homing_axis("Y");
        assert_eq!(sequencer.homing_axis(), "Y");
        assert_eq!(sequencer.preparation_steps()[1], Command::home("Y"));
    }

    #[test]
    fn test_run_fails_when_disconnected() {
        let controller = RigController::new(ClosedTransport, ConnectionConfig::default());
        let sequencer = TestSequencer::new(&controller);
        assert_eq!(
            sequencer.prepare_test_run(),
            Err(ConnectionError::NotConnected)
        );
    }

    #[test]
    fn test_empty_sequence_succeeds() {
        let controller = RigController::new(ClosedTransport, ConnectionConfig::default());
        assert_eq!(TestSequencer::new(&controller).run(&[]), Ok(()));
    }
}
