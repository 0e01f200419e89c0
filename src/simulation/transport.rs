// Motion-command transport between the loop and a (real or simulated) vehicle

use crate::common::{Point2D, VelocityCommand};

/// Outbound velocity commands and optional inbound pose reports
pub trait MotionTransport {
    /// Receive the command computed for `agent` this tick
    fn publish(&mut self, agent: usize, cmd: VelocityCommand);

    /// Externally reported position for `agent`; `None` means integrate locally
    fn reported_pose(&mut self, agent: usize) -> Option<Point2D>;
}

/// Default transport: nothing leaves the process, positions are integrated
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalIntegration;

impl MotionTransport for LocalIntegration {
    fn publish(&mut self, _agent: usize, _cmd: VelocityCommand) {}

    fn reported_pose(&mut self, _agent: usize) -> Option<Point2D> {
        None
    }
}

/// Keeps every published command per agent
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    commands: Vec<Vec<VelocityCommand>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self, agent: usize) -> &[VelocityCommand] {
        self.commands.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl MotionTransport for RecordingTransport {
    fn publish(&mut self, agent: usize, cmd: VelocityCommand) {
        if self.commands.len() <= agent {
            self.commands.resize_with(agent + 1, Vec::new);
        }
        self.commands[agent].push(cmd);
    }

    fn reported_pose(&mut self, _agent: usize) -> Option<Point2D> {
        None
    }
}
