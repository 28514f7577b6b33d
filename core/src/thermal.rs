//! Fan hysteresis
//!
//! A two-state machine over CPU temperature samples. The fan message is
//! sent only when a threshold is crossed, not on every sample.

use crate::protocol::Outbound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanState {
    #[default]
    Cool,
    Hot,
}

#[derive(Debug, Clone)]
pub struct FanController {
    state: FanState,
    on_celsius: f32,
    off_celsius: f32,
}

impl FanController {
    /// `off_celsius` must be below `on_celsius`; configuration validation
    /// enforces this.
    pub fn new(on_celsius: f32, off_celsius: f32) -> Self {
        Self {
            state: FanState::Cool,
            on_celsius,
            off_celsius,
        }
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    /// Feed one temperature sample. Returns the message to send if the
    /// state changed.
    pub fn observe(&mut self, celsius: f32) -> Option<Outbound> {
        match self.state {
            FanState::Cool if celsius > self.on_celsius => {
                tracing::info!(celsius, "Turning the fan on");
                self.state = FanState::Hot;
                Some(Outbound::FanOn)
            }
            FanState::Hot if celsius < self.off_celsius => {
                tracing::info!(celsius, "Turning the fan off");
                self.state = FanState::Cool;
                Some(Outbound::FanOff)
            }
            _ => None,
        }
    }
}
