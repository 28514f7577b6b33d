//! Single-consumer control loop
//!
//! Serial lines, button presses, temperature samples and the OS shutdown
//! signal all arrive as [`Event`]s on one channel. The [`Controller`] is the
//! only owner of the cartridge state and the only writer on the link, so a
//! button press can never observe a half-applied read.

use std::sync::mpsc::Receiver;

use crate::cartridge::CartridgeState;
use crate::dispatcher::Dispatcher;
use crate::error::{ControllerError, TransportError};
use crate::host::SystemControl;
use crate::protocol::Outbound;
use crate::sequencer::{LaunchOutcome, Sequencer, StopOutcome};
use crate::thermal::FanController;
use crate::transport::Outbox;


/// Inputs to the control loop.
#[derive(Debug)]
pub enum Event {
    /// One raw line from the link, terminator included
    Line(String),
    /// The link reader dropped a line longer than the given limit
    LineTooLong(usize),
    /// The link reader hit a fatal error and stopped
    LinkFailed(TransportError),
    /// Power switch moved to on
    LaunchPressed,
    /// Power switch moved to off
    StopPressed,
    /// CPU temperature sample in degrees Celsius
    Temperature(f32),
    /// SIGINT/SIGTERM received
    Shutdown,
}

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Controller {
    cart: CartridgeState,
    dispatcher: Dispatcher,
    sequencer: Sequencer,
    fan: Option<FanController>,
    outbox: Box<dyn Outbox>,
    system: Box<dyn SystemControl>,
}

impl Controller {
    pub fn new(
        dispatcher: Dispatcher,
        sequencer: Sequencer,
        outbox: Box<dyn Outbox>,
        system: Box<dyn SystemControl>,
    ) -> Self {
        Self {
            cart: CartridgeState::new(),
            dispatcher,
            sequencer,
            fan: None,
            outbox,
            system,
        }
    }

    /// Enable fan control from temperature events.
    pub fn with_fan(mut self, fan: FanController) -> Self {
        self.fan = Some(fan);
        self
    }

    pub fn cartridge(&self) -> &CartridgeState {
        &self.cart
    }

    /// Tell the reader we are up, so a cartridge inserted before power-on
    /// gets read again.
    pub fn announce_ready(&mut self) -> Result<(), TransportError> {
        self.outbox.send(&Outbound::Ready)
    }

    /// Process one event.
    pub fn handle(&mut self, event: Event) -> Result<Flow, ControllerError> {
        match event {
            Event::Line(line) => {
                let outcome = self.dispatcher.dispatch(
                    &line,
                    &mut self.cart,
                    self.outbox.as_mut(),
                    self.system.as_ref(),
                )?;
                tracing::debug!(?outcome, armed = self.cart.is_armed(), "Line handled");
            }
            Event::LineTooLong(limit) => {
                tracing::warn!(limit, "Oversized line from reader discarded");
                self.outbox.send(&Outbound::Bad)?;
            }
            Event::LinkFailed(e) => {
                tracing::error!("Serial link failed: {}", e);
                return Err(e.into());
            }
            Event::LaunchPressed => match self.sequencer.launch(&self.cart) {
                LaunchOutcome::NotArmed => {}
                LaunchOutcome::Launched(report) => {
                    tracing::info!(stopped = report.signalled.len(), "Cartridge launched");
                    if !report.is_clean() {
                        tracing::warn!(
                            failures = report.failures.len(),
                            "Some processes survived teardown"
                        );
                    }
                }
                LaunchOutcome::Failed { error, .. } => {
                    tracing::error!("Cartridge launch failed: {}", error);
                }
            },
            Event::StopPressed => match self.sequencer.stop(self.outbox.as_mut())? {
                StopOutcome::FrontendActive { reported } => {
                    tracing::debug!(?reported, "Stop ignored, frontend owns the game");
                }
                StopOutcome::TornDown(report) => {
                    tracing::info!(stopped = report.signalled.len(), "Emulators stopped");
                }
            },
            Event::Temperature(celsius) => {
                if let Some(message) = self.fan.as_mut().and_then(|fan| fan.observe(celsius)) {
                    self.outbox.send(&message)?;
                }
            }
            Event::Shutdown => {
                tracing::info!("Shutdown signal received, stopping controller");
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Consume events until shutdown or a fatal link error.
    pub fn run(&mut self, events: &Receiver<Event>) -> Result<(), ControllerError> {
        for event in events.iter() {
            if self.handle(event)? == Flow::Stop {
                return Ok(());
            }
        }
        Err(ControllerError::Disconnected)
    }
}
