//! Command dispatch and cartridge validation for received lines
//!
//! One call to [`Dispatcher::dispatch`] is one cycle of the receive state
//! machine:
//!
//! ```text
//! Idle -> RecordReceived -> parse failure ------------------------> Idle (bad)
//!                        -> reserved uid -> CommandExecuting -----> Idle
//!                        -> console set  -> ValidationPending -> fail -> Idle (bad)
//!                                                             -> Armed -> Idle (ok)
//! ```

use crate::cartridge::{CartridgeState, FailedReadPolicy};
use crate::error::{TransportError, ValidationError};
use crate::host::SystemControl;
use crate::protocol::{self, Command, Outbound};
use crate::transport::Outbox;
use crate::validator::{RomStore, Validator};

/// Receive state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    RecordReceived,
    CommandExecuting,
    ValidationPending,
    Armed,
}

/// What a dispatch cycle did with its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty line, nothing sent
    Skipped,
    /// Fewer than three fields, `bad` sent
    Malformed,
    /// Reserved command executed
    Command(Command),
    /// Cartridge validated and armed, `ok` sent
    Armed,
    /// Cartridge rejected, `bad` sent
    Rejected(ValidationError),
    /// Non-command uid with no console, nothing sent
    Ignored,
}

pub struct Dispatcher {
    validator: Validator,
    store: Box<dyn RomStore>,
    policy: FailedReadPolicy,
    state: DispatchState,
}

impl Dispatcher {
    pub fn new(validator: Validator, store: Box<dyn RomStore>, policy: FailedReadPolicy) -> Self {
        Self {
            validator,
            store,
            policy,
            state: DispatchState::Idle,
        }
    }

    /// Current state. Always [`DispatchState::Idle`] between cycles.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Run one receive cycle for `line`.
    ///
    /// Only a failed link write is an error; every protocol or validation
    /// failure is answered on the link and reported in the [`Outcome`].
    pub fn dispatch(
        &mut self,
        line: &str,
        cart: &mut CartridgeState,
        outbox: &mut dyn Outbox,
        system: &dyn SystemControl,
    ) -> Result<Outcome, TransportError> {
        self.enter(DispatchState::RecordReceived);
        let outcome = self.run_cycle(line, cart, outbox, system);
        self.enter(DispatchState::Idle);
        outcome
    }

    fn run_cycle(
        &mut self,
        line: &str,
        cart: &mut CartridgeState,
        outbox: &mut dyn Outbox,
        system: &dyn SystemControl,
    ) -> Result<Outcome, TransportError> {
        let record = match protocol::parse_line(line) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(Outcome::Skipped),
            Err(e) => {
                tracing::warn!("NDEF read error: {}", e);
                outbox.send(&Outbound::Bad)?;
                return Ok(Outcome::Malformed);
            }
        };

        if let Some(command) = record.command() {
            self.enter(DispatchState::CommandExecuting);
            self.execute(command, cart, system);
            return Ok(Outcome::Command(command));
        }

        if record.console.is_empty() {
            tracing::debug!(uid = %record.uid, "Record without console data ignored");
            return Ok(Outcome::Ignored);
        }

        self.enter(DispatchState::ValidationPending);
        match self
            .validator
            .validate(&record.console, &record.rom, self.store.as_ref())
        {
            Ok(target) => {
                outbox.send(&Outbound::Ok)?;
                tracing::info!(
                    console = %target.console,
                    rom = %target.rom_path,
                    "Cartridge armed"
                );
                cart.arm(target);
                self.enter(DispatchState::Armed);
                Ok(Outcome::Armed)
            }
            Err(e) => {
                outbox.send(&Outbound::Bad)?;
                cart.reject(self.policy);
                Ok(Outcome::Rejected(e))
            }
        }
    }

    fn execute(&self, command: Command, cart: &mut CartridgeState, system: &dyn SystemControl) {
        match command {
            Command::Shutdown => {
                tracing::info!("Shutdown command received");
                if let Err(e) = system.shutdown() {
                    tracing::error!("Shutdown failed: {}", e);
                }
            }
            Command::CartEject => {
                tracing::info!("Cartridge ejected");
                cart.disarm();
            }
            Command::Reset => {
                tracing::info!("Reset button pressed");
                if let Err(e) = system.reset_frontend() {
                    tracing::warn!("Frontend reset failed: {}", e);
                }
            }
        }
    }

    fn enter(&mut self, next: DispatchState) {
        tracing::trace!(from = ?self.state, to = ?next, "dispatch transition");
        self.state = next;
    }
}
