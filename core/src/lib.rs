//! Cartreader Core - cartridge reader bridge for RetroPie
//!
//! This crate holds the host-independent half of the controller: the serial
//! line protocol, cartridge validation, the launch and stop sequences, and
//! the event loop that ties them together. Everything that touches the real
//! machine sits behind the traits in [`host`].
//!
//! # Architecture
//!
//! - [`Controller`] - Single consumer of [`Event`]s; owns the cartridge state
//! - [`Dispatcher`] - One receive cycle per line from the reader
//! - [`Sequencer`] - Launch/stop sequences behind the power switch
//! - [`Config`] - TOML configuration with built-in RetroPie defaults

pub mod cartridge;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod protocol;
pub mod sequencer;
pub mod systems;
#[cfg(test)]
pub mod test_utils;
pub mod thermal;
pub mod transport;
pub mod validator;

pub use cartridge::{CartridgeState, FailedReadPolicy};
pub use config::Config;
pub use controller::{Controller, Event, Flow};
pub use dispatcher::{Dispatcher, Outcome};
pub use error::{
    CommandError, ConfigError, ControllerError, LaunchError, ProcessError, ProtocolError,
    TransportError, ValidationError,
};
pub use host::{Launcher, ProcessControl, RomStatusSource, SystemControl, TeardownReport, TermSignal};
pub use protocol::{Command, Outbound, Record};
pub use sequencer::{Sequencer, SequencerSettings};
pub use systems::{ManagedProcessSet, SupportedSystems};
pub use thermal::FanController;
pub use transport::{LineReader, LinkWriter, Outbox};
pub use validator::{FsRomStore, LaunchTarget, RomStore, Validator};
