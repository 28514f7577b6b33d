//! Host-side collaborators
//!
//! The control loop reaches the operating system only through these traits.
//! The `cartreader` binary provides the real implementations; tests use the
//! recording fakes in `test_utils`.

use std::fmt;

use crate::error::{CommandError, LaunchError, ProcessError};
use crate::validator::LaunchTarget;

/// Board-level commands carried over the serial link.
pub trait SystemControl {
    /// Halt the board.
    fn shutdown(&self) -> Result<(), CommandError>;

    /// Send a reset to the running emulation frontend.
    fn reset_frontend(&self) -> Result<(), CommandError>;
}

/// Termination signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSignal {
    /// SIGTERM
    Graceful,
    /// SIGKILL
    Forced,
}

impl TermSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Graceful => "SIGTERM",
            Self::Forced => "SIGKILL",
        }
    }
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A process that was sent a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalledProcess {
    pub name: String,
    pub pid: u32,
    pub signal: TermSignal,
}

/// Result of one or more teardown passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub signalled: Vec<SignalledProcess>,
    pub failures: Vec<ProcessError>,
}

impl TeardownReport {
    pub fn merge(&mut self, other: TeardownReport) {
        self.signalled.extend(other.signalled);
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Process lookup and signalling by name.
pub trait ProcessControl {
    /// Whether any process other than ourselves matches `name`, by process
    /// name or command line.
    fn is_running(&self, name: &str) -> bool;

    /// Send `signal` to every process whose name is in `names`.
    ///
    /// Never retries; failures are reported, not raised.
    fn signal_all(&self, names: &[String], signal: TermSignal) -> TeardownReport;
}

/// Emulator launch surface.
pub trait Launcher {
    /// Hand the shared scratch directory back to the frontend account.
    fn prepare_scratch(&self) -> Result<(), LaunchError>;

    /// Start the emulator for `target` on a virtual terminal and return
    /// without waiting for it.
    fn spawn_detached(&self, target: &LaunchTarget) -> Result<(), LaunchError>;
}

/// Source of the ROM the frontend most recently started.
pub trait RomStatusSource {
    fn active_rom(&self) -> Option<String>;
}
