//! Error types for the controller
//!
//! Each concern has its own enum. Everything except a fatal [`TransportError`] is
//! recoverable: the control loop logs it, acknowledges failure to the reader
//! where the protocol calls for it, and keeps running.

use std::path::PathBuf;

use thiserror::Error;

/// Parse-level failures for a single transport line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed record: expected 3 fields, got {fields} in {line:?}")]
    MalformedRecord { line: String, fields: usize },
}

/// Cartridge validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported console \"{0}\"")]
    UnsupportedConsole(String),

    #[error("ROM file not found: {}", .0.display())]
    MissingRomFile(PathBuf),
}

/// Failure to deliver a termination signal to a managed process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("failed to send {signal} to {name} (pid {pid})")]
    TerminationFailed {
        name: String,
        pid: u32,
        signal: &'static str,
    },
}

/// Serial link failures. Everything but [`TransportError::LineTooLong`] means
/// the link is gone and ends the control loop.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("link closed by peer")]
    Closed,

    #[error("line longer than {limit} bytes discarded")]
    LineTooLong { limit: usize },
}

/// A system command (shutdown, frontend reset) could not be carried out.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Status { command: String, status: String },

    #[error("frontend command datagram failed: {0}")]
    Datagram(#[source] std::io::Error),
}

/// The launch sequence could not start the emulator.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Status { command: String, status: String },
}

/// Configuration loading or validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that end the control loop.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("event queue disconnected")]
    Disconnected,
}
