//! Wire protocol between the controller and the cartridge reader
//!
//! Inbound traffic is one ASCII record per line, three fields joined by
//! `", "`:
//!
//! ```text
//! <uid>, <console>, <rom>\n
//! ```
//!
//! The `uid` field doubles as a command channel (`shutdown`, `cart_eject`,
//! `reset`). Outbound traffic is a single bare token per message.

use std::fmt;

use crate::error::ProtocolError;

/// Field delimiter for inbound records.
pub const FIELD_DELIMITER: &str = ", ";

/// One parsed transport line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Tag uid, or a reserved command token
    pub uid: String,
    /// Console identifier (NDEF record #1)
    pub console: String,
    /// ROM filename (NDEF record #2)
    pub rom: String,
}

impl Record {
    /// Reserved command carried in the uid field, if any.
    pub fn command(&self) -> Option<Command> {
        Command::from_uid(&self.uid)
    }
}

/// Parse one raw line into a [`Record`].
///
/// Returns `Ok(None)` for an empty line, which callers skip without
/// acknowledging. Fields beyond the third are ignored.
pub fn parse_line(raw: &str) -> Result<Option<Record>, ProtocolError> {
    let line = strip_terminator(raw);
    if line.is_empty() {
        return Ok(None);
    }

    let mut fields = line.split(FIELD_DELIMITER);
    match (fields.next(), fields.next(), fields.next()) {
        (Some(uid), Some(console), Some(rom)) => Ok(Some(Record {
            uid: uid.to_string(),
            console: console.to_string(),
            rom: rom.to_string(),
        })),
        _ => Err(ProtocolError::MalformedRecord {
            line: line.to_string(),
            fields: line.split(FIELD_DELIMITER).count(),
        }),
    }
}

/// Remove a trailing `\n` and an optional `\r` before it.
fn strip_terminator(raw: &str) -> &str {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    line.strip_suffix('\r').unwrap_or(line)
}

/// System commands sent in the uid field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Power the board down
    Shutdown,
    /// Cartridge removed from the slot
    CartEject,
    /// Console reset button
    Reset,
}

impl Command {
    pub fn from_uid(uid: &str) -> Option<Self> {
        match uid {
            "shutdown" => Some(Self::Shutdown),
            "cart_eject" => Some(Self::CartEject),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::CartEject => "cart_eject",
            Self::Reset => "reset",
        }
    }
}

/// Messages written back to the cartridge reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// The reader may scan a tag
    Ready,
    /// Cartridge read accepted
    Ok,
    /// Cartridge read rejected
    Bad,
    FanOn,
    FanOff,
    /// ROM currently running under the frontend
    RomStatus(String),
}

impl Outbound {
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Ok => "ok",
            Self::Bad => "bad",
            Self::FanOn => "fanon",
            Self::FanOff => "fanoff",
            Self::RomStatus(status) => status,
        }
    }
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}
