//! Cartridge validation
//!
//! Two short-circuiting stages: the console identifier must be a supported
//! system, then the ROM file must exist under `<roms_root>/<console>/`. Only
//! a cartridge that passes both becomes a [`LaunchTarget`].

use std::path::{Component, Path, PathBuf};

use crate::error::ValidationError;
use crate::systems::SupportedSystems;

/// Filesystem view used for the ROM existence check.
pub trait RomStore {
    fn is_file(&self, path: &Path) -> bool;
}

/// [`RomStore`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRomStore;

impl RomStore for FsRomStore {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// A validated, launch-ready cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    /// Console identifier the cartridge declared
    pub console: String,
    /// Emulator launcher command line, console included
    pub emulator_command: String,
    /// Absolute ROM path with shell metacharacters in the filename escaped
    pub rom_path: String,
    /// Unescaped ROM path, for logging
    pub rom_file: PathBuf,
}

impl LaunchTarget {
    /// Full shell command line for the launcher.
    pub fn command_line(&self) -> String {
        format!("{} {}", self.emulator_command, self.rom_path)
    }
}

/// Checks cartridge records against the supported systems and ROM tree.
#[derive(Debug, Clone)]
pub struct Validator {
    systems: SupportedSystems,
    roms_root: PathBuf,
    emulator_command: String,
}

impl Validator {
    pub fn new(
        systems: SupportedSystems,
        roms_root: impl Into<PathBuf>,
        emulator_command: impl Into<String>,
    ) -> Self {
        Self {
            systems,
            roms_root: roms_root.into(),
            emulator_command: emulator_command.into(),
        }
    }

    /// Validate a console/ROM pair.
    ///
    /// The store is never consulted for an unsupported console.
    pub fn validate(
        &self,
        console: &str,
        rom: &str,
        store: &dyn RomStore,
    ) -> Result<LaunchTarget, ValidationError> {
        if !self.systems.contains(console) {
            tracing::warn!(
                console,
                "Console is not in the supported systems list (names are all-lowercase)"
            );
            return Err(ValidationError::UnsupportedConsole(console.to_string()));
        }
        tracing::info!(console, "Console is a valid system");

        // Joined as text: an absolute ROM name must stay under the console dir
        let console_dir = self.roms_root.join(console).display().to_string();
        let rom_file = PathBuf::from(format!("{console_dir}/{rom}"));
        if climbs_out(rom) {
            tracing::warn!(rom, "ROM name leaves the console directory");
            return Err(ValidationError::MissingRomFile(rom_file));
        }
        if !store.is_file(&rom_file) {
            tracing::warn!(rom_file = %rom_file.display(), "ROM file not found");
            return Err(ValidationError::MissingRomFile(rom_file));
        }
        tracing::info!(rom, "Found ROM");

        Ok(LaunchTarget {
            console: console.to_string(),
            emulator_command: format!("{} {}", self.emulator_command, console),
            rom_path: format!("{console_dir}/{}", escape_shell(rom)),
            rom_file,
        })
    }
}

/// Whether `rom` names a parent directory anywhere in its path.
fn climbs_out(rom: &str) -> bool {
    Path::new(rom)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
}

/// Backslash-escape the characters a shell would split or interpret in a
/// ROM filename: space, parentheses and single quote.
pub fn escape_shell(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 8);
    for c in name.chars() {
        if matches!(c, ' ' | '(' | ')' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
