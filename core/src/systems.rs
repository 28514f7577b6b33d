//! Known console identifiers and managed process names
//!
//! Both sets are built once from configuration at startup and never mutated.

use hashbrown::HashSet;

/// RetroPie system directory names accepted in the console field.
pub const DEFAULT_SYSTEMS: &[&str] = &[
    "amiga",
    "amstradcpc",
    "apple2",
    "arcade",
    "atari800",
    "atari2600",
    "atari5200",
    "atari7800",
    "atarilynx",
    "atarist",
    "c64",
    "coco",
    "dragon32",
    "dreamcast",
    "fba",
    "fds",
    "gamegear",
    "gb",
    "gba",
    "gbc",
    "intellivision",
    "macintosh",
    "mame-advmame",
    "mame-libretro",
    "mame-mame4all",
    "mastersystem",
    "megadrive",
    "msx",
    "n64",
    "neogeo",
    "nes",
    "ngp",
    "ngpc",
    "pc",
    "ports",
    "psp",
    "psx",
    "scummvm",
    "sega32x",
    "segacd",
    "sg-1000",
    "snes",
    "vectrex",
    "videopac",
    "wonderswan",
    "wonderswancolor",
    "zmachine",
    "zxspectrum",
];

/// Emulator binaries that a cartridge launch may leave running.
pub const DEFAULT_EMULATORS: &[&str] = &[
    "retroarch",
    "ags",
    "uae4all2",
    "uae4arm",
    "capricerpi",
    "linapple",
    "hatari",
    "stella",
    "atari800",
    "xroar",
    "vice",
    "daphne",
    "reicast",
    "pifba",
    "osmose",
    "gpsp",
    "jzintv",
    "basiliskll",
    "mame",
    "advmame",
    "dgen",
    "openmsx",
    "mupen64plus",
    "gngeo",
    "dosbox",
    "ppsspp",
    "simcoupe",
    "scummvm",
    "snes9x",
    "pisnes",
    "frotz",
    "fbzx",
    "fuse",
    "gemrb",
    "cgenesis",
    "zdoom",
    "eduke32",
    "lincity",
    "love",
    "alephone",
    "micropolis",
    "openbor",
    "openttd",
    "opentyrian",
    "cannonball",
    "tyrquake",
    "ioquake3",
    "residualvm",
    "xrick",
    "sdlpop",
    "uqm",
    "stratagus",
    "wolf4sdl",
    "solarus",
];

/// Frontend shell process names. Linux truncates comm to 15 bytes, hence
/// the second spelling.
pub const DEFAULT_FRONTEND: &[&str] = &["emulationstation", "emulationstatio"];

/// Processes that ignore SIGTERM and need SIGKILL.
pub const DEFAULT_FORCE_KILL: &[&str] = &["kodi", "kodi.bin"];

/// Immutable set of console identifiers. Membership is case-sensitive.
#[derive(Debug, Clone)]
pub struct SupportedSystems {
    systems: HashSet<String>,
}

impl SupportedSystems {
    pub fn new<I, S>(systems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            systems: systems.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, console: &str) -> bool {
        self.systems.contains(console)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for SupportedSystems {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEMS.iter().copied())
    }
}

/// Process names subject to teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedProcessSet {
    /// Emulators, terminated gracefully
    pub emulators: Vec<String>,
    /// Frontend shell, terminated gracefully before a cartridge launch
    pub frontend: Vec<String>,
    /// Terminated with a forced signal after the graceful pass
    pub force_kill: Vec<String>,
}

impl ManagedProcessSet {
    /// Names for the graceful pass before a cartridge launch.
    pub fn launch_teardown(&self) -> Vec<String> {
        self.emulators
            .iter()
            .chain(&self.frontend)
            .cloned()
            .collect()
    }

    /// Names for the graceful pass on stop, which leaves the frontend alone.
    pub fn stop_teardown(&self) -> &[String] {
        &self.emulators
    }
}

impl Default for ManagedProcessSet {
    fn default() -> Self {
        Self {
            emulators: owned(DEFAULT_EMULATORS),
            frontend: owned(DEFAULT_FRONTEND),
            force_kill: owned(DEFAULT_FORCE_KILL),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
