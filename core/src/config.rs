//! Configuration management (`config.toml`)
//!
//! Every field has a default matching a stock RetroPie install on a
//! Raspberry Pi, so a missing or partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cartridge::FailedReadPolicy;
use crate::error::ConfigError;
use crate::sequencer::SequencerSettings;
use crate::systems::{
    DEFAULT_EMULATORS, DEFAULT_FORCE_KILL, DEFAULT_FRONTEND, DEFAULT_SYSTEMS, ManagedProcessSet,
    SupportedSystems,
};
use crate::thermal::FanController;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Serial link to the reader
    #[serde(default)]
    pub link: LinkConfig,
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Emulator launch settings
    #[serde(default)]
    pub launch: LaunchConfig,
    /// Emulation frontend settings
    #[serde(default)]
    pub frontend: FrontendConfig,
    /// Fan hysteresis
    #[serde(default)]
    pub fan: FanConfig,
    /// GPIO pin assignments (BCM numbering)
    #[serde(default)]
    pub gpio: GpioConfig,
    /// Behavioural policies
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Accepted console identifiers
    #[serde(default)]
    pub systems: SystemsConfig,
    /// Process names subject to teardown
    #[serde(default)]
    pub processes: ProcessesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Serial device (default: /dev/ttyS0)
    pub device: String,
    /// Baud rate (default: 9600)
    pub baud_rate: u32,
    /// Wait after opening the port before the first write (default: 2000).
    /// Opening the port resets the microcontroller.
    pub open_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// One subdirectory per console identifier
    pub roms_root: PathBuf,
    /// Shared memory directory the frontend needs to own
    pub scratch_dir: PathBuf,
    /// File whose first line is the ROM the frontend last started
    pub rom_details: PathBuf,
    /// Replaces `roms_root` in reported ROM paths (default: "rom")
    pub rom_status_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Launcher command; the console identifier and ROM path are appended
    pub emulator_command: String,
    /// Virtual terminal to run the emulator on (default: 1)
    pub virtual_terminal: u8,
    /// Prefix privileged commands with sudo (default: true)
    pub use_sudo: bool,
    /// Account that owns `scratch_dir` after a launch (default: pi)
    pub scratch_owner: String,
    /// Pause after starting the emulator (default: 1000)
    pub post_launch_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Process name that marks the frontend as running
    pub process: String,
    /// RetroArch network command address (default: 127.0.0.1:55355)
    pub command_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub enabled: bool,
    /// Fan turns on above this (default: 65)
    pub on_celsius: f32,
    /// Fan turns off below this (default: 50)
    pub off_celsius: f32,
    /// Sampling period (default: 10)
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    /// Held high while the controller runs (default: 4)
    pub liveness: u8,
    /// Power switch on (default: 3)
    pub launch_button: u8,
    /// Power switch off (default: 2)
    pub stop_button: u8,
    pub debounce_ms: u64,
    /// Buttons pull the line to ground when pressed (default: true). When
    /// false, inputs use pull-downs and a press is a rising edge.
    pub active_low: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Effect of a failed read on an armed cartridge (default: keep)
    pub failed_read: FailedReadPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemsConfig {
    pub supported: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessesConfig {
    pub emulators: Vec<String>,
    pub frontend: Vec<String>,
    pub force_kill: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS0".to_string(),
            baud_rate: 9600,
            open_delay_ms: 2000,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            roms_root: PathBuf::from("/home/pi/RetroPie/roms"),
            scratch_dir: PathBuf::from("/dev/shm"),
            rom_details: PathBuf::from("/home/pi/romdetails.txt"),
            rom_status_prefix: "rom".to_string(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            emulator_command: "/opt/retropie/supplementary/runcommand/runcommand.sh 0 _SYS_"
                .to_string(),
            virtual_terminal: 1,
            use_sudo: true,
            scratch_owner: "pi".to_string(),
            post_launch_delay_ms: 1000,
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            process: "emulationstation".to_string(),
            command_addr: "127.0.0.1:55355".to_string(),
        }
    }
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            on_celsius: 65.0,
            off_celsius: 50.0,
            poll_interval_secs: 10,
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            liveness: 4,
            launch_button: 3,
            stop_button: 2,
            debounce_ms: 50,
            active_low: true,
        }
    }
}

impl Default for SystemsConfig {
    fn default() -> Self {
        Self {
            supported: DEFAULT_SYSTEMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ProcessesConfig {
    fn default() -> Self {
        let set = ManagedProcessSet::default();
        Self {
            emulators: set.emulators,
            frontend: set.frontend,
            force_kill: set.force_kill,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fan.off_celsius >= self.fan.on_celsius {
            return Err(ConfigError::Invalid(format!(
                "fan.off_celsius ({}) must be below fan.on_celsius ({})",
                self.fan.off_celsius, self.fan.on_celsius
            )));
        }
        if self.fan.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "fan.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.supported_systems().is_empty() {
            return Err(ConfigError::Invalid(
                "systems.supported must list at least one console".to_string(),
            ));
        }
        if self.frontend.process.is_empty() {
            return Err(ConfigError::Invalid(
                "frontend.process must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn supported_systems(&self) -> SupportedSystems {
        SupportedSystems::new(self.systems.supported.iter().cloned())
    }

    pub fn managed_processes(&self) -> ManagedProcessSet {
        ManagedProcessSet {
            emulators: self.processes.emulators.clone(),
            frontend: self.processes.frontend.clone(),
            force_kill: self.processes.force_kill.clone(),
        }
    }

    pub fn sequencer_settings(&self) -> SequencerSettings {
        SequencerSettings {
            processes: self.managed_processes(),
            frontend_process: self.frontend.process.clone(),
            post_launch_delay: Duration::from_millis(self.launch.post_launch_delay_ms),
        }
    }

    pub fn fan_controller(&self) -> FanController {
        FanController::new(self.fan.on_celsius, self.fan.off_celsius)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/cartreader`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "cartreader", "cartreader")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default location of `config.toml`.
pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load the configuration.
///
/// An explicit `path` must exist. Without one, the default location is
/// tried and a missing file yields the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match default_path() {
            Some(path) => (path, false),
            None => return Ok(Config::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            tracing::info!(path = %path.display(), "Loaded configuration");
            Config::from_toml(&content, &path)
        }
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.link.device, "/dev/ttyS0");
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.policy.failed_read, FailedReadPolicy::Keep);
        assert!(config.supported_systems().contains("megadrive"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml(
            r#"
[link]
device = "/dev/ttyAMA0"

[policy]
failed_read = "disarm"

[systems]
supported = ["nes", "snes"]
"#,
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.link.device, "/dev/ttyAMA0");
        assert_eq!(config.link.baud_rate, 9600);
        assert_eq!(config.policy.failed_read, FailedReadPolicy::Disarm);
        assert_eq!(config.supported_systems().len(), 2);
        assert!(!config.supported_systems().contains("gb"));
        assert_eq!(config.fan, FanConfig::default());
    }

    #[test]
    fn test_inverted_fan_band_is_rejected() {
        let err = Config::from_toml(
            "[fan]\non_celsius = 50.0\noff_celsius = 60.0\n",
            Path::new("test.toml"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_systems_list_is_rejected() {
        let err =
            Config::from_toml("[systems]\nsupported = []\n", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let err = Config::from_toml("[link\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config::default();
        let parsed = Config::from_toml(&config.to_toml(), Path::new("rt.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[launch]\npost_launch_delay_ms = 250\n").unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(
            config.sequencer_settings().post_launch_delay,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_default_process_lists_match_constants() {
        let config = Config::default();
        assert_eq!(config.processes.emulators.len(), DEFAULT_EMULATORS.len());
        assert_eq!(config.processes.frontend.len(), DEFAULT_FRONTEND.len());
        assert_eq!(config.processes.force_kill.len(), DEFAULT_FORCE_KILL.len());
    }
}
