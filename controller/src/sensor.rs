//! CPU temperature sampling for fan control.

use std::path::PathBuf;
use std::process::Command;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cartreader_core::controller::Event;
use thiserror::Error;

const SYSFS_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("failed to read temperature from {source_name}: {error}")]
    Read {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("unrecognised temperature reading {0:?}")]
    Parse(String),
}

/// Where temperature samples come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemperatureSource {
    /// Firmware query, prints `temp=47.2'C`
    Vcgencmd(PathBuf),
    /// Kernel thermal zone in millidegrees
    Sysfs(PathBuf),
}

impl TemperatureSource {
    /// Prefer `vcgencmd` when it is on the PATH, else the first thermal zone.
    pub fn detect() -> Option<Self> {
        if let Ok(path) = which::which("vcgencmd") {
            return Some(Self::Vcgencmd(path));
        }
        let zone = PathBuf::from(SYSFS_THERMAL_ZONE);
        zone.exists().then_some(Self::Sysfs(zone))
    }

    pub fn read(&self) -> Result<f32, SensorError> {
        match self {
            Self::Vcgencmd(path) => {
                let output = Command::new(path)
                    .arg("measure_temp")
                    .output()
                    .map_err(|error| SensorError::Read {
                        source_name: path.display().to_string(),
                        error,
                    })?;
                let text = String::from_utf8_lossy(&output.stdout);
                parse_vcgencmd(&text).ok_or_else(|| SensorError::Parse(text.into_owned()))
            }
            Self::Sysfs(path) => {
                let text = std::fs::read_to_string(path).map_err(|error| SensorError::Read {
                    source_name: path.display().to_string(),
                    error,
                })?;
                parse_millidegrees(&text).ok_or(SensorError::Parse(text))
            }
        }
    }
}

/// Parse `temp=47.2'C`.
pub fn parse_vcgencmd(output: &str) -> Option<f32> {
    let start = output.find('=')? + 1;
    let end = output.rfind('\'')?;
    output.get(start..end)?.trim().parse().ok()
}

/// Parse a thermal zone reading such as `47236`.
pub fn parse_millidegrees(text: &str) -> Option<f32> {
    let milli: i64 = text.trim().parse().ok()?;
    Some(milli as f32 / 1000.0)
}

/// Sample `source` every `interval` and forward readings as events.
///
/// Failed samples are logged and skipped. The thread ends when the event
/// queue is dropped.
pub fn spawn_poller(
    source: TemperatureSource,
    interval: Duration,
    events: Sender<Event>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match source.read() {
                Ok(celsius) => {
                    tracing::trace!(celsius, "CPU temperature");
                    if events.send(Event::Temperature(celsius)).is_err() {
                        return;
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            }
            thread::sleep(interval);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_vcgencmd() {
        assert_eq!(parse_vcgencmd("temp=47.2'C\n"), Some(47.2));
        assert_eq!(parse_vcgencmd("temp=65'C"), Some(65.0));
        assert_eq!(parse_vcgencmd("error"), None);
        assert_eq!(parse_vcgencmd("temp=hot'C"), None);
    }

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("47000\n"), Some(47.0));
        assert_eq!(parse_millidegrees(""), None);
    }

    #[test]
    fn test_poller_forwards_sysfs_samples() {
        let dir = TempDir::new().unwrap();
        let zone = dir.path().join("temp");
        std::fs::write(&zone, "70000\n").unwrap();

        let (tx, rx) = mpsc::channel();
        spawn_poller(
            TemperatureSource::Sysfs(zone),
            Duration::from_millis(10),
            tx,
        );

        match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
            Event::Temperature(celsius) => assert_eq!(celsius, 70.0),
            other => panic!("unexpected event {other:?}"),
        }
        drop(rx);
    }
}
