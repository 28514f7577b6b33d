//! The ROM the frontend last started, as recorded by its launch hook.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use cartreader_core::config::Config;
use cartreader_core::host::RomStatusSource;

/// Reads the first line of the ROM details file and shortens the ROM root
/// to the configured prefix, e.g. `/home/pi/RetroPie/roms/nes/zelda.nes`
/// becomes `rom/nes/zelda.nes`.
#[derive(Debug, Clone)]
pub struct RomDetailsFile {
    path: PathBuf,
    roms_root: String,
    prefix: String,
}

impl RomDetailsFile {
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.paths.rom_details.clone(),
            roms_root: config.paths.roms_root.display().to_string(),
            prefix: config.paths.rom_status_prefix.clone(),
        }
    }

    fn first_line(&self) -> std::io::Result<String> {
        let mut line = String::new();
        BufReader::new(File::open(&self.path)?).read_line(&mut line)?;
        Ok(line)
    }
}

impl RomStatusSource for RomDetailsFile {
    fn active_rom(&self) -> Option<String> {
        let line = match self.first_line() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Could not read ROM details: {}", e);
                return None;
            }
        };

        let rom = line
            .replace(&self.roms_root, &self.prefix)
            .replace(['\n', '\r'], "");
        if rom.is_empty() { None } else { Some(rom) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source(dir: &TempDir) -> RomDetailsFile {
        let mut config = Config::default();
        config.paths.rom_details = dir.path().join("romdetails.txt");
        RomDetailsFile::from_config(&config)
    }

    #[test]
    fn test_rewrites_roms_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("romdetails.txt"),
            "/home/pi/RetroPie/roms/nes/Zelda (USA).nes\nsecond line\n",
        )
        .unwrap();

        assert_eq!(
            source(&dir).active_rom().as_deref(),
            Some("rom/nes/Zelda (USA).nes")
        );
    }

    #[test]
    fn test_missing_or_empty_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(source(&dir).active_rom(), None);

        fs::write(dir.path().join("romdetails.txt"), "\n").unwrap();
        assert_eq!(source(&dir).active_rom(), None);
    }
}
