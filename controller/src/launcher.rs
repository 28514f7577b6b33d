//! Starting the emulator on a virtual terminal.

use std::path::PathBuf;
use std::process::Command;

use cartreader_core::config::Config;
use cartreader_core::error::LaunchError;
use cartreader_core::host::Launcher;
use cartreader_core::validator::LaunchTarget;

use crate::command::{self, Privileged, RunFailure};

/// [`Launcher`] that hands the emulator to `openvt` through a shell, so the
/// escaped ROM path is interpreted the way the launcher script expects.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    privileged: Privileged,
    virtual_terminal: u8,
    scratch_dir: PathBuf,
    scratch_owner: String,
}

impl ShellLauncher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            privileged: Privileged::new(config.launch.use_sudo),
            virtual_terminal: config.launch.virtual_terminal,
            scratch_dir: config.paths.scratch_dir.clone(),
            scratch_owner: config.launch.scratch_owner.clone(),
        }
    }

    /// Shell line that starts the emulator in the background.
    pub fn launch_script(&self, target: &LaunchTarget) -> String {
        format!(
            "{}openvt -c {} -s -f {} &",
            self.privileged.prefix(),
            self.virtual_terminal,
            target.command_line()
        )
    }

    fn scratch_command(&self) -> Command {
        let mut cmd = self.privileged.command("chown");
        cmd.arg("-R").arg(&self.scratch_owner).arg(&self.scratch_dir);
        cmd
    }
}

impl Launcher for ShellLauncher {
    fn prepare_scratch(&self) -> Result<(), LaunchError> {
        let mut cmd = self.scratch_command();
        command::run(&mut cmd).map_err(|failure| launch_error(command::describe(&cmd), failure))
    }

    fn spawn_detached(&self, target: &LaunchTarget) -> Result<(), LaunchError> {
        let script = self.launch_script(target);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&script);
        command::run(&mut cmd).map_err(|failure| launch_error(script, failure))
    }
}

fn launch_error(command: String, failure: RunFailure) -> LaunchError {
    match failure {
        RunFailure::Spawn(source) => LaunchError::Spawn { command, source },
        RunFailure::Status(status) => LaunchError::Status {
            command,
            status: status.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> LaunchTarget {
        LaunchTarget {
            console: "nes".into(),
            emulator_command: "runcommand.sh 0 _SYS_ nes".into(),
            rom_path: "/roms/nes/Super\\ Mario\\ Bros.nes".into(),
            rom_file: PathBuf::from("/roms/nes/Super Mario Bros.nes"),
        }
    }

    #[test]
    fn test_launch_script_with_sudo() {
        let launcher = ShellLauncher::from_config(&Config::default());
        assert_eq!(
            launcher.launch_script(&target()),
            "sudo openvt -c 1 -s -f runcommand.sh 0 _SYS_ nes /roms/nes/Super\\ Mario\\ Bros.nes &"
        );
    }

    #[test]
    fn test_scratch_command_without_sudo() {
        let mut config = Config::default();
        config.launch.use_sudo = false;
        config.launch.virtual_terminal = 2;
        let launcher = ShellLauncher::from_config(&config);

        assert_eq!(
            command::describe(&launcher.scratch_command()),
            "chown -R pi /dev/shm"
        );
        assert!(launcher.launch_script(&target()).starts_with("openvt -c 2 "));
    }
}
