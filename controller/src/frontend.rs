//! Board shutdown and frontend reset.

use std::net::UdpSocket;

use cartreader_core::config::Config;
use cartreader_core::error::CommandError;
use cartreader_core::host::SystemControl;

use crate::command::{self, Privileged, RunFailure};

/// Network command understood by RetroArch.
const RESET_COMMAND: &[u8] = b"RESET";

/// [`SystemControl`] for the host machine.
#[derive(Debug, Clone)]
pub struct HostSystem {
    privileged: Privileged,
    command_addr: String,
}

impl HostSystem {
    pub fn from_config(config: &Config) -> Self {
        Self {
            privileged: Privileged::new(config.launch.use_sudo),
            command_addr: config.frontend.command_addr.clone(),
        }
    }
}

impl SystemControl for HostSystem {
    fn shutdown(&self) -> Result<(), CommandError> {
        let mut cmd = self.privileged.command("shutdown");
        cmd.args(["-h", "now"]);
        command::run(&mut cmd).map_err(|failure| {
            let command = command::describe(&cmd);
            match failure {
                RunFailure::Spawn(source) => CommandError::Spawn { command, source },
                RunFailure::Status(status) => CommandError::Status {
                    command,
                    status: status.to_string(),
                },
            }
        })
    }

    fn reset_frontend(&self) -> Result<(), CommandError> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(CommandError::Datagram)?;
        socket
            .send_to(RESET_COMMAND, self.command_addr.as_str())
            .map_err(CommandError::Datagram)?;
        tracing::debug!(addr = %self.command_addr, "Sent RESET");
        Ok(())
    }
}
