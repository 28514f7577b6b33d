//! Running external commands, optionally through sudo.

use std::io;
use std::process::{Command, ExitStatus};

/// Builds commands that may need root.
#[derive(Debug, Clone, Copy)]
pub struct Privileged {
    use_sudo: bool,
}

impl Privileged {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    pub fn command(&self, program: &str) -> Command {
        if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        }
    }

    pub fn uses_sudo(&self) -> bool {
        self.use_sudo
    }

    /// Prefix for a shell script line.
    pub fn prefix(&self) -> &'static str {
        if self.use_sudo { "sudo " } else { "" }
    }
}

pub enum RunFailure {
    Spawn(io::Error),
    Status(ExitStatus),
}

/// Run `cmd` to completion, treating a non-zero exit as a failure.
pub fn run(cmd: &mut Command) -> Result<(), RunFailure> {
    tracing::debug!(command = %describe(cmd), "Running");
    let status = cmd.status().map_err(RunFailure::Spawn)?;
    if status.success() {
        Ok(())
    } else {
        Err(RunFailure::Status(status))
    }
}

/// Human-readable command line for logs and errors.
pub fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|arg| arg.to_string_lossy().into_owned()));
    parts.join(" ")
}
