//! Process lookup and termination through the process table.

use std::ffi::OsStr;
use std::process::Command;

use cartreader_core::Config;
use cartreader_core::error::ProcessError;
use cartreader_core::host::{ProcessControl, SignalledProcess, TeardownReport, TermSignal};
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind};

use crate::command::{self, Privileged, RunFailure};

/// [`ProcessControl`] over a fresh process table snapshot per call.
///
/// Process names are the kernel's short names, truncated to 15 bytes, which
/// is why the frontend appears under both its full and truncated name.
///
/// Emulators launched through sudo run as root, so with sudo enabled the
/// signals go through `sudo kill` instead of straight from this process.
pub struct SysProcessControl {
    own_pid: Option<Pid>,
    privileged: Privileged,
}

impl SysProcessControl {
    pub fn from_config(config: &Config) -> Self {
        Self::new(Privileged::new(config.launch.use_sudo))
    }

    pub(crate) fn new(privileged: Privileged) -> Self {
        let own_pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Could not determine own pid: {}", e);
                None
            }
        };
        Self {
            own_pid,
            privileged,
        }
    }

    fn snapshot(&self) -> System {
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
        );
        system
    }

    /// Our own process and every userland thread, which shows up with the
    /// name and command line of its parent.
    fn skip(&self, pid: Pid, process: &Process) -> bool {
        self.own_pid == Some(pid) || process.thread_kind().is_some()
    }

    fn kill_command(&self, pid: u32, signal: TermSignal) -> Command {
        let flag = match signal {
            TermSignal::Graceful => "-TERM",
            TermSignal::Forced => "-KILL",
        };
        let mut cmd = self.privileged.command("kill");
        cmd.arg(flag).arg(pid.to_string());
        cmd
    }

    fn deliver(&self, pid: Pid, process: &Process, signal: TermSignal) -> bool {
        if !self.privileged.uses_sudo() {
            let sys_signal = match signal {
                TermSignal::Graceful => Signal::Term,
                TermSignal::Forced => Signal::Kill,
            };
            return process.kill_with(sys_signal) == Some(true);
        }

        let mut cmd = self.kill_command(pid.as_u32(), signal);
        match command::run(&mut cmd) {
            Ok(()) => true,
            Err(RunFailure::Spawn(e)) => {
                tracing::warn!(command = %command::describe(&cmd), "Failed to run: {}", e);
                false
            }
            Err(RunFailure::Status(status)) => {
                tracing::warn!(command = %command::describe(&cmd), %status, "Signal not delivered");
                false
            }
        }
    }
}

impl ProcessControl for SysProcessControl {
    fn is_running(&self, name: &str) -> bool {
        let system = self.snapshot();
        system
            .processes()
            .iter()
            .any(|(pid, process)| !self.skip(*pid, process) && matches_anywhere(process, name))
    }

    fn signal_all(&self, names: &[String], signal: TermSignal) -> TeardownReport {
        let mut report = TeardownReport::default();
        if names.is_empty() {
            return report;
        }

        let system = self.snapshot();

        for (pid, process) in system.processes() {
            if self.skip(*pid, process) {
                continue;
            }
            let name = process.name().to_string_lossy();
            if !names.iter().any(|n| *n == name) {
                continue;
            }

            let delivered = self.deliver(*pid, process, signal);
            let pid = pid.as_u32();
            if delivered {
                report.signalled.push(SignalledProcess {
                    name: name.into_owned(),
                    pid,
                    signal,
                });
            } else {
                report.failures.push(ProcessError::TerminationFailed {
                    name: name.into_owned(),
                    pid,
                    signal: signal.as_str(),
                });
            }
        }
        report
    }
}

/// Substring match against the process name or any command line argument.
fn matches_anywhere(process: &Process, needle: &str) -> bool {
    contains(process.name(), needle) || process.cmd().iter().any(|arg| contains(arg, needle))
}

fn contains(haystack: &OsStr, needle: &str) -> bool {
    haystack.to_string_lossy().contains(needle)
}
