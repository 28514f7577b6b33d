//! Shared test fakes for the host collaborators

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{CommandError, LaunchError, ProcessError, TransportError};
use crate::host::{
    Launcher, ProcessControl, RomStatusSource, SignalledProcess, SystemControl, TeardownReport,
    TermSignal,
};
use crate::protocol::Outbound;
use crate::transport::Outbox;
use crate::validator::{LaunchTarget, RomStore, escape_shell};

/// A launch target under `/roms` without touching the filesystem.
pub fn test_target(console: &str, rom: &str) -> LaunchTarget {
    LaunchTarget {
        console: console.to_string(),
        emulator_command: format!("runcommand.sh 0 _SYS_ {console}"),
        rom_path: format!("/roms/{console}/{}", escape_shell(rom)),
        rom_file: PathBuf::from(format!("/roms/{console}/{rom}")),
    }
}

// ============================================================================
// ROM store
// ============================================================================

/// ROM store that answers a fixed presence flag and counts lookups.
#[derive(Clone)]
pub struct CountingRomStore {
    present: Rc<Cell<bool>>,
    checks: Rc<Cell<usize>>,
}

impl CountingRomStore {
    pub fn new(present: bool) -> Self {
        Self {
            present: Rc::new(Cell::new(present)),
            checks: Rc::new(Cell::new(0)),
        }
    }

    pub fn set_present(&self, present: bool) {
        self.present.set(present);
    }

    pub fn checks(&self) -> usize {
        self.checks.get()
    }
}

impl RomStore for CountingRomStore {
    fn is_file(&self, _path: &Path) -> bool {
        self.checks.set(self.checks.get() + 1);
        self.present.get()
    }
}

// ============================================================================
// Link
// ============================================================================

/// Outbox that records every message, or fails every write.
#[derive(Clone, Default)]
pub struct RecordingOutbox {
    sent: Rc<RefCell<Vec<Outbound>>>,
    failing: bool,
}

impl RecordingOutbox {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.borrow().clone()
    }
}

impl Outbox for RecordingOutbox {
    fn send(&mut self, message: &Outbound) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "link unplugged",
            )));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

// ============================================================================
// System commands
// ============================================================================

#[derive(Clone, Default)]
pub struct RecordingSystem {
    shutdowns: Rc<Cell<usize>>,
    resets: Rc<Cell<usize>>,
}

impl RecordingSystem {
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.get()
    }

    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl SystemControl for RecordingSystem {
    fn shutdown(&self) -> Result<(), CommandError> {
        self.shutdowns.set(self.shutdowns.get() + 1);
        Ok(())
    }

    fn reset_frontend(&self) -> Result<(), CommandError> {
        self.resets.set(self.resets.get() + 1);
        Ok(())
    }
}

// ============================================================================
// Processes
// ============================================================================

#[derive(Default)]
struct ProcessTable {
    running: Vec<(String, u32)>,
    failing: Vec<u32>,
    calls: Vec<(Vec<String>, TermSignal)>,
    signals: Vec<SignalledProcess>,
}

/// In-memory process table. A signalled process exits unless its pid was
/// marked with [`FakeProcesses::fail_pid`].
#[derive(Clone, Default)]
pub struct FakeProcesses {
    table: Rc<RefCell<ProcessTable>>,
}

impl FakeProcesses {
    pub fn spawn(&self, name: &str, pid: u32) {
        self.table.borrow_mut().running.push((name.to_string(), pid));
    }

    pub fn fail_pid(&self, pid: u32) {
        self.table.borrow_mut().failing.push(pid);
    }

    /// Every `signal_all` call, in order.
    pub fn calls(&self) -> Vec<(Vec<String>, TermSignal)> {
        self.table.borrow().calls.clone()
    }

    /// Signals actually delivered.
    pub fn signals(&self) -> Vec<SignalledProcess> {
        self.table.borrow().signals.clone()
    }
}

impl ProcessControl for FakeProcesses {
    fn is_running(&self, name: &str) -> bool {
        self.table
            .borrow()
            .running
            .iter()
            .any(|(running, _)| running.contains(name))
    }

    fn signal_all(&self, names: &[String], signal: TermSignal) -> TeardownReport {
        let mut table = self.table.borrow_mut();
        table.calls.push((names.to_vec(), signal));

        let mut report = TeardownReport::default();
        let targets: Vec<(String, u32)> = table
            .running
            .iter()
            .filter(|(name, _)| names.contains(name))
            .cloned()
            .collect();

        for (name, pid) in targets {
            if table.failing.contains(&pid) {
                report.failures.push(ProcessError::TerminationFailed {
                    name,
                    pid,
                    signal: signal.as_str(),
                });
                continue;
            }
            let delivered = SignalledProcess { name, pid, signal };
            table.running.retain(|(_, p)| *p != pid);
            table.signals.push(delivered.clone());
            report.signalled.push(delivered);
        }
        report
    }
}

// ============================================================================
// Launcher and status
// ============================================================================

#[derive(Default)]
struct LaunchLog {
    scratch_calls: usize,
    launched: Vec<LaunchTarget>,
}

#[derive(Clone, Default)]
pub struct RecordingLauncher {
    log: Rc<RefCell<LaunchLog>>,
    failing: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn scratch_calls(&self) -> usize {
        self.log.borrow().scratch_calls
    }

    pub fn launched(&self) -> Vec<LaunchTarget> {
        self.log.borrow().launched.clone()
    }
}

impl Launcher for RecordingLauncher {
    fn prepare_scratch(&self) -> Result<(), LaunchError> {
        self.log.borrow_mut().scratch_calls += 1;
        Ok(())
    }

    fn spawn_detached(&self, target: &LaunchTarget) -> Result<(), LaunchError> {
        if self.failing {
            return Err(LaunchError::Status {
                command: target.command_line(),
                status: "exit status: 1".to_string(),
            });
        }
        self.log.borrow_mut().launched.push(target.clone());
        Ok(())
    }
}

pub struct StaticRomStatus(pub Option<String>);

impl RomStatusSource for StaticRomStatus {
    fn active_rom(&self) -> Option<String> {
        self.0.clone()
    }
}
