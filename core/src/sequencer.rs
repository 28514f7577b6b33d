//! Launch and stop sequences driven by the console's power switch

use std::thread;
use std::time::Duration;

use crate::cartridge::CartridgeState;
use crate::error::{LaunchError, TransportError};
use crate::host::{Launcher, ProcessControl, RomStatusSource, TeardownReport, TermSignal};
use crate::protocol::Outbound;
use crate::systems::ManagedProcessSet;
use crate::transport::Outbox;

/// Result of pressing the launch button.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// No valid cartridge; nothing was touched
    NotArmed,
    /// The launcher was invoked
    Launched(TeardownReport),
    /// Teardown ran but the emulator could not be started
    Failed {
        teardown: TeardownReport,
        error: LaunchError,
    },
}

/// Result of pressing the stop button.
#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// The frontend is running, so the game belongs to it and was left alone
    FrontendActive { reported: Option<String> },
    /// No frontend behind the game: emulators were torn down
    TornDown(TeardownReport),
}

/// Settings for [`Sequencer`].
#[derive(Debug, Clone)]
pub struct SequencerSettings {
    pub processes: ManagedProcessSet,
    /// Name used to detect a running frontend shell
    pub frontend_process: String,
    /// Time the emulator gets to claim the terminal
    pub post_launch_delay: Duration,
}

pub struct Sequencer {
    settings: SequencerSettings,
    processes: Box<dyn ProcessControl>,
    launcher: Box<dyn Launcher>,
    status: Box<dyn RomStatusSource>,
}

impl Sequencer {
    pub fn new(
        settings: SequencerSettings,
        processes: Box<dyn ProcessControl>,
        launcher: Box<dyn Launcher>,
        status: Box<dyn RomStatusSource>,
    ) -> Self {
        Self {
            settings,
            processes,
            launcher,
            status,
        }
    }

    /// Launch the armed cartridge.
    ///
    /// Tears down every emulator and the frontend, hands the scratch
    /// directory back to the frontend account, starts the emulator detached
    /// and waits the post-launch delay. Nothing is retried. The cartridge
    /// stays armed either way.
    pub fn launch(&self, cart: &CartridgeState) -> LaunchOutcome {
        let Some(target) = cart.target() else {
            tracing::info!("No valid cartridge inserted");
            return LaunchOutcome::NotArmed;
        };

        let teardown = self.teardown(&self.settings.processes.launch_teardown());

        if let Err(e) = self.launcher.prepare_scratch() {
            tracing::warn!("Could not fix scratch directory ownership: {}", e);
        }

        tracing::info!(command = %target.command_line(), "Launching cartridge");
        if let Err(error) = self.launcher.spawn_detached(target) {
            tracing::error!("Launch failed: {}", error);
            return LaunchOutcome::Failed { teardown, error };
        }

        if !self.settings.post_launch_delay.is_zero() {
            thread::sleep(self.settings.post_launch_delay);
        }

        LaunchOutcome::Launched(teardown)
    }

    /// Handle the stop button.
    ///
    /// Tells the reader it may scan again, then closes a cartridge-launched
    /// game. A game started from the frontend is left running; the only way
    /// to tell the two apart is whether the frontend process is alive.
    pub fn stop(&self, outbox: &mut dyn Outbox) -> Result<StopOutcome, TransportError> {
        outbox.send(&Outbound::Ready)?;

        if self.processes.is_running(&self.settings.frontend_process) {
            tracing::info!(
                frontend = %self.settings.frontend_process,
                "Frontend is running, leaving its game alone"
            );
            let reported = self.status.active_rom();
            if let Some(rom) = &reported {
                outbox.send(&Outbound::RomStatus(rom.clone()))?;
            }
            return Ok(StopOutcome::FrontendActive { reported });
        }

        let teardown = self.teardown(self.settings.processes.stop_teardown());
        Ok(StopOutcome::TornDown(teardown))
    }

    /// Graceful pass over `names`, then the forced pass.
    fn teardown(&self, names: &[String]) -> TeardownReport {
        let mut report = self.processes.signal_all(names, TermSignal::Graceful);
        report.merge(
            self.processes
                .signal_all(&self.settings.processes.force_kill, TermSignal::Forced),
        );

        for process in &report.signalled {
            tracing::info!(
                name = %process.name,
                pid = process.pid,
                signal = %process.signal,
                "Stopping process"
            );
        }
        for failure in &report.failures {
            tracing::warn!("{}", failure);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::host::SignalledProcess;
    use crate::test_utils::{
        FakeProcesses, RecordingLauncher, RecordingOutbox, StaticRomStatus, test_target,
    };

    fn sequencer(
        processes: &FakeProcesses,
        launcher: &RecordingLauncher,
        status: Option<&str>,
    ) -> Sequencer {
        Sequencer::new(
            SequencerSettings {
                processes: ManagedProcessSet::default(),
                frontend_process: "emulationstation".into(),
                post_launch_delay: Duration::ZERO,
            },
            Box::new(processes.clone()),
            Box::new(launcher.clone()),
            Box::new(StaticRomStatus(status.map(String::from))),
        )
    }

    #[test]
    fn test_launch_when_unarmed_is_noop() {
        let processes = FakeProcesses::default();
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, None);

        let outcome = seq.launch(&CartridgeState::new());

        assert!(matches!(outcome, LaunchOutcome::NotArmed));
        assert!(processes.calls().is_empty());
        assert_eq!(launcher.scratch_calls(), 0);
        assert!(launcher.launched().is_empty());
    }

    #[test]
    fn test_launch_tears_down_then_spawns() {
        let processes = FakeProcesses::default();
        processes.spawn("retroarch", 101);
        processes.spawn("emulationstatio", 102);
        processes.spawn("kodi.bin", 103);
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, None);

        let mut cart = CartridgeState::new();
        cart.arm(test_target("nes", "game.nes"));
        let outcome = seq.launch(&cart);

        let LaunchOutcome::Launched(report) = outcome else {
            panic!("expected launch");
        };
        assert_eq!(
            report.signalled,
            vec![
                SignalledProcess {
                    name: "retroarch".into(),
                    pid: 101,
                    signal: TermSignal::Graceful
                },
                SignalledProcess {
                    name: "emulationstatio".into(),
                    pid: 102,
                    signal: TermSignal::Graceful
                },
                SignalledProcess {
                    name: "kodi.bin".into(),
                    pid: 103,
                    signal: TermSignal::Forced
                },
            ]
        );
        assert_eq!(launcher.scratch_calls(), 1);
        assert_eq!(launcher.launched(), vec![test_target("nes", "game.nes")]);
        assert!(cart.is_armed());
    }

    #[test]
    fn test_launch_continues_after_termination_failure() {
        let processes = FakeProcesses::default();
        processes.spawn("retroarch", 7);
        processes.fail_pid(7);
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, None);

        let mut cart = CartridgeState::new();
        cart.arm(test_target("snes", "zelda.sfc"));

        let LaunchOutcome::Launched(report) = seq.launch(&cart) else {
            panic!("expected launch");
        };
        assert_eq!(
            report.failures,
            vec![ProcessError::TerminationFailed {
                name: "retroarch".into(),
                pid: 7,
                signal: "SIGTERM"
            }]
        );
        assert_eq!(launcher.launched().len(), 1);
    }

    #[test]
    fn test_launch_failure_is_surfaced() {
        let processes = FakeProcesses::default();
        let launcher = RecordingLauncher::failing();
        let seq = sequencer(&processes, &launcher, None);

        let mut cart = CartridgeState::new();
        cart.arm(test_target("gb", "tetris.gb"));

        assert!(matches!(seq.launch(&cart), LaunchOutcome::Failed { .. }));
    }

    #[test]
    fn test_stop_with_frontend_alive_kills_nothing() {
        let processes = FakeProcesses::default();
        processes.spawn("emulationstation", 10);
        processes.spawn("retroarch", 11);
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, Some("rom/nes/zelda.nes"));
        let mut outbox = RecordingOutbox::default();

        let outcome = seq.stop(&mut outbox).unwrap();

        assert_eq!(
            outcome,
            StopOutcome::FrontendActive {
                reported: Some("rom/nes/zelda.nes".into())
            }
        );
        assert!(processes.signals().is_empty());
        assert_eq!(
            outbox.sent(),
            vec![
                Outbound::Ready,
                Outbound::RomStatus("rom/nes/zelda.nes".into())
            ]
        );
    }

    #[test]
    fn test_stop_without_frontend_tears_down_emulators() {
        let processes = FakeProcesses::default();
        processes.spawn("retroarch", 11);
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, None);
        let mut outbox = RecordingOutbox::default();

        let outcome = seq.stop(&mut outbox).unwrap();

        let StopOutcome::TornDown(report) = outcome else {
            panic!("expected teardown");
        };
        assert_eq!(report.signalled.len(), 1);
        assert_eq!(report.signalled[0].name, "retroarch");
        assert_eq!(outbox.sent(), vec![Outbound::Ready]);
    }

    #[test]
    fn test_stop_never_signals_frontend() {
        let processes = FakeProcesses::default();
        let launcher = RecordingLauncher::default();
        let seq = sequencer(&processes, &launcher, None);
        let mut outbox = RecordingOutbox::default();

        seq.stop(&mut outbox).unwrap();

        let graceful: Vec<_> = processes
            .calls()
            .into_iter()
            .filter(|(_, signal)| *signal == TermSignal::Graceful)
            .flat_map(|(names, _)| names)
            .collect();
        assert!(!graceful.iter().any(|n| n == "emulationstation"));
    }
}
