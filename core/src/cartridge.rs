//! Cartridge state held by the control loop

use serde::{Deserialize, Serialize};

use crate::validator::LaunchTarget;

/// What a failed read does to a cartridge that is already armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedReadPolicy {
    /// Tolerate noisy re-reads: the previous cartridge stays armed
    #[default]
    Keep,
    /// Any failed read disarms
    Disarm,
}

/// Armed/unarmed status plus the resolved launch target.
///
/// Being armed and holding a target are the same thing: there is no way to
/// be armed with an empty or unvalidated launch path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartridgeState {
    target: Option<LaunchTarget>,
}

impl CartridgeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.target.is_some()
    }

    /// Console of the armed cartridge.
    pub fn console(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.console.as_str())
    }

    pub fn target(&self) -> Option<&LaunchTarget> {
        self.target.as_ref()
    }

    /// Arm with a freshly validated target, replacing any previous one.
    pub fn arm(&mut self, target: LaunchTarget) {
        self.target = Some(target);
    }

    pub fn disarm(&mut self) {
        self.target = None;
    }

    /// Apply a failed validation according to `policy`.
    pub fn reject(&mut self, policy: FailedReadPolicy) {
        if policy == FailedReadPolicy::Disarm {
            self.disarm();
        }
    }
}
