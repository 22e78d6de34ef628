//! Task-creation wizard.
//!
//! The wizard is a five-step state machine over a [`WizardDraft`]. Forward
//! navigation is gated by validation of the fields the current step owns;
//! installer upload and assessment scan run as detached jobs tracked by
//! [`SideEffectTracker`].

pub mod controller;
pub mod side_effects;
pub mod validation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::InstallerUpload;

pub use controller::{SubmitJob, SubmitOutcome, SubmitResult, SubmitStart, WizardController};
pub use side_effects::{
    InstallerStaged, OperationStatus, ScanJob, ScanOutcome, ScanSummary, SideEffectTracker,
    UploadJob, UploadOutcome, UploadTrigger,
};
pub use validation::ValidationErrors;

pub const MIN_AGGRESSIVENESS: u8 = 1;
pub const MAX_AGGRESSIVENESS: u8 = 5;
pub const DEFAULT_AGGRESSIVENESS: u8 = 3;

/// Ordered wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Targets,
    Credentials,
    Installer,
    Schedule,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Targets,
        WizardStep::Credentials,
        WizardStep::Installer,
        WizardStep::Schedule,
        WizardStep::Review,
    ];

    pub const FIRST: WizardStep = WizardStep::Targets;
    pub const LAST: WizardStep = WizardStep::Review;

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Step at `index`, clamped to the valid range.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    pub fn label(&self) -> &'static str {
        match self {
            WizardStep::Targets => "Targets",
            WizardStep::Credentials => "Credentials",
            WizardStep::Installer => "Installer",
            WizardStep::Schedule => "Schedule",
            WizardStep::Review => "Review",
        }
    }

    /// Fields validated when leaving this step (or submitting, for Review).
    pub fn fields(&self) -> &'static [Field] {
        match self {
            WizardStep::Targets => &[Field::TaskName, Field::Targets, Field::Aggressiveness],
            WizardStep::Credentials => &[
                Field::SshUsername,
                Field::SshPassword,
                Field::SshPrivateKey,
                Field::WinrmUsername,
                Field::WinrmPassword,
            ],
            WizardStep::Installer => &[Field::InstallerUrl],
            WizardStep::Schedule => &[Field::ScheduleMode, Field::StartAt],
            WizardStep::Review => &[Field::TaskName, Field::Targets, Field::InstallerUrl],
        }
    }

    /// Fields shown for editing on this step.
    pub fn editable_fields(&self) -> &'static [Field] {
        match self {
            WizardStep::Installer => &[Field::InstallerUrl, Field::Checksum, Field::InstallerId],
            WizardStep::Review => &[],
            other => other.fields(),
        }
    }

    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Self {
        Self::from_index(self.index().saturating_sub(1))
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Individually addressable draft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    TaskName,
    Targets,
    Aggressiveness,
    SshUsername,
    SshPassword,
    SshPrivateKey,
    WinrmUsername,
    WinrmPassword,
    InstallerUrl,
    Checksum,
    InstallerId,
    ScheduleMode,
    StartAt,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::TaskName => "Task name",
            Field::Targets => "Targets (hostnames, IPs, CIDR)",
            Field::Aggressiveness => "Scan aggressiveness (1-5)",
            Field::SshUsername => "SSH username",
            Field::SshPassword => "SSH password",
            Field::SshPrivateKey => "SSH private key",
            Field::WinrmUsername => "WinRM username",
            Field::WinrmPassword => "WinRM password",
            Field::InstallerUrl => "Installer URL",
            Field::Checksum => "SHA256 checksum",
            Field::InstallerId => "Installer ID",
            Field::ScheduleMode => "Schedule",
            Field::StartAt => "Start time",
        }
    }

    /// Values that should be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Field::SshPassword | Field::SshPrivateKey | Field::WinrmPassword
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// When the task should start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    #[default]
    Immediate,
    Deferred,
}

impl ScheduleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleMode::Immediate => "immediate",
            ScheduleMode::Deferred => "deferred",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "immediate" | "now" => Some(ScheduleMode::Immediate),
            "deferred" | "later" => Some(ScheduleMode::Deferred),
            _ => None,
        }
    }
}

/// Installer reference. Replaced as a whole so URL and checksum never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerRef {
    pub url: String,
    pub checksum: String,
    pub installer_id: String,
}

impl From<&InstallerUpload> for InstallerRef {
    fn from(upload: &InstallerUpload) -> Self {
        Self {
            url: upload.url.clone(),
            checksum: upload.checksum.clone(),
            installer_id: upload.installer_id.clone(),
        }
    }
}

/// In-progress form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardDraft {
    pub task_name: String,
    pub targets: String,
    pub aggressiveness: u8,
    pub ssh_username: String,
    pub ssh_password: String,
    pub ssh_private_key: String,
    pub winrm_username: String,
    pub winrm_password: String,
    pub installer: InstallerRef,
    pub schedule: ScheduleMode,
    pub start_at: String,
}

impl Default for WizardDraft {
    fn default() -> Self {
        Self {
            task_name: String::new(),
            targets: String::new(),
            aggressiveness: DEFAULT_AGGRESSIVENESS,
            ssh_username: String::new(),
            ssh_password: String::new(),
            ssh_private_key: String::new(),
            winrm_username: String::new(),
            winrm_password: String::new(),
            installer: InstallerRef::default(),
            schedule: ScheduleMode::default(),
            start_at: String::new(),
        }
    }
}

impl WizardDraft {
    /// Current value of a field as text.
    pub fn value(&self, field: Field) -> String {
        match field {
            Field::TaskName => self.task_name.clone(),
            Field::Targets => self.targets.clone(),
            Field::Aggressiveness => self.aggressiveness.to_string(),
            Field::SshUsername => self.ssh_username.clone(),
            Field::SshPassword => self.ssh_password.clone(),
            Field::SshPrivateKey => self.ssh_private_key.clone(),
            Field::WinrmUsername => self.winrm_username.clone(),
            Field::WinrmPassword => self.winrm_password.clone(),
            Field::InstallerUrl => self.installer.url.clone(),
            Field::Checksum => self.installer.checksum.clone(),
            Field::InstallerId => self.installer.installer_id.clone(),
            Field::ScheduleMode => self.schedule.as_str().to_string(),
            Field::StartAt => self.start_at.clone(),
        }
    }

    /// Set a field from text input.
    ///
    /// Only fails when the text cannot be represented at all (a non-numeric
    /// aggressiveness, an unknown schedule mode); range checks are left to
    /// validation.
    pub fn set(&mut self, field: Field, raw: &str) -> Result<(), String> {
        match field {
            Field::TaskName => self.task_name = raw.to_string(),
            Field::Targets => self.targets = raw.to_string(),
            Field::Aggressiveness => {
                self.aggressiveness = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("Aggressiveness must be a number, got '{}'", raw))?;
            }
            Field::SshUsername => self.ssh_username = raw.to_string(),
            Field::SshPassword => self.ssh_password = raw.to_string(),
            Field::SshPrivateKey => self.ssh_private_key = raw.to_string(),
            Field::WinrmUsername => self.winrm_username = raw.to_string(),
            Field::WinrmPassword => self.winrm_password = raw.to_string(),
            Field::InstallerUrl => self.installer.url = raw.to_string(),
            Field::Checksum => self.installer.checksum = raw.to_string(),
            Field::InstallerId => self.installer.installer_id = raw.to_string(),
            Field::ScheduleMode => {
                self.schedule = ScheduleMode::parse(raw)
                    .ok_or_else(|| format!("Unknown schedule mode '{}'", raw))?;
            }
            Field::StartAt => self.start_at = raw.to_string(),
        }
        Ok(())
    }

    /// Replace the installer reference as one step.
    pub fn apply_installer(&mut self, installer: InstallerRef) {
        self.installer = installer;
    }

    pub fn parsed_targets(&self) -> Vec<String> {
        crate::targets::parse_targets(&self.targets)
    }
}
