//! Installer upload and assessment scan tracking.
//!
//! Both operations follow the same shape: `begin_*` updates the tracked
//! status and, unless demo mode answers synchronously, hands back a detached
//! job; the job's outcome is applied with `finish_*`. Failures always end up
//! as [`OperationStatus::Failed`], never as an error returned to the caller.
//!
//! Upload and scan are tracked independently. A second trigger of the same
//! kind while one is running is allowed here; front-ends disable the control
//! based on [`OperationStatus::is_in_progress`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::InstallerRef;
use crate::api::ConsoleApi;
use crate::demo;
use crate::source::DataSource;
use crate::types::{ExecuteScanInput, ExecuteScanResponse, InstallerUpload};

/// Lifecycle of one tracked operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationStatus<T> {
    #[default]
    Idle,
    InProgress,
    Completed(T),
    Failed(String),
}

impl<T> OperationStatus<T> {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, OperationStatus::InProgress)
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            OperationStatus::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            OperationStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Installer accepted by the controller (or simulated in demo mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerStaged {
    pub upload: InstallerUpload,
    pub simulated: bool,
}

impl InstallerStaged {
    /// `<os family> / <package type>`
    pub fn package_summary(&self) -> String {
        format!("{} / {}", self.upload.os_family, self.upload.package_type)
    }
}

/// Result of an assessment scan. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub target_count: u32,
    pub targets_scanned: u32,
    pub issues: Vec<String>,
    pub simulated: bool,
}

impl ScanSummary {
    /// `<n> scanned, <m> issues`
    pub fn summary(&self) -> String {
        format!("{} scanned, {} issues", self.targets_scanned, self.issues.len())
    }

    fn simulated() -> Self {
        Self {
            target_count: 220,
            targets_scanned: 198,
            issues: vec![
                "win-edge-04: authentication denied".to_string(),
                "lab-mac-02: required port closed".to_string(),
            ],
            simulated: true,
        }
    }
}

/// Pending installer upload.
pub struct UploadJob {
    api: Arc<dyn ConsoleApi>,
    path: PathBuf,
    generation: u64,
}

/// What an [`UploadJob`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    generation: u64,
    result: Result<InstallerUpload, String>,
}

impl UploadJob {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn run(self) -> UploadOutcome {
        let result = self
            .api
            .upload_installer(&self.path)
            .await
            .map_err(|err| err.to_string());
        UploadOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// Pending assessment scan.
pub struct ScanJob {
    api: Arc<dyn ConsoleApi>,
    input: ExecuteScanInput,
    generation: u64,
}

/// What a [`ScanJob`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    generation: u64,
    result: Result<ExecuteScanResponse, String>,
}

impl ScanJob {
    pub fn input(&self) -> &ExecuteScanInput {
        &self.input
    }

    pub async fn run(self) -> ScanOutcome {
        let result = self
            .api
            .execute_scan(&self.input)
            .await
            .map_err(|err| err.to_string());
        ScanOutcome {
            generation: self.generation,
            result,
        }
    }
}

/// How an upload trigger was answered.
pub enum UploadTrigger {
    /// Demo mode staged the installer synchronously.
    Staged(InstallerRef),
    /// The upload has to run; apply its outcome with `finish_upload`.
    Pending(UploadJob),
}

/// Status of the two wizard side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffectTracker {
    upload: OperationStatus<InstallerStaged>,
    upload_file_name: Option<String>,
    scan: OperationStatus<ScanSummary>,
    generation: u64,
}

impl SideEffectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&self) -> &OperationStatus<InstallerStaged> {
        &self.upload
    }

    pub fn scan(&self) -> &OperationStatus<ScanSummary> {
        &self.scan
    }

    /// Name of the most recently selected installer file.
    pub fn upload_file_name(&self) -> Option<&str> {
        self.upload_file_name.as_deref()
    }

    /// Operator-facing upload status line.
    pub fn upload_status(&self) -> Option<String> {
        match &self.upload {
            OperationStatus::Idle => None,
            OperationStatus::InProgress => Some("Uploading installer...".to_string()),
            OperationStatus::Completed(staged) if staged.simulated => {
                Some("Demo mode: installer staged".to_string())
            }
            OperationStatus::Completed(_) => Some("Installer uploaded and ready".to_string()),
            OperationStatus::Failed(message) => Some(message.clone()),
        }
    }

    /// Operator-facing scan status line.
    pub fn scan_status(&self) -> Option<String> {
        match &self.scan {
            OperationStatus::Idle => None,
            OperationStatus::InProgress => Some("Running assessment scan...".to_string()),
            OperationStatus::Completed(summary) if summary.simulated => {
                Some("Demo mode: assessment scan simulated".to_string())
            }
            OperationStatus::Completed(_) => Some("Assessment scan complete".to_string()),
            OperationStatus::Failed(_) => Some("Assessment scan failed".to_string()),
        }
    }

    /// Scan result line: the summary on success, the message on failure.
    pub fn scan_result(&self) -> Option<String> {
        match &self.scan {
            OperationStatus::Completed(summary) => Some(summary.summary()),
            OperationStatus::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Start uploading the file at `path`.
    pub fn begin_upload(&mut self, source: &DataSource, path: &Path) -> UploadTrigger {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.upload_file_name = Some(file_name.clone());

        if source.is_demo() {
            let upload = demo::installer_upload(source.base_url(), &file_name);
            let installer = InstallerRef::from(&upload);
            self.upload = OperationStatus::Completed(InstallerStaged {
                upload,
                simulated: true,
            });
            return UploadTrigger::Staged(installer);
        }

        debug!(file = %path.display(), "uploading installer");
        self.upload = OperationStatus::InProgress;
        UploadTrigger::Pending(UploadJob {
            api: Arc::clone(source.api()),
            path: path.to_path_buf(),
            generation: self.generation,
        })
    }

    /// Apply an upload outcome.
    ///
    /// Returns the installer reference to write into the draft on success.
    /// Outcomes from before the last [`reset`](Self::reset) are ignored.
    pub fn finish_upload(&mut self, outcome: UploadOutcome) -> Option<InstallerRef> {
        if outcome.generation != self.generation {
            debug!("ignoring upload outcome from a previous wizard session");
            return None;
        }
        match outcome.result {
            Ok(upload) => {
                let installer = InstallerRef::from(&upload);
                self.upload = OperationStatus::Completed(InstallerStaged {
                    upload,
                    simulated: false,
                });
                Some(installer)
            }
            Err(message) => {
                warn!(%message, "installer upload failed");
                self.upload = OperationStatus::Failed(message);
                None
            }
        }
    }

    /// Start an assessment scan. Demo mode completes immediately and returns `None`.
    pub fn begin_scan(
        &mut self,
        source: &DataSource,
        targets: Vec<String>,
        aggressiveness: u8,
    ) -> Option<ScanJob> {
        if source.is_demo() {
            self.scan = OperationStatus::Completed(ScanSummary::simulated());
            return None;
        }

        debug!(targets = targets.len(), aggressiveness, "starting assessment scan");
        self.scan = OperationStatus::InProgress;
        Some(ScanJob {
            api: Arc::clone(source.api()),
            input: ExecuteScanInput {
                targets,
                aggressiveness,
            },
            generation: self.generation,
        })
    }

    pub fn finish_scan(&mut self, outcome: ScanOutcome) {
        if outcome.generation != self.generation {
            debug!("ignoring scan outcome from a previous wizard session");
            return;
        }
        self.scan = match outcome.result {
            Ok(response) => OperationStatus::Completed(ScanSummary {
                target_count: response.target_count,
                targets_scanned: response.targets_scanned,
                issues: response.errors,
                simulated: false,
            }),
            Err(message) => {
                warn!(%message, "assessment scan failed");
                OperationStatus::Failed(message)
            }
        };
    }

    /// Back to idle; outstanding jobs will be ignored when they finish.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }
}
