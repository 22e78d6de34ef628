//! Scripted backend double shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rollout_core::api::{ApiError, ConsoleApi};
use rollout_core::dashboard::DashboardSnapshot;
use rollout_core::types::{
    Assessment, CreateTaskInput, ErrorCatalogItem, ExecuteScanInput, ExecuteScanResponse,
    ExportFormat, InstallerUpload, MetricsSummary, RecordScanInput, RunRef, Task,
    TaskDeploymentDetail,
};
use tokio::sync::Notify;
use url::Url;

pub fn base_url() -> Url {
    Url::parse("http://controller.test").unwrap()
}

pub fn task(id: &str, name: &str, status: &str) -> Task {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    Task {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        target_count: 12,
        created_at: at,
        updated_at: at,
    }
}

pub fn deployment(id: &str, target: &str, status: &str) -> TaskDeploymentDetail {
    TaskDeploymentDetail {
        id: id.to_string(),
        task_run_id: "run-1".to_string(),
        target_id: format!("target-{}", target),
        target_label: target.to_string(),
        target_os: "linux".to_string(),
        status: status.to_string(),
        auth_method: "ssh_key".to_string(),
        error_code: String::new(),
        error_message: String::new(),
        remediation: String::new(),
        finished_at: "2026-03-01T09:00:00Z".to_string(),
    }
}

pub fn live_metrics(total_tasks: u32) -> MetricsSummary {
    MetricsSummary {
        total_tasks,
        running_tasks: 1,
        success_tasks: 4,
        failed_tasks: 2,
        pending_tasks: 0,
        targets_total: 40,
        targets_scanned: 31,
        ..Default::default()
    }
}

pub fn live_tasks() -> Vec<Task> {
    vec![
        task("t-1", "Linux fleet", "success"),
        task("t-2", "Edge hosts", "failed"),
        task("t-3", "Lab machines", "running"),
    ]
}

pub fn live_errors() -> Vec<ErrorCatalogItem> {
    vec![ErrorCatalogItem {
        code: "timeout".to_string(),
        message: "Target did not answer".to_string(),
        remediation: "Check network reachability".to_string(),
        steps: vec!["Ping the host".to_string()],
    }]
}

pub fn live_assessments() -> Vec<Assessment> {
    vec![Assessment {
        target_id: "target-a".to_string(),
        label: "build-01".to_string(),
        os: "linux".to_string(),
        reachable: Some(true),
        open_ports: vec![22],
        predicted_success: 90,
        secure_method: "ssh_key".to_string(),
        guidelines: Vec::new(),
        scanned_at: "2026-03-01T07:30:00Z".to_string(),
    }]
}

/// What the mock serves by default for the four dashboard fetches.
pub fn live_snapshot() -> DashboardSnapshot {
    DashboardSnapshot {
        metrics: live_metrics(7),
        errors: live_errors(),
        tasks: live_tasks(),
        assessments: live_assessments(),
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateTask(CreateTaskInput),
    ListTasks,
    CreateRun(String),
    UpdateRun(String, String),
    RecordScan(RecordScanInput),
    Metrics,
    ErrorCatalog,
    Assessments,
    TaskDeployments(String),
    ExportReport(String, ExportFormat),
    ExecuteScan(ExecuteScanInput),
    UploadInstaller(PathBuf),
}

/// Backend double answering every call from a per-endpoint slot.
///
/// Slots can be replaced while the mock is shared, and the metrics fetch can
/// be held on a gate to keep a refresh cycle in flight.
pub struct MockConsoleApi {
    calls: Mutex<Vec<Call>>,
    metrics: Mutex<Result<MetricsSummary, ApiError>>,
    errors: Mutex<Result<Vec<ErrorCatalogItem>, ApiError>>,
    tasks: Mutex<Result<Vec<Task>, ApiError>>,
    assessments: Mutex<Result<Vec<Assessment>, ApiError>>,
    created_task: Mutex<Result<Task, ApiError>>,
    run: Mutex<Result<RunRef, ApiError>>,
    deployments: Mutex<Result<Vec<TaskDeploymentDetail>, ApiError>>,
    report: Mutex<Result<Vec<u8>, ApiError>>,
    scan: Mutex<Result<ExecuteScanResponse, ApiError>>,
    upload: Mutex<Result<InstallerUpload, ApiError>>,
    metrics_entered: Notify,
    metrics_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockConsoleApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            metrics: Mutex::new(Ok(live_metrics(7))),
            errors: Mutex::new(Ok(live_errors())),
            tasks: Mutex::new(Ok(live_tasks())),
            assessments: Mutex::new(Ok(live_assessments())),
            created_task: Mutex::new(Ok(task("t-new", "February rollout", "pending"))),
            run: Mutex::new(Ok(RunRef {
                id: "run-1".to_string(),
            })),
            deployments: Mutex::new(Ok(Vec::new())),
            report: Mutex::new(Ok(b"target,status\n".to_vec())),
            scan: Mutex::new(Ok(ExecuteScanResponse {
                target_count: 2,
                targets_scanned: 2,
                errors: Vec::new(),
            })),
            upload: Mutex::new(Ok(InstallerUpload {
                url: "https://ctl.example/uploads/inst-7.pkg".to_string(),
                filename: "agent.pkg".to_string(),
                checksum: "sha256:abc123".to_string(),
                installer_id: "inst-7".to_string(),
                package_type: "pkg".to_string(),
                os_family: "macos".to_string(),
            })),
            metrics_entered: Notify::new(),
            metrics_gate: Mutex::new(None),
        }
    }

    /// Hold every metrics fetch until `gate` is notified.
    pub fn with_metrics_gate(self, gate: Arc<Notify>) -> Self {
        *self.metrics_gate.lock().unwrap() = Some(gate);
        self
    }

    /// Notified each time a metrics fetch starts.
    pub fn metrics_entered(&self) -> &Notify {
        &self.metrics_entered
    }

    pub fn set_metrics(&self, result: Result<MetricsSummary, ApiError>) {
        *self.metrics.lock().unwrap() = result;
    }

    pub fn set_assessments(&self, result: Result<Vec<Assessment>, ApiError>) {
        *self.assessments.lock().unwrap() = result;
    }

    pub fn set_created_task(&self, result: Result<Task, ApiError>) {
        *self.created_task.lock().unwrap() = result;
    }

    pub fn set_run(&self, result: Result<RunRef, ApiError>) {
        *self.run.lock().unwrap() = result;
    }

    pub fn set_deployments(&self, result: Result<Vec<TaskDeploymentDetail>, ApiError>) {
        *self.deployments.lock().unwrap() = result;
    }

    pub fn set_report(&self, result: Result<Vec<u8>, ApiError>) {
        *self.report.lock().unwrap() = result;
    }

    pub fn set_scan(&self, result: Result<ExecuteScanResponse, ApiError>) {
        *self.scan.lock().unwrap() = result;
    }

    pub fn set_upload(&self, result: Result<InstallerUpload, ApiError>) {
        *self.upload.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn answer<T: Clone>(slot: &Mutex<Result<T, ApiError>>) -> Result<T, ApiError> {
    slot.lock().unwrap().clone()
}

/// Status error carrying `body` the way the HTTP client builds it.
pub fn status_error(status: u16, body: &str) -> ApiError {
    ApiError::status(status, body, "Request failed")
}

#[async_trait]
impl ConsoleApi for MockConsoleApi {
    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ApiError> {
        self.record(Call::CreateTask(input.clone()));
        answer(&self.created_task)
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.record(Call::ListTasks);
        answer(&self.tasks)
    }

    async fn create_run(&self, task_id: &str) -> Result<RunRef, ApiError> {
        self.record(Call::CreateRun(task_id.to_string()));
        answer(&self.run)
    }

    async fn update_run(&self, run_id: &str, status: &str) -> Result<RunRef, ApiError> {
        self.record(Call::UpdateRun(run_id.to_string(), status.to_string()));
        Ok(RunRef {
            id: run_id.to_string(),
        })
    }

    async fn record_scan(&self, input: &RecordScanInput) -> Result<(), ApiError> {
        self.record(Call::RecordScan(input.clone()));
        Ok(())
    }

    async fn metrics(&self) -> Result<MetricsSummary, ApiError> {
        self.record(Call::Metrics);
        self.metrics_entered.notify_one();
        let gate = self.metrics_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        answer(&self.metrics)
    }

    async fn error_catalog(&self) -> Result<Vec<ErrorCatalogItem>, ApiError> {
        self.record(Call::ErrorCatalog);
        answer(&self.errors)
    }

    async fn assessments(&self) -> Result<Vec<Assessment>, ApiError> {
        self.record(Call::Assessments);
        answer(&self.assessments)
    }

    async fn task_deployments(
        &self,
        task_id: &str,
    ) -> Result<Vec<TaskDeploymentDetail>, ApiError> {
        self.record(Call::TaskDeployments(task_id.to_string()));
        answer(&self.deployments)
    }

    async fn export_report(
        &self,
        task_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ApiError> {
        self.record(Call::ExportReport(task_id.to_string(), format));
        answer(&self.report)
    }

    async fn execute_scan(
        &self,
        input: &ExecuteScanInput,
    ) -> Result<ExecuteScanResponse, ApiError> {
        self.record(Call::ExecuteScan(input.clone()));
        answer(&self.scan)
    }

    async fn upload_installer(&self, path: &Path) -> Result<InstallerUpload, ApiError> {
        self.record(Call::UploadInstaller(path.to_path_buf()));
        answer(&self.upload)
    }
}
