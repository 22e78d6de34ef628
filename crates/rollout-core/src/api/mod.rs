//! Backend contract consumed by the console.
//!
//! The console only depends on the request/response shapes below. The HTTP
//! implementation lives in [`client`]; tests substitute scripted doubles.

pub mod client;
pub mod error;

use std::path::Path;

use async_trait::async_trait;

use crate::types::{
    Assessment, CreateTaskInput, ErrorCatalogItem, ExecuteScanInput, ExecuteScanResponse,
    ExportFormat, InstallerUpload, MetricsSummary, RecordScanInput, RunRef, Task,
    TaskDeploymentDetail,
};

pub use client::HttpConsoleApi;
pub use error::ApiError;

/// Operations offered by the deployment controller.
///
/// Object-safe so callers can hold an `Arc<dyn ConsoleApi>`.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// `POST /api/tasks`
    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ApiError>;

    /// `GET /api/tasks`
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;

    /// `POST /api/tasks/{id}/runs`
    async fn create_run(&self, task_id: &str) -> Result<RunRef, ApiError>;

    /// `PATCH /api/runs/{id}`
    ///
    /// Part of the contract; the console itself never updates runs.
    async fn update_run(&self, run_id: &str, status: &str) -> Result<RunRef, ApiError>;

    /// `POST /api/scans`
    async fn record_scan(&self, input: &RecordScanInput) -> Result<(), ApiError>;

    /// `GET /api/metrics`
    async fn metrics(&self) -> Result<MetricsSummary, ApiError>;

    /// `GET /api/errors`
    async fn error_catalog(&self) -> Result<Vec<ErrorCatalogItem>, ApiError>;

    /// `GET /api/assessments`
    async fn assessments(&self) -> Result<Vec<Assessment>, ApiError>;

    /// `GET /api/tasks/{id}/deployments`
    async fn task_deployments(&self, task_id: &str)
    -> Result<Vec<TaskDeploymentDetail>, ApiError>;

    /// `GET /api/tasks/{id}/exports/{format}`
    async fn export_report(&self, task_id: &str, format: ExportFormat)
    -> Result<Vec<u8>, ApiError>;

    /// `POST /api/scans/execute`
    async fn execute_scan(&self, input: &ExecuteScanInput)
    -> Result<ExecuteScanResponse, ApiError>;

    /// `POST /api/uploads/installer` with the file at `path` as multipart `file`.
    async fn upload_installer(&self, path: &Path) -> Result<InstallerUpload, ApiError>;
}
