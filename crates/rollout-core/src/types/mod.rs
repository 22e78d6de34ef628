//! Wire types shared by the backend contract, the demo dataset and the views.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A named deployment campaign targeting a set of hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Backend status string (`pending`, `running`, `success`, `failed`, `canceled`).
    pub status: String,
    pub target_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counters behind the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub total_tasks: u32,
    pub running_tasks: u32,
    pub success_tasks: u32,
    pub failed_tasks: u32,
    pub pending_tasks: u32,
    pub targets_total: u32,
    pub targets_scanned: u32,
    #[serde(default)]
    pub failure_reasons: BTreeMap<String, u32>,
    #[serde(default, rename = "successByOS")]
    pub success_by_os: BTreeMap<String, u32>,
    #[serde(default, rename = "failureByOS")]
    pub failure_by_os: BTreeMap<String, u32>,
    #[serde(default)]
    pub auth_methods: BTreeMap<String, u32>,
}

/// Known failure code with operator-facing remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCatalogItem {
    pub code: String,
    pub message: String,
    pub remediation: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Pre-deployment readiness evaluation of a single target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub target_id: String,
    pub label: String,
    pub os: String,
    /// `None` when the target has not been probed yet.
    pub reachable: Option<bool>,
    #[serde(default)]
    pub open_ports: Vec<u16>,
    pub predicted_success: u32,
    pub secure_method: String,
    #[serde(default)]
    pub guidelines: Vec<String>,
    #[serde(default)]
    pub scanned_at: String,
}

/// Outcome of one task on one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeploymentDetail {
    pub id: String,
    pub task_run_id: String,
    pub target_id: String,
    pub target_label: String,
    #[serde(rename = "targetOS")]
    pub target_os: String,
    pub status: String,
    pub auth_method: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub finished_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub name: String,
    pub target_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordScanInput {
    pub target_count: u32,
    pub targets_scanned: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteScanInput {
    pub targets: Vec<String>,
    pub aggressiveness: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteScanResponse {
    pub target_count: u32,
    pub targets_scanned: u32,
    /// The controller sends `null` when the scan reported no issues.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier envelope returned by run creation and run updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRef {
    pub id: String,
}

/// Installer hosted by the controller after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallerUpload {
    pub url: String,
    pub filename: String,
    pub checksum: String,
    pub installer_id: String,
    pub package_type: String,
    pub os_family: String,
}

/// Report formats offered by the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Suggested file name for a task report.
    pub fn file_name(&self, task_id: &str) -> String {
        format!("task-{}-deployments.{}", task_id, self.as_str())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome class used to filter tasks and deployment rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Success,
    Failed,
}

impl StatusFilter {
    /// The backend status string this filter matches exactly.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Success => "success",
            StatusFilter::Failed => "failed",
        }
    }

    pub fn matches(&self, status: &str) -> bool {
        status == self.as_str()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
