//! Fixed dataset used in demo mode.
//!
//! Everything here is deterministic so demo sessions look the same on every
//! run and tests can assert on exact values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::dashboard::DashboardSnapshot;
use crate::types::{
    Assessment, ErrorCatalogItem, InstallerUpload, MetricsSummary, Task, TaskDeploymentDetail,
};

pub const TASK_CREATED_MESSAGE: &str = "Demo mode: task created (simulation)";
pub const SCAN_SUMMARY: &str = "198 scanned, 2 issues";

/// 2026-02-02T10:00:00Z
const DEMO_TIMESTAMP: i64 = 1_770_026_400;

fn histogram(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
    entries
        .iter()
        .map(|(label, value)| (label.to_string(), *value))
        .collect()
}

pub fn metrics() -> MetricsSummary {
    MetricsSummary {
        total_tasks: 18,
        running_tasks: 2,
        success_tasks: 13,
        failed_tasks: 3,
        pending_tasks: 3,
        targets_total: 220,
        targets_scanned: 198,
        failure_reasons: histogram(&[("auth_denied", 2), ("port_closed", 1)]),
        success_by_os: histogram(&[("linux", 8), ("windows", 4), ("macos", 1)]),
        failure_by_os: histogram(&[("windows", 2), ("linux", 1)]),
        auth_methods: histogram(&[
            ("ssh_key", 9),
            ("winrm_https_cert", 3),
            ("winrm_https_userpass", 1),
        ]),
    }
}

pub fn error_catalog() -> Vec<ErrorCatalogItem> {
    vec![
        ErrorCatalogItem {
            code: "auth_denied".into(),
            message: "Authentication denied".into(),
            remediation: "Ensure key access and verify target-side authorization policies."
                .into(),
            steps: vec![
                "Verify the account or key has access on the target.".into(),
                "Check the target auth policy and permissions.".into(),
                "Retry with key-based auth first, then password if needed.".into(),
            ],
        },
        ErrorCatalogItem {
            code: "port_closed".into(),
            message: "Required port closed".into(),
            remediation: "Enable SSH or WinRM and restrict access to the controller subnet."
                .into(),
            steps: vec![
                "Enable SSH (22) or WinRM HTTPS (5986) on the target.".into(),
                "Restrict access to the controller subnet.".into(),
                "Re-run the assessment scan.".into(),
            ],
        },
    ]
}

pub fn tasks() -> Vec<Task> {
    let at = DateTime::<Utc>::from_timestamp(DEMO_TIMESTAMP, 0).unwrap_or_default();
    vec![Task {
        id: "demo-1".into(),
        name: "February rollout".into(),
        status: "running".into(),
        target_count: 120,
        created_at: at,
        updated_at: at,
    }]
}

pub fn assessments() -> Vec<Assessment> {
    vec![
        Assessment {
            target_id: "demo-target-1".into(),
            label: "core-db-01".into(),
            os: "linux".into(),
            reachable: Some(true),
            open_ports: vec![22],
            predicted_success: 92,
            secure_method: "SSH key authentication".into(),
            guidelines: vec![
                "Restrict SSH access to the controller subnet.".into(),
                "Use short-lived SSH keys.".into(),
            ],
            scanned_at: "2026-02-02 10:45:00 PST".into(),
        },
        Assessment {
            target_id: "demo-target-2".into(),
            label: "win-edge-04".into(),
            os: "windows".into(),
            reachable: Some(true),
            open_ports: vec![5986],
            predicted_success: 86,
            secure_method: "WinRM HTTPS (certificate)".into(),
            guidelines: vec![
                "Ensure certificate chain is trusted.".into(),
                "Limit WinRM to HTTPS only.".into(),
            ],
            scanned_at: "2026-02-02 10:44:12 PST".into(),
        },
    ]
}

/// The complete snapshot installed when demo mode is mounted.
pub fn snapshot() -> DashboardSnapshot {
    DashboardSnapshot {
        metrics: metrics(),
        errors: error_catalog(),
        tasks: tasks(),
        assessments: assessments(),
    }
}

/// Deployment rows shown for any selected task in demo mode.
pub fn task_deployments() -> Vec<TaskDeploymentDetail> {
    vec![
        TaskDeploymentDetail {
            id: "demo-deploy-1".into(),
            task_run_id: "demo-run".into(),
            target_id: "demo-target-1".into(),
            target_label: "core-db-01".into(),
            target_os: "linux".into(),
            status: "success".into(),
            auth_method: "ssh_key".into(),
            error_code: String::new(),
            error_message: String::new(),
            remediation: String::new(),
            finished_at: "2026-02-02T10:45:00Z".into(),
        },
        TaskDeploymentDetail {
            id: "demo-deploy-2".into(),
            task_run_id: "demo-run".into(),
            target_id: "demo-target-2".into(),
            target_label: "win-edge-04".into(),
            target_os: "windows".into(),
            status: "failed".into(),
            auth_method: "winrm_https_cert".into(),
            error_code: "auth_denied".into(),
            error_message: "Authentication denied".into(),
            remediation: "Verify credentials and retry with certificate auth".into(),
            finished_at: "2026-02-02T10:46:00Z".into(),
        },
    ]
}

/// Staged installer reported for any file selected in demo mode.
pub fn installer_upload(base_url: &Url, file_name: &str) -> InstallerUpload {
    InstallerUpload {
        url: format!(
            "{}/uploads/demo-installer.bin",
            base_url.as_str().trim_end_matches('/')
        ),
        filename: file_name.to_string(),
        checksum: "demo-checksum".into(),
        installer_id: "demo-installer".into(),
        package_type: "binary".into(),
        os_family: "any".into(),
    }
}

/// Render deployment rows as the CSV report the backend would export.
pub fn render_csv(rows: &[TaskDeploymentDetail]) -> Vec<u8> {
    let mut out = String::from(
        "target,os,status,auth_method,error_code,error_message,remediation,finished_at\n",
    );
    for row in rows {
        let fields = [
            row.target_label.as_str(),
            row.target_os.as_str(),
            row.status.as_str(),
            row.auth_method.as_str(),
            row.error_code.as_str(),
            row.error_message.as_str(),
            row.remediation.as_str(),
            row.finished_at.as_str(),
        ];
        let line: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
