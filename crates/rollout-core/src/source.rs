//! Switch between the live backend and the demo dataset.
//!
//! Consumers always see the same shapes; only the origin of the data differs.
//! In demo mode the backend handle is never touched.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::api::{ApiError, ConsoleApi, HttpConsoleApi};
use crate::config::ConsoleConfig;
use crate::dashboard::DashboardSnapshot;
use crate::demo;
use crate::types::{ExportFormat, TaskDeploymentDetail};

/// Where console data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceMode {
    #[default]
    Live,
    Demo,
}

impl SourceMode {
    pub fn from_demo_flag(demo: bool) -> Self {
        if demo { SourceMode::Demo } else { SourceMode::Live }
    }

    pub fn is_demo(&self) -> bool {
        *self == SourceMode::Demo
    }

    pub fn toggled(&self) -> Self {
        match self {
            SourceMode::Live => SourceMode::Demo,
            SourceMode::Demo => SourceMode::Live,
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::Live => f.write_str("live"),
            SourceMode::Demo => f.write_str("demo"),
        }
    }
}

/// Backend handle plus the active mode.
///
/// Cheap to clone; switching modes produces a new value sharing the backend.
#[derive(Clone)]
pub struct DataSource {
    api: Arc<dyn ConsoleApi>,
    base_url: Url,
    mode: SourceMode,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("base_url", &self.base_url.as_str())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl DataSource {
    pub fn new(api: Arc<dyn ConsoleApi>, base_url: Url, mode: SourceMode) -> Self {
        Self {
            api,
            base_url,
            mode,
        }
    }

    /// HTTP backend for `config`, starting in the configured mode.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let api = HttpConsoleApi::from_config(config)?;
        Ok(Self::new(
            Arc::new(api),
            config.base_url.clone(),
            SourceMode::from_demo_flag(config.demo_mode),
        ))
    }

    pub fn with_mode(&self, mode: SourceMode) -> Self {
        Self {
            api: Arc::clone(&self.api),
            base_url: self.base_url.clone(),
            mode,
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn is_demo(&self) -> bool {
        self.mode.is_demo()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The backend handle, regardless of mode.
    pub fn api(&self) -> &Arc<dyn ConsoleApi> {
        &self.api
    }

    /// One complete dashboard snapshot.
    ///
    /// Live mode issues the four fetches concurrently and fails as a whole if
    /// any of them fails; the error is the first failing call's.
    pub async fn load_snapshot(&self) -> Result<DashboardSnapshot, ApiError> {
        if self.is_demo() {
            return Ok(demo::snapshot());
        }

        let api = self.api.as_ref();
        let (metrics, errors, tasks, assessments) = tokio::try_join!(
            api.metrics(),
            api.error_catalog(),
            api.list_tasks(),
            api.assessments(),
        )?;

        Ok(DashboardSnapshot {
            metrics,
            errors,
            tasks,
            assessments,
        })
    }

    /// Deployment rows of one task.
    pub async fn task_deployments(
        &self,
        task_id: &str,
    ) -> Result<Vec<TaskDeploymentDetail>, ApiError> {
        if self.is_demo() {
            return Ok(demo::task_deployments());
        }
        self.api.task_deployments(task_id).await
    }

    /// Report bytes for one task.
    ///
    /// Demo mode renders the CSV locally and has no PDF renderer.
    pub async fn export_report(
        &self,
        task_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ApiError> {
        if self.is_demo() {
            return match format {
                ExportFormat::Csv => Ok(demo::render_csv(&demo::task_deployments())),
                ExportFormat::Pdf => Err(ApiError::Unsupported(
                    "PDF export is not available in demo mode".to_string(),
                )),
            };
        }
        self.api.export_report(task_id, format).await
    }
}
