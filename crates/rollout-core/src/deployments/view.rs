//! Deployment results for one selected task.

use tracing::debug;

use super::filter::{self, FilterSelection};
use crate::api::ApiError;
use crate::source::DataSource;
use crate::types::{ExportFormat, StatusFilter, Task, TaskDeploymentDetail};

/// Pending fetch of the selected task's deployment rows.
#[derive(Debug)]
pub struct DetailsJob {
    source: DataSource,
    task_id: String,
    generation: u64,
}

/// What a [`DetailsJob`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsOutcome {
    task_id: String,
    generation: u64,
    result: Result<Vec<TaskDeploymentDetail>, String>,
}

impl DetailsJob {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub async fn run(self) -> DetailsOutcome {
        let result = self
            .source
            .task_deployments(&self.task_id)
            .await
            .map_err(|err| err.to_string());
        DetailsOutcome {
            task_id: self.task_id,
            generation: self.generation,
            result,
        }
    }
}

/// Downloaded report ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Pending report export.
#[derive(Debug)]
pub struct ExportJob {
    source: DataSource,
    task_id: String,
    format: ExportFormat,
}

impl ExportJob {
    pub async fn run(self) -> Result<ExportedReport, ApiError> {
        let bytes = self.source.export_report(&self.task_id, self.format).await?;
        Ok(ExportedReport {
            file_name: self.format.file_name(&self.task_id),
            bytes,
        })
    }
}

/// State of the deployments view.
#[derive(Debug)]
pub struct DeploymentsView {
    source: DataSource,
    filter: FilterSelection,
    selected_task_id: Option<String>,
    rows: Vec<TaskDeploymentDetail>,
    error_message: Option<String>,
    is_loading: bool,
    generation: u64,
}

impl DeploymentsView {
    pub fn new(source: DataSource, external_filter: Option<StatusFilter>) -> Self {
        Self {
            source,
            filter: FilterSelection::new(external_filter),
            selected_task_id: None,
            rows: Vec::new(),
            error_message: None,
            is_loading: false,
            generation: 0,
        }
    }

    pub fn filter(&self) -> &FilterSelection {
        &self.filter
    }

    pub fn effective_filter(&self) -> Option<StatusFilter> {
        self.filter.effective()
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Tasks visible under the effective filter.
    pub fn visible_tasks<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        filter::filter_tasks(tasks, self.effective_filter())
    }

    /// Rows of the selected task visible under the effective filter.
    pub fn visible_rows(&self) -> Vec<&TaskDeploymentDetail> {
        filter::filter_deployments(&self.rows, self.effective_filter())
    }

    /// Filter imposed by another view. `None` hands control back to the local selector.
    pub fn set_external_filter(&mut self, filter: Option<StatusFilter>) {
        self.filter.set_external(filter);
    }

    pub fn set_local_filter(&mut self, filter: Option<StatusFilter>) {
        self.filter.set_local(filter);
    }

    /// Follow a demo/live switch and reload the selected task.
    pub fn set_source(&mut self, source: DataSource) -> Option<DetailsJob> {
        self.source = source;
        self.begin_load()
    }

    /// Reconcile with a fresh task list.
    ///
    /// Selects the first visible task when nothing is selected yet.
    pub fn sync_tasks(&mut self, tasks: &[Task]) -> Option<DetailsJob> {
        if self.selected_task_id.is_some() {
            return None;
        }
        let first = self.visible_tasks(tasks).first().map(|task| task.id.clone())?;
        self.select_task(&first)
    }

    /// Select a task; its rows replace the previous task's rows wholesale.
    pub fn select_task(&mut self, task_id: &str) -> Option<DetailsJob> {
        if self.selected_task_id.as_deref() == Some(task_id) {
            return None;
        }
        self.selected_task_id = Some(task_id.to_string());
        self.rows.clear();
        self.begin_load()
    }

    /// Fetch rows for the current selection. Demo mode answers synchronously.
    pub fn begin_load(&mut self) -> Option<DetailsJob> {
        let task_id = self.selected_task_id.clone()?;
        self.generation += 1;
        self.error_message = None;

        if self.source.is_demo() {
            self.rows = crate::demo::task_deployments();
            self.is_loading = false;
            return None;
        }

        self.is_loading = true;
        Some(DetailsJob {
            source: self.source.clone(),
            task_id,
            generation: self.generation,
        })
    }

    /// Apply fetched rows. Returns `false` if the outcome was superseded.
    pub fn finish_load(&mut self, outcome: DetailsOutcome) -> bool {
        if outcome.generation != self.generation
            || self.selected_task_id.as_deref() != Some(outcome.task_id.as_str())
        {
            debug!(task_id = %outcome.task_id, "discarding superseded deployment rows");
            return false;
        }

        self.is_loading = false;
        match outcome.result {
            Ok(rows) => self.rows = rows,
            Err(message) => self.error_message = Some(message),
        }
        true
    }

    pub async fn load(&mut self) {
        if let Some(job) = self.begin_load() {
            let outcome = job.run().await;
            self.finish_load(outcome);
        }
    }

    /// Export the selected task's report; `None` when nothing is selected.
    pub fn export(&self, format: ExportFormat) -> Option<ExportJob> {
        let task_id = self.selected_task_id.clone()?;
        Some(ExportJob {
            source: self.source.clone(),
            task_id,
            format,
        })
    }
}
