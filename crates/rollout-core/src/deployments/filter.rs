//! Status filtering shared by the task list and deployment rows.

use crate::types::{StatusFilter, Task, TaskDeploymentDetail};

/// Filter imposed by another view plus the view's own selector.
///
/// The external filter wins whenever it is set; the local selector is only
/// consulted once the external one is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSelection {
    external: Option<StatusFilter>,
    local: Option<StatusFilter>,
}

impl FilterSelection {
    pub fn new(external: Option<StatusFilter>) -> Self {
        Self {
            external,
            local: None,
        }
    }

    pub fn effective(&self) -> Option<StatusFilter> {
        self.external.or(self.local)
    }

    pub fn external(&self) -> Option<StatusFilter> {
        self.external
    }

    pub fn local(&self) -> Option<StatusFilter> {
        self.local
    }

    pub fn set_external(&mut self, filter: Option<StatusFilter>) {
        self.external = filter;
    }

    pub fn set_local(&mut self, filter: Option<StatusFilter>) {
        self.local = filter;
    }

    /// Whether the local selector is currently overridden.
    pub fn is_local_overridden(&self) -> bool {
        self.external.is_some()
    }
}

/// Tasks whose status matches `filter` exactly; all tasks when `None`.
pub fn filter_tasks(tasks: &[Task], filter: Option<StatusFilter>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| filter.is_none_or(|f| f.matches(&task.status)))
        .collect()
}

/// Deployment rows whose status matches `filter` exactly; all rows when `None`.
pub fn filter_deployments(
    rows: &[TaskDeploymentDetail],
    filter: Option<StatusFilter>,
) -> Vec<&TaskDeploymentDetail> {
    rows.iter()
        .filter(|row| filter.is_none_or(|f| f.matches(&row.status)))
        .collect()
}
