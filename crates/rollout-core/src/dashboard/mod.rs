//! Continuously refreshed view of backend state.
//!
//! - [`store`]: pure state transitions (mount, cycle start, cycle resolution)
//! - [`sync`]: tokio driver that polls on an interval and publishes updates
//! - [`derive`]: chart series and gauges computed from a snapshot

pub mod derive;
pub mod store;
pub mod sync;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Assessment, ErrorCatalogItem, MetricsSummary, Task};

pub use store::{CycleTicket, DashboardStore, Invalidation};
pub use sync::{DashboardUpdate, PollingSynchronizer};

/// Everything the dashboard and deployments views render, produced as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub metrics: MetricsSummary,
    pub errors: Vec<ErrorCatalogItem>,
    pub tasks: Vec<Task>,
    pub assessments: Vec<Assessment>,
}

/// What consumers observe.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Last successfully loaded snapshot, if any.
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    /// True until the first refresh cycle of the current mount settles.
    pub is_loading: bool,
    /// Message of the most recent failed cycle; cleared by the next success.
    pub error_message: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            snapshot: None,
            is_loading: true,
            error_message: None,
        }
    }
}

impl DashboardState {
    pub fn tasks(&self) -> &[Task] {
        self.snapshot
            .as_deref()
            .map(|snapshot| snapshot.tasks.as_slice())
            .unwrap_or(&[])
    }
}
