//! Rollout Core Library
//!
//! Client-side orchestration for the deployment console: the task creation
//! wizard, the polling dashboard data layer with its demo-mode twin, and the
//! deployment results view. Front-ends (CLI/TUI) only render and forward
//! input.

pub mod api;
pub mod config;
pub mod console;
pub mod dashboard;
pub mod demo;
pub mod deployments;
pub mod source;
pub mod targets;
pub mod types;
pub mod wizard;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::ConsoleConfig;

    // Backend
    pub use crate::api::{ApiError, ConsoleApi, HttpConsoleApi};
    pub use crate::source::{DataSource, SourceMode};

    // Navigation
    pub use crate::console::{Console, Page};

    // Dashboard
    pub use crate::dashboard::{
        DashboardSnapshot, DashboardState, DashboardUpdate, Invalidation, PollingSynchronizer,
    };

    // Deployments
    pub use crate::deployments::{DeploymentsView, FilterSelection};

    // Wizard
    pub use crate::targets::parse_targets;
    pub use crate::wizard::{
        Field, ScheduleMode, SubmitResult, WizardController, WizardDraft, WizardStep,
    };

    // Wire types
    pub use crate::types::{
        Assessment, ErrorCatalogItem, ExportFormat, MetricsSummary, StatusFilter, Task,
        TaskDeploymentDetail,
    };
}
