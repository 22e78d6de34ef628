//! Console-level navigation and mode state.

use crate::source::SourceMode;
use crate::types::StatusFilter;

/// Top-level pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Dashboard,
    Deployments,
    /// The task creation wizard.
    Deploy,
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Deployments => "Deployments",
            Page::Deploy => "Create deployment task",
        }
    }
}

/// Which page is shown, which filter the deployments page was opened with,
/// and whether demo mode is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Console {
    page: Page,
    mode: SourceMode,
    deployment_filter: Option<StatusFilter>,
    refresh_key: u64,
}

impl Console {
    pub fn new(mode: SourceMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    /// Filter the deployments page must treat as authoritative.
    pub fn deployment_filter(&self) -> Option<StatusFilter> {
        self.deployment_filter
    }

    /// Bumped on every task creation; views keyed on it remount.
    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Plain navigation; keeps any filter already imposed on deployments.
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
    }

    /// Open deployments with `filter` imposed. `None` clears the imposition.
    pub fn view_deployments(&mut self, filter: Option<StatusFilter>) {
        self.deployment_filter = filter;
        self.page = Page::Deployments;
    }

    pub fn clear_deployment_filter(&mut self) {
        self.deployment_filter = None;
    }

    pub fn toggle_demo(&mut self) -> SourceMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn on_task_created(&mut self) -> u64 {
        self.refresh_key += 1;
        self.refresh_key
    }
}
