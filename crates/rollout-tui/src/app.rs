//! Console state for the terminal front-end.
//!
//! [`App`] owns the core controllers and the dashboard subscription. Network
//! work runs as detached jobs on the tokio runtime; their outcomes come back
//! over a channel and are applied on the UI thread in [`App::tick`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rollout_core::api::ApiError;
use rollout_core::config::ConsoleConfig;
use rollout_core::console::{Console, Page};
use rollout_core::dashboard::{DashboardState, DashboardUpdate, PollingSynchronizer, derive};
use rollout_core::deployments::{DeploymentsView, DetailsJob, DetailsOutcome, ExportedReport};
use rollout_core::source::DataSource;
use rollout_core::types::{ExportFormat, StatusFilter};
use rollout_core::wizard::{
    Field, ScanOutcome, SubmitOutcome, SubmitResult, SubmitStart, UploadOutcome,
    WizardController, WizardStep,
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

pub(crate) const UPLOAD_RUNNING: &str = "Installer upload already in progress";
pub(crate) const SCAN_RUNNING: &str = "Assessment scan already running";

/// Completed background work.
#[derive(Debug)]
pub enum JobMessage {
    Details(DetailsOutcome),
    Export(Result<ExportedReport, ApiError>),
    Upload(UploadOutcome),
    Scan(ScanOutcome),
    Submit(SubmitOutcome),
}

/// What the open text editor writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Field(Field),
    InstallerPath,
}

impl EditTarget {
    pub fn label(&self) -> &'static str {
        match self {
            EditTarget::Field(field) => field.label(),
            EditTarget::InstallerPath => "Installer file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub target: EditTarget,
    pub buffer: String,
}

pub struct App {
    pub(crate) console: Console,
    source: DataSource,
    sync: PollingSynchronizer,
    updates: watch::Receiver<DashboardUpdate>,
    pub(crate) dashboard: DashboardState,
    pub(crate) deployments: DeploymentsView,
    pub(crate) wizard: WizardController,
    runtime: Handle,
    jobs_tx: mpsc::UnboundedSender<JobMessage>,
    jobs_rx: mpsc::UnboundedReceiver<JobMessage>,
    pub(crate) gauge_cursor: usize,
    pub(crate) task_cursor: usize,
    pub(crate) field_cursor: usize,
    pub(crate) editor: Option<Editor>,
    pub(crate) notice: Option<String>,
    poll_interval: Duration,
    export_dir: PathBuf,
    should_quit: bool,
}

impl App {
    pub fn new(config: &ConsoleConfig, runtime: Handle) -> Result<Self> {
        let source = DataSource::from_config(config)?;
        let export_dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::with_source(
            source,
            config.poll_interval,
            runtime,
            export_dir,
        ))
    }

    pub fn with_source(
        source: DataSource,
        poll_interval: Duration,
        runtime: Handle,
        export_dir: PathBuf,
    ) -> Self {
        let sync = {
            let _guard = runtime.enter();
            PollingSynchronizer::mount(source.clone(), poll_interval)
        };
        let mut updates = sync.subscribe();
        let dashboard = updates.borrow_and_update().state.clone();
        let console = Console::new(source.mode());
        let deployments = DeploymentsView::new(source.clone(), console.deployment_filter());
        let wizard = WizardController::new(source.clone());
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            console,
            source,
            sync,
            updates,
            dashboard,
            deployments,
            wizard,
            runtime,
            jobs_tx,
            jobs_rx,
            gauge_cursor: 0,
            task_cursor: 0,
            field_cursor: 0,
            editor: None,
            notice: None,
            poll_interval,
            export_dir,
            should_quit: false,
        };
        app.sync_deployments();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn page(&self) -> Page {
        self.console.page()
    }

    /// Apply dashboard publications and finished jobs.
    pub fn tick(&mut self) {
        if self.updates.has_changed().unwrap_or(false) {
            let update = self.updates.borrow_and_update().clone();
            debug!(revision = update.revision, "dashboard update");
            self.dashboard = update.state;
            self.sync_deployments();
        }
        while let Ok(message) = self.jobs_rx.try_recv() {
            self.apply_job(message);
        }
    }

    // =========================================================================
    // Keys
    // =========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.editor.is_some() {
            self.handle_editor_key(key.code);
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.navigate(Page::Dashboard),
            KeyCode::Char('2') => self.navigate(Page::Deployments),
            KeyCode::Char('3') => self.navigate(Page::Deploy),
            KeyCode::Tab => self.navigate(next_page(self.console.page())),
            KeyCode::Char('d') => self.toggle_demo(),
            KeyCode::Char('r') => {
                self.sync.refresh_now();
                self.notice = Some("Refreshing...".to_string());
            }
            code => match self.console.page() {
                Page::Dashboard => self.handle_dashboard_key(code),
                Page::Deployments => self.handle_deployments_key(code),
                Page::Deploy => self.handle_deploy_key(code),
            },
        }
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.gauge_cursor = self.gauge_cursor.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.gauge_cursor = (self.gauge_cursor + 1).min(2);
            }
            KeyCode::Enter => self.drill_down(),
            _ => {}
        }
    }

    fn handle_deployments_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_task_at(self.task_cursor.saturating_sub(1));
            }
            KeyCode::Down | KeyCode::Char('j') => self.select_task_at(self.task_cursor + 1),
            KeyCode::Char('f') => {
                let next = match self.deployments.filter().local() {
                    None => Some(StatusFilter::Success),
                    Some(StatusFilter::Success) => Some(StatusFilter::Failed),
                    Some(StatusFilter::Failed) => None,
                };
                self.deployments.set_local_filter(next);
                self.select_task_at(0);
            }
            KeyCode::Char('c') => {
                self.console.clear_deployment_filter();
                self.deployments.set_external_filter(None);
                self.select_task_at(0);
            }
            KeyCode::Char('e') => self.export(ExportFormat::Csv),
            KeyCode::Char('p') => self.export(ExportFormat::Pdf),
            _ => {}
        }
    }

    fn handle_deploy_key(&mut self, code: KeyCode) {
        let step = self.wizard.step();
        let fields = step.editable_fields();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.field_cursor = self.field_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.field_cursor + 1 < fields.len() {
                    self.field_cursor += 1;
                }
            }
            KeyCode::Enter if step == WizardStep::Review => self.submit(),
            KeyCode::Enter => {
                if let Some(&field) = fields.get(self.field_cursor) {
                    self.editor = Some(Editor {
                        target: EditTarget::Field(field),
                        buffer: self.wizard.draft().value(field),
                    });
                }
            }
            KeyCode::Right | KeyCode::Char('n') => match self.wizard.advance() {
                Ok(_) => {
                    self.field_cursor = 0;
                    self.notice = None;
                }
                Err(errors) => {
                    self.notice = Some(format!("{} field(s) need attention", errors.len()));
                }
            },
            KeyCode::Left | KeyCode::Char('b') => {
                self.wizard.retreat();
                self.field_cursor = 0;
            }
            KeyCode::Char('u') if step == WizardStep::Installer => {
                if self.upload_running() {
                    return;
                }
                self.editor = Some(Editor {
                    target: EditTarget::InstallerPath,
                    buffer: String::new(),
                });
            }
            KeyCode::Char('s') if step == WizardStep::Targets => {
                if self.wizard.effects().scan().is_in_progress() {
                    self.notice = Some(SCAN_RUNNING.to_string());
                    return;
                }
                if let Some(job) = self.wizard.begin_scan() {
                    let tx = self.jobs_tx.clone();
                    self.runtime.spawn(async move {
                        let _ = tx.send(JobMessage::Scan(job.run().await));
                    });
                }
            }
            KeyCode::Char('x') => {
                self.wizard.reset();
                self.field_cursor = 0;
                self.notice = Some("Wizard cleared".to_string());
            }
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, code: KeyCode) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.editor = None,
            KeyCode::Backspace => {
                editor.buffer.pop();
            }
            KeyCode::Char(c) => editor.buffer.push(c),
            KeyCode::Enter => {
                if let Some(editor) = self.editor.take() {
                    self.commit_edit(editor);
                }
            }
            _ => {}
        }
    }

    fn commit_edit(&mut self, editor: Editor) {
        match editor.target {
            EditTarget::Field(field) => {
                if let Err(message) = self.wizard.set_field(field, &editor.buffer) {
                    self.notice = Some(message);
                }
            }
            EditTarget::InstallerPath => {
                let path = editor.buffer.trim();
                if path.is_empty() || self.upload_running() {
                    return;
                }
                if let Some(job) = self.wizard.begin_installer_upload(Path::new(path)) {
                    let tx = self.jobs_tx.clone();
                    self.runtime.spawn(async move {
                        let _ = tx.send(JobMessage::Upload(job.run().await));
                    });
                }
            }
        }
    }

    /// A second upload would race the first for the draft's installer fields.
    fn upload_running(&mut self) -> bool {
        let running = self.wizard.effects().upload().is_in_progress();
        if running {
            self.notice = Some(UPLOAD_RUNNING.to_string());
        }
        running
    }

    // =========================================================================
    // Navigation and mode
    // =========================================================================

    fn navigate(&mut self, page: Page) {
        self.console.navigate(page);
    }

    /// Open the deployments page with the selected gauge's filter imposed.
    fn drill_down(&mut self) {
        let Some(snapshot) = self.dashboard.snapshot.as_deref() else {
            return;
        };
        let gauges = derive::gauges(&snapshot.metrics);
        let gauge = &gauges[self.gauge_cursor.min(gauges.len() - 1)];
        let filter = gauge.drill_down;
        info!(gauge = gauge.label, ?filter, "drill down to deployments");
        self.console.view_deployments(filter);
        self.deployments.set_external_filter(filter);
        self.select_task_at(0);
    }

    fn toggle_demo(&mut self) {
        let mode = self.console.toggle_demo();
        info!(%mode, "switching data source");
        self.sync.switch_mode(mode);
        // Matches the remount; the next publication brings the new snapshot.
        self.dashboard = DashboardState::default();
        self.wizard.set_source(self.source.with_mode(mode));
        self.remount_deployments();
        self.notice = Some(format!("Switched to {} data", mode));
    }

    /// Replace the synchronizer; the old one stops polling when dropped.
    fn remount_dashboard(&mut self) {
        let source = self.source.with_mode(self.console.mode());
        self.sync = {
            let _guard = self.runtime.enter();
            PollingSynchronizer::mount(source, self.poll_interval)
        };
        self.updates = self.sync.subscribe();
        self.dashboard = self.updates.borrow_and_update().state.clone();
    }

    /// Fresh deployments view on the current source; keeps the imposed filter.
    fn remount_deployments(&mut self) {
        self.deployments = DeploymentsView::new(
            self.source.with_mode(self.console.mode()),
            self.console.deployment_filter(),
        );
        self.task_cursor = 0;
        self.sync_deployments();
    }

    fn sync_deployments(&mut self) {
        let visible = self.deployments.visible_tasks(self.dashboard.tasks()).len();
        self.task_cursor = self.task_cursor.min(visible.saturating_sub(1));
        if let Some(job) = self.deployments.sync_tasks(self.dashboard.tasks()) {
            self.spawn_details(job);
        }
    }

    fn select_task_at(&mut self, index: usize) {
        let task_id = self
            .deployments
            .visible_tasks(self.dashboard.tasks())
            .get(index)
            .map(|task| task.id.clone());
        let Some(task_id) = task_id else {
            return;
        };
        self.task_cursor = index;
        if let Some(job) = self.deployments.select_task(&task_id) {
            self.spawn_details(job);
        }
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    fn spawn_details(&self, job: DetailsJob) {
        let tx = self.jobs_tx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(JobMessage::Details(job.run().await));
        });
    }

    fn export(&mut self, format: ExportFormat) {
        let Some(job) = self.deployments.export(format) else {
            self.notice = Some("Select a task first".to_string());
            return;
        };
        self.notice = Some(format!("Exporting {}...", format));
        let tx = self.jobs_tx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(JobMessage::Export(job.run().await));
        });
    }

    fn submit(&mut self) {
        if self.wizard.is_submitting() {
            return;
        }
        match self.wizard.begin_submit() {
            SubmitStart::Done(result) => self.after_submit(result),
            SubmitStart::Pending(job) => {
                self.notice = Some("Creating task...".to_string());
                let tx = self.jobs_tx.clone();
                self.runtime.spawn(async move {
                    let _ = tx.send(JobMessage::Submit(job.run().await));
                });
            }
        }
    }

    fn after_submit(&mut self, result: SubmitResult) {
        match result {
            SubmitResult::Created { .. } => {
                let key = self.console.on_task_created();
                debug!(refresh_key = key, "task created, remounting views");
                self.remount_dashboard();
                self.field_cursor = 0;
                self.remount_deployments();
                self.notice = self.wizard.status_message().map(str::to_string);
            }
            SubmitResult::Invalid(errors) => {
                self.notice = Some(format!("{} field(s) need attention", errors.len()));
            }
            SubmitResult::Failed(message) => self.notice = Some(message),
        }
    }

    fn apply_job(&mut self, message: JobMessage) {
        match message {
            JobMessage::Details(outcome) => {
                if !self.deployments.finish_load(outcome) {
                    debug!("discarded superseded deployment rows");
                }
            }
            JobMessage::Export(Ok(report)) => {
                let path = self.export_dir.join(&report.file_name);
                match std::fs::write(&path, &report.bytes) {
                    Ok(()) => {
                        info!(path = %path.display(), "report saved");
                        self.notice = Some(format!("Saved {}", path.display()));
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "failed to save report");
                        self.notice = Some(format!("Could not write {}: {}", path.display(), err));
                    }
                }
            }
            JobMessage::Export(Err(err)) => self.notice = Some(err.to_string()),
            JobMessage::Upload(outcome) => self.wizard.finish_installer_upload(outcome),
            JobMessage::Scan(outcome) => self.wizard.finish_scan(outcome),
            JobMessage::Submit(outcome) => {
                let result = self.wizard.finish_submit(outcome);
                self.after_submit(result);
            }
        }
    }
}

fn next_page(page: Page) -> Page {
    match page {
        Page::Dashboard => Page::Deployments,
        Page::Deployments => Page::Deploy,
        Page::Deploy => Page::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rollout_core::api::ConsoleApi;
    use rollout_core::demo;
    use rollout_core::source::SourceMode;
    use rollout_core::types::{
        Assessment, CreateTaskInput, ErrorCatalogItem, ExecuteScanInput, ExecuteScanResponse,
        InstallerUpload, MetricsSummary, RecordScanInput, RunRef, Task, TaskDeploymentDetail,
    };
    use tokio::sync::Notify;

    use super::*;

    /// Backend whose upload and scan calls hang until the gate opens.
    #[derive(Default)]
    struct GatedApi {
        gate: Notify,
        uploads: AtomicUsize,
        scans: AtomicUsize,
    }

    fn offline() -> ApiError {
        ApiError::Unsupported("offline".to_string())
    }

    #[async_trait]
    impl ConsoleApi for GatedApi {
        async fn create_task(&self, _input: &CreateTaskInput) -> Result<Task, ApiError> {
            Err(offline())
        }

        async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
            Err(offline())
        }

        async fn create_run(&self, _task_id: &str) -> Result<RunRef, ApiError> {
            Err(offline())
        }

        async fn update_run(&self, _run_id: &str, _status: &str) -> Result<RunRef, ApiError> {
            Err(offline())
        }

        async fn record_scan(&self, _input: &RecordScanInput) -> Result<(), ApiError> {
            Err(offline())
        }

        async fn metrics(&self) -> Result<MetricsSummary, ApiError> {
            Err(offline())
        }

        async fn error_catalog(&self) -> Result<Vec<ErrorCatalogItem>, ApiError> {
            Err(offline())
        }

        async fn assessments(&self) -> Result<Vec<Assessment>, ApiError> {
            Err(offline())
        }

        async fn task_deployments(
            &self,
            _task_id: &str,
        ) -> Result<Vec<TaskDeploymentDetail>, ApiError> {
            Err(offline())
        }

        async fn export_report(
            &self,
            _task_id: &str,
            _format: ExportFormat,
        ) -> Result<Vec<u8>, ApiError> {
            Err(offline())
        }

        async fn execute_scan(
            &self,
            _input: &ExecuteScanInput,
        ) -> Result<ExecuteScanResponse, ApiError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Err(offline())
        }

        async fn upload_installer(&self, _path: &Path) -> Result<InstallerUpload, ApiError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Err(offline())
        }
    }

    fn live_app(api: &Arc<GatedApi>) -> App {
        let base_url = ConsoleConfig::default().base_url;
        App::with_source(
            DataSource::new(api.clone(), base_url, SourceMode::Live),
            Duration::from_secs(5),
            Handle::current(),
            std::env::temp_dir(),
        )
    }

    /// Let spawned jobs run up to their first await.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn demo_app() -> App {
        let config = ConsoleConfig {
            demo_mode: true,
            ..Default::default()
        };
        let source = DataSource::from_config(&config).unwrap();
        App::with_source(
            source,
            Duration::from_secs(5),
            Handle::current(),
            std::env::temp_dir(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn demo_mount_selects_first_task() {
        let app = demo_app();
        assert!(app.dashboard.snapshot.is_some());
        assert_eq!(app.deployments.selected_task_id(), Some("demo-1"));
        assert_eq!(
            app.deployments.visible_rows().len(),
            demo::task_deployments().len()
        );
    }

    #[tokio::test]
    async fn number_keys_switch_pages() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.page(), Page::Deployments);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.page(), Page::Deploy);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.page(), Page::Dashboard);
    }

    #[tokio::test]
    async fn gauge_drill_down_imposes_filter() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.page(), Page::Deployments);
        assert_eq!(app.console.deployment_filter(), Some(StatusFilter::Failed));
        assert_eq!(app.deployments.effective_filter(), Some(StatusFilter::Failed));

        // The local selector cannot override the imposed filter.
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.deployments.effective_filter(), Some(StatusFilter::Failed));

        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.console.deployment_filter(), None);
        assert_eq!(app.deployments.effective_filter(), Some(StatusFilter::Success));
    }

    #[tokio::test]
    async fn editing_a_field_updates_the_draft() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Enter);
        assert!(app.editor.is_some());

        // Letters go to the editor, not to page shortcuts.
        type_text(&mut app, "q1 rollout");
        press(&mut app, KeyCode::Enter);

        assert!(app.editor.is_none());
        assert!(!app.should_quit());
        assert_eq!(app.wizard.draft().task_name, "q1 rollout");
    }

    #[tokio::test]
    async fn invalid_aggressiveness_shows_notice() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        let editor = app.editor.as_mut().unwrap();
        assert_eq!(editor.target, EditTarget::Field(Field::Aggressiveness));
        editor.buffer.clear();
        type_text(&mut app, "high");
        press(&mut app, KeyCode::Enter);

        assert!(app.notice.as_deref().unwrap().contains("must be a number"));
    }

    #[tokio::test]
    async fn advancing_with_empty_step_reports_errors() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Right);

        assert_eq!(app.wizard.step(), WizardStep::Targets);
        assert!(app.wizard.errors().get(Field::TaskName).is_some());
        assert!(app.notice.as_deref().unwrap().ends_with("need attention"));
    }

    #[tokio::test]
    async fn demo_submit_through_keys_keeps_draft() {
        let mut app = demo_app();
        app.wizard.set_field(Field::TaskName, "February rollout").unwrap();
        app.wizard.set_field(Field::Targets, "db-01").unwrap();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);

        // Installer step: stage through the demo upload.
        press(&mut app, KeyCode::Char('u'));
        type_text(&mut app, "agent.pkg");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.wizard.draft().installer.checksum, "demo-checksum");

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.wizard.step(), WizardStep::Review);
        let before = app.wizard.draft().clone();
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.wizard.step(), WizardStep::Review);
        assert_eq!(app.wizard.draft(), &before);
        assert_eq!(app.console.refresh_key(), 1);
        assert_eq!(app.notice.as_deref(), Some(demo::TASK_CREATED_MESSAGE));
    }

    #[tokio::test]
    async fn toggling_demo_switches_every_view() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.console.mode(), SourceMode::Live);
        assert!(!app.wizard.source().is_demo());
        assert_eq!(app.deployments.selected_task_id(), None);
        assert_eq!(app.notice.as_deref(), Some("Switched to live data"));
    }

    #[tokio::test]
    async fn demo_pdf_export_reports_unsupported() {
        let mut app = demo_app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('p'));

        let message = app.jobs_rx.recv().await.unwrap();
        app.apply_job(message);
        assert!(app.notice.is_some());
        assert_ne!(app.notice.as_deref(), Some("Exporting pdf..."));
    }

    #[tokio::test]
    async fn second_scan_is_refused_while_one_runs() {
        let api = Arc::new(GatedApi::default());
        let mut app = live_app(&api);
        app.wizard.set_field(Field::Targets, "db-01, db-02").unwrap();
        press(&mut app, KeyCode::Char('3'));

        press(&mut app, KeyCode::Char('s'));
        assert!(app.wizard.effects().scan().is_in_progress());
        press(&mut app, KeyCode::Char('s'));
        settle().await;

        assert_eq!(app.notice.as_deref(), Some(SCAN_RUNNING));
        assert_eq!(api.scans.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_upload_is_refused_while_one_runs() {
        let api = Arc::new(GatedApi::default());
        let mut app = live_app(&api);
        app.wizard.set_field(Field::TaskName, "February rollout").unwrap();
        app.wizard.set_field(Field::Targets, "db-01").unwrap();
        press(&mut app, KeyCode::Char('3'));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.wizard.step(), WizardStep::Installer);

        press(&mut app, KeyCode::Char('u'));
        type_text(&mut app, "old.pkg");
        press(&mut app, KeyCode::Enter);
        assert!(app.wizard.effects().upload().is_in_progress());

        press(&mut app, KeyCode::Char('u'));
        settle().await;

        assert!(app.editor.is_none());
        assert_eq!(app.notice.as_deref(), Some(UPLOAD_RUNNING));
        assert_eq!(app.wizard.effects().upload_file_name(), Some("old.pkg"));
        assert_eq!(api.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upload_editor_opened_before_start_cannot_start_a_second() {
        let api = Arc::new(GatedApi::default());
        let mut app = live_app(&api);
        app.wizard.set_field(Field::TaskName, "February rollout").unwrap();
        app.wizard.set_field(Field::Targets, "db-01").unwrap();
        app.wizard.advance().unwrap();
        app.wizard.advance().unwrap();
        press(&mut app, KeyCode::Char('3'));

        press(&mut app, KeyCode::Char('u'));
        assert!(app.wizard.begin_installer_upload(Path::new("old.pkg")).is_some());
        type_text(&mut app, "new.pkg");
        press(&mut app, KeyCode::Enter);
        settle().await;

        assert_eq!(app.notice.as_deref(), Some(UPLOAD_RUNNING));
        assert_eq!(app.wizard.effects().upload_file_name(), Some("old.pkg"));
        assert_eq!(api.uploads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tab_cycles_through_pages() {
        assert_eq!(next_page(Page::Dashboard), Page::Deployments);
        assert_eq!(next_page(Page::Deploy), Page::Dashboard);
    }
}
