//! Wizard step controller.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::side_effects::{
    ScanJob, ScanOutcome, SideEffectTracker, UploadJob, UploadOutcome, UploadTrigger,
};
use super::validation::{self, ValidationErrors};
use super::{Field, WizardDraft, WizardStep};
use crate::api::ConsoleApi;
use crate::demo;
use crate::source::DataSource;
use crate::types::{CreateTaskInput, Task};

pub const TASK_CREATED_MESSAGE: &str =
    "Task created. Installer settings saved for deployment execution.";

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Validation failed; nothing was sent.
    Invalid(ValidationErrors),
    /// The task exists. `task` is `None` for a demo-mode simulation.
    Created { task: Option<Task>, run_id: Option<String> },
    /// The backend rejected the task or its run.
    Failed(String),
}

impl SubmitResult {
    pub fn is_created(&self) -> bool {
        matches!(self, SubmitResult::Created { .. })
    }
}

/// How a submission was started.
pub enum SubmitStart {
    /// Finished without network work.
    Done(SubmitResult),
    /// Run the job, then hand its outcome to [`WizardController::finish_submit`].
    Pending(SubmitJob),
}

/// Task creation followed by run creation.
pub struct SubmitJob {
    api: Arc<dyn ConsoleApi>,
    input: CreateTaskInput,
}

/// What a [`SubmitJob`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    result: Result<(Task, String), String>,
}

impl SubmitJob {
    pub fn input(&self) -> &CreateTaskInput {
        &self.input
    }

    pub async fn run(self) -> SubmitOutcome {
        let task = match self.api.create_task(&self.input).await {
            Ok(task) => task,
            Err(err) => {
                return SubmitOutcome {
                    result: Err(err.to_string()),
                };
            }
        };
        debug!(task_id = %task.id, "task created, creating run");

        // No compensation: the task stays on the backend without a run.
        match self.api.create_run(&task.id).await {
            Ok(run) => SubmitOutcome {
                result: Ok((task, run.id)),
            },
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "run creation failed; task left without a run");
                SubmitOutcome {
                    result: Err(err.to_string()),
                }
            }
        }
    }
}

/// The five-step task creation state machine.
#[derive(Debug)]
pub struct WizardController {
    source: DataSource,
    step: WizardStep,
    draft: WizardDraft,
    errors: ValidationErrors,
    status_message: Option<String>,
    is_submitting: bool,
    effects: SideEffectTracker,
}

impl WizardController {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            step: WizardStep::FIRST,
            draft: WizardDraft::default(),
            errors: ValidationErrors::default(),
            status_message: None,
            is_submitting: false,
            effects: SideEffectTracker::new(),
        }
    }

    /// Follow a demo/live switch. The draft is kept.
    pub fn set_source(&mut self, source: DataSource) {
        self.source = source;
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    /// Mutable access for field-by-field edits.
    pub fn draft_mut(&mut self) -> &mut WizardDraft {
        &mut self.draft
    }

    pub fn set_field(&mut self, field: Field, raw: &str) -> Result<(), String> {
        self.draft.set(field, raw)
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn effects(&self) -> &SideEffectTracker {
        &self.effects
    }

    /// Validate the current step and move forward on success.
    ///
    /// On failure the step is unchanged and the step's field errors are set.
    pub fn advance(&mut self) -> Result<WizardStep, ValidationErrors> {
        let fields = self.step.fields();
        let errors = validation::validate(&self.draft, fields);
        let valid = errors.is_empty();
        self.errors.refresh(fields, errors.clone());

        if !valid {
            debug!(step = %self.step, errors = errors.len(), "step validation failed");
            return Err(errors);
        }

        self.step = self.step.next();
        Ok(self.step)
    }

    /// Move back one step without validating.
    pub fn retreat(&mut self) -> WizardStep {
        self.step = self.step.previous();
        self.step
    }

    /// Validate the final field set and start the submission.
    pub fn begin_submit(&mut self) -> SubmitStart {
        let fields = WizardStep::Review.fields();
        let errors = validation::validate(&self.draft, fields);
        self.errors.refresh(fields, errors.clone());
        if !errors.is_empty() {
            return SubmitStart::Done(SubmitResult::Invalid(errors));
        }

        if self.source.is_demo() {
            info!(task = %self.draft.task_name, "demo mode: simulated task creation");
            self.status_message = Some(demo::TASK_CREATED_MESSAGE.to_string());
            return SubmitStart::Done(SubmitResult::Created {
                task: None,
                run_id: None,
            });
        }

        let target_count = u32::try_from(self.draft.parsed_targets().len()).unwrap_or(u32::MAX);
        self.is_submitting = true;
        self.status_message = None;
        SubmitStart::Pending(SubmitJob {
            api: Arc::clone(self.source.api()),
            input: CreateTaskInput {
                name: self.draft.task_name.clone(),
                target_count,
            },
        })
    }

    /// Apply the outcome of a [`SubmitJob`].
    ///
    /// Success resets the wizard to its initial state; failure leaves the
    /// draft and step untouched.
    pub fn finish_submit(&mut self, outcome: SubmitOutcome) -> SubmitResult {
        self.is_submitting = false;
        match outcome.result {
            Ok((task, run_id)) => {
                info!(task_id = %task.id, %run_id, "task created");
                self.reset();
                self.status_message = Some(TASK_CREATED_MESSAGE.to_string());
                SubmitResult::Created {
                    task: Some(task),
                    run_id: Some(run_id),
                }
            }
            Err(message) => {
                self.status_message = Some(message.clone());
                SubmitResult::Failed(message)
            }
        }
    }

    /// Validate and submit, waiting for the backend.
    pub async fn submit(&mut self) -> SubmitResult {
        match self.begin_submit() {
            SubmitStart::Done(result) => result,
            SubmitStart::Pending(job) => {
                let outcome = job.run().await;
                self.finish_submit(outcome)
            }
        }
    }

    /// Start uploading an installer. Demo mode stages it immediately.
    pub fn begin_installer_upload(&mut self, path: &Path) -> Option<UploadJob> {
        match self.effects.begin_upload(&self.source, path) {
            UploadTrigger::Staged(installer) => {
                self.draft.apply_installer(installer);
                self.clear_field_error(Field::InstallerUrl);
                None
            }
            UploadTrigger::Pending(job) => Some(job),
        }
    }

    pub fn finish_installer_upload(&mut self, outcome: UploadOutcome) {
        if let Some(installer) = self.effects.finish_upload(outcome) {
            self.draft.apply_installer(installer);
            self.clear_field_error(Field::InstallerUrl);
        }
    }

    pub async fn upload_installer(&mut self, path: &Path) {
        if let Some(job) = self.begin_installer_upload(path) {
            let outcome = job.run().await;
            self.finish_installer_upload(outcome);
        }
    }

    /// Start an assessment scan over the draft's targets.
    pub fn begin_scan(&mut self) -> Option<ScanJob> {
        let targets = self.draft.parsed_targets();
        self.effects
            .begin_scan(&self.source, targets, self.draft.aggressiveness)
    }

    pub fn finish_scan(&mut self, outcome: ScanOutcome) {
        self.effects.finish_scan(outcome);
    }

    pub async fn run_scan(&mut self) {
        if let Some(job) = self.begin_scan() {
            let outcome = job.run().await;
            self.finish_scan(outcome);
        }
    }

    /// Back to step 0 with an empty draft and idle side effects.
    pub fn reset(&mut self) {
        self.step = WizardStep::FIRST;
        self.draft = WizardDraft::default();
        self.errors.clear();
        self.status_message = None;
        self.is_submitting = false;
        self.effects.reset();
    }

    fn clear_field_error(&mut self, field: Field) {
        self.errors.refresh(&[field], ValidationErrors::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpConsoleApi;
    use crate::source::SourceMode;
    use url::Url;

    fn demo_wizard() -> WizardController {
        let base = Url::parse("http://localhost:8080").unwrap();
        let api = HttpConsoleApi::new(base.clone(), None).unwrap();
        WizardController::new(DataSource::new(Arc::new(api), base, SourceMode::Demo))
    }

    fn fill_valid(wizard: &mut WizardController) {
        let draft = wizard.draft_mut();
        draft.task_name = "February rollout".into();
        draft.targets = "host-1.local, 10.0.0.0/24".into();
        draft.installer.url = "https://example.com/installer.bin".into();
    }

    #[test]
    fn advance_blocked_on_empty_first_step() {
        let mut wizard = demo_wizard();
        let errors = wizard.advance().unwrap_err();

        assert_eq!(wizard.step(), WizardStep::Targets);
        assert_eq!(errors.get(Field::TaskName), Some("Task name is required"));
        assert_eq!(errors.get(Field::Targets), Some("Targets are required"));
        assert_eq!(wizard.errors(), &errors);
    }

    #[test]
    fn advance_never_passes_last_step() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        for _ in 0..10 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.step(), WizardStep::Review);
        assert_eq!(wizard.step().index(), 4);
    }

    #[test]
    fn retreat_never_goes_below_first_step() {
        let mut wizard = demo_wizard();
        assert_eq!(wizard.retreat(), WizardStep::Targets);

        fill_valid(&mut wizard);
        wizard.advance().unwrap();
        assert_eq!(wizard.retreat(), WizardStep::Targets);
        assert_eq!(wizard.retreat(), WizardStep::Targets);
    }

    #[test]
    fn retreat_does_not_validate() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        wizard.draft_mut().installer.url.clear();

        assert_eq!(wizard.retreat(), WizardStep::Credentials);
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn deferred_schedule_requires_start_time() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        for _ in 0..3 {
            wizard.advance().unwrap();
        }
        assert_eq!(wizard.step(), WizardStep::Schedule);

        wizard.set_field(Field::ScheduleMode, "later").unwrap();
        let errors = wizard.advance().unwrap_err();
        assert!(errors.get(Field::StartAt).is_some());
        assert_eq!(wizard.step(), WizardStep::Schedule);

        wizard.set_field(Field::StartAt, "2026-03-01T09:00").unwrap();
        assert_eq!(wizard.advance().unwrap(), WizardStep::Review);
        assert!(wizard.errors().get(Field::StartAt).is_none());
    }

    #[test]
    fn error_for_fixed_field_clears_on_successful_advance() {
        let mut wizard = demo_wizard();
        wizard.advance().unwrap_err();
        fill_valid(&mut wizard);
        wizard.advance().unwrap();
        assert!(wizard.errors().is_empty());
    }

    #[test]
    fn submit_with_missing_installer_is_invalid() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        wizard.draft_mut().installer.url.clear();

        match wizard.begin_submit() {
            SubmitStart::Done(SubmitResult::Invalid(errors)) => {
                assert_eq!(errors.get(Field::InstallerUrl), Some("Installer URL is required"));
            }
            _ => panic!("expected validation failure"),
        }
        assert_eq!(wizard.status_message(), None);
    }

    #[test]
    fn demo_submit_is_simulated_and_keeps_draft() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        for _ in 0..4 {
            wizard.advance().unwrap();
        }
        let before = wizard.draft().clone();

        match wizard.begin_submit() {
            SubmitStart::Done(result) => assert!(result.is_created()),
            SubmitStart::Pending(_) => panic!("demo submit must not reach the backend"),
        }
        assert_eq!(wizard.status_message(), Some(demo::TASK_CREATED_MESSAGE));
        assert_eq!(wizard.draft(), &before);
        assert_eq!(wizard.step(), WizardStep::Review);
        assert!(!wizard.is_submitting());
    }

    #[test]
    fn demo_upload_sets_all_installer_fields_at_once() {
        let mut wizard = demo_wizard();
        assert!(
            wizard
                .begin_installer_upload(Path::new("/tmp/agent-1.2.pkg"))
                .is_none()
        );

        let installer = &wizard.draft().installer;
        assert_eq!(installer.url, "http://localhost:8080/uploads/demo-installer.bin");
        assert_eq!(installer.checksum, "demo-checksum");
        assert_eq!(installer.installer_id, "demo-installer");
        assert_eq!(wizard.effects().upload_file_name(), Some("agent-1.2.pkg"));
        assert_eq!(
            wizard.effects().upload_status().as_deref(),
            Some("Demo mode: installer staged")
        );
    }

    #[test]
    fn demo_scan_does_not_touch_draft() {
        let mut wizard = demo_wizard();
        fill_valid(&mut wizard);
        let before = wizard.draft().clone();

        assert!(wizard.begin_scan().is_none());
        assert_eq!(wizard.draft(), &before);
        assert_eq!(
            wizard.effects().scan_result().as_deref(),
            Some(demo::SCAN_SUMMARY)
        );
        assert_eq!(
            wizard.effects().scan_status().as_deref(),
            Some("Demo mode: assessment scan simulated")
        );
    }
}
