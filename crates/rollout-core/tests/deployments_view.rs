//! Tests for the deployments view: filter precedence, task selection, row loading and export.

mod support;

use std::sync::Arc;

use rollout_core::api::ApiError;
use rollout_core::demo;
use rollout_core::deployments::DeploymentsView;
use rollout_core::source::{DataSource, SourceMode};
use rollout_core::types::{ExportFormat, StatusFilter};
use support::{Call, MockConsoleApi};

fn view(
    api: &Arc<MockConsoleApi>,
    mode: SourceMode,
    filter: Option<StatusFilter>,
) -> DeploymentsView {
    DeploymentsView::new(
        DataSource::new(api.clone(), support::base_url(), mode),
        filter,
    )
}

/// Select `task_id` and wait for its rows.
async fn load_selected(view: &mut DeploymentsView, task_id: &str) {
    if let Some(job) = view.select_task(task_id) {
        let outcome = job.run().await;
        view.finish_load(outcome);
    }
}

fn ids<'a>(tasks: impl IntoIterator<Item = &'a rollout_core::types::Task>) -> Vec<&'a str> {
    tasks.into_iter().map(|task| task.id.as_str()).collect()
}

// =========================================================================
// Filters
// =========================================================================

#[test]
fn external_filter_overrides_local_selector() {
    let api = Arc::new(MockConsoleApi::new());
    let tasks = support::live_tasks();
    let mut view = view(&api, SourceMode::Live, Some(StatusFilter::Failed));

    view.set_local_filter(Some(StatusFilter::Success));
    assert_eq!(view.effective_filter(), Some(StatusFilter::Failed));
    assert_eq!(ids(view.visible_tasks(&tasks)), vec!["t-2"]);

    view.set_external_filter(None);
    assert_eq!(view.effective_filter(), Some(StatusFilter::Success));
    assert_eq!(ids(view.visible_tasks(&tasks)), vec!["t-1"]);

    view.set_local_filter(None);
    assert_eq!(ids(view.visible_tasks(&tasks)), vec!["t-1", "t-2", "t-3"]);
}

#[test]
fn no_match_yields_empty_list() {
    let api = Arc::new(MockConsoleApi::new());
    let tasks = vec![support::task("t-9", "Pending only", "pending")];
    let mut view = view(&api, SourceMode::Live, Some(StatusFilter::Success));

    assert!(view.visible_tasks(&tasks).is_empty());
    assert!(view.sync_tasks(&tasks).is_none());
    assert_eq!(view.selected_task_id(), None);
}

// =========================================================================
// Selection and loading
// =========================================================================

#[tokio::test]
async fn first_visible_task_is_selected_automatically() {
    let api = Arc::new(MockConsoleApi::new());
    api.set_deployments(Ok(vec![support::deployment("d-1", "edge-01", "failed")]));
    let mut view = view(&api, SourceMode::Live, Some(StatusFilter::Failed));

    let job = view
        .sync_tasks(&support::live_tasks())
        .expect("selection starts a load");
    assert_eq!(job.task_id(), "t-2");
    assert_eq!(view.selected_task_id(), Some("t-2"));
    assert!(view.is_loading());

    assert!(view.finish_load(job.run().await));
    assert!(!view.is_loading());
    assert_eq!(view.visible_rows().len(), 1);
    assert_eq!(api.calls(), vec![Call::TaskDeployments("t-2".to_string())]);

    // An existing selection is kept on later task list updates.
    assert!(view.sync_tasks(&support::live_tasks()).is_none());
}

#[tokio::test]
async fn selecting_another_task_replaces_rows() {
    let api = Arc::new(MockConsoleApi::new());
    let mut view = view(&api, SourceMode::Live, None);

    api.set_deployments(Ok(vec![
        support::deployment("d-1", "db-01", "success"),
        support::deployment("d-2", "db-02", "failed"),
    ]));
    load_selected(&mut view, "t-1").await;
    assert_eq!(view.visible_rows().len(), 2);

    api.set_deployments(Ok(vec![support::deployment("d-3", "edge-01", "success")]));
    let job = view.select_task("t-2").expect("load job");
    assert!(view.visible_rows().is_empty());

    view.finish_load(job.run().await);
    let rows: Vec<&str> = view.visible_rows().into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rows, vec!["d-3"]);
}

#[tokio::test]
async fn superseded_load_is_discarded() {
    let api = Arc::new(MockConsoleApi::new());
    let mut view = view(&api, SourceMode::Live, None);

    api.set_deployments(Ok(vec![support::deployment("d-old", "db-01", "success")]));
    let first = view.select_task("t-1").expect("first job");
    let first_outcome = first.run().await;

    api.set_deployments(Ok(vec![support::deployment("d-new", "edge-01", "failed")]));
    let second = view.select_task("t-2").expect("second job");
    let second_outcome = second.run().await;

    assert!(view.finish_load(second_outcome));
    assert!(!view.finish_load(first_outcome));

    let rows: Vec<&str> = view.visible_rows().into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rows, vec!["d-new"]);
    assert_eq!(view.selected_task_id(), Some("t-2"));
}

#[tokio::test]
async fn row_filter_follows_effective_filter() {
    let api = Arc::new(MockConsoleApi::new());
    api.set_deployments(Ok(vec![
        support::deployment("d-1", "db-01", "success"),
        support::deployment("d-2", "db-02", "failed"),
        support::deployment("d-3", "db-03", "skipped"),
    ]));
    let mut view = view(&api, SourceMode::Live, None);
    load_selected(&mut view, "t-1").await;
    assert_eq!(view.visible_rows().len(), 3);

    view.set_external_filter(Some(StatusFilter::Success));
    let rows: Vec<&str> = view.visible_rows().into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rows, vec!["d-1"]);
}

#[tokio::test]
async fn load_failure_sets_error_message() {
    let api = Arc::new(MockConsoleApi::new());
    api.set_deployments(Err(support::status_error(404, "task not found")));
    let mut view = view(&api, SourceMode::Live, None);

    load_selected(&mut view, "t-404").await;

    assert_eq!(view.error_message(), Some("task not found"));
    assert!(view.visible_rows().is_empty());
    assert!(!view.is_loading());
}

#[test]
fn demo_selection_answers_synchronously() {
    let api = Arc::new(MockConsoleApi::new());
    let mut view = view(&api, SourceMode::Demo, Some(StatusFilter::Failed));

    assert!(view.select_task("demo-1").is_none());

    let rows: Vec<&str> = view.visible_rows().into_iter().map(|r| r.id.as_str()).collect();
    assert_eq!(rows, vec!["demo-deploy-2"]);
    assert!(!view.is_loading());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn switching_source_reloads_selection() {
    let api = Arc::new(MockConsoleApi::new());
    let mut view = view(&api, SourceMode::Demo, None);
    assert!(view.select_task("demo-1").is_none());
    assert_eq!(view.visible_rows().len(), 2);

    api.set_deployments(Ok(Vec::new()));
    let job = view
        .set_source(DataSource::new(
            api.clone(),
            support::base_url(),
            SourceMode::Live,
        ))
        .expect("live reload job");
    assert!(view.finish_load(job.run().await));
    assert!(view.visible_rows().is_empty());
}

// =========================================================================
// Export
// =========================================================================

#[tokio::test]
async fn live_export_downloads_report_bytes() {
    let api = Arc::new(MockConsoleApi::new());
    api.set_report(Ok(b"%PDF-1.7".to_vec()));
    let mut view = view(&api, SourceMode::Live, None);
    load_selected(&mut view, "t-1").await;

    let report = view
        .export(ExportFormat::Pdf)
        .expect("export job")
        .run()
        .await
        .unwrap();

    assert_eq!(report.file_name, "task-t-1-deployments.pdf");
    assert_eq!(report.bytes, b"%PDF-1.7".to_vec());
    assert!(api.calls().contains(&Call::ExportReport("t-1".to_string(), ExportFormat::Pdf)));
}

#[tokio::test]
async fn live_export_failure_is_reported() {
    let api = Arc::new(MockConsoleApi::new());
    api.set_report(Err(ApiError::status(500, "", "Export failed")));
    let mut view = view(&api, SourceMode::Live, None);
    load_selected(&mut view, "t-1").await;

    let err = view
        .export(ExportFormat::Csv)
        .expect("export job")
        .run()
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Export failed");
}

#[test]
fn export_without_selection_is_unavailable() {
    let api = Arc::new(MockConsoleApi::new());
    let view = view(&api, SourceMode::Live, None);
    assert!(view.export(ExportFormat::Csv).is_none());
}

#[tokio::test]
async fn demo_export_renders_csv_locally_and_has_no_pdf() {
    let api = Arc::new(MockConsoleApi::new());
    let mut view = view(&api, SourceMode::Demo, None);
    assert!(view.select_task("demo-1").is_none());

    let csv = view
        .export(ExportFormat::Csv)
        .expect("export job")
        .run()
        .await
        .unwrap();
    assert_eq!(csv.file_name, "task-demo-1-deployments.csv");
    assert_eq!(csv.bytes, demo::render_csv(&demo::task_deployments()));

    let pdf = view
        .export(ExportFormat::Pdf)
        .expect("export job")
        .run()
        .await;
    assert!(matches!(pdf, Err(ApiError::Unsupported(_))));
    assert!(api.calls().is_empty());
}
