//! Rendering. Everything here reads [`App`] and draws; no state changes.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap,
    },
};
use rollout_core::console::Page;
use rollout_core::dashboard::DashboardSnapshot;
use rollout_core::dashboard::derive::{self, SeriesPoint};
use rollout_core::wizard::{Field, OperationStatus, WizardStep};

use crate::app::App;

const PAGES: [Page; 3] = [Page::Dashboard, Page::Deployments, Page::Deploy];
const BAR_WIDTH: f64 = 24.0;

pub fn draw(f: &mut Frame, app: &App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    draw_header(f, header, app);
    match app.page() {
        Page::Dashboard => draw_dashboard(f, body, app),
        Page::Deployments => draw_deployments(f, body, app),
        Page::Deploy => draw_deploy(f, body, app),
    }
    draw_footer(f, footer, app);

    if let Some(editor) = &app.editor {
        let area = centered(f.area(), 60, 5);
        let secret = matches!(editor.target, crate::app::EditTarget::Field(field) if field.is_secret());
        let shown = if secret {
            mask(&editor.buffer)
        } else {
            editor.buffer.clone()
        };
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(format!("{shown}_"))
                .wrap(Wrap { trim: false })
                .block(
                    Block::bordered()
                        .title(format!(" {} ", editor.target.label()))
                        .title_bottom(" Enter: save  Esc: cancel "),
                ),
            area,
        );
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let selected = PAGES.iter().position(|p| *p == app.page()).unwrap_or(0);
    let titles = PAGES
        .iter()
        .enumerate()
        .map(|(i, page)| format!("{} {}", i + 1, page.title()));
    let mode = if app.console.mode().is_demo() {
        Span::styled(" DEMO ", Style::default().fg(Color::Black).bg(Color::Yellow))
    } else {
        Span::styled(" LIVE ", Style::default().fg(Color::Black).bg(Color::Green))
    };
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(
            Block::bordered()
                .title(" Rollout console ")
                .title(Line::from(vec![mode]).right_aligned()),
        );
    f.render_widget(tabs, area);
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.notice {
        Some(notice) => Line::from(notice.as_str()).yellow(),
        None => {
            let hints = match app.page() {
                Page::Dashboard => "←/→ gauge  Enter drill down".to_string(),
                Page::Deployments => "↑/↓ task  f filter  c clear  e csv  p pdf".to_string(),
                Page::Deploy => deploy_hints(app),
            };
            Line::from(format!("{hints}  |  Tab page  d demo  r refresh  q quit")).dark_gray()
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

// =========================================================================
// Dashboard
// =========================================================================

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let state = &app.dashboard;
    let Some(snapshot) = state.snapshot.as_deref() else {
        let text = match &state.error_message {
            Some(message) => Line::from(message.as_str()).red(),
            None => Line::from("Loading dashboard..."),
        };
        f.render_widget(Paragraph::new(text).block(Block::bordered()), area);
        return;
    };

    let [banner, gauges, charts, lists] = Layout::vertical([
        Constraint::Length(if state.error_message.is_some() { 1 } else { 0 }),
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Min(6),
    ])
    .areas(area);

    if let Some(message) = &state.error_message {
        f.render_widget(
            Paragraph::new(format!("Refresh failed, showing last data: {message}")).red(),
            banner,
        );
    }

    draw_gauges(f, gauges, snapshot, app.gauge_cursor);

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(charts);
    let [top_left, bottom_left] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(left);
    let [top_right, bottom_right] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(right);
    draw_series(f, top_left, "Failure reasons", &derive::failure_reasons(&snapshot.metrics));
    draw_series(f, top_right, "Auth methods", &derive::auth_methods(&snapshot.metrics));
    draw_series(f, bottom_left, "Success by OS", &derive::success_by_os(&snapshot.metrics));
    draw_series(f, bottom_right, "Failures by OS", &derive::failure_by_os(&snapshot.metrics));

    let [errors, assessments] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(lists);
    draw_error_catalog(f, errors, snapshot);
    draw_assessments(f, assessments, snapshot);
}

fn draw_gauges(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, cursor: usize) {
    let gauges = derive::gauges(&snapshot.metrics);
    let areas = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    for (i, (gauge, area)) in gauges.iter().zip(areas.iter()).enumerate() {
        let border = if i == cursor {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let color = match gauge.drill_down {
            Some(rollout_core::types::StatusFilter::Failed) => Color::Red,
            Some(rollout_core::types::StatusFilter::Success) => Color::Green,
            None => Color::Blue,
        };
        let widget = Gauge::default()
            .block(Block::bordered().title(gauge.label).border_style(border))
            .gauge_style(Style::default().fg(color))
            .ratio(gauge.ratio())
            .label(format!("{}/{}", gauge.value, gauge.total));
        f.render_widget(widget, *area);
    }
}

fn draw_series(f: &mut Frame, area: Rect, title: &str, points: &[SeriesPoint]) {
    let items: Vec<ListItem> = points
        .iter()
        .map(|point| {
            let bar = "█".repeat((point.width * BAR_WIDTH).round() as usize);
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<14} ", truncate(&point.label, 14))),
                Span::styled(bar, Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {}", point.value)),
            ]))
        })
        .collect();
    f.render_widget(List::new(items).block(Block::bordered().title(title)), area);
}

fn draw_error_catalog(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let mut lines = Vec::new();
    for item in &snapshot.errors {
        lines.push(Line::from(vec![
            Span::styled(item.code.as_str(), Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(format!("  {}", item.message)),
        ]));
        lines.push(Line::from(format!("  {}", item.remediation)).dark_gray());
        for (n, step) in item.steps.iter().enumerate() {
            lines.push(Line::from(format!("    {}. {}", n + 1, step)));
        }
    }
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title("Error catalog")),
        area,
    );
}

fn draw_assessments(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let rows = snapshot.assessments.iter().map(|a| {
        let reachable = match a.reachable {
            Some(true) => Cell::from("yes").green(),
            Some(false) => Cell::from("no").red(),
            None => Cell::from("-"),
        };
        Row::new(vec![
            Cell::from(a.label.as_str()),
            Cell::from(a.os.as_str()),
            reachable,
            Cell::from(format!("{}%", a.predicted_success)),
            Cell::from(a.secure_method.as_str()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(14),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Min(8),
        ],
    )
    .header(Row::new(vec!["Target", "OS", "Up", "Pred", "Method"]).bold())
    .block(Block::bordered().title("Assessments"));
    f.render_widget(table, area);
}

// =========================================================================
// Deployments
// =========================================================================

fn draw_deployments(f: &mut Frame, area: Rect, app: &App) {
    let view = &app.deployments;
    let [tasks_area, rows_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(area);

    let filter_label = match (view.filter().external(), view.effective_filter()) {
        (Some(filter), _) => format!("{filter} (from dashboard)"),
        (None, Some(filter)) => filter.to_string(),
        (None, None) => "all".to_string(),
    };

    let tasks = view.visible_tasks(app.dashboard.tasks());
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|task| {
            ListItem::new(Line::from(vec![
                Span::raw(task.name.as_str()),
                Span::styled(format!("  {}", task.status), status_style(&task.status)),
            ]))
        })
        .collect();
    let empty = items.is_empty();
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ")
        .block(Block::bordered().title(format!("Tasks [{filter_label}]")));
    let mut state = ListState::default().with_selected((!empty).then_some(app.task_cursor));
    f.render_stateful_widget(list, tasks_area, &mut state);

    let title = match view.selected_task_id() {
        Some(id) => format!("Deployments of {id}"),
        None => "Deployments".to_string(),
    };
    let block = Block::bordered().title(title);

    if view.is_loading() {
        f.render_widget(Paragraph::new("Loading deployments...").block(block), rows_area);
        return;
    }
    if let Some(message) = view.error_message() {
        f.render_widget(Paragraph::new(message).red().block(block), rows_area);
        return;
    }
    if empty {
        f.render_widget(
            Paragraph::new("No tasks match the current filter.").block(block),
            rows_area,
        );
        return;
    }

    let rows = view.visible_rows().into_iter().map(|row| {
        Row::new(vec![
            Cell::from(row.target_label.as_str()),
            Cell::from(row.target_os.as_str()),
            Cell::from(row.status.as_str()).style(status_style(&row.status)),
            Cell::from(row.auth_method.as_str()),
            Cell::from(row.error_code.as_str()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(Row::new(vec!["Target", "OS", "Status", "Auth", "Error"]).bold())
    .block(block);
    f.render_widget(table, rows_area);
}

fn status_style(status: &str) -> Style {
    match status {
        "success" => Style::default().fg(Color::Green),
        "failed" => Style::default().fg(Color::Red),
        "running" => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    }
}

// =========================================================================
// Deploy wizard
// =========================================================================

fn draw_deploy(f: &mut Frame, area: Rect, app: &App) {
    let wizard = &app.wizard;
    let step = wizard.step();

    let [steps, body, effects] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(4),
    ])
    .areas(area);

    let mut spans = Vec::new();
    for s in WizardStep::ALL {
        let text = format!(" {} {} ", s.index() + 1, s.label());
        if s == step {
            spans.push(Span::styled(text, Style::default().fg(Color::Black).bg(Color::Cyan)));
        } else {
            spans.push(Span::raw(text));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), steps);

    let lines = if step == WizardStep::Review {
        review_lines(app)
    } else {
        field_lines(app, step)
    };
    let title = if wizard.is_submitting() {
        format!("{} (submitting...)", step.label())
    } else {
        step.label().to_string()
    };
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(title)),
        body,
    );

    let tracker = wizard.effects();
    let mut status = Vec::new();
    if let Some(upload) = tracker.upload_status() {
        let name = tracker.upload_file_name().unwrap_or_default();
        let detail = match tracker.upload() {
            OperationStatus::Completed(staged) => format!(" ({})", staged.package_summary()),
            OperationStatus::Idle | OperationStatus::InProgress | OperationStatus::Failed(_) => {
                String::new()
            }
        };
        status.push(Line::from(format!("Upload {name}: {upload}{detail}")));
    }
    if let Some(scan) = tracker.scan_status() {
        let result = tracker.scan_result().unwrap_or_default();
        status.push(Line::from(format!("{scan}: {result}")));
    }
    if let Some(message) = wizard.status_message() {
        status.push(Line::from(message).yellow());
    }
    f.render_widget(Paragraph::new(status).block(Block::bordered()), effects);
}

/// Side-effect keys read "busy" while their operation runs.
fn deploy_hints(app: &App) -> String {
    let effects = app.wizard.effects();
    let scan = if effects.scan().is_in_progress() {
        "s scan (busy)"
    } else {
        "s scan"
    };
    let upload = if effects.upload().is_in_progress() {
        "u upload (busy)"
    } else {
        "u upload"
    };
    format!("↑/↓ field  Enter edit  n/b step  {scan}  {upload}  x clear")
}

fn field_lines(app: &App, step: WizardStep) -> Vec<Line<'static>> {
    let wizard = &app.wizard;
    let mut lines = Vec::new();
    for (i, &field) in step.editable_fields().iter().enumerate() {
        let marker = if i == app.field_cursor { "> " } else { "  " };
        let value = display_value(field, &wizard.draft().value(field));
        let style = if i == app.field_cursor {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<22}", field.label()), style),
            Span::raw(value),
        ]));
        if let Some(error) = wizard.errors().get(field) {
            lines.push(Line::from(format!("    {error}")).red());
        }
    }
    if step == WizardStep::Targets {
        let count = wizard.draft().parsed_targets().len();
        lines.push(Line::from(format!("  {count} target(s) parsed")).dark_gray());
    }
    lines
}

fn review_lines(app: &App) -> Vec<Line<'static>> {
    let wizard = &app.wizard;
    let draft = wizard.draft();
    let mut lines = Vec::new();
    for field in [
        Field::TaskName,
        Field::Targets,
        Field::Aggressiveness,
        Field::SshUsername,
        Field::WinrmUsername,
        Field::InstallerUrl,
        Field::Checksum,
        Field::ScheduleMode,
        Field::StartAt,
    ] {
        let value = display_value(field, &draft.value(field));
        lines.push(Line::from(format!("  {:<22}{}", field.label(), value)));
        if let Some(error) = wizard.errors().get(field) {
            lines.push(Line::from(format!("    {error}")).red());
        }
    }
    lines.push(Line::default());
    lines.push(Line::from("  Press Enter to create the task").bold());
    lines
}

fn display_value(field: Field, value: &str) -> String {
    if field.is_secret() {
        mask(value)
    } else {
        value.replace('\n', ", ")
    }
}

fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
