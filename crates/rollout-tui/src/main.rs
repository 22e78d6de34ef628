//! Rollout TUI - Terminal User Interface
//!
//! Ratatui-based operator console: live dashboard, deployment results and the
//! task creation wizard. Logs go to a file so they never draw over the screen.

mod app;
mod ui;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};
use rollout_core::config::ConsoleConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

const TICK: Duration = Duration::from_millis(120);

fn main() -> anyhow::Result<()> {
    let log_path = init_tracing()?;

    let config = ConsoleConfig::load()?;
    info!(base_url = %config.base_url, demo = config.demo_mode, log = ?log_path, "starting console");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let mut app = App::new(&config, runtime.handle().clone())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the TUI
    let res = run_tui(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    while !app.should_quit() {
        app.tick();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

/// Log to `<state dir>/rollout/rollout-tui.log`; without a state or cache
/// directory logging stays off.
fn init_tracing() -> anyhow::Result<Option<PathBuf>> {
    let Some(dir) = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("rollout"))
    else {
        return Ok(None);
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let path = dir.join("rollout-tui.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollout_tui=debug,rollout_core=debug,info".into()),
        )
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .init();

    Ok(Some(path))
}
