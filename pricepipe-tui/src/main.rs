//! pricepipe TUI: form front end for the fetch, normalize and CSV pipeline.
//!
//! Panels:
//! 1. Form: ticker input, period selector, results, preview, save
//! 2. Chart: close price by date
//! 3. Help: keyboard shortcuts

mod app;
mod input;
mod persistence;
mod theme;
mod ui;
mod worker;

use std::fs::{self, File};
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pricepipe_core::{OutputLayout, Pipeline, PipelineConfig};

use crate::app::AppState;
use crate::persistence::PersistedState;
use crate::worker::WorkerCommand;

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let app_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pricepipe");
    let state_path = app_dir.join("state.json");

    init_logging(&app_dir.join("tui.log"));

    let config = load_config(&app_dir)?;
    let layout = OutputLayout::new(config.output_dir.clone());
    let pipeline = Pipeline::from_config(&config).context("failed to build price provider")?;
    info!(output_dir = %config.output_dir.display(), "starting TUI");

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(pipeline, cmd_rx, resp_tx)
        .context("failed to spawn worker thread")?;

    let mut app = AppState::new(cmd_tx.clone(), resp_rx, layout);

    // Apply persisted state; a first run starts from the configured period.
    let persisted = if state_path.exists() {
        persistence::load(&state_path)
    } else {
        PersistedState {
            last_period: config.default_period,
            ..PersistedState::default()
        }
    };
    persistence::apply(&mut app, persisted);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Save state before exit
    if let Err(e) = persistence::save(&state_path, &persistence::extract(&app)) {
        warn!(error = %e, "failed to save TUI state");
    }

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}

/// Log to a file; stdout belongs to the terminal UI.
fn init_logging(log_path: &Path) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pricepipe_tui=info,pricepipe_core=info"));

    let file = log_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| File::create(log_path));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false);
    match file {
        Ok(file) => builder.with_writer(Mutex::new(file)).init(),
        Err(_) => builder.with_writer(io::sink).init(),
    }
}

/// First of `<config dir>/pricepipe/config.toml` and `./pricepipe.toml` that exists.
fn load_config(app_dir: &Path) -> Result<PipelineConfig> {
    let candidates = [app_dir.join("config.toml"), PathBuf::from("pricepipe.toml")];
    match candidates.iter().find(|p| p.exists()) {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}
