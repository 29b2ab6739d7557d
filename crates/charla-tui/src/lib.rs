//! charla-tui: terminal front-end for the charla composer.
//!
//! This crate provides the TUI layer, including:
//! - The message composer with its animated placeholder
//! - Web-search / deep-research mode toggles
//! - The Ollama connection panel and transcript view

pub mod app;
pub mod composer;
mod event;
pub mod theme;
pub mod widgets;

pub use app::{App, Command, PendingKind, TranscriptEntry, DEFAULT_PLACEHOLDER};
pub use charla_engine;
pub use event::{Event, EventHandler};

use std::io::{self, stdout};
use std::time::Instant;

use crossterm::{
    cursor::Show as ShowCursor,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Frame, Terminal,
};
use tokio::task::JoinHandle;

use charla_engine::{ConnectionState, Settings};

use crate::composer::DispatchError;
use crate::theme::Theme;
use crate::widgets::{ComposerBar, ConnectionPanel, TranscriptView};

/// Tick rate driving the placeholder animation and composer deadlines.
/// 40ms keeps the 80ms/50ms typing cadence smooth.
const TICK_RATE_MS: u64 = 40;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit.
pub async fn run_tui(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, Instant::now());
    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    let theme = Theme::default();

    // In-flight dispatch callbacks awaiting settlement.
    let mut pending: Vec<(PendingKind, JoinHandle<Result<(), DispatchError>>)> = Vec::new();
    // In-flight endpoint refreshes.
    let mut refreshes: Vec<JoinHandle<ConnectionState>> = Vec::new();

    // Probe the endpoint once on startup.
    if app.monitor.enabled() {
        refreshes.push(app.spawn_refresh());
    }

    loop {
        terminal.draw(|frame| draw(frame, app, &theme))?;

        // Settle completed dispatches (non-blocking).
        let mut completed = Vec::new();
        for (i, (_, handle)) in pending.iter().enumerate() {
            if handle.is_finished() {
                completed.push(i);
            }
        }
        for i in completed.into_iter().rev() {
            let (kind, handle) = pending.remove(i);
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(DispatchError::from(join_err.to_string())),
            };
            app.on_dispatch_settled(kind, result, Instant::now());
        }

        // Fold in completed refreshes; later completions overwrite earlier.
        let mut done = Vec::new();
        for (i, handle) in refreshes.iter().enumerate() {
            if handle.is_finished() {
                done.push(i);
            }
        }
        for i in done.into_iter().rev() {
            if let Ok(state) = refreshes.remove(i).await {
                app.apply_refresh(state);
            }
        }

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    if let Some(command) = app.handle_key(key, Instant::now()) {
                        match command {
                            Command::Dispatch(dispatch) => {
                                if let Some(task) = app.execute_dispatch(dispatch, Instant::now())
                                {
                                    pending.push(task);
                                }
                            }
                            Command::RefreshConnection => {
                                refreshes.push(app.spawn_refresh());
                            }
                        }
                    }
                }
                Event::Tick => {
                    app.tick(Instant::now());
                }
                Event::Resize(_, _) => {
                    // Terminal will handle resize automatically
                }
            }
        }

        if app.should_quit {
            for (_, handle) in pending {
                handle.abort();
            }
            for handle in refreshes {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn draw(frame: &mut Frame, app: &App, theme: &Theme) {
    // Panel grows with the model list, capped so the transcript keeps room.
    let panel_height = (5 + app.monitor.state().models.len() as u16).min(10);

    let input_lines = if app.composer.input.is_empty() {
        1
    } else {
        app.composer.input.content().split('\n').count() as u16
    };
    let composer_height = input_lines.min(5) + 2 + u16::from(app.show_action_row);

    let [panel_area, transcript_area, composer_area] = Layout::vertical([
        Constraint::Length(panel_height),
        Constraint::Min(3),
        Constraint::Length(composer_height),
    ])
    .areas(frame.area());

    frame.render_widget(
        ConnectionPanel::new(
            app.monitor.state(),
            app.monitor.endpoint(),
            app.monitor.enabled(),
            theme,
        ),
        panel_area,
    );

    frame.render_widget(
        TranscriptView::new(&app.transcript, theme).notification(app.notification.as_deref()),
        transcript_area,
    );

    frame.render_widget(
        ComposerBar::new(&app.composer, &app.placeholder, theme)
            .focused(true)
            .show_actions(app.show_action_row),
        composer_area,
    );
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
