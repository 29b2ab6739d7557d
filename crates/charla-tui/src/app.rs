//! Application state for the charla TUI.
//!
//! The `App` wires the composer to its callbacks and the connection monitor
//! to the screen. Background work (dispatch callbacks, endpoint refreshes)
//! runs on spawned tasks; their results are folded back in on the UI tick.

use std::time::Instant;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use charla_engine::{ConnectionMonitor, ConnectionState, OllamaClient, Settings};

use crate::composer::{
    ActionFn, Composer, ComposerCallbacks, Dispatch, DispatchError, DispatchFn,
    PlaceholderAnimator,
};

/// Static placeholder shown while the animation is suspended.
pub const DEFAULT_PLACEHOLDER: &str = "Describe tu tarea...";

/// Notification lifetime in ticks (~3s at the 40ms tick rate).
const NOTIFICATION_TICKS: u16 = 75;

/// What the host loop should do in response to a key.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Run a composer dispatch.
    Dispatch(Dispatch),
    /// Refresh the endpoint connection state.
    RefreshConnection,
}

/// Which settlement path a pending dispatch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Send,
    Search,
}

/// One dispatched message in the scrollback.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// Events produced by the default callbacks, drained on tick.
#[derive(Debug)]
pub enum AppEvent {
    Message(TranscriptEntry),
    Notice(String),
}

/// Top-level TUI state.
pub struct App {
    /// The message composer.
    pub composer: Composer,
    /// Animated placeholder for the composer.
    pub placeholder: PlaceholderAnimator,
    /// Caller-supplied dispatch callbacks.
    pub callbacks: ComposerCallbacks,
    /// Ollama endpoint monitor.
    pub monitor: ConnectionMonitor,
    /// Dispatched messages, oldest first.
    pub transcript: Vec<TranscriptEntry>,
    /// Transient notice shown in the transcript pane.
    pub notification: Option<String>,
    notification_ttl: u16,
    /// Whether the action-button row is shown.
    pub show_action_row: bool,
    /// Set when the user asks to quit.
    pub should_quit: bool,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create the app from settings. The default callbacks append sends and
    /// tagged searches to the transcript and raise notices for the
    /// affordances that have no backing feature yet.
    pub fn new(settings: &Settings, now: Instant) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = OllamaClient::new(settings.resolve_backend_url());
        let monitor = ConnectionMonitor::new(
            client,
            settings.ollama_endpoint.clone(),
            settings.ollama_enabled,
        );

        Self {
            composer: Composer::new(),
            placeholder: PlaceholderAnimator::with_default_phrases(DEFAULT_PLACEHOLDER, now),
            callbacks: default_callbacks(&tx),
            monitor,
            transcript: Vec::new(),
            notification: None,
            notification_ttl: 0,
            show_action_row: true,
            should_quit: false,
            events_rx: rx,
        }
    }

    /// Route a key press. Text edits mutate the composer directly; anything
    /// the host loop must act on comes back as a [`Command`].
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    None
                }
                // Ctrl+Enter inserts a literal newline; plain Enter submits.
                KeyCode::Enter => {
                    if !self.composer.is_disabled() {
                        self.composer.input.insert('\n');
                        self.sync_placeholder(now);
                    }
                    None
                }
                KeyCode::Char('w') => self.composer.activate_web_search().map(Command::Dispatch),
                KeyCode::Char('d') => self.composer.activate_deep_search().map(Command::Dispatch),
                KeyCode::Char('a') => Some(Command::Dispatch(self.composer.attach_files())),
                KeyCode::Char('v') => Some(Command::Dispatch(self.composer.voice_input())),
                KeyCode::Char('r') => Some(Command::RefreshConnection),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Enter => self.composer.submit().map(Command::Dispatch),
            KeyCode::Char(c) => {
                if !self.composer.is_disabled() {
                    self.composer.input.insert(c);
                    self.sync_placeholder(now);
                }
                None
            }
            KeyCode::Backspace => {
                if !self.composer.is_disabled() {
                    self.composer.input.backspace();
                    self.sync_placeholder(now);
                }
                None
            }
            KeyCode::Delete => {
                if !self.composer.is_disabled() {
                    self.composer.input.delete();
                    self.sync_placeholder(now);
                }
                None
            }
            KeyCode::Left => {
                self.composer.input.move_left();
                None
            }
            KeyCode::Right => {
                self.composer.input.move_right();
                None
            }
            KeyCode::Home => {
                self.composer.input.move_home();
                None
            }
            KeyCode::End => {
                self.composer.input.move_end();
                None
            }
            _ => None,
        }
    }

    /// Run a dispatch through the callbacks. Returns the pending handle for
    /// dispatches that settle later; absent optional callbacks settle
    /// immediately (the delay/dwell lifecycle still runs).
    pub fn execute_dispatch(
        &mut self,
        dispatch: Dispatch,
        now: Instant,
    ) -> Option<(PendingKind, JoinHandle<Result<(), DispatchError>>)> {
        match dispatch {
            Dispatch::Send { text } => {
                let fut = (self.callbacks.on_send_message)(text);
                Some((PendingKind::Send, tokio::spawn(fut)))
            }
            Dispatch::WebSearch { query } => {
                if let Some(cb) = &self.callbacks.on_web_search {
                    let fut = cb(query);
                    Some((PendingKind::Search, tokio::spawn(fut)))
                } else {
                    warn!("web search dispatched with no handler registered");
                    self.composer.on_search_settled(now);
                    None
                }
            }
            Dispatch::DeepSearch { query } => {
                if let Some(cb) = &self.callbacks.on_deep_search {
                    let fut = cb(query);
                    Some((PendingKind::Search, tokio::spawn(fut)))
                } else {
                    warn!("deep search dispatched with no handler registered");
                    self.composer.on_search_settled(now);
                    None
                }
            }
            Dispatch::AttachFiles => {
                if let Some(cb) = &self.callbacks.on_attach_files {
                    cb();
                }
                None
            }
            Dispatch::VoiceInput => {
                if let Some(cb) = &self.callbacks.on_voice_input {
                    cb();
                }
                None
            }
        }
    }

    /// A pending dispatch settled. Failures are logged and swallowed; the
    /// composer always returns to an interactive state.
    pub fn on_dispatch_settled(
        &mut self,
        kind: PendingKind,
        result: Result<(), DispatchError>,
        now: Instant,
    ) {
        if let Err(err) = result {
            warn!("dispatch failed: {err}");
        }
        match kind {
            PendingKind::Send => self.composer.on_send_settled(now),
            PendingKind::Search => self.composer.on_search_settled(now),
        }
    }

    /// Kick off a background refresh of the connection state. The app's own
    /// copy is marked loading; the task returns the refreshed state.
    pub fn spawn_refresh(&mut self) -> JoinHandle<ConnectionState> {
        let mut probe = self.monitor.clone();
        let mut loading = self.monitor.state().clone();
        loading.is_loading = true;
        self.monitor.replace_state(loading);

        tokio::spawn(async move {
            probe.refresh().await;
            probe.state().clone()
        })
    }

    /// Fold a completed background refresh back in (later writers win).
    pub fn apply_refresh(&mut self, state: ConnectionState) {
        self.monitor.replace_state(state);
    }

    /// Advance deadlines and drain callback events. Called on every tick.
    pub fn tick(&mut self, now: Instant) {
        self.composer.tick(now);
        self.sync_placeholder(now);
        self.placeholder.tick(now);

        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Message(entry) => self.transcript.push(entry),
                AppEvent::Notice(text) => {
                    self.notification = Some(text);
                    self.notification_ttl = NOTIFICATION_TICKS;
                }
            }
        }

        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }

    fn sync_placeholder(&mut self, now: Instant) {
        self.placeholder
            .set_suspended(self.composer.placeholder_suspended(), now);
    }
}

fn transcript_callback(tx: &mpsc::UnboundedSender<AppEvent>) -> DispatchFn {
    let tx = tx.clone();
    Box::new(move |text| {
        let tx = tx.clone();
        Box::pin(async move {
            tx.send(AppEvent::Message(TranscriptEntry {
                text,
                sent_at: Utc::now(),
            }))
            .map_err(|_| DispatchError::from("app event channel closed"))?;
            Ok(())
        })
    })
}

fn notice_callback(tx: &mpsc::UnboundedSender<AppEvent>, message: &'static str) -> ActionFn {
    let tx = tx.clone();
    Box::new(move || {
        let _ = tx.send(AppEvent::Notice(message.to_string()));
    })
}

fn default_callbacks(tx: &mpsc::UnboundedSender<AppEvent>) -> ComposerCallbacks {
    ComposerCallbacks {
        on_send_message: transcript_callback(tx),
        on_web_search: Some(transcript_callback(tx)),
        on_deep_search: Some(transcript_callback(tx)),
        on_attach_files: Some(notice_callback(
            tx,
            "Adjuntar archivos no está disponible todavía",
        )),
        on_voice_input: Some(notice_callback(
            tx,
            "Entrada de voz no está disponible todavía",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::Mode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn test_app(now: Instant) -> App {
        App::new(&Settings::default(), now)
    }

    #[tokio::test]
    async fn test_send_callback_invoked_exactly_once_with_trimmed_text() {
        let now = Instant::now();
        let mut app = test_app(now);

        let count = Arc::new(AtomicUsize::new(0));
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let (count2, seen2) = (Arc::clone(&count), Arc::clone(&seen));
        app.callbacks.on_send_message = Box::new(move |text| {
            let (count, seen) = (Arc::clone(&count2), Arc::clone(&seen2));
            Box::pin(async move {
                count.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(text);
                Ok(())
            })
        });

        app.composer.input.insert_str("  foo  ");
        let Some(Command::Dispatch(dispatch)) = app.handle_key(key(KeyCode::Enter), now) else {
            panic!("expected a send dispatch");
        };
        let (kind, handle) = app.execute_dispatch(dispatch, now).unwrap();
        let result = handle.await.unwrap();
        app.on_dispatch_settled(kind, result, now);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap().as_slice(), ["foo".to_string()]);

        // Text vanishes after the display delay.
        app.tick(now + Duration::from_millis(500));
        assert!(app.composer.input.is_empty());
    }

    #[tokio::test]
    async fn test_default_send_appends_to_transcript() {
        let now = Instant::now();
        let mut app = test_app(now);

        app.composer.input.insert_str("hola");
        let Some(Command::Dispatch(dispatch)) = app.handle_key(key(KeyCode::Enter), now) else {
            panic!("expected a send dispatch");
        };
        let (kind, handle) = app.execute_dispatch(dispatch, now).unwrap();
        let result = handle.await.unwrap();
        app.on_dispatch_settled(kind, result, now);
        app.tick(now);

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0].text, "hola");
    }

    #[tokio::test]
    async fn test_failed_dispatch_still_resets_composer() {
        let now = Instant::now();
        let mut app = test_app(now);
        app.callbacks.on_web_search = Some(Box::new(|_| {
            Box::pin(async { Err(DispatchError::from("backend rejected the query")) })
        }));

        app.composer.input.insert_str("foo");
        let Some(Command::Dispatch(dispatch)) = app.handle_key(ctrl(KeyCode::Char('w')), now)
        else {
            panic!("expected a web search dispatch");
        };
        let (kind, handle) = app.execute_dispatch(dispatch, now).unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_err());
        app.on_dispatch_settled(kind, result, now);

        app.tick(now + Duration::from_millis(1500));
        assert_eq!(app.composer.processing(), None);
        assert_eq!(app.composer.mode(), Mode::None);
        assert!(app.composer.input.is_empty());
    }

    #[tokio::test]
    async fn test_missing_search_handler_settles_immediately() {
        let now = Instant::now();
        let mut app = test_app(now);
        app.callbacks.on_web_search = None;

        app.composer.input.insert_str("foo");
        let Some(Command::Dispatch(dispatch)) = app.handle_key(ctrl(KeyCode::Char('w')), now)
        else {
            panic!("expected a web search dispatch");
        };
        assert!(app.execute_dispatch(dispatch, now).is_none());

        app.tick(now + Duration::from_millis(300));
        assert!(app.composer.input.is_empty());
        app.tick(now + Duration::from_millis(1500));
        assert_eq!(app.composer.processing(), None);
    }

    #[tokio::test]
    async fn test_attach_notice_surfaces_on_tick() {
        let now = Instant::now();
        let mut app = test_app(now);

        let Some(Command::Dispatch(dispatch)) = app.handle_key(ctrl(KeyCode::Char('a')), now)
        else {
            panic!("expected an attach dispatch");
        };
        assert!(app.execute_dispatch(dispatch, now).is_none());

        app.tick(now);
        assert!(app
            .notification
            .as_deref()
            .is_some_and(|n| n.contains("Adjuntar")));
    }

    #[tokio::test]
    async fn test_disabled_monitor_refresh_returns_clean_state() {
        let now = Instant::now();
        let settings = Settings {
            ollama_enabled: false,
            ..Settings::default()
        };
        let mut app = App::new(&settings, now);

        let handle = app.spawn_refresh();
        assert!(app.monitor.state().is_loading);

        let state = handle.await.unwrap();
        app.apply_refresh(state);

        assert!(!app.monitor.state().is_loading);
        assert!(!app.monitor.state().is_connected);
        assert!(app.monitor.state().models.is_empty());
        assert!(app.monitor.state().error.is_none());
    }

    #[test]
    fn test_ctrl_c_quits() {
        let now = Instant::now();
        let mut app = test_app(now);
        assert_eq!(app.handle_key(ctrl(KeyCode::Char('c')), now), None);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_r_requests_refresh() {
        let now = Instant::now();
        let mut app = test_app(now);
        assert_eq!(
            app.handle_key(ctrl(KeyCode::Char('r')), now),
            Some(Command::RefreshConnection)
        );
    }

    #[test]
    fn test_typing_suspends_placeholder_and_clearing_resumes() {
        let now = Instant::now();
        let mut app = test_app(now);
        assert!(!app.placeholder.is_suspended());

        app.handle_key(key(KeyCode::Char('h')), now);
        assert!(app.placeholder.is_suspended());

        app.handle_key(key(KeyCode::Backspace), now);
        assert!(!app.placeholder.is_suspended());
    }

    #[test]
    fn test_ctrl_enter_inserts_newline() {
        let now = Instant::now();
        let mut app = test_app(now);
        app.composer.input.insert_str("hola");
        app.handle_key(ctrl(KeyCode::Enter), now);
        app.handle_key(key(KeyCode::Char('x')), now);
        assert_eq!(app.composer.input.content(), "hola\nx");
    }

    #[test]
    fn test_empty_submit_produces_no_command() {
        let now = Instant::now();
        let mut app = test_app(now);
        assert_eq!(app.handle_key(key(KeyCode::Enter), now), None);
    }
}
