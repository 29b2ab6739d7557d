//! The message composer: text entry, submission and mode toggles.
//!
//! The composer owns the text buffer and a small state machine around
//! dispatching it: plain send, web search and deep research. The two search
//! modes are mutually exclusive by construction (a single [`Mode`] enum plus
//! one `processing` slot). Display pacing — keeping the submitted text
//! briefly visible, holding the "processing" affordance for a minimum dwell
//! — is expressed as deadlines evaluated on the shared UI tick, never as
//! detached timers.

pub mod input;
pub mod placeholder;

pub use input::InputState;
pub use placeholder::{Phase, PlaceholderAnimator, INSPIRATIONAL_PHRASES};

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Prefix applied to web-search dispatches.
pub const WEB_SEARCH_TAG: &str = "[WebSearch] ";
/// Prefix applied to deep-research dispatches.
pub const DEEP_SEARCH_TAG: &str = "[DeepResearch] ";

/// How long submitted text stays visible before the buffer clears.
const SEND_CLEAR_DELAY: Duration = Duration::from_millis(500);
/// Clear delay after a mode dispatch settles.
const SEARCH_CLEAR_DELAY: Duration = Duration::from_millis(300);
/// Minimum time the processing affordance stays visible after settlement.
const PROCESSING_DWELL: Duration = Duration::from_millis(1500);

/// Enhanced-send variant applied via text prefixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    WebSearch,
    DeepSearch,
}

impl ModeKind {
    /// The tag prefixed to the dispatched text.
    pub fn tag(self) -> &'static str {
        match self {
            Self::WebSearch => WEB_SEARCH_TAG,
            Self::DeepSearch => DEEP_SEARCH_TAG,
        }
    }

    /// Idle button label.
    pub fn label(self) -> &'static str {
        match self {
            Self::WebSearch => "Web",
            Self::DeepSearch => "Deep",
        }
    }

    /// Label shown while this mode is processing.
    pub fn processing_label(self) -> &'static str {
        match self {
            Self::WebSearch => "Buscando...",
            Self::DeepSearch => "Investigando...",
        }
    }
}

/// Mutually exclusive composer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    None,
    WebSearch,
    DeepSearch,
}

impl From<ModeKind> for Mode {
    fn from(kind: ModeKind) -> Self {
        match kind {
            ModeKind::WebSearch => Self::WebSearch,
            ModeKind::DeepSearch => Self::DeepSearch,
        }
    }
}

/// What the composer asks its host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Send the trimmed message text.
    Send { text: String },
    /// Run a web search for the tagged query.
    WebSearch { query: String },
    /// Run a deep research pass for the tagged query.
    DeepSearch { query: String },
    /// Open the file picker.
    AttachFiles,
    /// Start voice input.
    VoiceInput,
}

/// Error type crossing the callback boundary.
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;
/// Future returned by a dispatch callback.
pub type DispatchFuture = Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send>>;
/// Async callback receiving the dispatched text.
pub type DispatchFn = Box<dyn Fn(String) -> DispatchFuture + Send + Sync>;
/// Fire-and-forget callback.
pub type ActionFn = Box<dyn Fn() + Send + Sync>;

/// Caller-supplied capabilities. Only `on_send_message` is required; an
/// absent capability makes its dispatch a no-op invocation (the composer's
/// own lifecycle still runs).
pub struct ComposerCallbacks {
    pub on_send_message: DispatchFn,
    pub on_web_search: Option<DispatchFn>,
    pub on_deep_search: Option<DispatchFn>,
    pub on_attach_files: Option<ActionFn>,
    pub on_voice_input: Option<ActionFn>,
}

/// The text-entry widget state and its submission/mode logic.
#[derive(Debug, Default)]
pub struct Composer {
    /// Text buffer and cursor.
    pub input: InputState,
    mode: Mode,
    processing: Option<ModeKind>,
    is_submitting: bool,
    disabled: bool,
    clear_text_at: Option<Instant>,
    processing_reset_at: Option<Instant>,
}

impl Composer {
    /// Create a new idle composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode with a dispatch in flight (or still within its dwell), if any.
    pub fn processing(&self) -> Option<ModeKind> {
        self.processing
    }

    /// Whether a plain send is awaiting settlement or its clear delay.
    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    /// Whether the composer rejects input.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Enable or disable the composer.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Signal for the placeholder animation: suspended whenever the buffer
    /// has content or the composer is disabled.
    pub fn placeholder_suspended(&self) -> bool {
        !self.input.is_empty() || self.disabled
    }

    /// Submit the current text.
    ///
    /// Returns the dispatch to run, or `None` when the trimmed buffer is
    /// empty or the composer is disabled (a strict no-op). The buffer is
    /// deliberately not cleared here; it clears a moment after settlement so
    /// the user sees what was sent.
    pub fn submit(&mut self) -> Option<Dispatch> {
        if self.disabled {
            return None;
        }
        let text = self.input.trimmed();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.is_submitting = true;
        Some(Dispatch::Send { text })
    }

    /// The send callback settled (ok or err): schedule the buffer clear.
    pub fn on_send_settled(&mut self, now: Instant) {
        self.is_submitting = false;
        self.clear_text_at = Some(now + SEND_CLEAR_DELAY);
    }

    /// Toggle or dispatch web search.
    pub fn activate_web_search(&mut self) -> Option<Dispatch> {
        self.activate_mode(ModeKind::WebSearch)
    }

    /// Toggle or dispatch deep research.
    pub fn activate_deep_search(&mut self) -> Option<Dispatch> {
        self.activate_mode(ModeKind::DeepSearch)
    }

    /// Guarded mode transition shared by both search variants.
    ///
    /// No-op while either mode is processing. With an empty buffer the mode
    /// flag merely toggles (forcing the other off). With text, the mode
    /// becomes active and processing, and the tagged query is dispatched.
    fn activate_mode(&mut self, kind: ModeKind) -> Option<Dispatch> {
        if self.processing.is_some() {
            return None;
        }

        let text = self.input.trimmed();
        if text.is_empty() {
            self.mode = if self.mode == Mode::from(kind) {
                Mode::None
            } else {
                Mode::from(kind)
            };
            return None;
        }

        let query = format!("{}{text}", kind.tag());
        self.processing = Some(kind);
        self.mode = Mode::from(kind);
        Some(match kind {
            ModeKind::WebSearch => Dispatch::WebSearch { query },
            ModeKind::DeepSearch => Dispatch::DeepSearch { query },
        })
    }

    /// A mode dispatch settled (ok or err): schedule the buffer clear and
    /// the end of the processing dwell.
    pub fn on_search_settled(&mut self, now: Instant) {
        self.clear_text_at = Some(now + SEARCH_CLEAR_DELAY);
        self.processing_reset_at = Some(now + PROCESSING_DWELL);
    }

    /// Pass-through: open the file picker.
    pub fn attach_files(&self) -> Dispatch {
        Dispatch::AttachFiles
    }

    /// Pass-through: start voice input.
    pub fn voice_input(&self) -> Dispatch {
        Dispatch::VoiceInput
    }

    /// Evaluate pending deadlines. Called from the shared UI tick.
    pub fn tick(&mut self, now: Instant) {
        if self.clear_text_at.is_some_and(|at| at <= now) {
            self.input.clear();
            self.clear_text_at = None;
        }
        if self.processing_reset_at.is_some_and(|at| at <= now) {
            self.processing = None;
            self.mode = Mode::None;
            self.processing_reset_at = None;
        }
    }
}
