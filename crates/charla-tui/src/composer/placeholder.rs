//! Animated cycling placeholder for the composer.
//!
//! While the input is empty and enabled, the placeholder types out a phrase
//! character by character, holds it, erases it, pauses and moves to the next
//! phrase. The whole animation is a finite state machine driven by the UI
//! tick: every pending "timer" is a single deadline held in the state, so
//! suspension or dropping the animator cancels everything at once.

use std::time::{Duration, Instant};

/// Phrases cycled through while the composer is idle.
pub const INSPIRATIONAL_PHRASES: &[&str] = &[
    "Crea algo extraordinario hoy...",
    "¿Qué problema resolvemos juntos?",
    "Convierte tus ideas en realidad...",
    "¿Qué haremos posible hoy?",
    "Diseña el futuro que imaginas...",
    "¿Qué desafío enfrentaremos?",
    "Construye algo increíble...",
    "¿Cuál es tu próxima gran idea?",
    "Transforma tu visión en acción...",
    "¿Qué aventura comenzamos?",
    "Innova sin límites...",
    "¿Qué quieres lograr hoy?",
    "Haz que cada línea de código cuente...",
    "¿Qué sueño hacemos realidad?",
    "Crea, experimenta, descubre...",
];

const TYPE_INTERVAL: Duration = Duration::from_millis(80);
const HOLD_FULL: Duration = Duration::from_millis(3000);
const ERASE_INTERVAL: Duration = Duration::from_millis(50);
const HOLD_EMPTY: Duration = Duration::from_millis(1000);
const RESUME_DEBOUNCE: Duration = Duration::from_millis(100);

/// Animation phase for the current phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Appending one character per interval.
    Typing,
    /// Full phrase visible, waiting.
    HoldingFull,
    /// Removing one character per interval.
    Erasing,
    /// Empty, waiting before advancing to the next phrase.
    HoldingEmpty,
}

/// Tick-driven placeholder animation state.
#[derive(Debug, Clone)]
pub struct PlaceholderAnimator {
    phrases: Vec<String>,
    fallback: String,
    index: usize,
    shown: usize,
    phase: Phase,
    next_at: Option<Instant>,
    suspended: bool,
}

impl PlaceholderAnimator {
    /// Create an animator over the given phrases. `fallback` is the static
    /// placeholder shown while the animation is suspended.
    pub fn new(
        phrases: impl IntoIterator<Item = impl Into<String>>,
        fallback: impl Into<String>,
        now: Instant,
    ) -> Self {
        let phrases: Vec<String> = phrases.into_iter().map(Into::into).collect();
        // An empty phrase list never animates.
        let next_at = (!phrases.is_empty()).then_some(now + RESUME_DEBOUNCE);
        Self {
            phrases,
            fallback: fallback.into(),
            index: 0,
            shown: 0,
            phase: Phase::Typing,
            next_at,
            suspended: false,
        }
    }

    /// Create an animator over the built-in phrase list.
    pub fn with_default_phrases(fallback: impl Into<String>, now: Instant) -> Self {
        Self::new(INSPIRATIONAL_PHRASES.iter().copied(), fallback, now)
    }

    /// Current animation phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the phrase currently animated.
    pub fn phrase_index(&self) -> usize {
        self.index
    }

    /// Whether the animation is suspended.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Whether a typing cursor should be shown.
    pub fn is_typing(&self) -> bool {
        !self.suspended && self.phase == Phase::Typing
    }

    /// Suspend or resume the animation.
    ///
    /// Suspending drops the pending deadline (no further ticks mutate the
    /// display) and switches to the static fallback. Resuming restarts the
    /// typing of the current phrase after a short debounce.
    pub fn set_suspended(&mut self, suspended: bool, now: Instant) {
        if suspended == self.suspended {
            return;
        }
        self.suspended = suspended;
        if suspended {
            self.next_at = None;
        } else {
            self.phase = Phase::Typing;
            self.shown = 0;
            self.next_at = (!self.phrases.is_empty()).then_some(now + RESUME_DEBOUNCE);
        }
    }

    /// Advance the animation up to `now`, catching up across any deadlines
    /// that have already passed.
    pub fn tick(&mut self, now: Instant) {
        if self.suspended {
            return;
        }
        while let Some(at) = self.next_at {
            if at > now {
                break;
            }
            self.step(at);
        }
    }

    fn phrase_len(&self) -> usize {
        self.phrases[self.index].chars().count()
    }

    fn step(&mut self, at: Instant) {
        match self.phase {
            Phase::Typing => {
                if self.shown < self.phrase_len() {
                    self.shown += 1;
                }
                if self.shown >= self.phrase_len() {
                    self.phase = Phase::HoldingFull;
                    self.next_at = Some(at + HOLD_FULL);
                } else {
                    self.next_at = Some(at + TYPE_INTERVAL);
                }
            }
            Phase::HoldingFull => {
                self.phase = Phase::Erasing;
                self.next_at = Some(at + ERASE_INTERVAL);
            }
            Phase::Erasing => {
                self.shown = self.shown.saturating_sub(1);
                if self.shown == 0 {
                    self.phase = Phase::HoldingEmpty;
                    self.next_at = Some(at + HOLD_EMPTY);
                } else {
                    self.next_at = Some(at + ERASE_INTERVAL);
                }
            }
            Phase::HoldingEmpty => {
                self.index = (self.index + 1) % self.phrases.len();
                self.phase = Phase::Typing;
                self.shown = 0;
                self.next_at = Some(at + TYPE_INTERVAL);
            }
        }
    }

    /// The text to display: the animated slice of the current phrase, or the
    /// static fallback while suspended.
    pub fn visible_text(&self) -> &str {
        if self.suspended {
            return &self.fallback;
        }
        let Some(phrase) = self.phrases.get(self.index) else {
            return "";
        };
        let end = phrase
            .char_indices()
            .nth(self.shown)
            .map_or(phrase.len(), |(i, _)| i);
        &phrase[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn animator(phrases: &[&str]) -> (PlaceholderAnimator, Instant) {
        let start = Instant::now();
        let anim = PlaceholderAnimator::new(phrases.iter().copied(), "static", start);
        (anim, start)
    }

    #[test]
    fn test_types_holds_erases_and_advances() {
        let (mut anim, start) = animator(&["A", "BC"]);
        assert_eq!(anim.visible_text(), "");

        // Debounce (100ms), then the single char appears.
        anim.tick(start + ms(100));
        assert_eq!(anim.visible_text(), "A");
        assert_eq!(anim.phase(), Phase::HoldingFull);

        // Hold full for 3000ms, then the erase interval removes it.
        anim.tick(start + ms(3100));
        assert_eq!(anim.phase(), Phase::Erasing);
        assert_eq!(anim.visible_text(), "A");
        anim.tick(start + ms(3150));
        assert_eq!(anim.visible_text(), "");
        assert_eq!(anim.phase(), Phase::HoldingEmpty);

        // Hold empty 1000ms, advance to the next phrase and type it out.
        anim.tick(start + ms(4150));
        assert_eq!(anim.phrase_index(), 1);
        anim.tick(start + ms(4230));
        assert_eq!(anim.visible_text(), "B");
        anim.tick(start + ms(4310));
        assert_eq!(anim.visible_text(), "BC");
        assert_eq!(anim.phase(), Phase::HoldingFull);
    }

    #[test]
    fn test_cycles_back_to_first_phrase() {
        let (mut anim, start) = animator(&["A", "BC"]);
        // Far enough to finish both phrases; the catch-up loop replays every
        // intermediate deadline, so a single late tick suffices.
        // "A": 100 type + 3000 hold + 50 erase + 1000 hold = 4150
        // "BC": 80 + 80 type + 3000 hold + 50 + 50 erase + 1000 hold = 8410
        anim.tick(start + ms(8410));
        assert_eq!(anim.phrase_index(), 0);
        assert_eq!(anim.phase(), Phase::Typing);
    }

    #[test]
    fn test_suspension_shows_fallback_and_freezes() {
        let (mut anim, start) = animator(&["Hola"]);
        anim.tick(start + ms(200)); // "Ho"
        assert_eq!(anim.visible_text(), "Ho");

        anim.set_suspended(true, start + ms(300));
        assert_eq!(anim.visible_text(), "static");

        // Ticks while suspended change nothing.
        anim.tick(start + ms(60_000));
        assert_eq!(anim.visible_text(), "static");
        assert!(anim.is_suspended());
    }

    #[test]
    fn test_resume_restarts_current_phrase_after_debounce() {
        let (mut anim, start) = animator(&["A", "BC"]);
        // Advance into the second phrase, then suspend.
        anim.tick(start + ms(4230)); // "B"
        assert_eq!(anim.phrase_index(), 1);
        anim.set_suspended(true, start + ms(4240));

        let resume = start + ms(10_000);
        anim.set_suspended(false, resume);
        assert_eq!(anim.visible_text(), "");

        // Still within the debounce window: nothing shown yet.
        anim.tick(resume + ms(99));
        assert_eq!(anim.visible_text(), "");

        anim.tick(resume + ms(100));
        assert_eq!(anim.visible_text(), "B");
        assert_eq!(anim.phrase_index(), 1);
    }

    #[test]
    fn test_redundant_suspend_is_ignored() {
        let (mut anim, start) = animator(&["A"]);
        anim.tick(start + ms(100));
        anim.set_suspended(true, start + ms(200));
        let before = anim.visible_text().to_string();
        anim.set_suspended(true, start + ms(300));
        assert_eq!(anim.visible_text(), before);
    }

    #[test]
    fn test_multibyte_phrase_slicing() {
        let (mut anim, start) = animator(&["¿Qué?"]);
        anim.tick(start + ms(100));
        assert_eq!(anim.visible_text(), "¿");
        anim.tick(start + ms(180));
        assert_eq!(anim.visible_text(), "¿Q");
    }

    #[test]
    fn test_empty_phrase_list_never_animates() {
        let start = Instant::now();
        let mut anim = PlaceholderAnimator::new(Vec::<String>::new(), "static", start);
        anim.tick(start + ms(60_000));
        assert_eq!(anim.visible_text(), "");
        anim.set_suspended(true, start);
        assert_eq!(anim.visible_text(), "static");
    }
}
