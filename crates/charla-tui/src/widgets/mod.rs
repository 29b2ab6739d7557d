//! Shared widgets for the charla TUI.

mod composer_bar;
mod connection_panel;
mod transcript;

pub use composer_bar::ComposerBar;
pub use connection_panel::ConnectionPanel;
pub use transcript::TranscriptView;
