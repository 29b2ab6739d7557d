//! Color palette for the TUI (Catppuccin Mocha).

use ratatui::style::Color;

/// Theme color palette.
#[derive(Debug, Clone)]
pub struct Theme {
    // Backgrounds
    pub base: Color,

    // Foregrounds
    pub text: Color,
    pub subtext: Color,
    pub muted: Color,

    // Accents
    pub primary: Color,
    /// Web-search affordance.
    pub web: Color,
    /// Deep-research affordance.
    pub deep: Color,

    // Semantic
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // Borders
    pub border: Color,
    pub border_focused: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::mocha()
    }
}

impl Theme {
    /// Catppuccin Mocha theme (default dark theme).
    pub fn mocha() -> Self {
        Self {
            base: Color::Rgb(0x1e, 0x1e, 0x2e),
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            subtext: Color::Rgb(0xa6, 0xad, 0xc8),
            muted: Color::Rgb(0x6c, 0x70, 0x86),
            primary: Color::Rgb(0xb4, 0xbe, 0xfe),
            web: Color::Rgb(0x89, 0xb4, 0xfa),
            deep: Color::Rgb(0xcb, 0xa6, 0xf7),
            success: Color::Rgb(0xa6, 0xe3, 0xa1),
            warning: Color::Rgb(0xf9, 0xe2, 0xaf),
            error: Color::Rgb(0xf3, 0x8b, 0xa8),
            info: Color::Rgb(0x89, 0xdc, 0xeb),
            border: Color::Rgb(0x45, 0x47, 0x5a),
            border_focused: Color::Rgb(0xb4, 0xbe, 0xfe),
        }
    }
}
