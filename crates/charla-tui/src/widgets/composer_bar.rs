//! Full-width composer bar widget.
//!
//! Always visible at the bottom of the screen. Renders the text buffer with
//! a block cursor, the animated placeholder while the buffer is empty, and
//! an optional action row for the attach / web / deep / voice affordances.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::composer::{Composer, Mode, ModeKind, PlaceholderAnimator};
use crate::theme::Theme;

/// Full-width composer bar.
pub struct ComposerBar<'a> {
    composer: &'a Composer,
    placeholder: &'a PlaceholderAnimator,
    theme: &'a Theme,
    focused: bool,
    show_actions: bool,
}

impl<'a> ComposerBar<'a> {
    /// Create a new composer bar widget.
    pub fn new(
        composer: &'a Composer,
        placeholder: &'a PlaceholderAnimator,
        theme: &'a Theme,
    ) -> Self {
        Self {
            composer,
            placeholder,
            theme,
            focused: false,
            show_actions: false,
        }
    }

    /// Set whether the composer bar is focused.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Toggle the action-button row.
    #[must_use]
    pub fn show_actions(mut self, show: bool) -> Self {
        self.show_actions = show;
        self
    }

    /// Placeholder line shown while the buffer is empty.
    fn placeholder_line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled("> ", Style::default().fg(self.theme.primary))];
        if self.focused {
            spans.push(Span::styled(
                "█",
                Style::default().fg(self.theme.subtext),
            ));
        }
        spans.push(Span::styled(
            self.placeholder.visible_text().to_string(),
            Style::default().fg(self.theme.muted),
        ));
        if self.placeholder.is_typing() {
            spans.push(Span::styled("|", Style::default().fg(self.theme.info)));
        }
        Line::from(spans)
    }

    /// Build lines for multi-line input display.
    /// Returns the lines and which line index contains the cursor.
    fn build_input_lines(&self) -> (Vec<Line<'static>>, usize) {
        let content = self.composer.input.content();
        let cursor_pos = self.composer.input.cursor();

        let text_lines: Vec<&str> = if content.is_empty() {
            vec![""]
        } else {
            content.split('\n').collect()
        };

        // Locate the cursor line and column (character counts).
        let mut char_count = 0;
        let mut cursor_line = 0;
        let mut cursor_col = 0;
        for (line_idx, line) in text_lines.iter().enumerate() {
            let line_len = line.chars().count();
            if cursor_pos <= char_count + line_len {
                cursor_line = line_idx;
                cursor_col = cursor_pos - char_count;
                break;
            }
            // +1 for the newline character
            char_count += line_len + 1;
            cursor_line = line_idx;
            cursor_col = 0;
        }

        let text_style = if self.composer.is_submitting() {
            Style::default().fg(self.theme.muted)
        } else {
            Style::default().fg(self.theme.text)
        };

        let mut lines = Vec::with_capacity(text_lines.len());
        for (line_idx, line_text) in text_lines.iter().enumerate() {
            let prefix = if line_idx == 0 { "> " } else { "  " };

            if self.focused && line_idx == cursor_line {
                let mut spans = vec![Span::styled(
                    prefix.to_string(),
                    Style::default().fg(self.theme.primary),
                )];
                let chars: Vec<char> = line_text.chars().collect();
                if cursor_col < chars.len() {
                    let before: String = chars[..cursor_col].iter().collect();
                    let after: String = chars[cursor_col..].iter().collect();
                    spans.push(Span::styled(before, text_style));
                    spans.push(Span::styled("█", Style::default().fg(self.theme.subtext)));
                    spans.push(Span::styled(after, text_style));
                } else {
                    spans.push(Span::styled(line_text.to_string(), text_style));
                    spans.push(Span::styled("█", Style::default().fg(self.theme.subtext)));
                }
                lines.push(Line::from(spans));
            } else {
                lines.push(Line::from(vec![
                    Span::styled(prefix.to_string(), Style::default().fg(self.theme.primary)),
                    Span::styled(line_text.to_string(), text_style),
                ]));
            }
        }

        (lines, cursor_line)
    }

    fn mode_span(&self, kind: ModeKind) -> Span<'static> {
        let active = self.composer.mode() == Mode::from(kind);
        let processing = self.composer.processing() == Some(kind);
        let accent = match kind {
            ModeKind::WebSearch => self.theme.web,
            ModeKind::DeepSearch => self.theme.deep,
        };
        let style = if active || processing {
            Style::default().fg(accent)
        } else {
            Style::default().fg(self.theme.subtext)
        };
        let label = if processing {
            kind.processing_label()
        } else {
            kind.label()
        };
        Span::styled(label.to_string(), style)
    }

    /// Action row: attach / web / deep / voice shortcuts.
    fn action_line(&self, max_width: usize) -> Line<'static> {
        let key = |s: &str| Span::styled(s.to_string(), Style::default().fg(self.theme.muted));
        let plain = |s: &str| Span::styled(s.to_string(), Style::default().fg(self.theme.subtext));

        let spans = vec![
            Span::raw("  "),
            key("[Ctrl+A] "),
            plain("Adjuntar"),
            Span::raw("  "),
            key("[Ctrl+W] "),
            self.mode_span(ModeKind::WebSearch),
            Span::raw("  "),
            key("[Ctrl+D] "),
            self.mode_span(ModeKind::DeepSearch),
            Span::raw("  "),
            key("[Ctrl+V] "),
            plain("Voz"),
        ];

        // Drop trailing hints that do not fit instead of clipping mid-span.
        let mut fitted = Vec::new();
        let mut used = 0;
        for span in spans {
            let w = span.content.as_ref().width();
            if used + w > max_width {
                break;
            }
            used += w;
            fitted.push(span);
        }
        Line::from(fitted)
    }
}

#[allow(clippy::cast_possible_truncation)]
impl Widget for ComposerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        let action_rows = u16::from(self.show_actions && inner.height >= 2);
        let input_area = Rect {
            height: inner.height - action_rows,
            ..inner
        };

        if self.composer.input.is_empty() {
            Paragraph::new(vec![self.placeholder_line()]).render(input_area, buf);
        } else {
            let (lines, cursor_line) = self.build_input_lines();
            let visible = input_area.height as usize;
            let scroll_offset = if lines.len() <= visible {
                0
            } else {
                cursor_line.saturating_sub(visible.saturating_sub(1))
            };
            Paragraph::new(lines)
                .scroll((scroll_offset as u16, 0))
                .render(input_area, buf);
        }

        if action_rows == 1 {
            let action_area = Rect {
                y: inner.y + inner.height - 1,
                height: 1,
                ..inner
            };
            Paragraph::new(vec![self.action_line(inner.width as usize)])
                .render(action_area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn render_to_string(bar: ComposerBar<'_>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_placeholder_visible_when_empty() {
        let mut composer = Composer::new();
        composer.set_disabled(true); // suspends the animation
        let now = Instant::now();
        let mut placeholder = PlaceholderAnimator::with_default_phrases("Describe tu tarea...", now);
        placeholder.set_suspended(true, now);
        let theme = Theme::default();

        let rendered = render_to_string(
            ComposerBar::new(&composer, &placeholder, &theme).focused(true),
            50,
            3,
        );
        assert!(rendered.contains("Describe tu tarea..."));
    }

    #[test]
    fn test_typed_content_and_cursor_visible() {
        let mut composer = Composer::new();
        composer.input.insert_str("hola");
        let now = Instant::now();
        let placeholder = PlaceholderAnimator::with_default_phrases("", now);
        let theme = Theme::default();

        let rendered = render_to_string(
            ComposerBar::new(&composer, &placeholder, &theme).focused(true),
            30,
            3,
        );
        assert!(rendered.contains("> hola█"));
    }

    #[test]
    fn test_action_row_lists_affordances() {
        let composer = Composer::new();
        let now = Instant::now();
        let placeholder = PlaceholderAnimator::with_default_phrases("", now);
        let theme = Theme::default();

        let rendered = render_to_string(
            ComposerBar::new(&composer, &placeholder, &theme).show_actions(true),
            60,
            4,
        );
        assert!(rendered.contains("Adjuntar"));
        assert!(rendered.contains("Web"));
        assert!(rendered.contains("Deep"));
        assert!(rendered.contains("Voz"));
    }

    #[test]
    fn test_processing_label_shown_while_in_flight() {
        let mut composer = Composer::new();
        composer.input.insert_str("foo");
        composer.activate_web_search().unwrap();
        let now = Instant::now();
        let placeholder = PlaceholderAnimator::with_default_phrases("", now);
        let theme = Theme::default();

        let rendered = render_to_string(
            ComposerBar::new(&composer, &placeholder, &theme).show_actions(true),
            60,
            4,
        );
        assert!(rendered.contains("Buscando..."));
        assert!(!rendered.contains("Investigando..."));
    }
}
