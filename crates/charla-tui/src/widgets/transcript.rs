//! Scrollback of dispatched messages.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::TranscriptEntry;
use crate::theme::Theme;

/// Transcript view: the most recent entries that fit, newest at the bottom.
pub struct TranscriptView<'a> {
    entries: &'a [TranscriptEntry],
    notification: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> TranscriptView<'a> {
    /// Create a new transcript view.
    pub fn new(entries: &'a [TranscriptEntry], theme: &'a Theme) -> Self {
        Self {
            entries,
            notification: None,
            theme,
        }
    }

    /// Transient notice rendered under the entries.
    #[must_use]
    pub fn notification(mut self, notification: Option<&'a str>) -> Self {
        self.notification = notification;
        self
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Conversación ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 1 {
            return;
        }

        let mut budget = inner.height as usize;
        if self.notification.is_some() {
            budget = budget.saturating_sub(1);
        }

        let start = self.entries.len().saturating_sub(budget);
        let mut lines: Vec<Line<'_>> = self.entries[start..]
            .iter()
            .map(|entry| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", entry.sent_at.with_timezone(&Local).format("%H:%M")),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(entry.text.clone(), Style::default().fg(self.theme.text)),
                ])
            })
            .collect();

        if self.entries.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Sin mensajes todavía",
                Style::default().fg(self.theme.muted),
            )));
        }

        if let Some(notice) = self.notification {
            lines.push(Line::from(Span::styled(
                format!("  {notice}"),
                Style::default().fg(self.theme.warning),
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
