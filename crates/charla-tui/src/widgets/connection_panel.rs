//! Connection panel widget for the monitored Ollama endpoint.
//!
//! Shows reachability, the last error, and the available models:
//! ```text
//! ┌ Ollama ──────────────────────────────────────┐
//! │  ● Conectado      http://localhost:11434     │
//! │                                              │
//! │  llama2          Llama2                      │
//! │  mixtral-8x7b    Mixtral 8x7b                │
//! │                                              │
//! │  [Ctrl+R] Refrescar                          │
//! └──────────────────────────────────────────────┘
//! ```

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use charla_engine::ConnectionState;

use crate::theme::Theme;

/// Connection panel widget.
pub struct ConnectionPanel<'a> {
    state: &'a ConnectionState,
    endpoint: &'a str,
    enabled: bool,
    theme: &'a Theme,
}

impl<'a> ConnectionPanel<'a> {
    /// Create a new connection panel.
    pub fn new(
        state: &'a ConnectionState,
        endpoint: &'a str,
        enabled: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            state,
            endpoint,
            enabled,
            theme,
        }
    }

    fn status_span(&self) -> Span<'static> {
        if !self.enabled {
            return Span::styled(
                "○ Monitoreo desactivado",
                Style::default().fg(self.theme.muted),
            );
        }
        if self.state.is_loading {
            return Span::styled("◌ Comprobando...", Style::default().fg(self.theme.info));
        }
        if self.state.is_connected {
            Span::styled("● Conectado", Style::default().fg(self.theme.success))
        } else {
            Span::styled("○ Sin conexión", Style::default().fg(self.theme.muted))
        }
    }
}

impl Widget for ConnectionPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Ollama ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 1 {
            return;
        }

        let mut lines: Vec<Line<'_>> = Vec::new();

        let mut status_spans = vec![Span::raw("  "), self.status_span()];
        if self.enabled && !self.endpoint.is_empty() {
            status_spans.push(Span::raw("  "));
            status_spans.push(Span::styled(
                self.endpoint.to_string(),
                Style::default().fg(self.theme.subtext),
            ));
        }
        lines.push(Line::from(status_spans));

        if let Some(ref error) = self.state.error {
            // Truncate long errors to the inner width.
            let max_len = (inner.width as usize).saturating_sub(5);
            let display = if error.chars().count() > max_len && max_len > 3 {
                let cut: String = error.chars().take(max_len - 3).collect();
                format!("{cut}...")
            } else {
                error.clone()
            };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(display, Style::default().fg(self.theme.error)),
            ]));
        }

        lines.push(Line::from(""));

        if self.state.models.is_empty() {
            if self.enabled && self.state.is_connected {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled("Sin modelos", Style::default().fg(self.theme.muted)),
                ]));
            }
        } else {
            for model in &self.state.models {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<16}", model.name),
                        Style::default().fg(self.theme.text),
                    ),
                    Span::styled(
                        model.label.clone(),
                        Style::default().fg(self.theme.subtext),
                    ),
                ]));
            }
        }

        lines.push(Line::from(""));

        let mut footer = vec![
            Span::raw("  "),
            Span::styled("[", Style::default().fg(self.theme.muted)),
            Span::styled("Ctrl+R", Style::default().fg(self.theme.primary)),
            Span::styled("] ", Style::default().fg(self.theme.muted)),
            Span::styled("Refrescar", Style::default().fg(self.theme.subtext)),
        ];
        if let Some(checked) = self.state.last_checked {
            footer.push(Span::styled(
                format!(
                    "  Última comprobación: {}",
                    checked.with_timezone(&Local).format("%H:%M:%S")
                ),
                Style::default().fg(self.theme.muted),
            ));
        }
        lines.push(Line::from(footer));

        Paragraph::new(lines).render(inner, buf);
    }
}
