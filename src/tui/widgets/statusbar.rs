use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::models::RefreshRecord;
use crate::tui::theme;

/// What the refresh line under the panels shows.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshLine {
    Idle(Option<RefreshRecord>),
    Running(String),
    Done(String),
    Failed(String),
    Notice(String),
}

pub fn render_refresh(frame: &mut Frame, area: Rect, line: &RefreshLine) {
    let span = match line {
        RefreshLine::Idle(Some(last)) => Span::styled(
            format!(
                "  Last import {} · {} subjects · {}",
                last.refreshed_at, last.subject_count, last.source
            ),
            theme::dim(),
        ),
        RefreshLine::Idle(None) => Span::styled("  Never imported", theme::dim()),
        RefreshLine::Running(progress) => {
            Span::styled(format!("  ⟳ {}", progress), theme::amber())
        }
        RefreshLine::Done(summary) => Span::styled(format!("  ✓ {}", summary), theme::green()),
        RefreshLine::Failed(error) => {
            Span::styled(format!("  ✗ Refresh failed: {}", error), theme::red())
        }
        RefreshLine::Notice(message) => Span::styled(format!("  {}", message), theme::amber()),
    };
    frame.render_widget(Paragraph::new(Line::from(span)), area);
}

pub fn render(frame: &mut Frame, area: Rect) {
    let hints = [
        ("[↑↓]", " move  "),
        ("[a]", " attended  "),
        ("[m]", " missed  "),
        ("[e]", " edit  "),
        ("[R]", " refresh  "),
        ("[?]", " help  "),
        ("[Esc]", " quit"),
    ];

    let mut spans = Vec::new();
    for (key, label) in &hints {
        spans.push(Span::styled(*key, theme::accent()));
        spans.push(Span::styled(*label, theme::dim()));
    }

    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
