use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::report::SemesterInfo;
use crate::tui::theme;
use crate::utils::format::format_days_left;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    user: &str,
    today: NaiveDate,
    semester: Option<&SemesterInfo>,
) {
    let title_line = Line::from(vec![
        Span::styled("  bunkwise  ", theme::accent().add_modifier(Modifier::BOLD)),
        Span::styled(user, theme::dim()),
    ]);

    let mut date_spans = vec![Span::styled(
        today.format("%A, %b %d, %Y").to_string(),
        theme::dim(),
    )];
    match semester {
        Some(s) => {
            date_spans.push(Span::styled("  ·  ", theme::dim()));
            date_spans.push(Span::styled(
                format!("{} → {}", s.start.format("%b %d"), s.end.format("%b %d")),
                theme::dim(),
            ));
            date_spans.push(Span::styled("  ·  ", theme::dim()));
            let style = if s.days_left > 0 {
                theme::amber()
            } else {
                theme::dim()
            };
            date_spans.push(Span::styled(format_days_left(s.days_left), style));
        }
        None => {
            date_spans.push(Span::styled("  ·  ", theme::dim()));
            date_spans.push(Span::styled("no semester set", theme::dim()));
        }
    }

    let text = vec![title_line, Line::from(""), Line::from(date_spans)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::accent().add_modifier(Modifier::BOLD))
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
