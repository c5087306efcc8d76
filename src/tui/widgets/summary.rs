use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::calc::{AggregateStats, RiskLevel};
use crate::tui::theme;
use crate::utils::format::{format_percentage, progress_bar};

pub fn render(frame: &mut Frame, area: Rect, stats: &AggregateStats, target: f64) {
    let block = Block::default()
        .title(Span::styled(" Overall ", theme::accent()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(false))
        .style(theme::surface());

    let overall_style = theme::risk_style(RiskLevel::classify(stats.overall_percentage, target));

    let overall_line = Line::from(vec![
        Span::styled("  ", theme::dim()),
        Span::styled(progress_bar(stats.overall_percentage, 12), overall_style),
        Span::styled(
            format!("  {}", format_percentage(stats.overall_percentage)),
            overall_style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({}/{})", stats.total_present, stats.total_classes),
            theme::dim(),
        ),
    ]);

    let tiers_line = Line::from(vec![
        Span::styled("  ", theme::dim()),
        Span::styled(format!("● {} safe", stats.safe), theme::green()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(format!("◑ {} warning", stats.warning), theme::amber()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(format!("○ {} danger", stats.danger), theme::red()),
    ]);

    let text = vec![Line::from(""), overall_line, Line::from(""), tiers_line];
    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}
