use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState},
};

use crate::report::SubjectReport;
use crate::tui::theme;
use crate::utils::format::{format_percentage, truncate_to_width};

/// Columns taken by everything except the name.
const FIXED_COLUMNS: usize = 30;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    subjects: &[SubjectReport],
    focused_idx: usize,
    focused: bool,
) {
    let block = Block::default()
        .title(Span::styled(" Subjects ", theme::accent()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused))
        .style(theme::surface());

    if subjects.is_empty() {
        let empty = List::new(vec![
            ListItem::new(""),
            ListItem::new(Line::from(Span::styled(
                "  No subjects. Add one with `bunkwise add` or press [R]",
                theme::dim(),
            ))),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let name_width = (area.width as usize).saturating_sub(FIXED_COLUMNS).max(8);

    let items: Vec<ListItem> = subjects
        .iter()
        .map(|s| {
            let p = &s.projection;
            let risk = p.risk_level;
            let name = truncate_to_width(&s.name, name_width);
            let line = Line::from(vec![
                Span::styled(format!("  {} ", theme::risk_marker(risk)), theme::risk_style(risk)),
                Span::styled(format!("{:<width$}", name, width = name_width), theme::bold()),
                Span::styled(format!(" {:>4}/{:<4}", p.present, p.total), theme::dim()),
                Span::styled(
                    format!(" {:>8}", format_percentage(p.current_percentage)),
                    theme::risk_style(risk),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(focused_idx.min(subjects.len() - 1)));

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected().add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, area, &mut state);
}
