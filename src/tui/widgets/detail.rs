use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::calc::Recommendation;
use crate::report::SubjectReport;
use crate::tui::theme;
use crate::utils::format::{format_percentage, format_signed, progress_bar};

fn row<'a>(label: &'a str, value: String, style: ratatui::style::Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<18}", label), theme::dim()),
        Span::styled(value, style),
    ])
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    subject: Option<&SubjectReport>,
    future_classes: u32,
) {
    let title = subject
        .map(|s| format!(" {} ", s.name))
        .unwrap_or_else(|| " Details ".to_string());
    let block = Block::default()
        .title(Span::styled(title, theme::accent()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(false))
        .style(theme::surface());

    let Some(subject) = subject else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  Select a subject",
            theme::dim(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let p = &subject.projection;
    let bunk = &subject.bunk;
    let risk_style = theme::risk_style(p.risk_level);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  ", theme::dim()),
            Span::styled(progress_bar(p.current_percentage, 20), risk_style),
            Span::styled(
                format!("  {}", format_percentage(p.current_percentage)),
                risk_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", p.risk_level.display_name()), risk_style),
        ]),
        Line::from(""),
        row("Attended", format!("{} of {}", p.present, p.total), theme::bold()),
        row("Missed", format!("{}", p.total - p.present), theme::bold()),
        row("vs target", format_signed(bunk.buffer), theme::bold()),
        Line::from(""),
        Line::from(Span::styled("  Rest of semester", theme::accent())),
    ];

    if p.remaining_classes == 0 {
        lines.push(Line::from(Span::styled(
            "  No remaining classes known",
            theme::dim(),
        )));
    } else {
        lines.push(row("Classes left", format!("{}", p.remaining_classes), theme::bold()));
        lines.push(row("Must attend", format!("{}", p.classes_needed), risk_style));
        lines.push(row("Can skip", format!("{}", p.can_skip), theme::green()));
        lines.push(row(
            "Attend all",
            format_percentage(p.projected_percentage_if_attend_all),
            theme::bold(),
        ));
        lines.push(row(
            "Current pace",
            format_percentage(p.projected_percentage_at_current_rate),
            theme::bold(),
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  Next {} classes", future_classes),
        theme::accent(),
    )));
    let advice = match bunk.recommendation() {
        Recommendation::CanBunk(n) => Span::styled(
            format!("  ✓ Safe to bunk {} classes", n),
            theme::green().add_modifier(Modifier::BOLD),
        ),
        Recommendation::MustAttend(n) => Span::styled(
            format!("  ! Attend the next {} classes to reach the safe zone", n),
            theme::red().add_modifier(Modifier::BOLD),
        ),
        Recommendation::AttendAll => Span::styled(
            "  ~ Don't bunk: attend every class",
            theme::amber().add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(advice));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
