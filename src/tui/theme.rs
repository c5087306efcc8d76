use ratatui::style::{Color, Modifier, Style};

use crate::calc::RiskLevel;

pub const BG: Color = Color::Rgb(14, 17, 22);
pub const SURFACE: Color = Color::Rgb(22, 27, 34);
pub const BORDER: Color = Color::Rgb(48, 56, 68);
pub const BORDER_FOCUS: Color = Color::Rgb(86, 182, 194);
pub const TEXT: Color = Color::Rgb(220, 226, 232);
pub const TEXT_DIM: Color = Color::Rgb(118, 128, 140);
pub const ACCENT: Color = Color::Rgb(86, 182, 194);
pub const GREEN: Color = Color::Rgb(110, 170, 100);
pub const AMBER: Color = Color::Rgb(214, 160, 64);
pub const RED: Color = Color::Rgb(204, 84, 76);
pub const CRIMSON: Color = Color::Rgb(236, 64, 96);
pub const SELECTED: Color = Color::Rgb(36, 44, 56);

pub fn base() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn green() -> Style {
    Style::default().fg(GREEN)
}

pub fn amber() -> Style {
    Style::default().fg(AMBER)
}

pub fn red() -> Style {
    Style::default().fg(RED)
}

pub fn bold() -> Style {
    Style::default().fg(TEXT).add_modifier(Modifier::BOLD)
}

pub fn surface() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn selected() -> Style {
    Style::default().bg(SELECTED).add_modifier(Modifier::BOLD)
}

pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(BORDER_FOCUS)
    } else {
        Style::default().fg(BORDER)
    }
}

pub fn risk_style(risk: RiskLevel) -> Style {
    match risk {
        RiskLevel::Safe => green(),
        RiskLevel::Warning => amber(),
        RiskLevel::Danger => red(),
        RiskLevel::Critical => Style::default().fg(CRIMSON).add_modifier(Modifier::BOLD),
    }
}

/// One-character marker shown next to a subject.
pub fn risk_marker(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Safe => "●",
        RiskLevel::Warning => "◑",
        RiskLevel::Danger => "○",
        RiskLevel::Critical => "✗",
    }
}
