use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use rusqlite::Connection;
use std::time::Duration;

use crate::calc::DEFAULT_FUTURE_CLASSES;
use crate::config::AppConfig;
use crate::db::repository::MetaRepo;
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;

// ─── Wizard steps ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    Welcome,
    Target,
    Buffer,
    SemesterStart,
    SemesterEnd,
    WeeklyClasses,
    Confirm,
}

// ─── Wizard state ─────────────────────────────────────────────────────────────

struct SetupWizard {
    step: Step,
    input: String,
    error: Option<String>,

    // Collected values
    target: f64,
    buffer: f64,
    semester_start: Option<NaiveDate>,
    semester_end: Option<NaiveDate>,
    weekly_classes: u32,

    should_quit: bool,
    confirmed: bool,
}

impl SetupWizard {
    fn new(existing: &AppConfig) -> Self {
        Self {
            step: Step::Welcome,
            input: String::new(),
            error: None,

            target: existing.attendance.target_percentage,
            buffer: existing.attendance.safety_buffer,
            semester_start: existing.semester.start,
            semester_end: existing.semester.end,
            weekly_classes: existing.attendance.weekly_classes,

            should_quit: false,
            confirmed: false,
        }
    }

    fn step_number(&self) -> usize {
        match self.step {
            Step::Welcome => 0,
            Step::Target => 1,
            Step::Buffer => 2,
            Step::SemesterStart => 3,
            Step::SemesterEnd => 4,
            Step::WeeklyClasses => 5,
            Step::Confirm => 6,
        }
    }

    const TOTAL_STEPS: usize = 6;

    fn advance(&mut self) {
        self.error = None;
        self.step = match self.step {
            Step::Welcome => Step::Target,
            Step::Target => Step::Buffer,
            Step::Buffer => Step::SemesterStart,
            Step::SemesterStart => Step::SemesterEnd,
            Step::SemesterEnd => Step::WeeklyClasses,
            Step::WeeklyClasses | Step::Confirm => Step::Confirm,
        };
        self.prefill();
    }

    fn go_back(&mut self) {
        self.error = None;
        self.step = match self.step {
            Step::Welcome => {
                self.should_quit = true;
                Step::Welcome
            }
            Step::Target => Step::Welcome,
            Step::Buffer => Step::Target,
            Step::SemesterStart => Step::Buffer,
            Step::SemesterEnd => Step::SemesterStart,
            Step::WeeklyClasses => Step::SemesterEnd,
            Step::Confirm => Step::WeeklyClasses,
        };
        self.prefill();
    }

    /// Pre-fill input with the current value when entering a text step.
    fn prefill(&mut self) {
        self.input = match self.step {
            Step::Target => format!("{}", self.target),
            Step::Buffer => format!("{}", self.buffer),
            Step::SemesterStart => date_input(self.semester_start),
            Step::SemesterEnd => date_input(self.semester_end),
            Step::WeeklyClasses => format!("{}", self.weekly_classes),
            _ => String::new(),
        };
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.step {
            Step::Welcome => {
                if key.code == KeyCode::Esc {
                    self.should_quit = true;
                } else {
                    self.advance();
                }
            }
            Step::Confirm => match key.code {
                KeyCode::Enter | KeyCode::Char('y') => match self.validate_all() {
                    Ok(()) => self.confirmed = true,
                    Err(e) => self.error = Some(e),
                },
                KeyCode::Esc | KeyCode::Char('n') => self.go_back(),
                _ => {}
            },
            _ => self.handle_text_input(key),
        }
    }

    fn handle_text_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Enter => {
                let val = self.input.trim().to_string();
                match self.commit_text_input(&val) {
                    Ok(()) => self.advance(),
                    Err(e) => self.error = Some(e),
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.error = None;
            }
            KeyCode::Tab => {
                // Reset to default value for this step
                self.input = match self.step {
                    Step::Target => "75".to_string(),
                    Step::Buffer => "1".to_string(),
                    Step::SemesterStart | Step::SemesterEnd => String::new(),
                    Step::WeeklyClasses => "0".to_string(),
                    _ => self.input.clone(),
                };
                self.error = None;
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.error = None;
            }
            _ => {}
        }
    }

    fn commit_text_input(&mut self, val: &str) -> std::result::Result<(), String> {
        match self.step {
            Step::Target => self.target = parse_target(val)?,
            Step::Buffer => self.buffer = parse_buffer(val, self.target)?,
            Step::SemesterStart => self.semester_start = parse_optional_date(val)?,
            Step::SemesterEnd => {
                let end = parse_optional_date(val)?;
                if let (Some(start), Some(end)) = (self.semester_start, end) {
                    if end < start {
                        return Err(format!("End must be on or after {}", start));
                    }
                }
                self.semester_end = end;
            }
            Step::WeeklyClasses => {
                self.weekly_classes = val
                    .parse()
                    .map_err(|_| "Enter a whole number (0 to skip)".to_string())?;
            }
            _ => {}
        }
        Ok(())
    }

    fn build_config(&self, existing: &AppConfig) -> AppConfig {
        let mut config = existing.clone();
        config.attendance.target_percentage = self.target;
        config.attendance.safety_buffer = self.buffer;
        config.attendance.weekly_classes = self.weekly_classes;
        if config.attendance.future_classes == 0 {
            config.attendance.future_classes = DEFAULT_FUTURE_CLASSES;
        }
        config.semester.start = self.semester_start;
        config.semester.end = self.semester_end;
        config
    }

    fn validate_all(&self) -> std::result::Result<(), String> {
        self.build_config(&AppConfig::default())
            .validate()
            .map_err(|e| e.to_string())
    }
}

// ─── Input parsing ───────────────────────────────────────────────────────────

fn parse_target(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s
        .trim_end_matches('%')
        .parse()
        .map_err(|_| "Enter a percentage (e.g. 75)".to_string())?;
    if v <= 0.0 || v >= 100.0 {
        return Err("Target must be between 0 and 100".to_string());
    }
    Ok(v)
}

fn parse_buffer(s: &str, target: f64) -> std::result::Result<f64, String> {
    let v: f64 = s
        .trim_end_matches('%')
        .parse()
        .map_err(|_| "Enter a number of percentage points (e.g. 1)".to_string())?;
    if v < 0.0 {
        return Err("Buffer cannot be negative".to_string());
    }
    if target + v >= 100.0 {
        return Err(format!("Target + buffer must stay below 100 (is {})", target + v));
    }
    Ok(v)
}

/// Empty input clears the date.
fn parse_optional_date(s: &str) -> std::result::Result<Option<NaiveDate>, String> {
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| "Use YYYY-MM-DD, or leave empty to skip".to_string())
}

fn date_input(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn date_display(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "not set".to_string())
}

// ─── Rendering ────────────────────────────────────────────────────────────────

fn draw(frame: &mut Frame, wizard: &SetupWizard) {
    let area = frame.area();

    frame.render_widget(Block::default().style(theme::base()), area);

    // Center the wizard box
    let vchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(22),
            Constraint::Min(0),
        ])
        .split(area);

    let hchunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(64),
            Constraint::Min(0),
        ])
        .split(vchunks[1]);

    let box_area = hchunks[1];
    frame.render_widget(Clear, box_area);

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::accent())
        .style(theme::surface())
        .title(Span::styled(
            "  bunkwise · setup  ",
            theme::accent().add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    frame.render_widget(outer_block, box_area);

    let inner = Rect {
        x: box_area.x + 2,
        y: box_area.y + 1,
        width: box_area.width.saturating_sub(4),
        height: box_area.height.saturating_sub(2),
    };

    match wizard.step {
        Step::Welcome => draw_welcome(frame, inner),
        Step::Confirm => draw_confirm(frame, inner, wizard),
        _ => draw_text_step(frame, inner, wizard),
    }

    draw_progress(frame, inner, wizard.step_number(), SetupWizard::TOTAL_STEPS);
}

fn draw_progress(frame: &mut Frame, area: Rect, current: usize, total: usize) {
    let mut spans = vec![Span::styled("  ", theme::dim())];
    for i in 1..=total {
        if i < current {
            spans.push(Span::styled("● ", theme::green()));
        } else if i == current {
            spans.push(Span::styled("◉ ", theme::accent()));
        } else {
            spans.push(Span::styled("○ ", theme::dim()));
        }
    }
    let progress_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: 1,
    };
    frame.render_widget(Paragraph::new(Line::from(spans)), progress_area);
}

fn content_area(area: Rect) -> Rect {
    Rect {
        x: area.x,
        y: area.y + 2,
        width: area.width,
        height: area.height.saturating_sub(2),
    }
}

fn draw_welcome(frame: &mut Frame, area: Rect) {
    let bullet = |text: &'static str| {
        Line::from(vec![
            Span::styled("  ●  ", theme::accent()),
            Span::styled(text, theme::dim()),
        ])
    };
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to bunkwise",
            theme::bold().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Know exactly how many classes you can afford to miss.",
            theme::dim(),
        )),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled("This wizard will configure:", theme::dim())),
        bullet("Your minimum attendance target"),
        bullet("A safety buffer on top of it"),
        bullet("Semester dates for end-of-term projections"),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "Press  Enter  to begin  ·  Esc  to cancel",
            theme::dim(),
        )),
    ];

    let para = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(para, content_area(area));
}

fn draw_text_step(frame: &mut Frame, area: Rect, wizard: &SetupWizard) {
    let (title, subtitle, hint) = match wizard.step {
        Step::Target => (
            "Attendance Target",
            "Minimum percentage your institution requires",
            "e.g.  75  ·  [Tab] to reset",
        ),
        Step::Buffer => (
            "Safety Buffer",
            "Extra percentage points to keep above the target",
            "e.g.  1  means bunk only while at 76% or more",
        ),
        Step::SemesterStart => (
            "Semester Start",
            "First day of classes (YYYY-MM-DD)",
            "Leave empty to skip projections",
        ),
        Step::SemesterEnd => (
            "Semester End",
            "Last day of classes (YYYY-MM-DD)",
            "Leave empty to skip projections",
        ),
        Step::WeeklyClasses => (
            "Classes per Week",
            "Per subject, used until you add a timetable",
            "0 turns the estimate off",
        ),
        _ => ("", "", ""),
    };

    let cursor = if wizard.input.len() < 40 { "█" } else { "" };

    let mut lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(title, theme::accent().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(subtitle, theme::dim())),
        Line::from(""),
        Line::from(""),
    ];

    let input_display = format!("  {}{}  ", wizard.input, cursor);
    let input_width = area.width.saturating_sub(8) as usize;
    let padded = format!("{:<width$}", input_display, width = input_width);

    let input_style = if wizard.error.is_some() {
        theme::red()
    } else {
        theme::amber()
    };

    lines.push(Line::from(Span::styled(padded, input_style.add_modifier(Modifier::BOLD))));
    lines.push(Line::from(""));

    if let Some(err) = &wizard.error {
        lines.push(Line::from(Span::styled(format!("  ✗  {}", err), theme::red())));
    } else {
        lines.push(Line::from(Span::styled(hint, theme::dim())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter  confirm   ·   Esc  back",
        theme::dim(),
    )));

    let para = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(para, content_area(area));
}

fn draw_confirm(frame: &mut Frame, area: Rect, wizard: &SetupWizard) {
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, theme::dim()),
            Span::styled(value, theme::bold()),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Confirm Settings",
            theme::accent().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Review your configuration:", theme::dim())),
        Line::from(""),
        row("  Target      ", format!("{}%", wizard.target)),
        row("  Buffer      ", format!("{} pts", wizard.buffer)),
        row("  Safe zone   ", format!("{}%", wizard.target + wizard.buffer)),
        row("  Starts      ", date_display(wizard.semester_start)),
        row("  Ends        ", date_display(wizard.semester_end)),
        row("  Per week    ", format!("{}", wizard.weekly_classes)),
        Line::from(""),
    ];

    if let Some(err) = &wizard.error {
        lines.push(Line::from(Span::styled(format!("  ✗  {}", err), theme::red())));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Enter  save   ·   Esc  go back",
        theme::dim(),
    )));

    let para = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(para, content_area(area));
}

// ─── Public entry point ──────────────────────────────────────────────────────

pub fn run_setup_tui(conn: &Connection, config: &mut AppConfig) -> Result<()> {
    let mut wizard = SetupWizard::new(config);
    let mut terminal = ratatui::init();
    let events = EventHandler::new(Duration::from_millis(100));

    let outcome: Result<bool> = loop {
        if let Err(e) = terminal.draw(|frame| draw(frame, &wizard)) {
            break Err(e.into());
        }

        match events.next() {
            Ok(Event::Key(key)) => {
                wizard.handle_key(key);
                if wizard.should_quit {
                    break Ok(false);
                }
                if wizard.confirmed {
                    break Ok(true);
                }
            }
            Ok(Event::Resize | Event::Tick) => {}
            Err(e) => break Err(e.into()),
        }
    };

    ratatui::restore();

    if outcome? {
        *config = wizard.build_config(config);
        config.save()?;
        MetaRepo::set(conn, "setup_done", "1")?;
        log::info!("setup saved to {:?}", AppConfig::config_path()?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_and_enter(wizard: &mut SetupWizard, text: &str) {
        wizard.input.clear();
        for c in text.chars() {
            wizard.handle_key(press(KeyCode::Char(c)));
        }
        wizard.handle_key(press(KeyCode::Enter));
    }

    #[test]
    fn parses_inputs() {
        assert_eq!(parse_target("80"), Ok(80.0));
        assert_eq!(parse_target("75%"), Ok(75.0));
        assert!(parse_target("100").is_err());
        assert!(parse_target("abc").is_err());
        assert_eq!(parse_buffer("2.5", 75.0), Ok(2.5));
        assert!(parse_buffer("-1", 75.0).is_err());
        assert!(parse_buffer("5", 96.0).is_err());
        assert_eq!(parse_optional_date(""), Ok(None));
        assert_eq!(
            parse_optional_date("2024-01-15"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 15))
        );
        assert!(parse_optional_date("15/01/2024").is_err());
    }

    #[test]
    fn walks_every_step_to_a_valid_config() {
        let mut wizard = SetupWizard::new(&AppConfig::default());
        wizard.handle_key(press(KeyCode::Enter));
        assert_eq!(wizard.step, Step::Target);
        // Pre-filled with the current target
        assert_eq!(wizard.input, "75");

        type_and_enter(&mut wizard, "80");
        type_and_enter(&mut wizard, "2");
        type_and_enter(&mut wizard, "2024-01-01");
        type_and_enter(&mut wizard, "2024-05-31");
        type_and_enter(&mut wizard, "3");
        assert_eq!(wizard.step, Step::Confirm);

        wizard.handle_key(press(KeyCode::Enter));
        assert!(wizard.confirmed);

        let config = wizard.build_config(&AppConfig::default());
        assert_eq!(config.attendance.target_percentage, 80.0);
        assert_eq!(config.attendance.safety_buffer, 2.0);
        assert_eq!(config.attendance.weekly_classes, 3);
        assert!(config.semester_window().is_some());
    }

    #[test]
    fn rejects_end_before_start() {
        let mut wizard = SetupWizard::new(&AppConfig::default());
        wizard.step = Step::SemesterStart;
        type_and_enter(&mut wizard, "2024-05-01");
        assert_eq!(wizard.step, Step::SemesterEnd);
        type_and_enter(&mut wizard, "2024-04-01");
        assert_eq!(wizard.step, Step::SemesterEnd);
        assert!(wizard.error.is_some());
    }

    #[test]
    fn escape_on_welcome_quits() {
        let mut wizard = SetupWizard::new(&AppConfig::default());
        wizard.handle_key(press(KeyCode::Esc));
        assert!(wizard.should_quit);
    }
}
