use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::repository::{RefreshRepo, SqliteStore, SubjectRepo};
use crate::models::validate_manual_counts;
use crate::refresh::{RefreshTracker, snapshot_job};
use crate::report::{self, AttendanceReport, ReportOptions, SubjectReport};
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::statusbar::RefreshLine;
use crate::tui::widgets::{detail, header, statusbar, subjects, summary};

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    EditCounts,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub user: String,
    pub db_path: PathBuf,
    pub focus_idx: usize,
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub input_error: Option<String>,

    // Cached state (refreshed on tick/action)
    pub today: NaiveDate,
    pub report: AttendanceReport,
    pub refresh: RefreshTracker,
    pub refresh_line: RefreshLine,
}

impl App {
    pub fn new(config: AppConfig, user: String, db_path: PathBuf) -> Self {
        let today = Local::now().date_naive();
        let report = report::assemble(
            Vec::new(),
            &[],
            &user,
            &ReportOptions::from_config(&config, today),
        );

        App {
            view: View::Dashboard,
            config,
            user,
            db_path,
            focus_idx: 0,
            should_quit: false,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            input_error: None,
            today,
            report,
            refresh: RefreshTracker::new(),
            refresh_line: RefreshLine::Idle(None),
        }
    }

    pub fn load(&mut self, conn: &Connection) -> Result<()> {
        self.today = Local::now().date_naive();
        let store = SqliteStore::new(conn);
        let options = ReportOptions::from_config(&self.config, self.today);
        self.report = report::build_report(&store, &store, &self.user, &options)?;
        self.focus_idx = self
            .focus_idx
            .min(self.report.subjects.len().saturating_sub(1));

        if matches!(self.refresh_line, RefreshLine::Idle(_)) {
            self.refresh_line = RefreshLine::Idle(RefreshRepo::last(conn, &self.user)?);
        }
        Ok(())
    }

    /// Poll the refresh tracker; reload once a job has finished.
    pub fn tick(&mut self, conn: &Connection) {
        if let Some(status) = self.refresh.take_finished(&self.user) {
            self.refresh_line = match status.error {
                Some(error) => RefreshLine::Failed(error),
                None => RefreshLine::Done(status.progress),
            };
            self.reload(conn);
        } else if self.refresh.is_running(&self.user) {
            self.refresh_line = RefreshLine::Running(self.refresh.status(&self.user).progress);
        } else if Local::now().date_naive() != self.today {
            self.reload(conn);
        }
    }

    fn reload(&mut self, conn: &Connection) {
        if let Err(e) = self.load(conn) {
            log::error!("reloading dashboard: {:#}", e);
            self.refresh_line = RefreshLine::Failed(format!("{:#}", e));
        }
    }

    pub fn focused(&self) -> Option<&SubjectReport> {
        self.report.subjects.get(self.focus_idx)
    }

    pub fn handle_key(&mut self, key: KeyEvent, conn: &Connection) {
        match self.input_mode {
            InputMode::EditCounts => self.handle_edit_input(key, conn),
            InputMode::Normal => match self.view {
                View::Dashboard => self.handle_dashboard_key(key, conn),
                View::Help => self.handle_help_key(key),
            },
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent, conn: &Connection) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.view = View::Help;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.focus_idx = self.focus_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let max = self.report.subjects.len().saturating_sub(1);
                if self.focus_idx < max {
                    self.focus_idx += 1;
                }
            }
            KeyCode::Char('a') => self.record_focused(conn, true),
            KeyCode::Char('m') => self.record_focused(conn, false),
            KeyCode::Char('e') => {
                let current = self
                    .focused()
                    .map(|s| format!("{}/{}", s.projection.present, s.projection.total));
                if let Some(counts) = current {
                    self.input_buffer = counts;
                    self.input_error = None;
                    self.input_mode = InputMode::EditCounts;
                }
            }
            KeyCode::Char('R') => self.start_refresh(),
            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            self.view = View::Dashboard;
        }
    }

    fn handle_edit_input(&mut self, key: KeyEvent, conn: &Connection) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.input_error = None;
            }
            KeyCode::Enter => {
                let Some(name) = self.focused().map(|s| s.name.clone()) else {
                    self.input_mode = InputMode::Normal;
                    return;
                };
                let result = parse_counts(&name, &self.input_buffer).and_then(|(present, total)| {
                    SubjectRepo::update(conn, &self.user, &name, present, total)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                });
                match result {
                    Ok(()) => {
                        self.input_mode = InputMode::Normal;
                        self.input_buffer.clear();
                        self.input_error = None;
                        self.reload(conn);
                    }
                    Err(e) => self.input_error = Some(e),
                }
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
                self.input_error = None;
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '/' => {
                self.input_buffer.push(c);
                self.input_error = None;
            }
            _ => {}
        }
    }

    fn record_focused(&mut self, conn: &Connection, attended: bool) {
        let Some(name) = self.focused().map(|s| s.name.clone()) else {
            return;
        };
        match SubjectRepo::record_class(conn, &self.user, &name, attended) {
            Ok(_) => self.reload(conn),
            Err(e) => self.refresh_line = RefreshLine::Failed(format!("{:#}", e)),
        }
    }

    fn start_refresh(&mut self) {
        let Some(snapshot_path) = self.config.refresh.snapshot_path.clone() else {
            self.refresh_line =
                RefreshLine::Notice("Set [refresh] snapshot_path in config.toml to refresh".to_string());
            return;
        };
        let job = snapshot_job(self.db_path.clone(), self.user.clone(), snapshot_path);
        self.refresh_line = match self.refresh.start(&self.user, job) {
            Ok(_) => RefreshLine::Running("Starting...".to_string()),
            Err(e) => RefreshLine::Notice(e.to_string()),
        };
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.draw_dashboard(frame);

        if self.view == View::Help {
            self.draw_help_overlay(frame);
        }
        if self.input_mode == InputMode::EditCounts {
            self.draw_edit_input(frame);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Min(0),    // body
                Constraint::Length(1), // refresh line
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(
            frame,
            outer_chunks[0],
            &self.user,
            self.today,
            self.report.semester.as_ref(),
        );
        statusbar::render_refresh(frame, outer_chunks[2], &self.refresh_line);
        statusbar::render(frame, outer_chunks[3]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(outer_chunks[1]);

        // Left column: subjects + summary
        let left_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(6)])
            .split(columns[0]);

        subjects::render(
            frame,
            left_chunks[0],
            &self.report.subjects,
            self.focus_idx,
            self.input_mode == InputMode::Normal,
        );
        summary::render(
            frame,
            left_chunks[1],
            &self.report.stats,
            self.report.target_percentage,
        );

        detail::render(frame, columns[1], self.focused(), self.report.future_classes);
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();

        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: (area.height / 2).max(14).min(area.height),
        };

        frame.render_widget(Clear, popup_area);

        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {:<13}", k), theme::accent()),
                Span::styled(what, theme::dim()),
            ])
        };

        let help_text = vec![
            Line::from(Span::styled(
                "  Keybindings",
                theme::accent().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            key("[↑ ↓]", "Select subject"),
            key("[a]", "Attended a class"),
            key("[m]", "Missed a class"),
            key("[e]", "Edit counts (present/total)"),
            key("[R]", "Refresh from snapshot file"),
            key("[?]", "Toggle help"),
            key("[Esc]", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  Target {}%  ·  safe zone {}%",
                    self.report.target_percentage,
                    self.report.safe_target()
                ),
                theme::dim(),
            )),
        ];

        let block = Block::default()
            .title(Span::styled(" Help ", theme::accent()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::accent())
            .style(theme::surface());

        frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
    }

    fn draw_edit_input(&self, frame: &mut Frame) {
        let area = frame.area();
        let height = if self.input_error.is_some() { 7 } else { 5 };

        let popup_area = Rect {
            x: area.width / 4,
            y: (area.height / 2).saturating_sub(3),
            width: area.width / 2,
            height,
        };

        frame.render_widget(Clear, popup_area);

        let mut text = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Present/total: ", theme::dim()),
                Span::styled(
                    self.input_buffer.as_str(),
                    theme::accent().add_modifier(Modifier::BOLD),
                ),
                Span::styled("█", theme::amber()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "  e.g. 30/40, then [Enter]  ·  [Esc] cancel",
                theme::dim(),
            )),
        ];

        if let Some(err) = &self.input_error {
            text.push(Line::from(""));
            text.push(Line::from(Span::styled(format!("  ✗ {}", err), theme::red())));
        }

        let border_style = if self.input_error.is_some() {
            theme::red()
        } else {
            theme::amber()
        };

        let title = self
            .focused()
            .map(|s| format!(" Edit {} ", s.name))
            .unwrap_or_else(|| " Edit ".to_string());

        let block = Block::default()
            .title(Span::styled(title, theme::accent()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .style(theme::surface());

        frame.render_widget(Paragraph::new(text).block(block), popup_area);
    }
}

/// Parse "present/total" typed into the edit popup.
fn parse_counts(subject: &str, input: &str) -> std::result::Result<(u32, u32), String> {
    let (present, total) = input
        .trim()
        .split_once('/')
        .ok_or_else(|| "Use present/total, e.g. 30/40".to_string())?;
    let present: u32 = present
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", present))?;
    let total: u32 = total
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a whole number", total))?;
    validate_manual_counts(subject, present, total).map_err(|e| e.to_string())?;
    Ok((present, total))
}

/// Run the TUI event loop.
pub fn run(conn: Connection, config: AppConfig, user: String, db_path: PathBuf) -> Result<()> {
    let mut app = App::new(config, user, db_path);
    app.load(&conn)?;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(Duration::from_millis(500));

    let outcome: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }

        match events.next() {
            Ok(Event::Key(key)) => {
                app.handle_key(key, &conn);
                if app.should_quit {
                    break Ok(());
                }
            }
            Ok(Event::Tick) => app.tick(&conn),
            Ok(Event::Resize) => {}
            Err(e) => break Err(e.into()),
        }
    };

    ratatui::restore();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::SubjectRecord;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (Connection, App) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        for (name, present, total) in [("Maths", 30, 40), ("Physics", 9, 10)] {
            SubjectRepo::add(&conn, "asha", &SubjectRecord::new(name, present, total).unwrap())
                .unwrap();
        }
        let mut app = App::new(AppConfig::default(), "asha".to_string(), PathBuf::from(":memory:"));
        app.load(&conn).unwrap();
        (conn, app)
    }

    #[test]
    fn parses_count_input() {
        assert_eq!(parse_counts("Maths", "30/40"), Ok((30, 40)));
        assert_eq!(parse_counts("Maths", " 3 / 4 "), Ok((3, 4)));
        assert!(parse_counts("Maths", "30").is_err());
        assert!(parse_counts("Maths", "41/40").is_err());
        assert!(parse_counts("Maths", "0/0").is_err());
    }

    #[test]
    fn navigation_stays_in_bounds() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Up), &conn);
        assert_eq!(app.focus_idx, 0);
        app.handle_key(press(KeyCode::Down), &conn);
        app.handle_key(press(KeyCode::Down), &conn);
        assert_eq!(app.focus_idx, 1);
        assert_eq!(app.focused().unwrap().name, "Physics");
    }

    #[test]
    fn attended_and_missed_update_counts() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Char('a')), &conn);
        app.handle_key(press(KeyCode::Char('m')), &conn);
        let maths = SubjectRepo::get(&conn, "asha", "Maths").unwrap().unwrap();
        assert_eq!((maths.present, maths.total), (31, 42));
        assert_eq!(app.focused().unwrap().projection.total, 42);
    }

    #[test]
    fn edit_popup_overwrites_counts() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Char('e')), &conn);
        assert_eq!(app.input_mode, InputMode::EditCounts);
        assert_eq!(app.input_buffer, "30/40");

        app.input_buffer.clear();
        for c in "35/40".chars() {
            app.handle_key(press(KeyCode::Char(c)), &conn);
        }
        app.handle_key(press(KeyCode::Enter), &conn);
        assert_eq!(app.input_mode, InputMode::Normal);
        let maths = SubjectRepo::get(&conn, "asha", "Maths").unwrap().unwrap();
        assert_eq!(maths.present, 35);
    }

    #[test]
    fn bad_edit_keeps_popup_open() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Char('e')), &conn);
        app.input_buffer = "50/40".to_string();
        app.handle_key(press(KeyCode::Enter), &conn);
        assert_eq!(app.input_mode, InputMode::EditCounts);
        assert!(app.input_error.is_some());
    }

    #[test]
    fn refresh_without_snapshot_path_is_a_notice() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Char('R')), &conn);
        assert!(matches!(app.refresh_line, RefreshLine::Notice(_)));
        assert!(!app.refresh.is_running("asha"));
    }

    #[test]
    fn help_toggles_and_escape_quits() {
        let (conn, mut app) = setup();
        app.handle_key(press(KeyCode::Char('?')), &conn);
        assert_eq!(app.view, View::Help);
        app.handle_key(press(KeyCode::Esc), &conn);
        assert_eq!(app.view, View::Dashboard);
        assert!(!app.should_quit);
        app.handle_key(press(KeyCode::Esc), &conn);
        assert!(app.should_quit);
    }
}
