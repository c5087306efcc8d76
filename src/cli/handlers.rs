use anyhow::{Result, bail};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::path::Path;

use crate::calc::{AggregateStats, Recommendation, RiskLevel};
use crate::cli::args::{ExportFormat, TimetableCommands};
use crate::config::AppConfig;
use crate::db::repository::{MetaRepo, RefreshRepo, SqliteStore, SubjectRepo, TimetableRepo};
use crate::models::timetable::{day_name, parse_time, parse_weekday};
use crate::models::{SubjectRecord, TimetableEntry, validate_manual_counts};
use crate::report::{self, AttendanceReport, ReportOptions};
use crate::snapshot::{self, Snapshot};
use crate::source::NoTimetable;
use crate::utils::format::{
    format_days_left, format_percentage, format_signed, format_time, progress_bar,
};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const TEAL: &str = "\x1b[38;2;86;182;194m";

fn risk_color(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Safe => GREEN,
        RiskLevel::Warning => AMBER,
        RiskLevel::Danger | RiskLevel::Critical => RED,
    }
}

fn load_report(conn: &Connection, user: &str, options: ReportOptions) -> Result<AttendanceReport> {
    let store = SqliteStore::new(conn);
    report::build_report(&store, &store, user, &options)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ─── Setup wizard ────────────────────────────────────────────────────────────

pub fn handle_setup(conn: &Connection, config: &mut AppConfig, reset: bool) -> Result<()> {
    if !reset {
        if let Some(done) = MetaRepo::get(conn, "setup_done")? {
            if done == "1" {
                println!("bunkwise is already configured. Use --reset to reconfigure.");
                return Ok(());
            }
        }
    }
    crate::cli::setup_tui::run_setup_tui(conn, config)
}

// ─── Subjects ────────────────────────────────────────────────────────────────

pub fn handle_list(conn: &Connection, config: &AppConfig, user: &str) -> Result<()> {
    let subjects = SubjectRepo::list(conn, user)?;
    let target = config.attendance.target_percentage;

    println!();
    println_colored!(
        TEAL,
        "  Subjects ({})  ·  safe zone {}%",
        user,
        config.calculator().safe_target()
    );
    println!();
    if subjects.is_empty() {
        println_colored!(DIM, "  No subjects yet. Add one with: bunkwise add NAME --present P --total T");
        println!();
        return Ok(());
    }
    for subject in &subjects {
        let pct = subject.percentage();
        let risk = RiskLevel::classify(pct, target);
        println_colored!(
            risk_color(risk),
            "  {:<24} {:>4}/{:<4} {:>8}  {}  {}",
            subject.name,
            subject.present,
            subject.total,
            format_percentage(pct),
            progress_bar(pct, 10),
            risk.display_name()
        );
    }
    println!();
    Ok(())
}

pub fn handle_add(conn: &Connection, user: &str, name: &str, present: u32, total: u32) -> Result<()> {
    let name = name.trim();
    validate_manual_counts(name, present, total)?;
    let subject = SubjectRecord::new(name, present, total)?;
    SubjectRepo::add(conn, user, &subject)?;
    println_colored!(
        GREEN,
        "  ✓ Added {}: {}/{} ({})",
        subject.name,
        present,
        total,
        format_percentage(subject.percentage())
    );
    Ok(())
}

pub fn handle_update(
    conn: &Connection,
    user: &str,
    name: &str,
    present: u32,
    total: u32,
) -> Result<()> {
    validate_manual_counts(name, present, total)?;
    let updated = SubjectRepo::update(conn, user, name.trim(), present, total)?;
    println_colored!(
        GREEN,
        "  ✓ {} updated: {}/{} ({})",
        updated.name,
        updated.present,
        updated.total,
        format_percentage(updated.percentage())
    );
    Ok(())
}

pub fn handle_record(
    conn: &Connection,
    config: &AppConfig,
    user: &str,
    name: &str,
    attended: bool,
) -> Result<()> {
    let subject = SubjectRepo::record_class(conn, user, name.trim(), attended)?;
    let pct = subject.percentage();
    let risk = RiskLevel::classify(pct, config.attendance.target_percentage);
    if attended {
        println_colored!(GREEN, "  ✓ {} attended", subject.name);
    } else {
        println_colored!(AMBER, "  ✗ {} missed", subject.name);
    }
    println_colored!(
        risk_color(risk),
        "    now {}/{} ({}, {}) · {} missed",
        subject.present,
        subject.total,
        format_percentage(pct),
        risk.display_name(),
        subject.missed()
    );
    Ok(())
}

pub fn handle_remove(conn: &Connection, user: &str, name: &str) -> Result<()> {
    SubjectRepo::delete(conn, user, name.trim())?;
    println_colored!(DIM, "  Removed {}", name.trim());
    Ok(())
}

// ─── Bunk ────────────────────────────────────────────────────────────────────

pub fn handle_bunk(
    conn: &Connection,
    config: &AppConfig,
    user: &str,
    future: Option<u32>,
) -> Result<()> {
    let mut options = ReportOptions::from_config(config, today());
    if let Some(future) = future {
        options.future_classes = future;
    }
    let report = load_report(conn, user, options)?;

    println!();
    println_colored!(
        TEAL,
        "  Bunk analysis: target {}%, safe zone {}%, next {} classes",
        report.target_percentage,
        report.safe_target(),
        report.future_classes
    );
    println!();

    if report.subjects.is_empty() {
        println_colored!(DIM, "  No subjects recorded.");
        println!();
        return Ok(());
    }

    for subject in &report.subjects {
        let bunk = &subject.bunk;
        let (color, advice) = match bunk.recommendation() {
            Recommendation::CanBunk(n) => (GREEN, format!("can bunk {} of the next {}", n, report.future_classes)),
            Recommendation::MustAttend(n) => (RED, format!("attend the next {} classes", n)),
            Recommendation::AttendAll => (AMBER, "attend everything".to_string()),
        };
        println_colored!(
            color,
            "  {:<24} {:>8}  ({})  {}",
            subject.name,
            format_percentage(bunk.current_percentage),
            format_signed(bunk.buffer),
            advice
        );
    }

    let advice = report.bunk_advice();
    println!();
    println_colored!(BOLD, "  Overall");
    if advice.below_target.is_empty() && advice.near_target.is_empty() {
        println_colored!(GREEN, "  ✓ Every subject is in the safe zone");
    }
    for (name, needed) in &advice.below_target {
        println_colored!(RED, "  ! {} is below target: attend {} more classes", name, needed);
    }
    for (name, buffer) in &advice.near_target {
        println_colored!(
            AMBER,
            "  ~ {} is only {} above target: avoid bunking",
            name,
            format_signed(*buffer)
        );
    }
    if let Some((name, bunks)) = advice.bunkable.first() {
        println_colored!(
            GREEN,
            "  Best subject to bunk: {} (up to {} classes)",
            name,
            bunks
        );
    }
    println!();
    Ok(())
}

// ─── Projection ──────────────────────────────────────────────────────────────

pub fn handle_project(
    conn: &Connection,
    config: &AppConfig,
    user: &str,
    today_override: Option<NaiveDate>,
) -> Result<()> {
    let options = ReportOptions::from_config(config, today_override.unwrap_or_else(today));
    let report = load_report(conn, user, options)?;

    println!();
    match &report.semester {
        Some(semester) => println_colored!(
            TEAL,
            "  Projection to {} ({})",
            semester.end,
            format_days_left(semester.days_left)
        ),
        None => {
            println_colored!(TEAL, "  Projection");
            println_colored!(
                DIM,
                "  No semester window set; run `bunkwise semester START END` for projections."
            );
        }
    }
    println!();

    for subject in &report.subjects {
        let p = &subject.projection;
        println_colored!(
            risk_color(p.risk_level),
            "  {:<24} {:>8}  {}",
            subject.name,
            format_percentage(p.current_percentage),
            p.risk_level.display_name()
        );
        if p.remaining_classes == 0 {
            println_colored!(DIM, "    no classes left to project");
            continue;
        }
        println!(
            "    {} left · need {} · can skip {}",
            p.remaining_classes, p.classes_needed, p.can_skip
        );
        println_colored!(
            DIM,
            "    attend all → {}   current pace → {}   semester total {}",
            format_percentage(p.projected_percentage_if_attend_all),
            format_percentage(p.projected_percentage_at_current_rate),
            p.expected_total_for_semester
        );
    }
    println!();
    Ok(())
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub fn handle_stats(conn: &Connection, config: &AppConfig, user: &str) -> Result<()> {
    let subjects = SubjectRepo::list(conn, user)?;
    let stats = AggregateStats::from_subjects(&subjects, config.attendance.target_percentage);

    println!();
    println_colored!(TEAL, "  Statistics ({})", user);
    println!();
    println_colored!(
        BOLD,
        "  Overall:     {}  ({}/{})",
        format_percentage(stats.overall_percentage),
        stats.total_present,
        stats.total_classes
    );
    println_colored!(
        DIM,
        "  Subject avg: {}",
        format_percentage(AggregateStats::mean_of_subjects(&subjects))
    );
    println!("  Subjects:    {}", stats.subjects);
    println_colored!(GREEN, "  Safe:        {}", stats.safe);
    println_colored!(AMBER, "  Warning:     {}", stats.warning);
    println_colored!(RED, "  Danger:      {}", stats.danger);

    if let Some(days) = config.days_left() {
        println!("  Semester:    {}", format_days_left(days));
    }
    if let Some(last) = RefreshRepo::last(conn, user)? {
        println_colored!(
            DIM,
            "  Last import: {} ({} subjects from {})",
            last.refreshed_at,
            last.subject_count,
            last.source
        );
    }
    println!();
    Ok(())
}

// ─── Timetable ───────────────────────────────────────────────────────────────

pub fn handle_timetable(conn: &Connection, user: &str, action: &TimetableCommands) -> Result<()> {
    match action {
        TimetableCommands::Add {
            subject,
            day,
            start,
            end,
        } => {
            let subject = subject.trim();
            if subject.is_empty() {
                bail!("Subject name cannot be empty");
            }
            let entry = TimetableEntry {
                id: None,
                subject: subject.to_string(),
                day: parse_weekday(day)?,
                start_time: parse_time(start)?,
                end_time: parse_time(end)?,
            };
            if entry.end_time <= entry.start_time {
                bail!("Slot must end after it starts ({} - {})", start, end);
            }
            let id = TimetableRepo::add(conn, user, &entry)?;
            println_colored!(
                GREEN,
                "  ✓ Slot {}: {} on {} {}-{}",
                id,
                entry.subject,
                day_name(entry.day),
                format_time(entry.start_time),
                format_time(entry.end_time)
            );
        }
        TimetableCommands::List => {
            let entries = TimetableRepo::list(conn, user)?;
            println!();
            println_colored!(TEAL, "  Timetable ({})", user);
            println!();
            if entries.is_empty() {
                println_colored!(DIM, "  No slots. Projections use [attendance].weekly_classes.");
            }
            let mut last_day = None;
            for entry in &entries {
                if last_day != Some(entry.day) {
                    println_colored!(BOLD, "  {}", day_name(entry.day));
                    last_day = Some(entry.day);
                }
                println!(
                    "    [{}] {}-{}  {}",
                    entry.id.unwrap_or_default(),
                    format_time(entry.start_time),
                    format_time(entry.end_time),
                    entry.subject
                );
            }
            println!();
        }
        TimetableCommands::Remove { id } => {
            TimetableRepo::remove(conn, user, *id)?;
            println_colored!(DIM, "  Removed slot {}", id);
        }
        TimetableCommands::Clear => {
            let removed = TimetableRepo::clear(conn, user)?;
            println_colored!(DIM, "  Removed {} slots", removed);
        }
    }
    Ok(())
}

// ─── Semester ────────────────────────────────────────────────────────────────

pub fn handle_semester(config: &mut AppConfig, start: NaiveDate, end: NaiveDate) -> Result<()> {
    config.semester.start = Some(start);
    config.semester.end = Some(end);
    config.save()?;
    println_colored!(GREEN, "  ✓ Semester set: {} to {}", start, end);
    if let Some(days) = config.days_left() {
        println_colored!(DIM, "    {}", format_days_left(days));
    }
    Ok(())
}

// ─── Import / export ─────────────────────────────────────────────────────────

pub fn handle_import(
    conn: &Connection,
    config: &AppConfig,
    user: &str,
    file: &Path,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        let snapshot = Snapshot::load(file)?;
        let options = ReportOptions::from_config(config, today());
        let report = report::build_report(&snapshot, &NoTimetable, user, &options)?;
        println_colored!(DIM, "  Dry run: {} would be imported, nothing saved", file.display());
        print!("{}", report::render_text(&report));
        return Ok(());
    }
    let written = snapshot::import_file(conn, user, file)?;
    println_colored!(GREEN, "  ✓ Imported {} subjects for {}", written, user);
    Ok(())
}

pub fn handle_export(
    conn: &Connection,
    config: &AppConfig,
    user: &str,
    format: ExportFormat,
) -> Result<()> {
    let report = load_report(conn, user, ReportOptions::from_config(config, today()))?;
    match format {
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ExportFormat::Text => print!("{}", report::render_text(&report)),
    }
    Ok(())
}
