use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bunkwise", version, author, about = "Know how many classes you can safely skip")]
pub struct Cli {
    /// Whose attendance to work on (defaults to [profile].user)
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// First-run setup wizard (target, safety buffer, semester dates)
    Setup {
        /// Reset existing configuration
        #[arg(long)]
        reset: bool,
    },
    /// List subjects with counts, percentage and risk tier
    List,
    /// Add a subject
    Add {
        /// Subject name
        name: String,
        /// Classes attended
        #[arg(long)]
        present: u32,
        /// Classes held
        #[arg(long)]
        total: u32,
    },
    /// Overwrite a subject's counts
    Update {
        /// Subject name
        name: String,
        #[arg(long)]
        present: u32,
        #[arg(long)]
        total: u32,
    },
    /// Record one attended class
    Attend {
        /// Subject name
        name: String,
    },
    /// Record one missed class
    Miss {
        /// Subject name
        name: String,
    },
    /// Delete a subject
    Remove {
        /// Subject name
        name: String,
    },
    /// How many upcoming classes each subject can afford to lose
    Bunk {
        /// Upcoming classes to plan for (defaults to [attendance].future_classes)
        #[arg(long)]
        future: Option<u32>,
    },
    /// Project each subject to the end of the semester
    Project {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Show aggregate statistics
    Stats,
    /// Weekly timetable management
    Timetable {
        #[command(subcommand)]
        action: TimetableCommands,
    },
    /// Set the semester window (YYYY-MM-DD YYYY-MM-DD)
    Semester { start: NaiveDate, end: NaiveDate },
    /// Import a JSON attendance snapshot
    Import {
        /// Snapshot file
        file: PathBuf,
        /// Show what the snapshot contains without saving it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the full report to stdout
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum TimetableCommands {
    /// Add a weekly slot
    Add {
        /// Subject name
        subject: String,
        /// Day name (monday) or index (0 = Monday)
        day: String,
        /// Start time (HH:MM)
        start: String,
        /// End time (HH:MM)
        end: String,
    },
    /// Show the weekly timetable
    List,
    /// Remove a slot by id
    Remove { id: i64 },
    /// Remove every slot
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}
