mod calc;
mod cli;
mod config;
mod db;
mod models;
mod refresh;
mod report;
mod snapshot;
mod source;
mod tui;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::repository::MetaRepo;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("Loading config")?;
    let user = cli.user.clone().unwrap_or_else(|| config.profile.user.clone());

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = db::open(&db_path)?;

    match cli.command {
        Some(Commands::Setup { reset }) => {
            handlers::handle_setup(&conn, &mut config, reset)?;
        }

        // Explicit subcommands: check setup first
        Some(cmd) => {
            ensure_setup(&conn, &mut config)?;
            match cmd {
                Commands::List => handlers::handle_list(&conn, &config, &user)?,
                Commands::Add {
                    name,
                    present,
                    total,
                } => handlers::handle_add(&conn, &user, &name, present, total)?,
                Commands::Update {
                    name,
                    present,
                    total,
                } => handlers::handle_update(&conn, &user, &name, present, total)?,
                Commands::Attend { name } => {
                    handlers::handle_record(&conn, &config, &user, &name, true)?
                }
                Commands::Miss { name } => {
                    handlers::handle_record(&conn, &config, &user, &name, false)?
                }
                Commands::Remove { name } => handlers::handle_remove(&conn, &user, &name)?,
                Commands::Bunk { future } => {
                    handlers::handle_bunk(&conn, &config, &user, future)?
                }
                Commands::Project { today } => {
                    handlers::handle_project(&conn, &config, &user, today)?
                }
                Commands::Stats => handlers::handle_stats(&conn, &config, &user)?,
                Commands::Timetable { action } => {
                    handlers::handle_timetable(&conn, &user, &action)?
                }
                Commands::Semester { start, end } => {
                    handlers::handle_semester(&mut config, start, end)?
                }
                Commands::Import { file, dry_run } => {
                    handlers::handle_import(&conn, &config, &user, &file, dry_run)?
                }
                Commands::Export { format } => {
                    handlers::handle_export(&conn, &config, &user, format)?
                }
                Commands::Setup { .. } => unreachable!(),
            }
        }

        // No subcommand → launch TUI
        None => {
            ensure_setup(&conn, &mut config)?;
            tui::app::run(conn, config, user, db_path)?;
        }
    }

    Ok(())
}

/// Check if setup has been done; if not, run the wizard automatically.
fn ensure_setup(conn: &Connection, config: &mut AppConfig) -> Result<()> {
    let done = MetaRepo::get(conn, "setup_done")?;
    if done.as_deref() != Some("1") {
        eprintln!("No configuration found. Running setup...");
        eprintln!();
        handlers::handle_setup(conn, config, false)?;
    }
    Ok(())
}
