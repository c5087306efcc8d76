use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::calc::{BunkCalculator, DEFAULT_BUFFER, DEFAULT_FUTURE_CLASSES, DEFAULT_TARGET};
use crate::models::SemesterWindow;

fn default_target() -> f64 {
    DEFAULT_TARGET
}
fn default_buffer() -> f64 {
    DEFAULT_BUFFER
}
fn default_future_classes() -> u32 {
    DEFAULT_FUTURE_CLASSES
}
fn default_user() -> String {
    "default".to_string()
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Target percentage must be between 0 and 100, got {0}")]
    TargetOutOfRange(f64),

    #[error("Safety buffer cannot be negative, got {0}")]
    NegativeBuffer(f64),

    #[error("Target plus buffer must stay below 100% (got {0}%)")]
    SafeZoneUnreachable(f64),

    #[error("Semester ends ({end}) before it starts ({start})")]
    InvertedSemester { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceConfig {
    #[serde(default = "default_target")]
    pub target_percentage: f64,
    #[serde(default = "default_buffer")]
    pub safety_buffer: f64,
    /// Flat per-subject estimate used by the bunk calculator.
    #[serde(default = "default_future_classes")]
    pub future_classes: u32,
    /// Classes per subject per week, used for projections when there is no
    /// timetable. 0 disables the estimate.
    #[serde(default)]
    pub weekly_classes: u32,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            target_percentage: default_target(),
            safety_buffer: default_buffer(),
            future_classes: default_future_classes(),
            weekly_classes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SemesterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RefreshConfig {
    /// JSON attendance snapshot re-imported by the dashboard refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub semester: SemesterConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "bunkwise")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("bunkwise.db"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            log::debug!("no config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Reading {:?}", path))?;
        let config = Self::from_toml(&content)?;
        log::debug!("loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Parsing config.toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(&path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let target = self.attendance.target_percentage;
        if !(target > 0.0 && target < 100.0) {
            return Err(ConfigError::TargetOutOfRange(target));
        }
        let buffer = self.attendance.safety_buffer;
        if buffer < 0.0 {
            return Err(ConfigError::NegativeBuffer(buffer));
        }
        if target + buffer >= 100.0 {
            return Err(ConfigError::SafeZoneUnreachable(target + buffer));
        }
        if let (Some(start), Some(end)) = (self.semester.start, self.semester.end) {
            if start > end {
                return Err(ConfigError::InvertedSemester { start, end });
            }
        }
        Ok(())
    }

    pub fn calculator(&self) -> BunkCalculator {
        BunkCalculator::new(
            self.attendance.target_percentage,
            self.attendance.safety_buffer,
        )
    }

    /// The full window, when both ends are known.
    pub fn semester_window(&self) -> Option<SemesterWindow> {
        match (self.semester.start, self.semester.end) {
            (Some(start), Some(end)) => Some(SemesterWindow::new(start, end)),
            _ => None,
        }
    }

    pub fn days_left(&self) -> Option<i64> {
        self.semester_window()
            .map(|w| w.days_left(Local::now().date_naive()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.attendance.target_percentage, 75.0);
        assert_eq!(config.attendance.safety_buffer, 1.0);
        assert_eq!(config.attendance.future_classes, 20);
        assert_eq!(config.attendance.weekly_classes, 0);
        assert_eq!(config.profile.user, "default");
        assert!(config.semester_window().is_none());
        assert!(config.refresh.snapshot_path.is_none());
    }

    #[test]
    fn reads_semester_dates() {
        let config = AppConfig::from_toml(
            r#"
            [attendance]
            target_percentage = 80.0

            [semester]
            start = "2024-01-01"
            end = "2024-05-31"
            "#,
        )
        .unwrap();
        let window = config.semester_window().unwrap();
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(config.calculator().safe_target(), 81.0);
    }

    #[test]
    fn half_a_semester_is_no_window() {
        let config = AppConfig::from_toml("[semester]\nend = \"2024-05-31\"\n").unwrap();
        assert!(config.semester_window().is_none());
    }

    #[test]
    fn rejects_bad_targets() {
        let mut config = AppConfig::default();
        config.attendance.target_percentage = 100.0;
        assert_eq!(config.validate(), Err(ConfigError::TargetOutOfRange(100.0)));

        config.attendance.target_percentage = 99.5;
        assert_eq!(config.validate(), Err(ConfigError::SafeZoneUnreachable(100.5)));

        config.attendance.target_percentage = 75.0;
        config.attendance.safety_buffer = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::NegativeBuffer(-1.0)));
    }

    #[test]
    fn rejects_inverted_semester() {
        let err = AppConfig::from_toml(
            "[semester]\nstart = \"2024-06-01\"\nend = \"2024-01-01\"\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = AppConfig::default();
        config.semester.start = NaiveDate::from_ymd_opt(2024, 1, 1);
        config.semester.end = NaiveDate::from_ymd_opt(2024, 5, 31);
        config.refresh.snapshot_path = Some(PathBuf::from("/tmp/attendance.json"));
        let text = toml::to_string_pretty(&config).unwrap();
        let back = AppConfig::from_toml(&text).unwrap();
        assert_eq!(back.semester_window(), config.semester_window());
        assert_eq!(back.refresh.snapshot_path, config.refresh.snapshot_path);
    }
}
