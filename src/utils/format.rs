use chrono::NaiveTime;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Format a percentage with two decimals, e.g. "75.00%"
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Signed distance from the target, e.g. "+3.50" or "-1.25"
pub fn format_signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn format_days_left(days: i64) -> String {
    match days {
        d if d <= 0 => "semester over".to_string(),
        1 => "1 day left".to_string(),
        d => format!("{} days left", d),
    }
}

/// Create a simple ASCII progress bar for a 0-100 percentage
pub fn progress_bar(percent: f64, width: usize) -> String {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

/// Cut `s` to at most `width` terminal columns, ending in "…" when cut.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_and_signs() {
        assert_eq!(format_percentage(75.0), "75.00%");
        assert_eq!(format_signed(3.5), "+3.50");
        assert_eq!(format_signed(-1.25), "-1.25");
        assert_eq!(format_signed(0.0), "+0.00");
    }

    #[test]
    fn days_left_wording() {
        assert_eq!(format_days_left(0), "semester over");
        assert_eq!(format_days_left(1), "1 day left");
        assert_eq!(format_days_left(12), "12 days left");
    }

    #[test]
    fn bar_is_clamped() {
        assert_eq!(progress_bar(50.0, 4), "██░░");
        assert_eq!(progress_bar(150.0, 3), "███");
        assert_eq!(progress_bar(0.0, 2), "░░");
    }

    #[test]
    fn truncation_counts_columns() {
        assert_eq!(truncate_to_width("Maths", 10), "Maths");
        assert_eq!(truncate_to_width("Engineering Physics", 8), "Enginee…");
        // CJK characters take two columns each
        assert_eq!(truncate_to_width("数学数学", 5), "数学…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
