//! Summary statistics side panel.

use crate::api::QueryMeta;
use crate::theme;
use eframe::egui::{RichText, Ui};

const MINUTE: f64 = 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;

/// Figures shown in the summary panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub users: usize,
    pub user_sessions: u64,
    pub miserable_sessions: u64,
    pub avg_session_secs: f64,
}

impl SummaryStats {
    pub fn from_meta(meta: &QueryMeta) -> Self {
        Self {
            users: meta.distinct_users.len(),
            user_sessions: meta.user_session_count,
            miserable_sessions: meta.miserable_session_count,
            avg_session_secs: meta.avg_session_time_diff,
        }
    }
}

/// Human duration with `digits` decimals in the largest fitting unit.
pub fn format_duration(seconds: f64, digits: usize) -> String {
    let abs = seconds.abs();
    let (value, unit) = if abs >= WEEK {
        (seconds / WEEK, "weeks")
    } else if abs >= DAY {
        (seconds / DAY, "days")
    } else if abs >= HOUR {
        (seconds / HOUR, "hours")
    } else if abs >= MINUTE {
        (seconds / MINUTE, "minutes")
    } else if abs >= 1.0 {
        (seconds, "seconds")
    } else {
        return format!("{:.*}ms", digits, seconds * 1000.0);
    };
    format!("{:.*} {}", digits, value, unit)
}

pub fn render_summary_panel(ui: &mut Ui, meta: Option<&QueryMeta>) {
    ui.label(
        RichText::new("SUMMARY")
            .small()
            .strong()
            .color(theme::text::MUTED),
    );
    ui.add_space(6.0);

    let stats = meta.map(SummaryStats::from_meta);
    let dash = || "—".to_string();

    summary_item(ui, "👤", "Users", stats.as_ref().map(|s| s.users.to_string()).unwrap_or_else(dash));
    summary_item(
        ui,
        "📅",
        "User Sessions",
        stats.as_ref().map(|s| s.user_sessions.to_string()).unwrap_or_else(dash),
    );
    summary_item(
        ui,
        "🔥",
        "Sessions With Misery",
        stats
            .as_ref()
            .map(|s| s.miserable_sessions.to_string())
            .unwrap_or_else(dash),
    );
    summary_item(
        ui,
        "⏱",
        "Avg. Session Duration",
        format_duration(stats.as_ref().map_or(0.0, |s| s.avg_session_secs), 1),
    );
}

fn summary_item(ui: &mut Ui, icon: &str, title: &str, body: String) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(icon).size(16.0));
        ui.vertical(|ui| {
            ui.label(RichText::new(title).color(theme::text::PRIMARY));
            ui.label(RichText::new(body).color(theme::text::MUTED));
        });
    });
    ui.add_space(10.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::GROUPED_SESSIONS, QueryResult};

    #[test]
    fn stats_from_meta() {
        let result = QueryResult::from_json(GROUPED_SESSIONS).unwrap();
        let stats = SummaryStats::from_meta(&result.meta);
        assert_eq!(stats.users, 2);
        assert_eq!(stats.user_sessions, 12);
        assert_eq!(stats.miserable_sessions, 3);
        assert_eq!(stats.avg_session_secs, 95.5);
    }

    #[test]
    fn duration_picks_largest_unit() {
        assert_eq!(format_duration(95.5, 1), "1.6 minutes");
        assert_eq!(format_duration(30.0, 1), "30.0 seconds");
        assert_eq!(format_duration(7200.0, 1), "2.0 hours");
        assert_eq!(format_duration(3.0 * DAY, 1), "3.0 days");
        assert_eq!(format_duration(2.0 * WEEK, 1), "2.0 weeks");
        assert_eq!(format_duration(0.25, 1), "250.0ms");
        assert_eq!(format_duration(0.0, 1), "0.0ms");
    }
}
