//! Tag value drill-down for a single issue.
//!
//! Loads `/issues/{id}/tags/{key}/` and its `values/` list, and turns a
//! clicked value into an issue search location.

use crate::api::{ApiClient, ApiError};
use crate::navigation::{issues_location, Location};
use crate::summary::format_duration;
use crate::theme;
use chrono::{DateTime, Utc};
use eframe::egui::{self, RichText, Ui};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, TryRecvError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDetails {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_values: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagValue {
    pub value: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub count: u64,
    /// Search expression matching this value, when the backend provides one.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl TagValue {
    /// Search expression for issues carrying this value.
    pub fn search_query(&self, tag_key: &str) -> String {
        self.query
            .clone()
            .unwrap_or_else(|| format!("{}:{}", tag_key, self.value))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.value)
    }

    /// "last seen 2.0 days ago" relative to `now`.
    pub fn last_seen_label(&self, now: DateTime<Utc>) -> Option<String> {
        let age = now.signed_duration_since(self.last_seen?);
        Some(format!(
            "last seen {} ago",
            format_duration(age.num_seconds().max(0) as f64, 1)
        ))
    }

    /// Share of the tag's total occurrences, in percent.
    pub fn percent_of(&self, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.count as f64 * 100.0 / total as f64
        }
    }
}

/// Location for a clicked tag value.
pub fn tag_value_location(organization: &str, tag_key: &str, value: &TagValue) -> Location {
    issues_location(organization, &value.search_query(tag_key))
}

type TagResult = Result<(TagDetails, Vec<TagValue>), ApiError>;

/// Inputs and results of the drill-down side panel.
pub struct TagDrilldown {
    pub issue_id: String,
    pub tag_key: String,
    pub details: Option<TagDetails>,
    pub values: Vec<TagValue>,
    pub loading: bool,
    pub error: Option<String>,
    receiver: Option<Receiver<TagResult>>,
}

impl Default for TagDrilldown {
    fn default() -> Self {
        Self {
            issue_id: String::new(),
            tag_key: "user".to_string(),
            details: None,
            values: Vec::new(),
            loading: false,
            error: None,
            receiver: None,
        }
    }
}

impl TagDrilldown {
    /// Start loading the tag and its values on a background thread.
    pub fn load(&mut self, api: &ApiClient) {
        let issue_id = self.issue_id.trim().to_string();
        let tag_key = self.tag_key.trim().to_string();
        if issue_id.is_empty() || tag_key.is_empty() {
            self.error = Some("Issue and tag are required".to_string());
            return;
        }

        self.loading = true;
        self.error = None;
        let (tx, rx) = mpsc::channel();
        self.receiver = Some(rx);

        let api = api.clone();
        std::thread::spawn(move || {
            let result = api
                .fetch_tag(&issue_id, &tag_key)
                .and_then(|details| Ok((details, api.fetch_tag_values(&issue_id, &tag_key)?)));
            let _ = tx.send(result);
        });
    }

    /// Apply a finished load, if any. Returns true while still waiting.
    pub fn poll(&mut self) -> bool {
        let Some(ref rx) = self.receiver else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.apply(result);
                self.receiver = None;
                false
            }
            Err(TryRecvError::Empty) => true,
            Err(TryRecvError::Disconnected) => {
                self.loading = false;
                self.error = Some("Tag request cancelled".to_string());
                self.receiver = None;
                false
            }
        }
    }

    fn apply(&mut self, result: TagResult) {
        self.loading = false;
        match result {
            Ok((details, values)) => {
                tracing::info!("Loaded {} values for tag {}", values.len(), details.key);
                self.details = Some(details);
                self.values = values;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("Tag drill-down failed: {}", e);
                self.details = None;
                self.values.clear();
                self.error = Some(e.detail().unwrap_or_else(|| e.to_string()));
            }
        }
    }
}

/// Render the drill-down section. Returns a location when a value is clicked.
pub fn render_tag_drilldown(
    ui: &mut Ui,
    state: &mut TagDrilldown,
    api: &ApiClient,
    organization: &str,
) -> Option<Location> {
    let mut navigate = None;

    ui.horizontal(|ui| {
        ui.label("Issue");
        ui.add(egui::TextEdit::singleline(&mut state.issue_id).desired_width(70.0));
        ui.label("Tag");
        ui.add(egui::TextEdit::singleline(&mut state.tag_key).desired_width(70.0));
    });
    ui.horizontal(|ui| {
        if ui.add_enabled(!state.loading, egui::Button::new("Load")).clicked() {
            state.load(api);
        }
        if state.loading {
            ui.spinner();
        }
    });

    if let Some(ref err) = state.error {
        ui.colored_label(theme::state::ERROR, err);
    }

    let Some(details) = state.details.clone() else {
        return None;
    };

    ui.add_space(4.0);
    ui.label(
        RichText::new(format!("{} ({} values)", details.name, details.total_values))
            .color(theme::text::SECONDARY),
    );

    let now = Utc::now();
    egui::ScrollArea::vertical()
        .id_salt("tag_values")
        .max_height(160.0)
        .show(ui, |ui| {
            for value in &state.values {
                ui.horizontal(|ui| {
                    let mut link = ui.link(value.display_name());
                    if let Some(seen) = value.last_seen_label(now) {
                        link = link.on_hover_text(seen);
                    }
                    if link.clicked() {
                        navigate = Some(tag_value_location(organization, &details.key, value));
                    }
                    ui.label(
                        RichText::new(format!("{:.0}%", value.percent_of(details.total_values)))
                            .small()
                            .color(theme::text::MUTED),
                    );
                });
            }
        });

    navigate
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = r#"{"key": "user", "name": "User", "totalValues": 4, "uniqueValues": 2}"#;
    const VALUES: &str = r#"[
        {"value": "david", "name": "David Cramer", "count": 3, "query": "user.username:david", "lastSeen": "2018-12-20T23:32:25Z"},
        {"value": "10.0.0.1", "count": 1}
    ]"#;

    #[test]
    fn decodes_tag_payloads() {
        let details: TagDetails = serde_json::from_str(TAG).unwrap();
        assert_eq!(details.total_values, 4);
        let values: Vec<TagValue> = serde_json::from_str(VALUES).unwrap();
        assert_eq!(values[0].display_name(), "David Cramer");
        assert_eq!(values[1].display_name(), "10.0.0.1");
        assert_eq!(values[0].percent_of(details.total_values), 75.0);
        assert!(values[1].last_seen.is_none());
    }

    #[test]
    fn last_seen_is_relative() {
        let values: Vec<TagValue> = serde_json::from_str(VALUES).unwrap();
        let now: DateTime<Utc> = "2018-12-22T23:32:25Z".parse().unwrap();
        assert_eq!(
            values[0].last_seen_label(now).as_deref(),
            Some("last seen 2.0 days ago")
        );
        assert_eq!(values[1].last_seen_label(now), None);
    }

    #[test]
    fn clicking_value_navigates_to_issue_search() {
        let values: Vec<TagValue> = serde_json::from_str(VALUES).unwrap();
        let loc = tag_value_location("org-slug", "user", &values[0]);
        assert_eq!(loc.pathname, "/organizations/org-slug/issues/");
        assert_eq!(loc.query.get("query").map(String::as_str), Some("user.username:david"));

        // Without a backend query the tag key and raw value are used.
        let loc = tag_value_location("org-slug", "ip", &values[1]);
        assert_eq!(loc.query.get("query").map(String::as_str), Some("ip:10.0.0.1"));
    }

    #[test]
    fn failed_load_keeps_message() {
        let mut state = TagDrilldown::default();
        state.loading = true;
        state.apply(Err(ApiError::from_status(404, r#"{"detail": "Tag not found"}"#)));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Tag not found"));
        assert!(state.details.is_none());
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let api = ApiClient::new("http://localhost:1", std::time::Duration::from_secs(1));
        let mut state = TagDrilldown::default();
        state.load(&api);
        assert!(!state.loading);
        assert!(state.error.is_some());
        assert!(!state.poll());
    }
}
