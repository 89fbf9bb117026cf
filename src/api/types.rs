//! Response schema for `/groupedsessions`.

use super::error::ApiError;
use crate::filters::{FilterItem, MAX_DROPDOWN_OPTIONS};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// A graph vertex as sent by the backend. An empty name is the pageload root.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SankeyNode {
    #[serde(default)]
    pub name: String,
    pub value: f64,
}

/// A weighted edge between two node indices.
///
/// Extra metric columns depend on the requested value/heat types and are
/// kept in `metrics`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    /// Median latency in ms; absent when the backend has no samples.
    #[serde(default)]
    pub p50: Option<f64>,
    #[serde(flatten)]
    pub metrics: HashMap<String, serde_json::Value>,
}

impl SankeyLink {
    /// Numeric metric by key, covering the fixed columns too.
    pub fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "value" => Some(self.value),
            "p50" => self.p50,
            _ => self.metrics.get(key).and_then(serde_json::Value::as_f64),
        }
    }

    /// Metric rendered for tooltips; missing values show as a dash.
    pub fn metric_text(&self, key: &str) -> String {
        match key {
            "value" | "p50" => self
                .metric(key)
                .map(format_number)
                .unwrap_or_else(|| "—".to_string()),
            _ => match self.metrics.get(key) {
                Some(serde_json::Value::Number(n)) => n
                    .as_f64()
                    .map(format_number)
                    .unwrap_or_else(|| n.to_string()),
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => "—".to_string(),
                Some(other) => other.to_string(),
            },
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroupedSessionData {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistinctUser {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSession {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub start: String,
}

/// Aggregates and side-channel lists accompanying the graph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMeta {
    pub max_node_value: f64,
    pub distinct_users: Vec<DistinctUser>,
    #[serde(default)]
    pub user_sessions: Vec<UserSession>,
    #[serde(default)]
    pub user_session_count: u64,
    #[serde(default)]
    pub miserable_session_count: u64,
    #[serde(default)]
    pub avg_session_time_diff: f64,
    #[serde(default)]
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScatterPoint {
    pub plan_change_count: f64,
    pub percent_misery: f64,
}

/// Full `/groupedsessions` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    pub data: GroupedSessionData,
    pub meta: QueryMeta,
    #[serde(default, rename = "scatterData")]
    pub scatter_data: Vec<ScatterPoint>,
}

impl QueryResult {
    /// Decode and validate a response body.
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let result: QueryResult =
            serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        result.validate()?;
        Ok(result)
    }

    /// Check the invariants the renderer relies on.
    pub fn validate(&self) -> Result<(), ApiError> {
        let node_count = self.data.nodes.len();
        for (i, link) in self.data.links.iter().enumerate() {
            if link.source >= node_count || link.target >= node_count {
                return Err(ApiError::Malformed(format!(
                    "link {} references node {}->{} but only {} nodes exist",
                    i, link.source, link.target, node_count
                )));
            }
        }
        if !self.meta.max_node_value.is_finite() {
            return Err(ApiError::Malformed("maxNodeValue is not finite".into()));
        }
        Ok(())
    }

    /// Distinct user names as dropdown options.
    pub fn user_options(&self) -> Vec<FilterItem> {
        self.meta
            .distinct_users
            .iter()
            .map(|u| FilterItem::new(u.name.clone(), u.name.clone()))
            .collect()
    }

    /// Sessions of the selected user as dropdown options, labelled by start.
    pub fn session_options(&self) -> Vec<FilterItem> {
        self.meta
            .user_sessions
            .iter()
            .take(MAX_DROPDOWN_OPTIONS)
            .map(|s| FilterItem::new(s.start.clone(), s.id.clone()))
            .collect()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}
