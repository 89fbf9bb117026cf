//! HTTP client for the grouped sessions API.

use super::error::ApiError;
use super::types::QueryResult;
use crate::query::SessionQuery;
use crate::tags::{TagDetails, TagValue};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:3001";

/// Blocking API client. The base URL is fixed per client; requests never
/// rewrite it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        });
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for `/groupedsessions` with the query's active filters.
    pub fn grouped_sessions_url(&self, query: &SessionQuery) -> String {
        let qs = query.to_query_string();
        if qs.is_empty() {
            format!("{}/groupedsessions", self.base_url)
        } else {
            format!("{}/groupedsessions?{}", self.base_url, qs)
        }
    }

    /// Fetch the aggregated session graph for the given filters
    pub fn fetch_grouped_sessions(&self, query: &SessionQuery) -> Result<QueryResult, ApiError> {
        let url = self.grouped_sessions_url(query);
        tracing::debug!("GET {}", url);
        let body = self.get_text(&url)?;
        QueryResult::from_json(&body)
    }

    /// Fetch the summary of one tag on an issue
    pub fn fetch_tag(&self, issue_id: &str, tag_key: &str) -> Result<TagDetails, ApiError> {
        let url = format!(
            "{}/issues/{}/tags/{}/",
            self.base_url,
            urlencoding::encode(issue_id),
            urlencoding::encode(tag_key)
        );
        self.get_json(&url)
    }

    /// Fetch the individual values of one tag on an issue
    pub fn fetch_tag_values(&self, issue_id: &str, tag_key: &str) -> Result<Vec<TagValue>, ApiError> {
        let url = format!(
            "{}/issues/{}/tags/{}/values/",
            self.base_url,
            urlencoding::encode(issue_id),
            urlencoding::encode(tag_key)
        );
        self.get_json(&url)
    }

    fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;

        if !status.is_success() {
            tracing::warn!("GET {} returned {}", url, status);
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}
