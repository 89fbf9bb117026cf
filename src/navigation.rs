//! In-app navigation history and the search strings pushed into it.

use crate::flow::PAGELOAD_LABEL;
use std::collections::BTreeMap;

const BASE_FILTER: &str = "event.type:transaction";

/// A page path plus its query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            query: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Path with an encoded query string.
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.pathname.clone();
        }
        let qs = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.pathname, qs)
    }
}

/// Stack of visited locations; the last entry is current.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn current(&self) -> &Location {
        // Never empty: created with one entry and `back` keeps the first.
        &self.entries[self.entries.len() - 1]
    }

    pub fn push(&mut self, location: Location) {
        tracing::info!("Navigate to {}", location.to_url());
        self.entries.push(location);
    }

    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Search filter for the selected node's full name.
pub fn build_filter_string(selected: Option<&str>) -> String {
    match selected {
        Some(PAGELOAD_LABEL) => format!("{} transaction.op:pageload", BASE_FILTER),
        Some(name) => format!("{} transaction:{}", BASE_FILTER, name),
        None => BASE_FILTER.to_string(),
    }
}

/// Location reached by selecting a node: same page, new `query`, no cursor.
pub fn selection_location(current: &Location, selected: Option<&str>) -> Location {
    let mut next = current.clone();
    next.query.remove("cursor");
    next.query
        .insert("query".to_string(), build_filter_string(selected));
    next
}

/// Issue search page filtered by `query`.
pub fn issues_location(organization: &str, query: &str) -> Location {
    Location::new(format!("/organizations/{}/issues/", organization)).with_param("query", query)
}
