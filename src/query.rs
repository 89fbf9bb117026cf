//! Sequenced fetching of `/groupedsessions`.
//!
//! Every request gets a sequence number. Only the completion of the newest
//! request is applied; anything older is dropped when it arrives.

use crate::api::{ApiClient, ApiError, QueryResult};
use crate::filters::{FilterItem, FilterSelection};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// The six inputs that drive a refetch when any of them changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuery {
    pub selected_transaction: Option<String>,
    pub op: FilterItem,
    pub heat: FilterItem,
    pub value: FilterItem,
    pub user: FilterItem,
    pub session: FilterItem,
}

impl Default for SessionQuery {
    fn default() -> Self {
        Self::new(None, &FilterSelection::default())
    }
}

impl SessionQuery {
    pub fn new(selected_transaction: Option<&str>, filters: &FilterSelection) -> Self {
        Self {
            selected_transaction: selected_transaction.map(str::to_string),
            op: filters.op.clone(),
            heat: filters.heat.clone(),
            value: filters.value.clone(),
            user: filters.user.clone(),
            session: filters.session.clone(),
        }
    }

    /// Query parameters, skipping the sentinel on every axis.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::new();
        if let Some(name) = self.selected_transaction.as_deref().filter(|n| !n.is_empty()) {
            params.push(("selectedTransaction", name));
        }
        let axes = [
            ("currentOpItem", &self.op),
            ("currentHeatItem", &self.heat),
            ("currentValueItem", &self.value),
            ("currentUserItem", &self.user),
            ("currentSessionItem", &self.session),
        ];
        for (key, item) in axes {
            if let Some(value) = item.active_value() {
                params.push((key, value));
            }
        }
        params
    }

    pub fn to_query_string(&self) -> String {
        self.params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// What the panel renders from.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub data: Option<QueryResult>,
}

struct Completion {
    seq: u64,
    result: Result<QueryResult, ApiError>,
}

pub struct SessionFetcher {
    state: FetchState,
    next_seq: u64,
    latest_seq: Option<u64>,
    last_query: Option<SessionQuery>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl Default for SessionFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFetcher {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            state: FetchState::default(),
            next_seq: 0,
            latest_seq: None,
            last_query: None,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// True if `query` differs from the last one requested.
    pub fn needs_fetch(&self, query: &SessionQuery) -> bool {
        self.last_query.as_ref() != Some(query)
    }

    /// Forget the last query so the next frame fetches again.
    pub fn invalidate(&mut self) {
        self.last_query = None;
    }

    /// Register a new request and return its sequence number.
    pub fn begin(&mut self, query: SessionQuery) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_seq = Some(seq);
        self.last_query = Some(query);
        self.state.is_loading = true;
        seq
    }

    /// Apply a completion. Returns the distinct-user options when the
    /// completion was accepted and successful.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<QueryResult, ApiError>,
    ) -> Option<Vec<FilterItem>> {
        if self.latest_seq != Some(seq) {
            tracing::debug!("Discarding superseded response #{}", seq);
            return None;
        }

        match result {
            Ok(data) => {
                tracing::info!(
                    "Loaded {} nodes / {} links (request #{})",
                    data.data.nodes.len(),
                    data.data.links.len(),
                    seq
                );
                let users = data.user_options();
                self.state = FetchState {
                    is_loading: false,
                    error: None,
                    data: Some(data),
                };
                Some(users)
            }
            Err(e) => {
                tracing::warn!("Grouped sessions request #{} failed: {}", seq, e);
                self.state = FetchState {
                    is_loading: false,
                    error: e.detail(),
                    data: None,
                };
                None
            }
        }
    }

    /// Issue `query` on a background thread.
    pub fn request(&mut self, api: &ApiClient, query: SessionQuery) {
        let seq = self.begin(query.clone());
        tracing::info!("Requesting grouped sessions #{}", seq);

        let tx = self.sender.clone();
        let api = api.clone();
        std::thread::spawn(move || {
            let result = api.fetch_grouped_sessions(&query);
            let _ = tx.send(Completion { seq, result });
        });
    }

    /// Drain finished requests. Returns user options from the newest
    /// accepted success, if any arrived.
    pub fn poll(&mut self) -> Option<Vec<FilterItem>> {
        let mut users = None;
        loop {
            match self.receiver.try_recv() {
                Ok(Completion { seq, result }) => {
                    if let Some(u) = self.complete(seq, result) {
                        users = Some(u);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures::GROUPED_SESSIONS;

    fn sample() -> QueryResult {
        QueryResult::from_json(GROUPED_SESSIONS).unwrap()
    }

    #[test]
    fn params_skip_sentinel_values() {
        let mut filters = FilterSelection::default();
        filters.user = FilterItem::new("alice", "alice");
        let query = SessionQuery::new(Some("/checkout"), &filters);
        assert_eq!(
            query.params(),
            vec![
                ("selectedTransaction", "/checkout"),
                ("currentHeatItem", "p50"),
                ("currentValueItem", "transactions"),
                ("currentUserItem", "alice"),
            ]
        );
    }

    #[test]
    fn changed_input_needs_fetch() {
        let mut fetcher = SessionFetcher::new();
        let query = SessionQuery::default();
        assert!(fetcher.needs_fetch(&query));
        fetcher.begin(query.clone());
        assert!(!fetcher.needs_fetch(&query));

        let mut other = query.clone();
        other.heat = FilterItem::new("Misery (%)", "misery");
        assert!(fetcher.needs_fetch(&other));
    }

    #[test]
    fn success_stores_data_and_reports_users() {
        let mut fetcher = SessionFetcher::new();
        let seq = fetcher.begin(SessionQuery::default());
        assert!(fetcher.is_loading());

        let users = fetcher.complete(seq, Ok(sample())).unwrap();
        assert_eq!(users.len(), 2);
        let state = fetcher.state();
        assert!(!state.is_loading);
        assert!(state.error.is_none());
        assert!(state.data.is_some());
    }

    #[test]
    fn failure_clears_data_and_keeps_detail() {
        let mut fetcher = SessionFetcher::new();
        let seq = fetcher.begin(SessionQuery::default());
        fetcher.complete(seq, Ok(sample()));

        let seq = fetcher.begin(SessionQuery::default());
        let users = fetcher.complete(seq, Err(ApiError::from_status(500, r#"{"detail":"boom"}"#)));
        assert!(users.is_none());
        let state = fetcher.state();
        assert!(!state.is_loading);
        assert!(state.data.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn superseded_response_is_discarded() {
        let mut fetcher = SessionFetcher::new();
        let first = fetcher.begin(SessionQuery::default());
        let second = fetcher.begin(SessionQuery::default());

        // The newer request resolves first, then the stale one arrives.
        assert!(fetcher.complete(second, Err(ApiError::Request("timeout".into()))).is_none());
        assert!(fetcher.complete(first, Ok(sample())).is_none());

        assert!(fetcher.state().data.is_none());
        assert!(!fetcher.is_loading());
    }

    #[test]
    fn poll_drains_out_of_order_completions() {
        let mut fetcher = SessionFetcher::new();
        let first = fetcher.begin(SessionQuery::default());
        let second = fetcher.begin(SessionQuery::default());

        // Newest lands first, then the stale one; only the newest is kept.
        fetcher
            .sender
            .send(Completion { seq: second, result: Ok(sample()) })
            .unwrap();
        fetcher
            .sender
            .send(Completion { seq: first, result: Err(ApiError::Request("late".into())) })
            .unwrap();

        let users = fetcher.poll().unwrap();
        assert_eq!(users.len(), 2);
        assert!(!fetcher.is_loading());
        assert!(fetcher.state().error.is_none());
        assert!(fetcher.state().data.is_some());

        // Channel is empty now.
        assert!(fetcher.poll().is_none());
        assert!(fetcher.state().data.is_some());
    }

    #[test]
    fn stale_response_does_not_end_loading() {
        let mut fetcher = SessionFetcher::new();
        let first = fetcher.begin(SessionQuery::default());
        let _second = fetcher.begin(SessionQuery::default());
        fetcher.complete(first, Ok(sample()));
        assert!(fetcher.is_loading());
        assert!(fetcher.state().data.is_none());
    }
}
