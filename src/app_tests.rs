use super::*;
use crate::api::fixtures::GROUPED_SESSIONS;
use crate::filters::{heat_types, value_types};
use crate::flow::PAGELOAD_LABEL;

fn app() -> DashboardApp {
    DashboardApp::with_settings(Settings::default())
}

/// App with the fixture payload applied as if a request had finished.
fn loaded_app() -> DashboardApp {
    let mut app = app();
    let seq = app.fetcher.begin(app.current_query());
    let result = QueryResult::from_json(GROUPED_SESSIONS).unwrap();
    if let Some(users) = app.fetcher.complete(seq, Ok(result)) {
        app.set_known_users(users);
    }
    app
}

#[test]
fn initial_location_carries_base_filter() {
    let app = app();
    assert_eq!(app.history.len(), 1);
    assert_eq!(
        app.history.current().query.get("query").map(String::as_str),
        Some("event.type:transaction")
    );
    assert_eq!(app.filter_string(), "event.type:transaction");
}

#[test]
fn selecting_node_pushes_location() {
    let mut app = app();
    app.set_selected_node(Some("/checkout".into()));
    assert_eq!(app.history.len(), 2);
    assert_eq!(
        app.history.current().query.get("query").map(String::as_str),
        Some("event.type:transaction transaction:/checkout")
    );
    assert_eq!(app.current_query().selected_transaction.as_deref(), Some("/checkout"));

    app.handle_flow_event(FlowEvent::SelectionCleared, &DisplayGraph::default());
    assert!(app.selected_node.is_none());
    assert_eq!(app.history.len(), 3);
    assert_eq!(app.filter_string(), "event.type:transaction");
}

#[test]
fn clicked_node_is_selected_by_full_name() {
    let mut app = loaded_app();
    let graph = app.display_graph();
    app.handle_flow_event(FlowEvent::NodeClicked(0), &graph);
    assert_eq!(app.selected_node.as_deref(), Some(PAGELOAD_LABEL));
    assert_eq!(app.highlight().selected_node, Some(0));

    // Unknown index is ignored
    app.handle_flow_event(FlowEvent::NodeClicked(42), &graph);
    assert_eq!(app.selected_node.as_deref(), Some(PAGELOAD_LABEL));
}

#[test]
fn highlight_resolves_selection_against_payload() {
    let mut app = loaded_app();
    app.selected_node = Some("/cart".into());
    assert_eq!(app.highlight().selected_node, Some(2));

    app.selected_node = Some("/gone".into());
    assert_eq!(app.highlight().selected_node, None);
}

#[test]
fn known_users_are_set_once() {
    let mut app = loaded_app();
    assert_eq!(app.known_users.len(), 2);

    app.set_known_users(vec![FilterItem::new("carol", "carol")]);
    assert_eq!(app.known_users.len(), 2);
    assert_eq!(app.known_users[0].value, "alice");
}

#[test]
fn empty_user_list_does_not_fill_dropdown() {
    let mut app = app();
    app.set_known_users(Vec::new());
    assert!(app.known_users.is_empty());
    app.set_known_users(vec![FilterItem::new("carol", "carol")]);
    assert_eq!(app.known_users.len(), 1);
}

#[test]
fn user_options_start_with_sentinel_and_are_capped() {
    let mut app = app();
    let many = (0..150)
        .map(|i| FilterItem::new(format!("user{}", i), format!("user{}", i)))
        .collect();
    app.set_known_users(many);

    let options = app.user_options();
    assert_eq!(options.len(), MAX_DROPDOWN_OPTIONS + 1);
    assert!(options[0].is_ignored());
    assert_eq!(options[1].value, "user0");
}

#[test]
fn session_options_follow_payload() {
    let app = app();
    assert_eq!(app.session_options().len(), 1);

    let app = loaded_app();
    let options = app.session_options();
    assert_eq!(options.len(), 2);
    assert!(options[0].is_ignored());
    assert_eq!(options[1].value, "17");
}

#[test]
fn changing_user_resets_session() {
    let mut app = loaded_app();
    app.set_user_item(FilterItem::new("alice", "alice"));
    app.filters.session = FilterItem::new("start", "17");
    assert!(app.filters.session_enabled());

    // Same user keeps the session
    app.set_user_item(FilterItem::new("alice", "alice"));
    assert_eq!(app.filters.session.value, "17");

    app.set_user_item(FilterItem::new("bob", "bob"));
    assert!(app.filters.session.is_ignored());
}

#[test]
fn value_change_hides_insights() {
    let mut app = app();
    app.show_insights = true;
    app.set_value_item(value_types()[2].clone());
    assert!(!app.show_insights);
    assert!(app.filters.is_value_plan_changes());
}

#[test]
fn color_scale_follows_heat_item() {
    let mut app = app();
    assert_eq!(app.color_scale(), &ColorScale::latency().unwrap());
    app.filters.heat = heat_types()[1].clone();
    assert_eq!(app.color_scale(), &ColorScale::misery().unwrap());
}

#[test]
fn filter_change_requires_new_fetch() {
    let mut app = loaded_app();
    assert!(!app.fetcher.needs_fetch(&app.current_query()));

    app.filters.heat = heat_types()[1].clone();
    assert!(app.fetcher.needs_fetch(&app.current_query()));
}

#[test]
fn blank_api_url_is_not_applied() {
    let mut app = app();
    app.api_url_input = "   ".into();
    app.apply_api_url();
    assert_eq!(app.api.base_url(), crate::api::DEFAULT_API_BASE);
}
