//! Filter axes and their selectable options.

use serde::{Deserialize, Serialize};

/// Sentinel option value meaning "no filter applied".
pub const IGNORE_VALUE: &str = "all";

/// Maximum number of user/session options offered in a dropdown.
pub const MAX_DROPDOWN_OPTIONS: usize = 100;

/// One selectable dropdown option.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterItem {
    pub label: String,
    pub value: String,
}

impl FilterItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// True when this option is the "no filter" sentinel.
    pub fn is_ignored(&self) -> bool {
        self.value == IGNORE_VALUE
    }

    /// The value to send to the backend, or `None` for the sentinel.
    pub fn active_value(&self) -> Option<&str> {
        if self.is_ignored() {
            None
        } else {
            Some(&self.value)
        }
    }
}

/// Heat metric values the dashboard knows how to color by.
pub mod heat {
    pub const P50: &str = "p50";
    pub const MISERY: &str = "misery";
    pub const ERRORS: &str = "errors";

    /// Link field that carries the numbers for a heat selection.
    pub fn metric_key(heat_value: &str) -> &str {
        match heat_value {
            MISERY => "percent_miserable",
            other => other,
        }
    }
}

/// Value metric values.
pub mod value {
    pub const TRANSACTIONS: &str = "transactions";
    pub const ERRORS: &str = "error_count";
    pub const PLAN_CHANGES: &str = "plan_changes";
}

pub fn op_types() -> Vec<FilterItem> {
    vec![
        FilterItem::new("All", IGNORE_VALUE),
        FilterItem::new("Pageload", "pageload"),
        FilterItem::new("Navigation", "navigation"),
    ]
}

pub fn value_types() -> Vec<FilterItem> {
    vec![
        FilterItem::new("Transactions", value::TRANSACTIONS),
        FilterItem::new("Errors", value::ERRORS),
        FilterItem::new("Plan Changes", value::PLAN_CHANGES),
    ]
}

pub fn heat_types() -> Vec<FilterItem> {
    vec![
        FilterItem::new("p50()", heat::P50),
        FilterItem::new("Misery (%)", heat::MISERY),
        FilterItem::new("Errors", heat::ERRORS),
    ]
}

pub fn default_user_item() -> FilterItem {
    FilterItem::new("All Users", IGNORE_VALUE)
}

pub fn default_session_item() -> FilterItem {
    FilterItem::new("All Sessions", IGNORE_VALUE)
}

/// The five independent filter selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub op: FilterItem,
    pub value: FilterItem,
    pub heat: FilterItem,
    pub user: FilterItem,
    pub session: FilterItem,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            op: op_types().remove(0),
            value: value_types().remove(0),
            heat: heat_types().remove(0),
            user: default_user_item(),
            session: default_session_item(),
        }
    }
}

impl FilterSelection {
    pub fn is_heat_misery(&self) -> bool {
        self.heat.value == heat::MISERY
    }

    pub fn is_value_plan_changes(&self) -> bool {
        self.value.value == value::PLAN_CHANGES
    }

    /// Session filtering only makes sense once a user is chosen.
    pub fn session_enabled(&self) -> bool {
        !self.user.is_ignored()
    }
}

/// Label shown for an option at `index` in a dropdown list.
///
/// In redacted mode every non-sentinel option is replaced by its ordinal so
/// the real label never reaches the screen.
pub fn option_label(item: &FilterItem, index: usize, redacted: bool) -> String {
    if redacted && !item.is_ignored() {
        format!("{}: <redacted>", index)
    } else {
        item.label.clone()
    }
}

/// Label for the currently selected option of a dropdown.
pub fn selected_label(items: &[FilterItem], current: &FilterItem, redacted: bool) -> String {
    match items.iter().position(|item| item == current) {
        Some(index) => option_label(current, index, redacted),
        None if redacted && !current.is_ignored() => "<redacted>".to_string(),
        None => current.label.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_first_option_of_each_axis() {
        let selection = FilterSelection::default();
        assert_eq!(selection.op.value, IGNORE_VALUE);
        assert_eq!(selection.value.value, "transactions");
        assert_eq!(selection.heat.value, "p50");
        assert!(selection.user.is_ignored());
        assert!(selection.session.is_ignored());
        assert!(!selection.session_enabled());
    }

    #[test]
    fn sentinel_has_no_active_value() {
        assert_eq!(default_user_item().active_value(), None);
        assert_eq!(FilterItem::new("x", "bob").active_value(), Some("bob"));
    }

    #[test]
    fn redacted_options_show_ordinal_only() {
        let items = vec![
            default_user_item(),
            FilterItem::new("alice@example.com", "alice@example.com"),
            FilterItem::new("bob@example.com", "bob@example.com"),
        ];
        assert_eq!(option_label(&items[0], 0, true), "All Users");
        assert_eq!(option_label(&items[2], 2, true), "2: <redacted>");
        assert_eq!(option_label(&items[2], 2, false), "bob@example.com");

        // The selection keeps its real value for requests.
        let current = items[1].clone();
        assert_eq!(selected_label(&items, &current, true), "1: <redacted>");
        assert_eq!(current.active_value(), Some("alice@example.com"));
    }

    #[test]
    fn misery_reads_percent_miserable() {
        assert_eq!(heat::metric_key("misery"), "percent_miserable");
        assert_eq!(heat::metric_key("p50"), "p50");
    }
}
