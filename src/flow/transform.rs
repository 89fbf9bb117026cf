//! Builds the render-ready display model from a query result.
//!
//! The raw payload is never touched; a fresh `DisplayGraph` is built every
//! frame from the result, the active color scale and the hover/selection
//! state.

use crate::api::{QueryResult, SankeyLink};
use crate::color::ColorScale;
use crate::theme;
use egui::Color32;

pub const LABEL_FONT_SIZE: f32 = 14.0;
pub const LABEL_MAX_CHARS: usize = 35;
pub const VIS_HEIGHT: f32 = 500.0;

/// Display name of the unnamed root node.
pub const PAGELOAD_LABEL: &str = "<Pageload>";

/// Which node is selected and what the pointer is over.
///
/// `active_link` indexes the display link list, not the raw payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Highlight {
    pub selected_node: Option<usize>,
    pub active_node: Option<usize>,
    pub active_link: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub index: usize,
    pub full_name: String,
    pub value: f64,
    /// Large enough to carry a label without emphasis.
    pub name_shown: bool,
    pub emphasized: bool,
    /// What gets drawn next to the node; empty when hidden.
    pub label: String,
    pub color: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayLink {
    /// Position in the display list.
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub raw: SankeyLink,
    pub color: Color32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayGraph {
    pub nodes: Vec<DisplayNode>,
    pub links: Vec<DisplayLink>,
}

impl DisplayGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&DisplayNode> {
        self.nodes.get(index)
    }

    pub fn link(&self, index: usize) -> Option<&DisplayLink> {
        self.links.get(index)
    }
}

/// Minimum node value that earns an always-visible label.
pub fn label_threshold(max_node_value: f64) -> f64 {
    max_node_value * (LABEL_FONT_SIZE as f64 / VIS_HEIGHT as f64)
}

/// Cut a name to `LABEL_MAX_CHARS` characters with a trailing ellipsis.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let truncated: String = name.chars().take(LABEL_MAX_CHARS).collect();
        format!("{}…", truncated)
    } else {
        name.to_string()
    }
}

pub fn full_name(raw_name: &str) -> String {
    if raw_name.is_empty() {
        PAGELOAD_LABEL.to_string()
    } else {
        raw_name.to_string()
    }
}

/// Derive the display model.
pub fn build_display_graph(
    result: Option<&QueryResult>,
    scale: &ColorScale,
    highlight: &Highlight,
) -> DisplayGraph {
    let Some(result) = result else {
        return DisplayGraph::default();
    };

    let links: Vec<DisplayLink> = result
        .data
        .links
        .iter()
        .filter(|l| l.source < l.target)
        .enumerate()
        .map(|(index, l)| DisplayLink {
            index,
            source: l.source,
            target: l.target,
            value: l.value,
            raw: l.clone(),
            color: scale.color_for(l),
            opacity: if highlight.active_link == Some(index) {
                theme::link::FOCUSED_OPACITY
            } else {
                theme::link::BLURRED_OPACITY
            },
        })
        .collect();

    let hovered_ends = highlight
        .active_link
        .and_then(|i| links.get(i))
        .map(|l| (l.source, l.target));

    let threshold = label_threshold(result.meta.max_node_value);

    let nodes = result
        .data
        .nodes
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let full_name = full_name(&raw.name);
            let name_shown = raw.value > threshold;
            let emphasized = highlight.selected_node == Some(index)
                || highlight.active_node == Some(index)
                || hovered_ends.is_some_and(|(s, t)| s == index || t == index);

            let label = if emphasized {
                full_name.clone()
            } else if name_shown {
                truncate_label(&full_name)
            } else {
                String::new()
            };

            DisplayNode {
                index,
                full_name,
                value: raw.value,
                name_shown,
                emphasized,
                label,
                color: if emphasized {
                    theme::node::PURPLE_400
                } else {
                    theme::node::PURPLE_500
                },
            }
        })
        .collect();

    DisplayGraph { nodes, links }
}
