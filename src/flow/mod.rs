//! Session flow (Sankey) diagram: display model, layout and widget.

pub mod layout;
pub mod transform;
pub mod widget;

pub use transform::{build_display_graph, DisplayGraph, Highlight, PAGELOAD_LABEL};
pub use widget::{render_flow_diagram, FlowEvent, FlowState};
