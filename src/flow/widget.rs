//! Flow diagram widget.

use super::layout::SankeyLayout;
use super::transform::{DisplayGraph, LABEL_FONT_SIZE, VIS_HEIGHT};
use crate::filters::{heat, FilterItem};
use crate::theme;
use egui::{Align2, Color32, FontId, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2};

/// Horizontal room reserved on each side for node labels.
const LABEL_MARGIN: f32 = 160.0;
const VERTICAL_MARGIN: f32 = 12.0;

/// Hover state owned by the diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowState {
    pub active_link: Option<usize>,
    pub active_node: Option<usize>,
}

impl FlowState {
    /// Update hover from what the pointer is over. Leaving a shape clears it.
    pub fn hover(&mut self, node: Option<usize>, link: Option<usize>) {
        self.active_node = node;
        self.active_link = if node.is_some() { None } else { link };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Interaction reported back to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    NodeClicked(usize),
    SelectionCleared,
}

/// Text of the link hover tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub from: String,
    pub to: String,
    pub heat_label: String,
    pub heat_value: String,
    pub plan_changes: Option<String>,
}

/// Tooltip for display link `link_index`, if it exists.
pub fn tooltip_content(
    graph: &DisplayGraph,
    link_index: usize,
    heat_item: &FilterItem,
    value_item: &FilterItem,
) -> Option<TooltipContent> {
    let link = graph.link(link_index)?;
    let from = graph.node(link.source)?.full_name.clone();
    let to = graph.node(link.target)?.full_name.clone();

    let plan_changes = (value_item.value == crate::filters::value::PLAN_CHANGES)
        .then(|| link.raw.metric_text("plan_changes"));

    Some(TooltipContent {
        from,
        to,
        heat_label: heat_item.label.clone(),
        heat_value: link.raw.metric_text(heat::metric_key(&heat_item.value)),
        plan_changes,
    })
}

/// Draw the diagram and translate pointer input into hover state and events.
pub fn render_flow_diagram(
    ui: &mut Ui,
    state: &mut FlowState,
    graph: &DisplayGraph,
    heat_item: &FilterItem,
    value_item: &FilterItem,
    has_selection: bool,
) -> Vec<FlowEvent> {
    let mut events = Vec::new();
    let size = Vec2::new(ui.available_width(), VIS_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let rect = response.rect;

    painter.rect_filled(rect, 4.0, theme::bg::DIAGRAM);

    if graph.is_empty() {
        state.clear();
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "No session data",
            FontId::proportional(13.0),
            theme::text::MUTED,
        );
        return events;
    }

    let plot = Rect::from_min_max(
        rect.min + Vec2::new(LABEL_MARGIN, VERTICAL_MARGIN),
        rect.max - Vec2::new(LABEL_MARGIN, VERTICAL_MARGIN),
    );
    let layout = SankeyLayout::compute(graph, plot);

    track_pointer(ui, &response, &layout, state, &mut events);

    // Links behind nodes
    for (link, geom) in graph.links.iter().zip(&layout.links) {
        let color = theme::with_opacity(link.color, link.opacity);
        painter.add(Shape::line(geom.centerline(), Stroke::new(geom.width, color)));
    }

    let last_column = layout.nodes.iter().map(|n| n.column).max().unwrap_or(0);
    for (node, geom) in graph.nodes.iter().zip(&layout.nodes) {
        painter.rect_filled(geom.rect, 1.0, node.color);

        if node.label.is_empty() {
            continue;
        }
        let (anchor, align) = if geom.column == last_column && last_column > 0 {
            (
                Pos2::new(geom.rect.left() - 6.0, geom.rect.center().y),
                Align2::RIGHT_CENTER,
            )
        } else {
            (
                Pos2::new(geom.rect.right() + 6.0, geom.rect.center().y),
                Align2::LEFT_CENTER,
            )
        };
        let color = if node.emphasized {
            theme::text::PRIMARY
        } else {
            theme::text::SECONDARY
        };
        painter.text(anchor, align, &node.label, FontId::proportional(LABEL_FONT_SIZE), color);
    }

    if let Some(link_index) = state.active_link {
        if let (Some(content), Some(geom)) = (
            tooltip_content(graph, link_index, heat_item, value_item),
            layout.links.get(link_index),
        ) {
            draw_tooltip(&painter, geom.midpoint(), &content);
        }
    }

    if has_selection {
        let button_rect = Rect::from_min_size(
            rect.right_bottom() - Vec2::new(90.0, 40.0),
            Vec2::new(70.0, 22.0),
        );
        if ui.put(button_rect, egui::Button::new("⟲ Reset").small()).clicked() {
            events.push(FlowEvent::SelectionCleared);
        }
    }

    events
}

fn track_pointer(
    ui: &Ui,
    response: &Response,
    layout: &SankeyLayout,
    state: &mut FlowState,
    events: &mut Vec<FlowEvent>,
) {
    let Some(pos) = response.hover_pos() else {
        state.clear();
        return;
    };

    let node = layout.node_at(pos);
    let link = if node.is_none() { layout.link_at(pos) } else { None };
    state.hover(node, link);

    if node.is_some() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    if response.clicked() {
        if let Some(index) = node {
            events.push(FlowEvent::NodeClicked(index));
        }
    }
}

fn draw_tooltip(painter: &egui::Painter, center: Pos2, content: &TooltipContent) {
    let font = FontId::proportional(13.0);
    let padding = Vec2::new(12.0, 6.0);

    let series = [
        format!("From: {}", content.from),
        format!("To: {}", content.to),
    ];
    let mut aux = vec![(content.heat_label.clone(), content.heat_value.clone())];
    if let Some(plan_changes) = &content.plan_changes {
        aux.push(("plan changes".to_string(), plan_changes.clone()));
    }

    let series_galleys: Vec<_> = series
        .iter()
        .map(|line| painter.layout_no_wrap(line.clone(), font.clone(), theme::tooltip::SERIES_TEXT))
        .collect();
    let aux_galleys: Vec<_> = aux
        .iter()
        .map(|(label, value)| {
            painter.layout_no_wrap(format!("{}   {}", label, value), font.clone(), Color32::WHITE)
        })
        .collect();

    let marker = 10.0;
    let width = series_galleys
        .iter()
        .map(|g| g.size().x)
        .chain(aux_galleys.iter().map(|g| g.size().x + marker + 5.0))
        .fold(0.0f32, f32::max)
        + padding.x * 2.0;
    let line_height = font.size + 5.0;
    let series_height = line_height * series_galleys.len() as f32 + padding.y * 2.0;
    let aux_height = line_height * aux_galleys.len() as f32 + padding.y * 2.0;

    // Centered on the anchor.
    let box_rect = Rect::from_center_size(center, Vec2::new(width, series_height + aux_height));
    painter.rect_filled(box_rect, 4.0, theme::tooltip::BACKGROUND);

    let mut y = box_rect.top() + padding.y;
    for galley in series_galleys {
        painter.galley(Pos2::new(box_rect.left() + padding.x, y), galley, theme::tooltip::SERIES_TEXT);
        y += line_height;
    }

    let divider_y = box_rect.top() + series_height;
    painter.line_segment(
        [
            Pos2::new(box_rect.left(), divider_y),
            Pos2::new(box_rect.right(), divider_y),
        ],
        Stroke::new(1.0, theme::tooltip::DIVIDER),
    );

    let mut y = divider_y + padding.y;
    for galley in aux_galleys {
        let marker_center = Pos2::new(box_rect.left() + padding.x + marker / 2.0, y + font.size / 2.0 + 1.0);
        painter.circle_filled(marker_center, marker / 2.0, theme::tooltip::MARKER);
        painter.galley(
            Pos2::new(box_rect.left() + padding.x + marker + 5.0, y),
            galley,
            Color32::WHITE,
        );
        y += line_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::GROUPED_SESSIONS, QueryResult};
    use crate::color::ColorScale;
    use crate::filters::{heat_types, value_types};
    use crate::flow::transform::{build_display_graph, Highlight, PAGELOAD_LABEL};

    fn graph() -> DisplayGraph {
        let result = QueryResult::from_json(GROUPED_SESSIONS).unwrap();
        build_display_graph(Some(&result), &ColorScale::latency().unwrap(), &Highlight::default())
    }

    #[test]
    fn hovering_node_clears_link() {
        let mut state = FlowState::default();
        state.hover(None, Some(2));
        assert_eq!(state.active_link, Some(2));
        state.hover(Some(1), Some(2));
        assert_eq!(state, FlowState { active_node: Some(1), active_link: None });
        state.hover(None, None);
        assert_eq!(state, FlowState::default());
    }

    #[test]
    fn tooltip_shows_heat_metric() {
        let graph = graph();
        let heat = heat_types()[0].clone();
        let value = value_types()[0].clone();
        let tip = tooltip_content(&graph, 0, &heat, &value).unwrap();
        assert_eq!(tip.from, PAGELOAD_LABEL);
        assert_eq!(tip.to, "/checkout");
        assert_eq!(tip.heat_label, "p50()");
        assert_eq!(tip.heat_value, "350");
        assert_eq!(tip.plan_changes, None);
    }

    #[test]
    fn tooltip_adds_plan_changes_for_plan_change_value() {
        let graph = graph();
        let heat = heat_types()[1].clone();
        let value = value_types()[2].clone();
        let tip = tooltip_content(&graph, 0, &heat, &value).unwrap();
        assert_eq!(tip.heat_value, "0.30");
        assert_eq!(tip.plan_changes.as_deref(), Some("4"));
    }

    #[test]
    fn tooltip_for_missing_link_is_none() {
        let graph = graph();
        assert!(tooltip_content(&graph, 99, &heat_types()[0], &value_types()[0]).is_none());
    }
}
