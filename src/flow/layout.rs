//! Sankey layout for the flow diagram.
//!
//! Nodes are placed in columns by their longest path from a root, sized by
//! throughput, and stacked top to bottom. Links become ribbons whose ends
//! stack along the node edges.

use super::transform::DisplayGraph;
use egui::{Pos2, Rect, Vec2};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

/// Width of a node bar.
pub const NODE_WIDTH: f32 = 12.0;
/// Vertical gap between nodes in a column.
pub const NODE_PADDING: f32 = 10.0;
/// Samples per ribbon centerline.
const CURVE_SEGMENTS: usize = 24;
/// Extra pixels around shapes when hit-testing.
const HIT_SLOP: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeGeometry {
    pub column: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    /// Right edge of the source node.
    pub source_x1: f32,
    /// Left edge of the target node.
    pub target_x0: f32,
    /// Ribbon center where it leaves the source.
    pub y0: f32,
    /// Ribbon center where it enters the target.
    pub y1: f32,
    pub width: f32,
}

impl LinkGeometry {
    /// Tooltip anchor: the midpoint between the ribbon's two ends.
    pub fn midpoint(&self) -> Pos2 {
        Pos2::new(
            self.source_x1 + (self.target_x0 - self.source_x1) / 2.0,
            self.y0 - (self.y0 - self.y1) / 2.0,
        )
    }

    /// Centerline of the ribbon as a horizontal-tangent cubic bezier.
    pub fn centerline(&self) -> Vec<Pos2> {
        let p0 = Pos2::new(self.source_x1, self.y0);
        let p3 = Pos2::new(self.target_x0, self.y1);
        let xm = (p0.x + p3.x) / 2.0;
        let p1 = Pos2::new(xm, p0.y);
        let p2 = Pos2::new(xm, p3.y);

        (0..=CURVE_SEGMENTS)
            .map(|i| {
                let t = i as f32 / CURVE_SEGMENTS as f32;
                let u = 1.0 - t;
                let v = p0.to_vec2() * (u * u * u)
                    + p1.to_vec2() * (3.0 * u * u * t)
                    + p2.to_vec2() * (3.0 * u * t * t)
                    + p3.to_vec2() * (t * t * t);
                v.to_pos2()
            })
            .collect()
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        let reach = self.width / 2.0 + HIT_SLOP;
        self.centerline()
            .windows(2)
            .any(|seg| distance_to_segment(pos, seg[0], seg[1]) <= reach)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SankeyLayout {
    pub nodes: Vec<NodeGeometry>,
    pub links: Vec<LinkGeometry>,
}

impl SankeyLayout {
    /// Lay out `graph` inside `bounds`.
    pub fn compute(graph: &DisplayGraph, bounds: Rect) -> Self {
        let n = graph.nodes.len();
        if n == 0 {
            return Self::default();
        }

        let columns = assign_columns(graph);
        let column_count = columns.iter().copied().max().unwrap_or(0) + 1;

        // Throughput per node: the larger of its own value and its flows.
        let mut inflow = vec![0.0f64; n];
        let mut outflow = vec![0.0f64; n];
        for link in &graph.links {
            outflow[link.source] += link.value;
            inflow[link.target] += link.value;
        }
        let size: Vec<f64> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| node.value.max(inflow[i]).max(outflow[i]).max(0.0))
            .collect();

        // One vertical scale for every column so ribbon widths line up.
        let mut ky = f64::INFINITY;
        for col in 0..column_count {
            let members: Vec<usize> = (0..n).filter(|&i| columns[i] == col).collect();
            let total: f64 = members.iter().map(|&i| size[i]).sum();
            if total > 0.0 {
                let free = bounds.height() - NODE_PADDING * (members.len().saturating_sub(1)) as f32;
                ky = ky.min(free.max(0.0) as f64 / total);
            }
        }
        if !ky.is_finite() {
            ky = 0.0;
        }

        let column_step = if column_count > 1 {
            (bounds.width() - NODE_WIDTH) / (column_count - 1) as f32
        } else {
            0.0
        };

        let mut nodes = vec![
            NodeGeometry {
                column: 0,
                rect: Rect::NOTHING,
            };
            n
        ];
        let mut cursor = vec![bounds.top(); column_count];
        for i in 0..n {
            let col = columns[i];
            let height = ((size[i] * ky) as f32).max(1.0);
            let x0 = bounds.left() + column_step * col as f32;
            let y0 = cursor[col];
            nodes[i] = NodeGeometry {
                column: col,
                rect: Rect::from_min_size(Pos2::new(x0, y0), Vec2::new(NODE_WIDTH, height)),
            };
            cursor[col] = y0 + height + NODE_PADDING;
        }

        // Stack ribbon ends: outgoing ordered by target position, incoming by
        // source position.
        let mut out_order: Vec<usize> = (0..graph.links.len()).collect();
        out_order.sort_by(|&a, &b| {
            let (la, lb) = (&graph.links[a], &graph.links[b]);
            la.source
                .cmp(&lb.source)
                .then(nodes[la.target].rect.top().total_cmp(&nodes[lb.target].rect.top()))
        });
        let mut in_order: Vec<usize> = (0..graph.links.len()).collect();
        in_order.sort_by(|&a, &b| {
            let (la, lb) = (&graph.links[a], &graph.links[b]);
            la.target
                .cmp(&lb.target)
                .then(nodes[la.source].rect.top().total_cmp(&nodes[lb.source].rect.top()))
        });

        let widths: Vec<f32> = graph.links.iter().map(|l| (l.value * ky) as f32).collect();
        let mut y0 = vec![0.0f32; graph.links.len()];
        let mut y1 = vec![0.0f32; graph.links.len()];

        let mut offsets = vec![0.0f32; n];
        for &li in &out_order {
            let link = &graph.links[li];
            y0[li] = nodes[link.source].rect.top() + offsets[link.source] + widths[li] / 2.0;
            offsets[link.source] += widths[li];
        }
        let mut offsets = vec![0.0f32; n];
        for &li in &in_order {
            let link = &graph.links[li];
            y1[li] = nodes[link.target].rect.top() + offsets[link.target] + widths[li] / 2.0;
            offsets[link.target] += widths[li];
        }

        let links = graph
            .links
            .iter()
            .enumerate()
            .map(|(li, link)| LinkGeometry {
                source_x1: nodes[link.source].rect.right(),
                target_x0: nodes[link.target].rect.left(),
                y0: y0[li],
                y1: y1[li],
                width: widths[li].max(1.0),
            })
            .collect();

        Self { nodes, links }
    }

    /// Topmost node under `pos`.
    pub fn node_at(&self, pos: Pos2) -> Option<usize> {
        self.nodes
            .iter()
            .rposition(|n| n.rect.expand(HIT_SLOP).contains(pos))
    }

    /// Topmost link under `pos`.
    pub fn link_at(&self, pos: Pos2) -> Option<usize> {
        self.links.iter().rposition(|l| l.contains(pos))
    }
}

/// Column of each node: longest path from any root.
fn assign_columns(graph: &DisplayGraph) -> Vec<usize> {
    let mut g: DiGraph<usize, ()> = DiGraph::with_capacity(graph.nodes.len(), graph.links.len());
    let ids: Vec<NodeIndex> = (0..graph.nodes.len()).map(|i| g.add_node(i)).collect();
    for link in &graph.links {
        g.add_edge(ids[link.source], ids[link.target], ());
    }

    // Forward-only links cannot form a cycle, so index order is a valid
    // fallback ordering.
    let order: Vec<NodeIndex> = toposort(&g, None).unwrap_or_else(|_| ids.clone());

    let mut columns = vec![0usize; graph.nodes.len()];
    for idx in order {
        let col = columns[idx.index()];
        for next in g.neighbors(idx) {
            let entry = &mut columns[next.index()];
            *entry = (*entry).max(col + 1);
        }
    }
    columns
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{fixtures::GROUPED_SESSIONS, QueryResult};
    use crate::color::ColorScale;
    use crate::flow::transform::{build_display_graph, Highlight};

    fn layout() -> (DisplayGraph, SankeyLayout, Rect) {
        let result = QueryResult::from_json(GROUPED_SESSIONS).unwrap();
        let graph = build_display_graph(Some(&result), &ColorScale::latency().unwrap(), &Highlight::default());
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(600.0, 500.0));
        let layout = SankeyLayout::compute(&graph, bounds);
        (graph, layout, bounds)
    }

    #[test]
    fn columns_follow_longest_path() {
        let (_, layout, _) = layout();
        let cols: Vec<usize> = layout.nodes.iter().map(|n| n.column).collect();
        // 0 -> 1 -> 3, 0 -> 2
        assert_eq!(cols, vec![0, 1, 1, 2]);
    }

    #[test]
    fn nodes_stay_inside_bounds() {
        let (_, layout, bounds) = layout();
        for node in &layout.nodes {
            assert!(node.rect.left() >= bounds.left());
            assert!(node.rect.right() <= bounds.right() + 0.01);
            assert!(node.rect.bottom() <= bounds.bottom() + 0.01, "{:?}", node.rect);
        }
        assert_eq!(layout.nodes[3].rect.right(), bounds.right());
    }

    #[test]
    fn node_height_tracks_value() {
        let (_, layout, _) = layout();
        let root = layout.nodes[0].rect.height();
        let checkout = layout.nodes[1].rect.height();
        assert!((root / checkout - 100.0 / 60.0).abs() < 0.01);
    }

    #[test]
    fn tooltip_anchor_is_ribbon_midpoint() {
        let geom = LinkGeometry {
            source_x1: 100.0,
            target_x0: 300.0,
            y0: 50.0,
            y1: 150.0,
            width: 10.0,
        };
        assert_eq!(geom.midpoint(), Pos2::new(200.0, 100.0));
        assert!(geom.contains(Pos2::new(200.0, 100.0)));
        assert!(!geom.contains(Pos2::new(200.0, 10.0)));
    }

    #[test]
    fn hit_testing_finds_nodes_and_links() {
        let (_, layout, _) = layout();
        let center = layout.nodes[1].rect.center();
        assert_eq!(layout.node_at(center), Some(1));

        let mid = layout.links[2].midpoint();
        assert_eq!(layout.link_at(mid), Some(2));
        assert_eq!(layout.node_at(Pos2::new(-50.0, -50.0)), None);
    }

    #[test]
    fn empty_graph_has_empty_layout() {
        let bounds = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let layout = SankeyLayout::compute(&DisplayGraph::default(), bounds);
        assert!(layout.nodes.is_empty());
        assert_eq!(layout.link_at(Pos2::ZERO), None);
    }
}
