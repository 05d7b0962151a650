//! Render adapter (§4.5): a pure `(Graph, VisualState) -> RenderGraph` translation. No
//! semantic decisions happen here — only geometry lookup, ID rewriting, and the
//! presentation-only palette assignment.

use meridian_core::graph::{BoundaryType, C4Type, Graph};

use crate::visual::{Point, Size, VisualState};

const SUBGRAPH_PALETTE: &[&str] =
    &["#e3f2fd", "#f3e5f5", "#e8f5e9", "#fff3e0", "#fce4ec", "#ede7f6"];
const EDGE_PALETTE: &[&str] = &["#1976d2", "#388e3c", "#f57c00", "#7b1fa2", "#c2185b"];
const DEFAULT_NODE_COLOR: &str = "#ffffff";

fn c4_color(c4_type: C4Type) -> &'static str {
    use C4Type::*;
    match c4_type {
        Person | PersonExt => "#08427b",
        System | SystemDb | SystemQueue => "#1168bd",
        SystemExt => "#999999",
        Container | ContainerDb | ContainerQueue => "#438dd5",
        ContainerExt => "#b3b3b3",
        Component | ComponentDb | ComponentQueue => "#85bbf0",
        ComponentExt => "#cccccc",
    }
}

fn boundary_color(boundary: BoundaryType) -> &'static str {
    match boundary {
        BoundaryType::Enterprise => "#f5f5f5",
        BoundaryType::System => "#eeeeee",
        BoundaryType::Container => "#e0e0e0",
        BoundaryType::Boundary => "#dddddd",
    }
}

fn container_id(id: &str) -> String {
    format!("subgraph-{id}")
}

/// Rewrites `id` to its container record ID when `id` names a subgraph; a bare node ID passes
/// through unchanged (§4.5: endpoints "rewritten from id to subgraph-id whenever the endpoint
/// corresponds to a subgraph ID").
fn rewrite_endpoint(graph: &Graph, id: &str) -> String {
    if graph.subgraphs.contains_key(id) {
        container_id(id)
    } else {
        id.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderContainer {
    pub id: String,
    pub label: Option<String>,
    pub parent_node: Option<String>,
    pub position: Point,
    pub size: Size,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderLeaf {
    pub id: String,
    pub label: String,
    pub parent_node: Option<String>,
    pub position: Point,
    pub size: Size,
    pub draggable: bool,
    pub handles: [String; 4],
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub bend_points: Vec<Point>,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderGraph {
    pub containers: Vec<RenderContainer>,
    pub nodes: Vec<RenderLeaf>,
    pub edges: Vec<RenderEdge>,
}

fn handles(id: &str) -> [String; 4] {
    ["top", "right", "bottom", "left"].map(|side| format!("{id}-{side}"))
}

pub fn to_renderer(graph: &Graph, state: &VisualState) -> RenderGraph {
    let mut containers = Vec::with_capacity(graph.subgraphs.len());
    for (index, sg) in graph.subgraphs.values().enumerate() {
        let placement = state.subgraphs.get(&sg.id);
        let color = sg
            .boundary_type
            .map(boundary_color)
            .unwrap_or_else(|| SUBGRAPH_PALETTE[index % SUBGRAPH_PALETTE.len()])
            .to_string();
        containers.push(RenderContainer {
            id: container_id(&sg.id),
            label: sg.label.clone(),
            parent_node: sg.parent.as_deref().map(container_id),
            position: placement.map(|p| p.position).unwrap_or(Point { x: 0.0, y: 0.0 }),
            size: placement.map(|p| p.size).unwrap_or(Size { width: 0.0, height: 0.0 }),
            color,
        });
    }

    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in graph.nodes.values() {
        let placement = state.nodes.get(&node.id);
        let locked = placement.and_then(|p| p.locked).unwrap_or(false);
        let color = node
            .c4
            .as_ref()
            .map(|c4| c4_color(c4.c4_type).to_string())
            .unwrap_or_else(|| DEFAULT_NODE_COLOR.to_string());
        nodes.push(RenderLeaf {
            id: node.id.clone(),
            label: node.label.clone(),
            parent_node: node.parent.as_deref().map(container_id),
            position: placement.map(|p| p.position).unwrap_or(Point { x: 0.0, y: 0.0 }),
            size: placement
                .and_then(|p| p.size)
                .unwrap_or(Size { width: 0.0, height: 0.0 }),
            draggable: !locked,
            handles: handles(&node.id),
            color,
        });
    }

    let mut edges = Vec::with_capacity(graph.edges.len());
    for (index, edge) in graph.edges.values().enumerate() {
        let bend_points = state
            .edges
            .get(&edge.id)
            .and_then(|p| p.bend_points.clone())
            .unwrap_or_default();
        edges.push(RenderEdge {
            id: edge.id.clone(),
            source: rewrite_endpoint(graph, &edge.from),
            target: rewrite_endpoint(graph, &edge.to),
            label: edge.label.clone(),
            bend_points,
            color: EDGE_PALETTE[index % EDGE_PALETTE.len()].to_string(),
        });
    }

    RenderGraph { containers, nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutSpacing, auto_layout};
    use meridian_core::parse;

    #[test]
    fn edge_endpoints_rewrite_to_subgraph_ids() {
        let graph = parse("graph TD\nsubgraph S\nA\nend\nS --> B").unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let rendered = to_renderer(&graph, &state);
        let edge = &rendered.edges[0];
        assert_eq!(edge.source, "subgraph-S");
        assert_eq!(edge.target, "B");
    }

    #[test]
    fn locked_node_is_not_draggable() {
        let graph = parse("graph TD\nA --> B").unwrap();
        let mut state = auto_layout(&graph, &LayoutSpacing::default(), None);
        state.nodes.get_mut("A").unwrap().locked = Some(true);
        let rendered = to_renderer(&graph, &state);
        let a = rendered.nodes.iter().find(|n| n.id == "A").unwrap();
        assert!(!a.draggable);
    }

    #[test]
    fn c4_nodes_get_type_specific_colors() {
        let src = "C4Context\nPerson(p, \"P\")\nSystemDb(db, \"DB\")";
        let graph = parse(src).unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let rendered = to_renderer(&graph, &state);
        let person = rendered.nodes.iter().find(|n| n.id == "p").unwrap();
        let db = rendered.nodes.iter().find(|n| n.id == "db").unwrap();
        assert_ne!(person.color, db.color);
    }

    #[test]
    fn container_nesting_sets_parent_node() {
        let src = "graph TB\nsubgraph outer\nsubgraph inner\nX\nend\nend";
        let graph = parse(src).unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let rendered = to_renderer(&graph, &state);
        let inner = rendered.containers.iter().find(|c| c.id == "subgraph-inner").unwrap();
        assert_eq!(inner.parent_node.as_deref(), Some("subgraph-outer"));
    }
}
