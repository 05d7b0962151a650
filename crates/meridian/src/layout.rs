//! Hierarchical auto-layout (§4.4): per-subgraph interior layout, parent enlargement, a
//! top-level meta-graph layout, nested placement of child subgraphs, and final assembly into
//! a [`VisualState`]. Each phase reuses [`meridian_layout::layout`] as its layered-layout core.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use meridian_core::geom::Box2;
use meridian_core::graph::{Graph, Node, NodeId, NodeShape, RankDir, SubgraphId};
use meridian_layout::{self as dagre, GraphLabel, LayoutGraph, NodeLabel, RankDir as LRankDir};
use meridian_layout::graphlib::GraphOptions;

use crate::visual::{EdgePlacement, NodePlacement, Point, Size, SubgraphPlacement, VisualState};

/// §6 `LAYOUT_SPACING`. Defaults are a minimal set that produces readable output, not a
/// reproduction of any particular renderer's house style.
#[derive(Debug, Clone, Copy)]
pub struct LayoutSpacing {
    pub subgraph_header_height: f64,
    pub subgraph_padding: f64,
    pub subgraph_content_top_margin: f64,
    pub node_separation_horizontal: f64,
    pub node_separation_vertical: f64,
    pub container_separation_horizontal: f64,
    pub container_separation_vertical: f64,
    pub nested_subgraph_separation_horizontal: f64,
    pub nested_subgraph_separation_vertical: f64,
    pub meta_graph_margin: f64,
    pub nested_content_margin: f64,
    pub mixed_content_vertical_spacing: f64,
    pub mixed_content_horizontal_spacing: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            subgraph_header_height: 30.0,
            subgraph_padding: 20.0,
            subgraph_content_top_margin: 10.0,
            node_separation_horizontal: 50.0,
            node_separation_vertical: 50.0,
            container_separation_horizontal: 80.0,
            container_separation_vertical: 80.0,
            nested_subgraph_separation_horizontal: 40.0,
            nested_subgraph_separation_vertical: 40.0,
            meta_graph_margin: 40.0,
            nested_content_margin: 20.0,
            mixed_content_vertical_spacing: 20.0,
            mixed_content_horizontal_spacing: 20.0,
        }
    }
}

fn to_layout_rankdir(r: RankDir) -> LRankDir {
    match r {
        RankDir::TB => LRankDir::TB,
        RankDir::BT => LRankDir::BT,
        RankDir::LR => LRankDir::LR,
        RankDir::RL => LRankDir::RL,
    }
}

fn is_vertical(r: RankDir) -> bool {
    matches!(r, RankDir::TB | RankDir::BT)
}

/// Label-driven size heuristic (§4.4 step 4).
fn node_label_size(node: &Node) -> (f64, f64) {
    let lines: Vec<&str> = node.label.split('\n').collect();
    let max_line = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let line_count = lines.len().max(1);
    let mut w = (max_line as f64 * 8.0 + 60.0).max(80.0);
    let mut h = (line_count as f64 * 18.0 + 40.0).max(40.0);
    match node.kind {
        NodeShape::Diamond => {
            w = (w * 1.05).max(90.0);
            h = (h * 1.05).max(90.0);
        }
        NodeShape::Circle => {
            let side = w.max(h) + 10.0;
            w = side;
            h = side;
        }
        NodeShape::Rect | NodeShape::Round | NodeShape::Stadium => {}
    }
    (w, h)
}

fn new_layout_graph(rankdir: LRankDir, nodesep: f64, ranksep: f64) -> LayoutGraph {
    let mut g = LayoutGraph::new(GraphOptions {
        directed: true,
        compound: false,
        multigraph: false,
    });
    *g.graph_label_mut() = GraphLabel {
        rankdir,
        nodesep,
        ranksep,
        edgesep: 10.0,
    };
    g
}

/// The chain of ancestors from `id` (inclusive) up to the outermost subgraph. `id` may name a
/// node or a subgraph.
fn ancestor_chain(graph: &Graph, id: &str) -> Vec<String> {
    let mut chain = vec![id.to_string()];
    let mut cur_parent = graph
        .nodes
        .get(id)
        .map(|n| n.parent.clone())
        .unwrap_or_else(|| graph.subgraphs.get(id).and_then(|s| s.parent.clone()));
    while let Some(p) = cur_parent {
        cur_parent = graph.subgraphs.get(&p).and_then(|s| s.parent.clone());
        chain.push(p);
    }
    chain
}

/// Topmost ancestor of `id` — itself if it has no parent.
fn root_container(graph: &Graph, id: &str) -> String {
    ancestor_chain(graph, id).pop().unwrap_or_else(|| id.to_string())
}

/// The element of `ancestor`'s direct children that contains (or is) `id`, if any.
fn child_of(graph: &Graph, id: &str, ancestor: &str) -> Option<String> {
    let chain = ancestor_chain(graph, id);
    let pos = chain.iter().position(|c| c == ancestor)?;
    (pos > 0).then(|| chain[pos - 1].clone())
}

/// Bounding box, in layout-engine center coordinates, of every id in `ids` that the layout
/// graph actually placed. Returns a degenerate zero box if none were.
fn child_bbox(lg: &LayoutGraph, ids: &[String], sizes: &IndexMap<NodeId, (f64, f64)>) -> Box2 {
    let mut bbox: Option<Box2> = None;
    for id in ids {
        let Some(n) = lg.node(id) else { continue };
        let Some(&(w, h)) = sizes.get(id) else { continue };
        let (x, y) = (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0));
        let b = Box2::from_center(x, y, w, h);
        match &mut bbox {
            Some(acc) => acc.union(b),
            None => bbox = Some(b),
        }
    }
    bbox.unwrap_or_else(|| Box2::from_min_max(0.0, 0.0, 0.0, 0.0))
}

#[derive(Debug, Clone, Default)]
struct Interior {
    width: f64,
    height: f64,
    positions: IndexMap<NodeId, (f64, f64)>,
    sizes: IndexMap<NodeId, (f64, f64)>,
}

/// Phase 1: lays out each subgraph's direct child nodes in isolation and records its content
/// bounding box translated into a local, subgraph-relative coordinate system.
fn phase1_interiors(graph: &Graph, spacing: &LayoutSpacing) -> IndexMap<SubgraphId, Interior> {
    let mut out = IndexMap::new();
    for sg in graph.subgraphs.values() {
        let direction = sg.direction.unwrap_or(graph.meta.direction);
        let mut lg = new_layout_graph(
            to_layout_rankdir(direction),
            spacing.node_separation_horizontal,
            spacing.node_separation_vertical,
        );

        let mut sizes = IndexMap::new();
        for nid in &sg.children {
            let Some(node) = graph.nodes.get(nid) else { continue };
            let size = node_label_size(node);
            sizes.insert(nid.clone(), size);
            lg.set_node(
                nid.clone(),
                NodeLabel {
                    width: size.0,
                    height: size.1,
                    x: None,
                    y: None,
                },
            );
        }

        let child_set: HashSet<&str> = sg.children.iter().map(String::as_str).collect();
        for edge in graph.edges.values() {
            if child_set.contains(edge.from.as_str()) && child_set.contains(edge.to.as_str()) {
                lg.set_edge(&edge.from, &edge.to);
            }
        }

        dagre::layout(&mut lg);

        let bbox = child_bbox(&lg, &sg.children, &sizes);
        let (min_x, min_y) = (bbox.min_x(), bbox.min_y());

        let padding = spacing.subgraph_padding;
        let header = spacing.subgraph_header_height;
        let top_margin = spacing.subgraph_content_top_margin;

        let mut positions = IndexMap::new();
        for nid in &sg.children {
            let Some(n) = lg.node(nid) else { continue };
            let (w, h) = sizes[nid];
            let (x, y) = (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0));
            let left = x - w / 2.0 - min_x + padding;
            let top = y - h / 2.0 - min_y + padding + header + top_margin;
            positions.insert(nid.clone(), (left, top));
        }

        let width = bbox.width() + 2.0 * padding + 4.0;
        let height = bbox.height() + 2.0 * padding + header + top_margin + 4.0;
        out.insert(sg.id.clone(), Interior { width, height, positions, sizes });
    }
    out
}

fn subgraph_depth(graph: &Graph, id: &str) -> usize {
    let mut depth = 0;
    let mut cur = id;
    while let Some(p) = graph.subgraphs.get(cur).and_then(|s| s.parent.as_deref()) {
        depth += 1;
        cur = p;
    }
    depth
}

/// Phase 1b: walks subgraphs deepest-first so each parent's enlargement can see its
/// already-finalized child-subgraph sizes, then inflates to fit both direct content and
/// child-subgraph bounding boxes, floored at 300x200.
fn phase1b_enlarge(
    graph: &Graph,
    interiors: &IndexMap<SubgraphId, Interior>,
    spacing: &LayoutSpacing,
) -> IndexMap<SubgraphId, (f64, f64)> {
    let mut sizes: IndexMap<SubgraphId, (f64, f64)> = interiors
        .iter()
        .map(|(id, i)| (id.clone(), (i.width, i.height)))
        .collect();

    let mut order: Vec<String> = graph.subgraphs.keys().cloned().collect();
    order.sort_by_key(|id| std::cmp::Reverse(subgraph_depth(graph, id)));

    for id in order {
        let children: Vec<String> = graph
            .subgraphs
            .values()
            .filter(|s| s.parent.as_deref() == Some(id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        let (own_w, own_h) = sizes[&id];

        if children.is_empty() {
            // No child subgraphs to fit, but every subgraph still ends Phase 1b floored at
            // 300x200 (§4.4 Phase 1b), not just ones with nested containers.
            sizes.insert(id, (own_w.max(300.0), own_h.max(200.0)));
            continue;
        }
        let child_sizes: Vec<(f64, f64)> = children.iter().map(|c| sizes[c]).collect();
        let direction = graph.subgraphs[&id].direction.unwrap_or(graph.meta.direction);

        let (needed_w, needed_h) = if is_vertical(direction) {
            let gap = spacing.nested_subgraph_separation_vertical;
            let max_child_w = child_sizes.iter().map(|(w, _)| *w).fold(0.0, f64::max);
            let stacked_h: f64 = child_sizes.iter().map(|(_, h)| *h).sum::<f64>()
                + gap * (child_sizes.len().saturating_sub(1)) as f64;
            (
                max_child_w + 2.0 * spacing.nested_content_margin,
                own_h + stacked_h + spacing.mixed_content_vertical_spacing,
            )
        } else {
            let gap = spacing.nested_subgraph_separation_horizontal;
            let max_child_h = child_sizes.iter().map(|(_, h)| *h).fold(0.0, f64::max);
            let stacked_w: f64 = child_sizes.iter().map(|(w, _)| *w).sum::<f64>()
                + gap * (child_sizes.len().saturating_sub(1)) as f64;
            (
                own_w + stacked_w + spacing.mixed_content_horizontal_spacing,
                max_child_h + 2.0 * spacing.nested_content_margin,
            )
        };

        sizes.insert(
            id,
            (own_w.max(needed_w).max(300.0), own_h.max(needed_h).max(200.0)),
        );
    }
    sizes
}

/// Phase 2: lays out every top-level subgraph and standalone node as one meta-graph, edges
/// aggregated by mapping each endpoint to its topmost container and dropping same-container
/// pairs. Returns each top-level vertex's absolute top-left position and size.
fn phase2_meta_layout(
    graph: &Graph,
    sg_sizes: &IndexMap<SubgraphId, (f64, f64)>,
    spacing: &LayoutSpacing,
) -> IndexMap<String, (f64, f64, f64, f64)> {
    let mut lg = new_layout_graph(
        to_layout_rankdir(graph.meta.direction),
        spacing.container_separation_horizontal,
        spacing.container_separation_vertical,
    );

    let mut sizes: IndexMap<String, (f64, f64)> = IndexMap::new();
    for sg in graph.subgraphs.values().filter(|s| s.parent.is_none()) {
        let size = sg_sizes[&sg.id];
        sizes.insert(sg.id.clone(), size);
        lg.set_node(sg.id.clone(), NodeLabel { width: size.0, height: size.1, x: None, y: None });
    }
    for node in graph.nodes.values().filter(|n| n.parent.is_none()) {
        let size = node_label_size(node);
        sizes.insert(node.id.clone(), size);
        lg.set_node(node.id.clone(), NodeLabel { width: size.0, height: size.1, x: None, y: None });
    }

    let mut weights: IndexMap<(String, String), f64> = IndexMap::new();
    for edge in graph.edges.values() {
        let src = root_container(graph, &edge.from);
        let dst = root_container(graph, &edge.to);
        if src == dst {
            continue;
        }
        *weights.entry((src, dst)).or_insert(0.0) += 1.0;
    }
    for ((src, dst), weight) in &weights {
        lg.set_edge_with_label(
            src,
            dst,
            meridian_layout::EdgeLabel { weight: *weight, ..Default::default() },
        );
    }

    dagre::layout(&mut lg);

    sizes
        .into_iter()
        .map(|(id, (w, h))| {
            let n = lg.node(&id);
            let (cx, cy) = n.map(|n| (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0))).unwrap_or((0.0, 0.0));
            (id, (cx - w / 2.0, cy - h / 2.0, w, h))
        })
        .collect()
}

/// Phase 3: places each positioned subgraph's direct child subgraphs inside it, breadth-first
/// down the subgraph tree, bounded to 100 rounds to guarantee termination on malformed input.
fn phase3_nest(
    graph: &Graph,
    interiors: &IndexMap<SubgraphId, Interior>,
    sg_sizes: &IndexMap<SubgraphId, (f64, f64)>,
    top_level: &IndexMap<String, (f64, f64, f64, f64)>,
    spacing: &LayoutSpacing,
) -> IndexMap<SubgraphId, (f64, f64)> {
    let mut absolute: IndexMap<SubgraphId, (f64, f64)> = IndexMap::new();
    let mut queue: VecDeque<SubgraphId> = VecDeque::new();
    for sg in graph.subgraphs.values().filter(|s| s.parent.is_none()) {
        if let Some((x, y, _, _)) = top_level.get(&sg.id) {
            absolute.insert(sg.id.clone(), (*x, *y));
        }
        queue.push_back(sg.id.clone());
    }

    let mut rounds = 0;
    while let Some(parent_id) = queue.pop_front() {
        rounds += 1;
        if rounds > 100 {
            break;
        }
        let children: Vec<String> = graph
            .subgraphs
            .values()
            .filter(|s| s.parent.as_deref() == Some(parent_id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        if children.is_empty() {
            continue;
        }
        let Some(&(parent_x, parent_y)) = absolute.get(&parent_id) else { continue };
        let (parent_w, parent_h) = sg_sizes[&parent_id];
        let direction = graph.subgraphs[&parent_id].direction.unwrap_or(graph.meta.direction);

        let mut lg = new_layout_graph(
            to_layout_rankdir(direction),
            spacing.nested_subgraph_separation_horizontal,
            spacing.nested_subgraph_separation_vertical,
        );
        for c in &children {
            let (w, h) = sg_sizes[c];
            lg.set_node(c.clone(), NodeLabel { width: w, height: h, x: None, y: None });
        }

        let mut weights: IndexMap<(String, String), f64> = IndexMap::new();
        for edge in graph.edges.values() {
            let (Some(src), Some(dst)) =
                (child_of(graph, &edge.from, &parent_id), child_of(graph, &edge.to, &parent_id))
            else {
                continue;
            };
            if src == dst {
                continue;
            }
            *weights.entry((src, dst)).or_insert(0.0) += 1.0;
        }
        if weights.is_empty() && children.len() > 1 {
            for pair in children.windows(2) {
                weights.insert((pair[0].clone(), pair[1].clone()), 0.0);
            }
        }
        for ((src, dst), weight) in &weights {
            lg.set_edge_with_label(
                src,
                dst,
                meridian_layout::EdgeLabel { weight: *weight, ..Default::default() },
            );
        }

        dagre::layout(&mut lg);

        let child_sizes: IndexMap<NodeId, (f64, f64)> =
            children.iter().map(|c| (c.clone(), sg_sizes[c])).collect();
        let bbox = child_bbox(&lg, &children, &child_sizes);
        let (min_x, min_y) = (bbox.min_x(), bbox.min_y());
        let bbox_w = bbox.width();
        let bbox_h = bbox.height();

        let interior = interiors.get(&parent_id);
        let content_bottom = interior
            .map(|i| i.positions.values().zip(i.sizes.values()).map(|((_, top), (_, h))| top + h).fold(0.0, f64::max))
            .unwrap_or(0.0);
        let content_right = interior
            .map(|i| i.positions.values().zip(i.sizes.values()).map(|((left, _), (w, _))| left + w).fold(0.0, f64::max))
            .unwrap_or(0.0);

        let (origin_x, origin_y) = if is_vertical(direction) {
            let y = (spacing.subgraph_padding + spacing.subgraph_header_height)
                .max(content_bottom + spacing.mixed_content_vertical_spacing);
            let x = (parent_w - bbox_w) / 2.0;
            (x, y)
        } else {
            let x = spacing.subgraph_padding.max(content_right + spacing.mixed_content_horizontal_spacing);
            let y = (parent_h - bbox_h) / 2.0;
            (x, y)
        };

        for c in &children {
            let Some(n) = lg.node(c) else { continue };
            let (w, h) = sg_sizes[c];
            let (x, y) = (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0));
            let local_left = x - w / 2.0 - min_x + origin_x;
            let local_top = y - h / 2.0 - min_y + origin_y;
            absolute.insert(c.clone(), (parent_x + local_left, parent_y + local_top));
            queue.push_back(c.clone());
        }
    }

    absolute
}

/// Runs all four phases (§4.4) and assembles the resulting [`VisualState`]. Infallible: an
/// empty graph yields an empty state (§6).
pub fn auto_layout(graph: &Graph, spacing: &LayoutSpacing, prior: Option<&VisualState>) -> VisualState {
    let interiors = phase1_interiors(graph, spacing);
    let sg_sizes = phase1b_enlarge(graph, &interiors, spacing);
    let top_level = phase2_meta_layout(graph, &sg_sizes, spacing);
    let absolute_subgraphs = phase3_nest(graph, &interiors, &sg_sizes, &top_level, spacing);

    let mut nodes = IndexMap::new();
    for node in graph.nodes.values() {
        let (position, size) = match &node.parent {
            Some(parent) => {
                let interior = &interiors[parent];
                let (x, y) = interior.positions.get(&node.id).copied().unwrap_or((0.0, 0.0));
                let (w, h) = interior.sizes.get(&node.id).copied().unwrap_or((0.0, 0.0));
                ((x, y), (w, h))
            }
            None => {
                let (x, y, w, h) = top_level.get(&node.id).copied().unwrap_or((0.0, 0.0, 0.0, 0.0));
                ((x, y), (w, h))
            }
        };
        nodes.insert(
            node.id.clone(),
            NodePlacement {
                position: Point { x: position.0, y: position.1 },
                size: Some(Size { width: size.0, height: size.1 }),
                locked: None,
            },
        );
    }

    let mut subgraphs = IndexMap::new();
    for sg in graph.subgraphs.values() {
        let (w, h) = sg_sizes[&sg.id];
        let (x, y) = match &sg.parent {
            Some(parent) => {
                let (ax, ay) = absolute_subgraphs.get(&sg.id).copied().unwrap_or((0.0, 0.0));
                let (px, py) = absolute_subgraphs.get(parent).copied().unwrap_or((0.0, 0.0));
                (ax - px, ay - py)
            }
            None => absolute_subgraphs.get(&sg.id).copied().unwrap_or((0.0, 0.0)),
        };
        subgraphs.insert(
            sg.id.clone(),
            SubgraphPlacement { position: Point { x, y }, size: Size { width: w, height: h }, locked: None },
        );
    }

    if let Some(prior) = prior {
        for (id, placement) in &prior.nodes {
            if placement.locked == Some(true)
                && let Some(entry) = nodes.get_mut(id)
            {
                *entry = placement.clone();
            }
        }
        for (id, placement) in &prior.subgraphs {
            if placement.locked == Some(true)
                && let Some(entry) = subgraphs.get_mut(id)
            {
                *entry = placement.clone();
            }
        }
    }

    let edges: IndexMap<_, _> = prior
        .map(|p| p.edges.clone())
        .unwrap_or_default()
        .into_iter()
        .filter(|(id, _)| graph.edges.contains_key(id))
        .collect::<IndexMap<_, EdgePlacement>>();
    let edges = if edges.is_empty() {
        graph.edges.keys().map(|id| (id.clone(), EdgePlacement::default())).collect()
    } else {
        edges
    };

    VisualState { nodes, edges, subgraphs, viewport: prior.and_then(|p| p.viewport.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::parse;

    #[test]
    fn empty_graph_yields_empty_state() {
        let graph = parse("").unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        assert!(state.nodes.is_empty());
        assert!(state.subgraphs.is_empty());
    }

    #[test]
    fn standalone_nodes_get_distinct_positions() {
        let graph = parse("graph TD\nA --> B").unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        assert_ne!(state.nodes["A"].position, state.nodes["B"].position);
    }

    #[test]
    fn subgraph_is_enlarged_to_fit_its_nodes() {
        let graph = parse("graph TD\nsubgraph S\nA --> B --> C\nend").unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let sg = &state.subgraphs["S"];
        assert!(sg.size.width > 0.0);
        assert!(sg.size.height > 0.0);
        for id in ["A", "B", "C"] {
            let pos = state.nodes[id].position;
            assert!(pos.x >= 0.0 && pos.y >= 0.0);
        }
    }

    #[test]
    fn nested_subgraph_gets_an_enlarged_parent() {
        let src = "graph TB\nsubgraph outer\nsubgraph inner\nX --> Y\nend\nend";
        let graph = parse(src).unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let outer = &state.subgraphs["outer"];
        assert!(outer.size.width >= 300.0);
        assert!(outer.size.height >= 200.0);
    }

    #[test]
    fn locked_node_is_preserved_verbatim() {
        let graph = parse("graph TD\nA --> B").unwrap();
        let mut prior = VisualState::default();
        prior.nodes.insert(
            "A".to_string(),
            NodePlacement { position: Point { x: 999.0, y: 999.0 }, size: None, locked: Some(true) },
        );
        let state = auto_layout(&graph, &LayoutSpacing::default(), Some(&prior));
        assert_eq!(state.nodes["A"].position, Point { x: 999.0, y: 999.0 });
    }
}
