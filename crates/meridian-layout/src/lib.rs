//! Deterministic layered graph-layout algorithm.
//!
//! Assigns each node a rank by longest path from its sources, packs nodes within a rank
//! left-to-right in insertion order, and routes edges as simple polylines between rank bands.
//! This is a parity-oriented simplification of Dagre's rank/order/position pipeline: one
//! ranker (longest-path) rather than network-simplex, and per-rank packing rather than
//! Brandes-Köpf alignment. Deterministic for identical input order, which is what the caller
//! (the hierarchical auto-layout pass in `meridian`) relies on.

pub use meridian_graphlib as graphlib;

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

#[derive(Debug, Clone)]
pub struct GraphLabel {
    pub rankdir: RankDir,
    pub nodesep: f64,
    pub ranksep: f64,
    pub edgesep: f64,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            nodesep: 50.0,
            ranksep: 50.0,
            edgesep: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPos {
    #[default]
    C,
    L,
    R,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub width: f64,
    pub height: f64,
    pub labelpos: LabelPos,
    pub labeloffset: f64,
    pub minlen: usize,
    pub weight: f64,

    pub x: Option<f64>,
    pub y: Option<f64>,
    pub points: Vec<Point>,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            labelpos: LabelPos::C,
            labeloffset: 0.0,
            minlen: 1,
            weight: 1.0,
            x: None,
            y: None,
            points: Vec::new(),
        }
    }
}

pub type LayoutGraph = graphlib::Graph<NodeLabel, EdgeLabel, GraphLabel>;

/// Transforms node/edge geometry between the canonical TB layout space and the requested
/// `rankdir`, so the ranking/packing pass below can always work top-to-bottom.
pub mod coordinate_system {
    use super::{LayoutGraph, RankDir, graphlib};

    /// Swaps every node's width/height for `LR`/`RL` so the rank/pack pass below — which always
    /// separates within-rank siblings by `width` and stacks ranks by `height` — measures along
    /// the axis that will actually become the within-rank axis once `undo` swaps positions back.
    pub fn adjust(g: &mut LayoutGraph) {
        if matches!(g.graph_label().rankdir, RankDir::LR | RankDir::RL) {
            swap_width_height(g);
        }
    }

    /// Reverses `adjust` and maps canonical TB-space positions to the requested `rankdir`,
    /// including every routed edge's polyline and label anchor. `total_height` is the canonical
    /// layout's total rank extent, used to keep `BT`/`RL` coordinates non-negative instead of
    /// mirroring through zero.
    pub fn undo(g: &mut LayoutGraph, edge_keys: &[graphlib::EdgeKey], total_height: f64) {
        let rankdir = g.graph_label().rankdir;
        if matches!(rankdir, RankDir::BT | RankDir::RL) {
            reverse_y(g, edge_keys, total_height);
        }
        if matches!(rankdir, RankDir::LR | RankDir::RL) {
            swap_xy(g, edge_keys);
            swap_width_height(g);
        }
    }

    fn swap_width_height(g: &mut LayoutGraph) {
        for id in g.node_ids() {
            if let Some(n) = g.node_mut(&id) {
                (n.width, n.height) = (n.height, n.width);
            }
        }
    }

    fn reverse_y(g: &mut LayoutGraph, edge_keys: &[graphlib::EdgeKey], total_height: f64) {
        for id in g.node_ids() {
            if let Some(n) = g.node_mut(&id)
                && let Some(y) = n.y
            {
                n.y = Some(total_height - y);
            }
        }
        for e in edge_keys {
            if let Some(lbl) = g.edge_mut(&e.v, &e.w, e.name.as_deref()) {
                for p in &mut lbl.points {
                    p.y = total_height - p.y;
                }
                if let Some(y) = lbl.y {
                    lbl.y = Some(total_height - y);
                }
            }
        }
    }

    fn swap_xy(g: &mut LayoutGraph, edge_keys: &[graphlib::EdgeKey]) {
        for id in g.node_ids() {
            if let Some(n) = g.node_mut(&id)
                && let (Some(x), Some(y)) = (n.x, n.y)
            {
                n.x = Some(y);
                n.y = Some(x);
            }
        }
        for e in edge_keys {
            if let Some(lbl) = g.edge_mut(&e.v, &e.w, e.name.as_deref()) {
                for p in &mut lbl.points {
                    (p.x, p.y) = (p.y, p.x);
                }
                if let (Some(x), Some(y)) = (lbl.x, lbl.y) {
                    lbl.x = Some(y);
                    lbl.y = Some(x);
                }
            }
        }
    }
}

/// Runs the layered layout pipeline on `g` in place: assigns ranks, packs nodes within each
/// rank, and routes edges as polylines, honoring `g.graph_label().rankdir`.
pub fn layout(g: &mut LayoutGraph) {
    let graph = g.graph_label().clone();
    coordinate_system::adjust(g);
    let edge_keys: Vec<graphlib::EdgeKey> = g.edge_keys();

    let mut max_edge_label_width: f64 = 0.0;
    let mut max_edge_label_height: f64 = 0.0;
    for e in &edge_keys {
        if let Some(lbl) = g.edge(&e.v, &e.w, e.name.as_deref()) {
            max_edge_label_width = max_edge_label_width.max(lbl.width);
            max_edge_label_height = max_edge_label_height.max(lbl.height);
        }
    }

    let node_sep = match graph.rankdir {
        RankDir::TB | RankDir::BT => graph.nodesep.max(max_edge_label_width),
        RankDir::LR | RankDir::RL => graph.nodesep.max(max_edge_label_height),
    };
    let rank_sep = match graph.rankdir {
        RankDir::TB | RankDir::BT => graph.ranksep,
        RankDir::LR | RankDir::RL => graph.ranksep.max(max_edge_label_width),
    };

    let node_ids: Vec<String> = g
        .node_ids()
        .into_iter()
        .filter(|id| !g.options().compound || g.children(id).is_empty())
        .collect();

    let rank = assign_ranks(g, &node_ids);
    let rank = if g.options().compound {
        compact_compound_ranks(g, &node_ids, rank)
    } else {
        rank
    };

    let max_rank = rank.values().copied().max().unwrap_or(0);
    let mut ranks: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
    for id in &node_ids {
        ranks[rank.get(id).copied().unwrap_or(0)].push(id.clone());
    }

    let node_size = |g: &LayoutGraph, id: &str| -> (f64, f64) {
        g.node(id).map(|n| (n.width, n.height)).unwrap_or((0.0, 0.0))
    };

    let mut gap_extra: Vec<f64> = vec![0.0; ranks.len().saturating_sub(1)];
    for e in &edge_keys {
        let (Some(&v_rank), Some(&w_rank)) = (rank.get(&e.v), rank.get(&e.w)) else {
            continue;
        };
        if w_rank != v_rank + 1 {
            continue;
        }
        if let Some(lbl) = g.edge(&e.v, &e.w, e.name.as_deref())
            && lbl.height > 0.0
            && let Some(extra) = gap_extra.get_mut(v_rank)
        {
            *extra = extra.max(lbl.height);
        }
    }

    let mut rank_heights: Vec<f64> = Vec::with_capacity(ranks.len());
    let mut rank_widths: Vec<f64> = Vec::with_capacity(ranks.len());
    for ids in &ranks {
        let mut h: f64 = 0.0;
        let mut w: f64 = 0.0;
        for (i, id) in ids.iter().enumerate() {
            let (nw, nh) = node_size(g, id);
            h = h.max(nh);
            w += nw;
            if i + 1 < ids.len() {
                w += node_sep;
            }
        }
        rank_heights.push(h);
        rank_widths.push(w);
    }
    let max_rank_width = rank_widths.iter().copied().fold(0.0_f64, f64::max);

    let mut y_cursor: f64 = 0.0;
    for (rank_idx, ids) in ranks.iter().enumerate() {
        let rank_h = rank_heights[rank_idx];
        let y = y_cursor + rank_h / 2.0;

        let rank_w = rank_widths[rank_idx];
        let mut x_cursor = (max_rank_width - rank_w) / 2.0;
        for id in ids {
            let (nw, _) = node_size(g, id);
            let x = x_cursor + nw / 2.0;
            if let Some(n) = g.node_mut(id) {
                n.x = Some(x);
                n.y = Some(y);
            }
            x_cursor += nw + node_sep;
        }

        y_cursor += rank_h;
        if rank_idx + 1 < ranks.len() {
            y_cursor += rank_sep + gap_extra.get(rank_idx).copied().unwrap_or(0.0);
        }
    }

    let total_height = y_cursor;
    route_edges(g, &edge_keys, &graph);
    coordinate_system::undo(g, &edge_keys, total_height);
}

/// Longest-path rank assignment: every node's rank is the longest edge-weighted
/// (by `minlen`) path from a source. Falls back to plain insertion order if the graph has a
/// cycle the caller didn't break first — still deterministic, just not minlen-tight.
fn assign_ranks(g: &LayoutGraph, node_ids: &[String]) -> HashMap<String, usize> {
    let mut indegree: HashMap<String, usize> = node_ids.iter().map(|id| (id.clone(), 0)).collect();
    for e in g.edge_keys() {
        if let Some(v) = indegree.get_mut(&e.w) {
            *v += 1;
        }
    }

    let mut queue: VecDeque<String> = node_ids
        .iter()
        .filter(|id| indegree.get(*id).copied().unwrap_or(0) == 0)
        .cloned()
        .collect();

    let mut topo: Vec<String> = Vec::new();
    while let Some(n) = queue.pop_front() {
        topo.push(n.clone());
        for e in g.out_edges(&n, None) {
            if let Some(v) = indegree.get_mut(&e.w) {
                *v = v.saturating_sub(1);
                if *v == 0 {
                    queue.push_back(e.w.clone());
                }
            }
        }
    }
    if topo.len() != node_ids.len() {
        topo = node_ids.to_vec();
    }

    let mut rank: HashMap<String, usize> = node_ids.iter().map(|id| (id.clone(), 0)).collect();
    for n in &topo {
        let r = rank.get(n).copied().unwrap_or(0);
        for e in g.out_edges(n, None) {
            let minlen = g.edge(&e.v, &e.w, e.name.as_deref()).map(|l| l.minlen).unwrap_or(1).max(1);
            let next = r + minlen;
            let entry = rank.entry(e.w.clone()).or_insert(0);
            if next > *entry {
                *entry = next;
            }
        }
    }
    rank
}

/// Aligns sibling children of a cluster to a common rank when every sibling's
/// predecessor/successor constraints allow it, so a cluster's interior doesn't splay across
/// more ranks than its content needs.
fn compact_compound_ranks(
    g: &LayoutGraph,
    node_ids: &[String],
    mut rank: HashMap<String, usize>,
) -> HashMap<String, usize> {
    let parents: Vec<String> = g
        .node_ids()
        .into_iter()
        .filter(|id| !g.children(id).is_empty())
        .collect();

    for parent in parents {
        let targets: Vec<String> = g
            .children(&parent)
            .into_iter()
            .map(str::to_string)
            .filter(|c| node_ids.contains(c))
            .collect();
        if targets.len() < 2 {
            continue;
        }

        let mut min_needed: usize = 0;
        let mut max_allowed: usize = usize::MAX / 4;
        for child in &targets {
            let mut min_rank: usize = 0;
            for ek in g.in_edges(child, None) {
                let Some(&pred_rank) = rank.get(&ek.v) else { continue };
                let minlen = g.edge(&ek.v, &ek.w, ek.name.as_deref()).map(|e| e.minlen).unwrap_or(1).max(1);
                min_rank = min_rank.max(pred_rank + minlen);
            }
            let mut max_rank: usize = usize::MAX / 4;
            for ek in g.out_edges(child, None) {
                let Some(&succ_rank) = rank.get(&ek.w) else { continue };
                let minlen = g.edge(&ek.v, &ek.w, ek.name.as_deref()).map(|e| e.minlen).unwrap_or(1).max(1);
                max_rank = max_rank.min(succ_rank.saturating_sub(minlen));
            }
            min_needed = min_needed.max(min_rank);
            max_allowed = max_allowed.min(max_rank);
        }

        if min_needed <= max_allowed {
            for child in &targets {
                rank.insert(child.clone(), min_needed);
            }
        }
    }
    rank
}

fn route_edges(g: &mut LayoutGraph, edge_keys: &[graphlib::EdgeKey], graph: &GraphLabel) {
    for e in edge_keys {
        let Some((sx, sy, sw, sh)) = g.node(&e.v).map(|n| (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0), n.width, n.height)) else {
            continue;
        };
        let Some((tx, ty, _tw, th)) = g.node(&e.w).map(|n| (n.x.unwrap_or(0.0), n.y.unwrap_or(0.0), n.width, n.height)) else {
            continue;
        };
        let Some(lbl) = g.edge_mut(&e.v, &e.w, e.name.as_deref()) else {
            continue;
        };
        lbl.points.clear();
        lbl.x = None;
        lbl.y = None;

        if e.v == e.w {
            let x0 = sx + sw / 2.0 + graph.edgesep.max(1.0);
            let x1 = x0 + graph.edgesep.max(1.0);
            let y_top = sy - sh / 2.0;
            let y_bot = sy + sh / 2.0;
            lbl.points.extend([
                Point { x: x0, y: sy },
                Point { x: x0, y: y_top },
                Point { x: x1, y: y_top },
                Point { x: x1, y: sy },
                Point { x: x1, y: y_bot },
                Point { x: x0, y: y_bot },
                Point { x: x0, y: sy },
            ]);
            continue;
        }

        let start = Point { x: sx, y: sy + sh / 2.0 };
        let end = Point { x: tx, y: ty - th / 2.0 };
        let minlen = lbl.minlen.max(1);
        let count = 2 * minlen + 1;
        for i in 0..count {
            let t = i as f64 / (count - 1) as f64;
            lbl.points.push(Point {
                x: start.x + (end.x - start.x) * t,
                y: start.y + (end.y - start.y) * t,
            });
        }

        if lbl.width > 0.0 || lbl.height > 0.0 {
            let mid = lbl.points[count / 2];
            let mut ex = mid.x;
            match lbl.labelpos {
                LabelPos::C => {}
                LabelPos::L => ex -= lbl.labeloffset + lbl.width / 2.0,
                LabelPos::R => ex += lbl.labeloffset + lbl.width / 2.0,
            }
            lbl.x = Some(ex);
            lbl.y = Some(mid.y);
        }
    }
}

