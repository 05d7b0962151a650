//! Facade-level coverage of the testable properties and boundary cases (spec §8): these
//! exercise `parse` + `auto_layout` + `to_renderer` together, where the per-module unit tests
//! in `meridian-core` and `meridian-layout` exercise one phase in isolation.

use meridian::visual::Point;
use meridian::{LayoutSpacing, VisualState, auto_layout, convert, to_renderer};
use meridian_core::parse;

fn sample_sources() -> Vec<&'static str> {
    vec![
        "graph TD\nA[Start] --> B[Middle] --> C[End]",
        "graph TD\nA{Choice}\nA -->|yes| B[Ok]\nA -->|no| C[Fail]",
        "graph TB\n subgraph outer\n  subgraph inner\n   X --> Y\n  end\n  Z\n end",
        "graph LR\nA <-> B",
        "C4Context\ntitle System Context\nPerson(u,\"User\")\nSystem(s,\"Banking\")\nRel(u, s, \"Uses\", \"HTTPS\")",
        "graph TD\nA\nB\nC",
    ]
}

/// P1: every parsed graph satisfies I1-I5 (checked inside `parse`; here we confirm across the
/// whole seed set that parsing succeeds and every edge/parent reference actually resolves).
#[test]
fn p1_invariants_hold_across_seed_sources() {
    for src in sample_sources() {
        let graph = parse(src).unwrap();
        for edge in graph.edges.values() {
            assert!(graph.has_endpoint(&edge.from), "{src}: dangling edge.from {}", edge.from);
            assert!(graph.has_endpoint(&edge.to), "{src}: dangling edge.to {}", edge.to);
        }
        for node in graph.nodes.values() {
            if let Some(p) = &node.parent {
                assert!(graph.subgraphs.contains_key(p));
            }
        }
        for sg in graph.subgraphs.values() {
            for child in &sg.children {
                assert_eq!(graph.nodes[child].parent.as_deref(), Some(sg.id.as_str()));
            }
        }
    }
}

/// P2: render-adapter record counts equal the semantic graph's node+subgraph and edge counts.
#[test]
fn p2_render_adapter_record_counts_match_the_graph() {
    for src in sample_sources() {
        let graph = parse(src).unwrap();
        let state = auto_layout(&graph, &LayoutSpacing::default(), None);
        let records = to_renderer(&graph, &state);
        assert_eq!(records.nodes.len() + records.containers.len(), graph.nodes.len() + graph.subgraphs.len());
        assert_eq!(records.edges.len(), graph.edges.len());
    }
}

/// P3: a locked prior entry survives relayout byte-for-byte.
#[test]
fn p3_locked_entries_are_preserved_verbatim() {
    let (graph, state, _) = convert("graph TD\nA --> B --> C", None).unwrap();
    let mut locked: VisualState = state;
    let mut entry = locked.nodes["B"].clone();
    entry.locked = Some(true);
    entry.position = Point { x: 12345.0, y: 6789.0 };
    locked.nodes.insert("B".to_string(), entry);

    let relaid = auto_layout(&graph, &LayoutSpacing::default(), Some(&locked));
    assert_eq!(relaid.nodes["B"], locked.nodes["B"]);
    // A and C aren't locked, so they recompute to the same fresh-layout positions regardless
    // of B's overridden value.
    let fresh = auto_layout(&graph, &LayoutSpacing::default(), None);
    assert_eq!(relaid.nodes["A"].position, fresh.nodes["A"].position);
    assert_eq!(relaid.nodes["C"].position, fresh.nodes["C"].position);
}

/// P4: two parses of identical text agree on node/edge key sets and edge ordering.
#[test]
fn p4_ids_are_stable_across_repeated_parses() {
    for src in sample_sources() {
        let g1 = parse(src).unwrap();
        let g2 = parse(src).unwrap();
        assert_eq!(
            g1.nodes.keys().collect::<Vec<_>>(),
            g2.nodes.keys().collect::<Vec<_>>()
        );
        assert_eq!(
            g1.edges.keys().collect::<Vec<_>>(),
            g2.edges.keys().collect::<Vec<_>>()
        );
    }
}

/// P5: every child node sits within its subgraph's recorded bounding box.
#[test]
fn p5_child_nodes_are_contained_in_their_subgraph() {
    let graph = parse("graph TD\nsubgraph S\nA --> B\nB --> C\nend").unwrap();
    let state = auto_layout(&graph, &LayoutSpacing::default(), None);
    let sg = &state.subgraphs["S"];
    for id in ["A", "B", "C"] {
        let placement = &state.nodes[id];
        let size = placement.size.unwrap();
        assert!(placement.position.x >= 0.0);
        assert!(placement.position.y >= 0.0);
        assert!(placement.position.x + size.width <= sg.size.width + 1e-6);
        assert!(placement.position.y + size.height <= sg.size.height + 1e-6);
    }
}

/// P6: nodes on the same rank within a subgraph never overlap on the cross axis.
#[test]
fn p6_same_rank_siblings_do_not_overlap() {
    let graph = parse("graph TD\nsubgraph S\nA --> B\nA --> C\nend").unwrap();
    let state = auto_layout(&graph, &LayoutSpacing::default(), None);
    let (b, c) = (&state.nodes["B"], &state.nodes["C"]);
    assert_eq!(b.position.y, c.position.y, "same-rank siblings should share a y band");
    let (bw, cw) = (b.size.unwrap().width, c.size.unwrap().width);
    let (b_lo, b_hi) = (b.position.x, b.position.x + bw);
    let (c_lo, c_hi) = (c.position.x, c.position.x + cw);
    assert!(b_hi <= c_lo || c_hi <= b_lo, "B and C intervals must be disjoint: {b_lo}-{b_hi} vs {c_lo}-{c_hi}");
}

#[test]
fn boundary_empty_source_yields_empty_graph_and_state() {
    let (graph, state, records) = convert("", None).unwrap();
    assert!(graph.nodes.is_empty() && graph.edges.is_empty() && graph.subgraphs.is_empty());
    assert!(state.nodes.is_empty() && state.subgraphs.is_empty());
    assert!(records.nodes.is_empty() && records.containers.is_empty() && records.edges.is_empty());
}

#[test]
fn boundary_single_node_with_no_edges() {
    let (graph, state, _) = convert("graph TD\nA[Solo]", None).unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edges.is_empty());
    assert!(state.nodes.contains_key("A"));
}

#[test]
fn boundary_disjoint_components_both_get_positions() {
    let (graph, state, _) = convert("graph TD\nA --> B\nC --> D", None).unwrap();
    assert_eq!(graph.nodes.len(), 4);
    let positions: Vec<_> = ["A", "B", "C", "D"].map(|id| state.nodes[id].position).to_vec();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            assert_ne!(positions[i], positions[j]);
        }
    }
}

#[test]
fn boundary_subgraph_with_no_children_still_gets_a_floored_size() {
    let (graph, state, _) = convert("graph TD\nsubgraph Empty\nend\nA --> B", None).unwrap();
    assert!(graph.subgraphs["Empty"].children.is_empty());
    let sg = &state.subgraphs["Empty"];
    assert!(sg.size.width >= 300.0);
    assert!(sg.size.height >= 200.0);
}

#[test]
fn boundary_nested_subgraphs_three_levels_deep() {
    let src = "graph TB\nsubgraph l1\nsubgraph l2\nsubgraph l3\nA --> B\nend\nend\nend";
    let (graph, state, _) = convert(src, None).unwrap();
    assert_eq!(graph.subgraphs["l3"].parent.as_deref(), Some("l2"));
    assert_eq!(graph.subgraphs["l2"].parent.as_deref(), Some("l1"));
    assert!(graph.subgraphs["l1"].parent.is_none());
    // l3's absolute position is l2-relative, which is itself l1-relative; just confirm every
    // level was actually placed.
    for id in ["l1", "l2", "l3"] {
        assert!(state.subgraphs.contains_key(id));
    }
}

#[test]
fn boundary_edge_between_two_subgraphs() {
    let src = "graph TD\nsubgraph S1\nA\nend\nsubgraph S2\nB\nend\nS1 --> S2";
    let graph = parse(src).unwrap();
    let edge = graph.edges.values().next().unwrap();
    assert_eq!(edge.from, "S1");
    assert_eq!(edge.to, "S2");
}

#[test]
fn boundary_duplicate_node_declaration_first_shape_wins_second_position_wins() {
    // First declaration's shape sticks; re-declaring later still leaves the node a single
    // child of whichever subgraph it was most recently referenced under.
    let src = "graph TD\nsubgraph S\nA[Rect]\nend\nsubgraph T\nA((Circle))\nend";
    let graph = parse(src).unwrap();
    assert_eq!(graph.nodes["A"].kind, meridian_core::graph::NodeShape::Rect);
    // The node keeps its first-seen parent; a forward reference under a second subgraph does
    // not relocate it.
    assert_eq!(graph.nodes["A"].parent.as_deref(), Some("S"));
    assert_eq!(graph.subgraphs["S"].children, vec!["A"]);
    assert!(graph.subgraphs["T"].children.is_empty());
}
