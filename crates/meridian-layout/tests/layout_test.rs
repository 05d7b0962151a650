use meridian_layout::graphlib::{Graph, GraphOptions};
use meridian_layout::{EdgeLabel, GraphLabel, NodeLabel, RankDir, layout};

fn node(width: f64, height: f64) -> NodeLabel {
    NodeLabel { width, height, x: None, y: None }
}

#[test]
fn places_a_chain_of_nodes_on_increasing_ranks() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.set_node("a", node(50.0, 30.0));
    g.set_node("b", node(50.0, 30.0));
    g.set_node("c", node(50.0, 30.0));
    g.set_edge_with_label("a", "b", EdgeLabel::default());
    g.set_edge_with_label("b", "c", EdgeLabel::default());

    layout(&mut g);

    let ay = g.node("a").unwrap().y.unwrap();
    let by = g.node("b").unwrap().y.unwrap();
    let cy = g.node("c").unwrap().y.unwrap();
    assert!(ay < by);
    assert!(by < cy);

    let ax = g.node("a").unwrap().x.unwrap();
    let bx = g.node("b").unwrap().x.unwrap();
    let cx = g.node("c").unwrap().x.unwrap();
    assert_eq!(ax, bx);
    assert_eq!(bx, cx);
}

#[test]
fn siblings_on_the_same_rank_respect_nodesep() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.graph_label_mut().nodesep = 20.0;
    g.set_node("root", node(40.0, 30.0));
    g.set_node("left", node(60.0, 30.0));
    g.set_node("right", node(60.0, 30.0));
    g.set_edge_with_label("root", "left", EdgeLabel::default());
    g.set_edge_with_label("root", "right", EdgeLabel::default());

    layout(&mut g);

    let left_x = g.node("left").unwrap().x.unwrap();
    let right_x = g.node("right").unwrap().x.unwrap();
    let gap = (right_x - left_x).abs();
    assert_eq!(gap, 60.0 + 20.0);
}

#[test]
fn left_to_right_swaps_rank_axis_to_x() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.graph_label_mut().rankdir = RankDir::LR;
    g.set_node("a", node(50.0, 30.0));
    g.set_node("b", node(50.0, 30.0));
    g.set_edge_with_label("a", "b", EdgeLabel::default());

    layout(&mut g);

    let ax = g.node("a").unwrap().x.unwrap();
    let bx = g.node("b").unwrap().x.unwrap();
    assert!(ax < bx);
}

#[test]
fn left_to_right_siblings_respect_nodesep_along_height_not_width() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.graph_label_mut().rankdir = RankDir::LR;
    g.graph_label_mut().nodesep = 20.0;
    g.set_node("root", node(40.0, 30.0));
    // Tall node: width 30, height 100. In LR, within-rank siblings stack vertically and must
    // be separated by height, not width, or a tall node overlaps its rank neighbor.
    g.set_node("top", node(30.0, 100.0));
    g.set_node("bottom", node(30.0, 100.0));
    g.set_edge_with_label("root", "top", EdgeLabel::default());
    g.set_edge_with_label("root", "bottom", EdgeLabel::default());

    layout(&mut g);

    let top = g.node("top").unwrap();
    let bottom = g.node("bottom").unwrap();
    assert_eq!(top.width, 30.0);
    assert_eq!(top.height, 100.0);
    let gap = (bottom.y.unwrap() - top.y.unwrap()).abs();
    assert_eq!(gap, 100.0 + 20.0);
}

#[test]
fn self_loop_produces_a_closed_polyline_to_the_right_of_the_node() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.set_node("a", node(50.0, 30.0));
    g.set_edge_with_label("a", "a", EdgeLabel::default());

    layout(&mut g);

    let ax = g.node("a").unwrap().x.unwrap();
    let lbl = g.edge("a", "a", None).unwrap();
    assert!(!lbl.points.is_empty());
    assert!(lbl.points.iter().all(|p| p.x > ax));
}

#[test]
fn a_disconnected_node_still_gets_a_deterministic_position() {
    let mut g: Graph<NodeLabel, EdgeLabel, GraphLabel> = Graph::new(GraphOptions {
        directed: true,
        compound: true,
        multigraph: true,
    });
    g.set_node("lonely", node(40.0, 40.0));

    layout(&mut g);

    let n = g.node("lonely").unwrap();
    assert_eq!(n.x, Some(20.0));
    assert_eq!(n.y, Some(20.0));
}
