//! A small compound directed-graph container.
//!
//! Nodes and edges are keyed by string ids, and nodes may additionally carry a single
//! `parent` node, forming the cluster-tree structure the layout engine needs to treat a
//! subgraph's children as one vertex in an outer graph.

mod graph;

pub use graph::alg;
pub use graph::{EdgeKey, Graph, GraphOptions};
