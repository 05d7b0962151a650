//! Persisted layout state (§3 `VisualState`, §6 JSON format).
//!
//! Geometry only — no semantic data. `autoLayout` produces a fresh value each run; a caller
//! may feed a prior one back in so that `locked` entries survive relayout verbatim.

use indexmap::IndexMap;
use meridian_core::graph::{EdgeId, NodeId, SubgraphId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    pub position: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl Default for Point {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgePlacement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bend_points: Option<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphPlacement {
    pub position: Point,
    pub size: Size,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Point,
}

/// `locked` elements are preserved verbatim across relayouts (§3 Lifecycles); everything else
/// is recomputed fresh on every `autoLayout` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualState {
    #[serde(default)]
    pub nodes: IndexMap<NodeId, NodePlacement>,
    #[serde(default)]
    pub edges: IndexMap<EdgeId, EdgePlacement>,
    #[serde(default)]
    pub subgraphs: IndexMap<SubgraphId, SubgraphPlacement>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub viewport: Option<Viewport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_and_drops_unknown_keys() {
        let json = r#"{
            "nodes": {"A": {"position": {"x": 1.0, "y": 2.0}, "locked": true}},
            "edges": {},
            "subgraphs": {},
            "bogus": "ignored"
        }"#;
        let state: VisualState = serde_json::from_str(json).unwrap();
        assert_eq!(state.nodes["A"].position, Point { x: 1.0, y: 2.0 });
        assert_eq!(state.nodes["A"].locked, Some(true));
    }

    #[test]
    fn defaults_to_empty_state() {
        let state: VisualState = serde_json::from_str("{}").unwrap();
        assert!(state.nodes.is_empty());
        assert!(state.viewport.is_none());
    }
}
