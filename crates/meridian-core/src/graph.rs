//! The semantic graph: nodes, edges, and nested containers with stable identifiers.
//!
//! Carries no geometry. `meridian::layout` turns a `Graph` plus spacing configuration into a
//! `VisualState`; this module only ever describes identity and relationships.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type NodeId = String;
pub type EdgeId = String;
pub type SubgraphId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Flowchart,
    C4Context,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMeta {
    pub direction: RankDir,
    pub title: Option<String>,
    pub dialect: Option<Dialect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeShape {
    Rect,
    Round,
    Stadium,
    Circle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum C4Type {
    Person,
    PersonExt,
    System,
    SystemExt,
    SystemDb,
    SystemQueue,
    Container,
    ContainerExt,
    ContainerDb,
    ContainerQueue,
    Component,
    ComponentExt,
    ComponentDb,
    ComponentQueue,
}

impl C4Type {
    /// Whether this family's macro-call carries a `technology` argument (§4.3):
    /// Container/Component take `(id,"label","tech","desc")`; Person/System take
    /// `(id,"label","desc")` with no technology slot at all.
    pub fn has_technology(self) -> bool {
        matches!(
            self,
            C4Type::Container
                | C4Type::ContainerExt
                | C4Type::ContainerDb
                | C4Type::ContainerQueue
                | C4Type::Component
                | C4Type::ComponentExt
                | C4Type::ComponentDb
                | C4Type::ComponentQueue
        )
    }
}

/// A node in the semantic graph. `C4` is a strict superset of the flowchart fields, per the
/// Data Model's `Node | C4Node` sum-type split — both dialects produce the same container type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeShape,
    pub parent: Option<SubgraphId>,
    pub c4: Option<C4NodeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct C4NodeData {
    pub c4_type: C4Type,
    pub description: Option<String>,
    pub technology: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Directed,
    Bidirectional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub kind: EdgeKind,
    pub c4: Option<C4EdgeData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C4EdgeData {
    pub technology: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    Enterprise,
    System,
    Container,
    Boundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subgraph {
    pub id: SubgraphId,
    pub label: Option<String>,
    pub parent: Option<SubgraphId>,
    pub children: Vec<NodeId>,
    pub direction: Option<RankDir>,
    pub boundary_type: Option<BoundaryType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub meta: GraphMeta,
    pub nodes: IndexMap<NodeId, Node>,
    pub edges: IndexMap<EdgeId, Edge>,
    pub subgraphs: IndexMap<SubgraphId, Subgraph>,
}

impl Graph {
    pub fn new(direction: RankDir, dialect: Dialect) -> Self {
        Self {
            meta: GraphMeta {
                direction,
                title: None,
                dialect: Some(dialect),
            },
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            subgraphs: IndexMap::new(),
        }
    }

    /// True if `id` names either a node or a subgraph (edges may target either, §3 I1).
    pub fn has_endpoint(&self, id: &str) -> bool {
        self.nodes.contains_key(id) || self.subgraphs.contains_key(id)
    }

    /// Validates I1-I5. Called by both parsers right before returning, per §7: a graph that
    /// violates an invariant is the only hard parse error.
    pub fn check_invariants(&self) -> Result<(), String> {
        for edge in self.edges.values() {
            if !self.has_endpoint(&edge.from) {
                return Err(format!("edge {} references unknown endpoint {}", edge.id, edge.from));
            }
            if !self.has_endpoint(&edge.to) {
                return Err(format!("edge {} references unknown endpoint {}", edge.id, edge.to));
            }
        }

        for node in self.nodes.values() {
            if let Some(parent) = &node.parent
                && !self.subgraphs.contains_key(parent)
            {
                return Err(format!("node {} has unknown parent {}", node.id, parent));
            }
        }

        for sg in self.subgraphs.values() {
            if let Some(parent) = &sg.parent {
                if !self.subgraphs.contains_key(parent) {
                    return Err(format!("subgraph {} has unknown parent {}", sg.id, parent));
                }
                if parent == &sg.id {
                    return Err(format!("subgraph {} is its own parent", sg.id));
                }
            }
            for child in &sg.children {
                let Some(node) = self.nodes.get(child) else {
                    return Err(format!("subgraph {} lists unknown child {}", sg.id, child));
                };
                if node.parent.as_deref() != Some(sg.id.as_str()) {
                    return Err(format!(
                        "subgraph {} lists child {} whose parent does not point back",
                        sg.id, child
                    ));
                }
            }
        }

        self.check_acyclic_parents()
    }

    fn check_acyclic_parents(&self) -> Result<(), String> {
        for start in self.subgraphs.keys() {
            let mut seen = rustc_hash::FxHashSet::default();
            let mut cur = start.as_str();
            loop {
                if !seen.insert(cur.to_string()) {
                    return Err(format!("subgraph parent cycle involving {start}"));
                }
                match self.subgraphs.get(cur).and_then(|s| s.parent.as_deref()) {
                    Some(next) => cur = next,
                    None => break,
                }
            }
        }
        Ok(())
    }
}
