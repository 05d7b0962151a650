//! The `Graph` container: a directed (or undirected) multigraph with optional compound
//! (parent/children) structure, keyed by string node ids.
//!
//! Node and edge insertion order is preserved so that algorithms built on top of `Graph` are
//! deterministic for identical input order, which is a hard requirement of the layered layout
//! pipeline in `meridian-layout`.

use super::{EdgeKey, GraphOptions};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    key: EdgeKey,
    label: E,
}

#[derive(Debug, Clone)]
pub struct Graph<N, E, G> {
    options: GraphOptions,
    label: G,
    node_order: Vec<String>,
    nodes: FxHashMap<String, NodeEntry<N>>,
    edge_order: Vec<usize>,
    edges: Vec<Option<EdgeEntry<E>>>,
    edge_lookup: FxHashMap<(String, String, Option<String>), usize>,
    out_edges: FxHashMap<String, Vec<usize>>,
    in_edges: FxHashMap<String, Vec<usize>>,
    parent: FxHashMap<String, String>,
    children: FxHashMap<String, Vec<String>>,
}

impl<N, E, G: Default> Graph<N, E, G> {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            label: G::default(),
            node_order: Vec::new(),
            nodes: FxHashMap::default(),
            edge_order: Vec::new(),
            edges: Vec::new(),
            edge_lookup: FxHashMap::default(),
            out_edges: FxHashMap::default(),
            in_edges: FxHashMap::default(),
            parent: FxHashMap::default(),
            children: FxHashMap::default(),
        }
    }
}

impl<N, E, G> Graph<N, E, G> {
    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn graph_label(&self) -> &G {
        &self.label
    }

    pub fn graph_label_mut(&mut self) -> &mut G {
        &mut self.label
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.nodes.get(id).map(|e| &e.label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.nodes.get_mut(id).map(|e| &mut e.label)
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> Vec<String> {
        self.node_order.clone()
    }

    pub fn set_node(&mut self, id: impl Into<String>, label: N) {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.node_order.push(id.clone());
            self.out_edges.entry(id.clone()).or_default();
            self.in_edges.entry(id.clone()).or_default();
        }
        self.nodes.insert(id, NodeEntry { label });
    }

    pub fn set_node_default(&mut self, id: impl Into<String>)
    where
        N: Default,
    {
        let id = id.into();
        if !self.nodes.contains_key(&id) {
            self.set_node(id, N::default());
        }
    }

    fn ensure_node_default(&mut self, id: &str)
    where
        N: Default,
    {
        if !self.nodes.contains_key(id) {
            self.set_node(id.to_string(), N::default());
        }
    }

    // --- compound (parent/children) API ---

    pub fn set_parent(&mut self, v: &str, parent: Option<&str>)
    where
        N: Default,
    {
        debug_assert!(self.options.compound, "set_parent requires a compound graph");
        self.ensure_node_default(v);
        if let Some(old_parent) = self.parent.remove(v)
            && let Some(siblings) = self.children.get_mut(&old_parent)
        {
            siblings.retain(|c| c != v);
        }
        if let Some(p) = parent {
            self.ensure_node_default(p);
            self.parent.insert(v.to_string(), p.to_string());
            self.children.entry(p.to_string()).or_default().push(v.to_string());
        }
    }

    pub fn parent(&self, v: &str) -> Option<&str> {
        self.parent.get(v).map(|s| s.as_str())
    }

    pub fn children(&self, v: &str) -> Vec<&str> {
        self.children
            .get(v)
            .map(|c| c.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    // --- edge API ---

    fn edge_index(&self, v: &str, w: &str, name: Option<&str>) -> Option<usize> {
        let (v, w) = if self.options.directed || v <= w {
            (v, w)
        } else {
            (w, v)
        };
        self.edge_lookup
            .get(&(v.to_string(), w.to_string(), name.map(|s| s.to_string())))
            .copied()
    }

    pub fn has_edge(&self, v: &str, w: &str, name: Option<&str>) -> bool {
        self.edge_index(v, w, name).is_some()
    }

    pub fn edge(&self, v: &str, w: &str, name: Option<&str>) -> Option<&E> {
        let ix = self.edge_index(v, w, name)?;
        self.edges[ix].as_ref().map(|e| &e.label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<&mut E> {
        let ix = self.edge_index(v, w, name)?;
        self.edges[ix].as_mut().map(|e| &mut e.label)
    }

    pub fn set_edge(&mut self, v: &str, w: &str)
    where
        N: Default,
        E: Default,
    {
        self.set_edge_with_label(v, w, E::default());
    }

    pub fn set_edge_with_label(&mut self, v: &str, w: &str, label: E)
    where
        N: Default,
    {
        self.set_edge_named(v, w, None::<String>, label);
    }

    pub fn set_edge_named(&mut self, v: &str, w: &str, name: Option<impl Into<String>>, label: E)
    where
        N: Default,
    {
        self.ensure_node_default(v);
        self.ensure_node_default(w);
        let name = name.map(Into::into);
        let (stored_v, stored_w) = if self.options.directed || v <= w {
            (v.to_string(), w.to_string())
        } else {
            (w.to_string(), v.to_string())
        };

        if let Some(&ix) = self
            .edge_lookup
            .get(&(stored_v.clone(), stored_w.clone(), name.clone()))
        {
            self.edges[ix] = Some(EdgeEntry {
                key: EdgeKey::new(v, w, name),
                label,
            });
            return;
        }

        let ix = self.edges.len();
        self.edges.push(Some(EdgeEntry {
            key: EdgeKey::new(v, w, name.clone()),
            label,
        }));
        self.edge_order.push(ix);
        self.edge_lookup.insert((stored_v, stored_w, name), ix);
        self.out_edges.entry(v.to_string()).or_default().push(ix);
        self.in_edges.entry(w.to_string()).or_default().push(ix);
        if !self.options.directed && v != w {
            self.out_edges.entry(w.to_string()).or_default().push(ix);
            self.in_edges.entry(v.to_string()).or_default().push(ix);
        }
    }

    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edge_order
            .iter()
            .filter_map(|&ix| self.edges[ix].as_ref().map(|e| e.key.clone()))
            .collect()
    }

    /// Filter edges incident to `v`, keeping only those whose other endpoint is `other`
    /// (when given). `v` may sit on either side of the stored key for undirected graphs.
    fn filtered<'a>(&'a self, ixs: &[usize], v: &str, other: Option<&str>) -> Vec<&'a EdgeKey> {
        ixs.iter()
            .filter_map(|&ix| self.edges[ix].as_ref())
            .map(|e| &e.key)
            .filter(|k| match other {
                None => true,
                Some(o) => {
                    let other_end = if k.v == v { k.w.as_str() } else { k.v.as_str() };
                    other_end == o
                }
            })
            .collect()
    }

    pub fn out_edges(&self, v: &str, w: Option<&str>) -> Vec<&EdgeKey> {
        let empty = Vec::new();
        let ixs = self.out_edges.get(v).unwrap_or(&empty);
        self.filtered(ixs, v, w)
    }

    pub fn in_edges(&self, v: &str, w: Option<&str>) -> Vec<&EdgeKey> {
        let empty = Vec::new();
        let ixs = self.in_edges.get(v).unwrap_or(&empty);
        self.filtered(ixs, v, w)
    }

    pub fn node_edges(&self, v: &str) -> Vec<&EdgeKey> {
        if self.options.directed {
            let mut out = self.out_edges(v, None);
            out.extend(self.in_edges(v, None));
            out
        } else {
            self.out_edges(v, None)
        }
    }

    pub fn successors(&self, v: &str) -> Vec<&str> {
        self.out_edges(v, None)
            .into_iter()
            .map(|k| if k.v == v { k.w.as_str() } else { k.v.as_str() })
            .collect()
    }

    pub fn predecessors(&self, v: &str) -> Vec<&str> {
        self.in_edges(v, None)
            .into_iter()
            .map(|k| if k.w == v { k.v.as_str() } else { k.w.as_str() })
            .collect()
    }

    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        if self.options.directed {
            let mut out: Vec<&str> = self.successors(v);
            out.extend(self.predecessors(v));
            out
        } else {
            self.successors(v)
        }
    }
}

impl<N, E, G: Default> Default for Graph<N, E, G> {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}
