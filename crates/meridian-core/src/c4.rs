//! C4-Context dialect parser (§4.3): a line-based tokenizer for the macro-call grammar
//! `Name(arg1, "arg2", ...) { ... }`, a boundary push/pop stack, and constructors for the
//! Person/System/Container/Component and Rel families.

use crate::error::{ParseError, Result};
use crate::graph::{
    BoundaryType, C4EdgeData, C4NodeData, C4Type, Dialect, Edge, EdgeKind, Graph, Node, NodeShape,
    RankDir, Subgraph,
};
use crate::text::{clean_label, unquote_once};
use regex::Regex;
use std::sync::LazyLock;

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<args>.*?)\)\s*\{?\s*$").unwrap());
static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^title\s+(?P<title>.+)$").unwrap());

/// Splits a macro-call argument list on top-level commas, respecting quoted strings.
fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    for c in args.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                cur.push(c);
            }
            ',' if !in_quotes => {
                out.push(cur.trim().to_string());
                cur = String::new();
            }
            _ => cur.push(c),
        }
    }
    if !cur.trim().is_empty() {
        out.push(cur.trim().to_string());
    }
    out.into_iter()
        .map(|a| clean_label(unquote_once(&a)))
        .collect()
}

fn boundary_type(name: &str) -> Option<BoundaryType> {
    match name {
        "Enterprise_Boundary" => Some(BoundaryType::Enterprise),
        "System_Boundary" => Some(BoundaryType::System),
        "Container_Boundary" => Some(BoundaryType::Container),
        "Boundary" => Some(BoundaryType::Boundary),
        _ => None,
    }
}

fn node_type(name: &str) -> Option<C4Type> {
    Some(match name {
        "Person" => C4Type::Person,
        "Person_Ext" => C4Type::PersonExt,
        "System" => C4Type::System,
        "System_Ext" => C4Type::SystemExt,
        "SystemDb" | "System_Db" => C4Type::SystemDb,
        "SystemQueue" | "System_Queue" => C4Type::SystemQueue,
        "Container" => C4Type::Container,
        "Container_Ext" => C4Type::ContainerExt,
        "ContainerDb" | "Container_Db" => C4Type::ContainerDb,
        "ContainerQueue" | "Container_Queue" => C4Type::ContainerQueue,
        "Component" => C4Type::Component,
        "Component_Ext" => C4Type::ComponentExt,
        "ComponentDb" | "Component_Db" => C4Type::ComponentDb,
        "ComponentQueue" | "Component_Queue" => C4Type::ComponentQueue,
        _ => return None,
    })
}

fn is_rel(name: &str) -> Option<EdgeKind> {
    if name == "BiRel" {
        return Some(EdgeKind::Bidirectional);
    }
    if name == "Rel"
        || name.starts_with("Rel_")
        || name == "RelIndex"
    {
        return Some(EdgeKind::Directed);
    }
    None
}

pub fn parse(source: &str) -> Result<Graph> {
    let mut graph = Graph::new(RankDir::TB, Dialect::C4Context);
    let mut stack: Vec<String> = Vec::new();
    let mut boundary_counter: usize = 0;

    for (line_no, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("%%") || line.eq_ignore_ascii_case("C4Context") {
            continue;
        }
        if line == "}" {
            stack.pop();
            continue;
        }
        if let Some(c) = TITLE.captures(line) {
            graph.meta.title = Some(c["title"].trim().to_string());
            continue;
        }
        let Some(c) = CALL.captures(line) else {
            continue;
        };
        let name = &c["name"];
        let args = split_args(&c["args"]);
        let opens_block = raw.trim_end().ends_with('{');

        if let Some(boundary) = boundary_type(name) {
            boundary_counter += 1;
            let id = args.first().cloned().unwrap_or_else(|| format!("boundary-{boundary_counter}"));
            let label = args.get(1).cloned().or_else(|| Some(id.clone()));
            graph.subgraphs.insert(
                id.clone(),
                Subgraph {
                    id: id.clone(),
                    label,
                    parent: stack.last().cloned(),
                    children: Vec::new(),
                    direction: None,
                    boundary_type: Some(boundary),
                },
            );
            if opens_block {
                stack.push(id);
            }
            continue;
        }

        if let Some(c4_type) = node_type(name) {
            let id = args.first().cloned().unwrap_or_default();
            if id.is_empty() {
                continue;
            }
            let label = args.get(1).cloned().unwrap_or_else(|| id.clone());
            // Person/System take `(id,"label","desc")`; Container/Component take
            // `(id,"label","tech","desc")` (§4.3) — tech and desc swap slots between families.
            let (description, technology) = if c4_type.has_technology() {
                (
                    args.get(3).cloned().filter(|s| !s.is_empty()),
                    args.get(2).cloned().filter(|s| !s.is_empty()),
                )
            } else {
                (args.get(2).cloned().filter(|s| !s.is_empty()), None)
            };
            let parent = stack.last().cloned();
            graph.nodes.insert(
                id.clone(),
                Node {
                    id: id.clone(),
                    label,
                    kind: NodeShape::Rect,
                    parent: parent.clone(),
                    c4: Some(C4NodeData {
                        c4_type,
                        description,
                        technology,
                        tags: Vec::new(),
                    }),
                },
            );
            if let Some(p) = parent
                && let Some(sg) = graph.subgraphs.get_mut(&p)
            {
                sg.children.push(id);
            }
            continue;
        }

        if let Some(kind) = is_rel(name) {
            if args.len() < 2 {
                continue;
            }
            // Direction-hinted Rel_* variants (§4.3) carry their hint as a semantic label
            // only; from/to always follow argument order, even for Rel_Back.
            let (from, to) = (args[0].clone(), args[1].clone());
            let label = args.get(2).cloned().filter(|s| !s.is_empty());
            let technology = args.get(3).cloned().filter(|s| !s.is_empty());
            let description = args.get(4).cloned().filter(|s| !s.is_empty());
            let id = format!("e-{from}-{to}-{line_no}");
            graph.edges.insert(
                id.clone(),
                Edge {
                    id,
                    from,
                    to,
                    label,
                    kind,
                    c4: Some(C4EdgeData {
                        technology,
                        description,
                        tags: Vec::new(),
                    }),
                },
            );
        }
    }

    if let Err(reason) = graph.check_invariants() {
        return Err(ParseError::new(0, reason));
    }
    Ok(graph)
}
