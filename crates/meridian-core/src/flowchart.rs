//! Flowchart dialect parser (§4.2): two passes over preprocessed lines — a definition scan
//! that harvests explicit shape definitions (first definition wins), then a structural pass
//! that walks the subgraph stack and emits nodes, edges, and subgraphs in source order.

use crate::error::{ParseError, Result};
use crate::graph::{Dialect, Edge, EdgeKind, Graph, Node, NodeShape, RankDir, Subgraph};
use crate::text::clean_label;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

const ID: &str = r"[A-Za-z0-9_\-]+";

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(flowchart|graph)\s+(tb|td|bt|rl|lr)").unwrap());
static SUBGRAPH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^subgraph\s+(?P<tail>.+)$").unwrap());
static SUBGRAPH_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r#"^(?P<id>{ID})\s*\[\s*"?(?P<title>[^\]"]*)"?\s*\]$"#)).unwrap());
static DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^direction\s+(tb|td|bt|rl|lr)$").unwrap());
static END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^end$").unwrap());

static SHAPE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?P<id>{ID})(?:(?:\(\((?P<circle>[^)]*)\)\))|(?:\(\[(?P<stadium>[^\]]*)\]\))|(?:\{{(?P<diamond>[^}}]*)\}})|(?:\[(?P<rect>[^\]]*)\])|(?:\((?P<round>[^)]*)\)))"#
    ))
    .unwrap()
});

/// Arrow tokens, longest-match-first per §4.2's priority list.
const OPERATORS: &[&str] = &[
    "-.->", "-->", "==>", "->>", "<->", "-<>", "<-", "->", "---", "-.-", ":::", ":-:", "...",
    "~", "===",
];

struct EdgeMatch {
    left: String,
    op: String,
    right: String,
    label: Option<String>,
}

/// Matches a single labeled edge (inline dash label or pipe-wrapped label). Chains with labels
/// aren't supported, matching how rare they are in practice; plain chains go through
/// [`split_chain`] instead.
fn find_edge_labeled(line: &str) -> Option<EdgeMatch> {
    // Inline dash label: `A-- text -->B`.
    // Requires whitespace right after the opening `--` so a plain `-->` operator (no gap
    // before the arrowhead) is never mistaken for an inline label.
    static INLINE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(?P<left>.+?)--\s+(?P<label>\S.*?)\s+-->(?P<right>.+)$").unwrap());
    if let Some(c) = INLINE.captures(line) {
        return Some(EdgeMatch {
            left: c["left"].to_string(),
            op: "-->".to_string(),
            right: c["right"].to_string(),
            label: Some(c["label"].to_string()),
        });
    }

    let op_alt = OPERATORS
        .iter()
        .map(|op| regex::escape(op))
        .collect::<Vec<_>>()
        .join("|");

    let pipe_after = Regex::new(&format!(
        r"^(?P<left>.+?)(?P<op>{op_alt})\s*\|(?P<label>[^|]*)\|\s*(?P<right>.+)$"
    ))
    .unwrap();
    if let Some(c) = pipe_after.captures(line) {
        return Some(EdgeMatch {
            left: c["left"].to_string(),
            op: c["op"].to_string(),
            right: c["right"].to_string(),
            label: Some(c["label"].to_string()),
        });
    }

    let pipe_before = Regex::new(&format!(
        r"^(?P<left>.+?)\|(?P<label>[^|]*)\|\s*(?P<op>{op_alt})\s*(?P<right>.+)$"
    ))
    .unwrap();
    pipe_before.captures(line).map(|c| EdgeMatch {
        left: c["left"].to_string(),
        op: c["op"].to_string(),
        right: c["right"].to_string(),
        label: Some(c["label"].to_string()),
    })
}

/// Leftmost, highest-priority operator occurrence in `s`, scanning by byte position.
fn scan_operator(s: &str) -> Option<(usize, usize, &'static str)> {
    for i in 0..s.len() {
        if !s.is_char_boundary(i) {
            continue;
        }
        for op in OPERATORS {
            if s[i..].starts_with(op) {
                return Some((i, i + op.len(), op));
            }
        }
    }
    None
}

/// Splits an unlabeled chain like `A --> B --> C` into its node tokens and the operator
/// between each consecutive pair.
fn split_chain(line: &str) -> Option<(Vec<String>, Vec<String>)> {
    let mut nodes = Vec::new();
    let mut ops = Vec::new();
    let mut rest = line;
    loop {
        match scan_operator(rest) {
            Some((start, end, op)) => {
                nodes.push(rest[..start].trim().to_string());
                ops.push(op.to_string());
                rest = &rest[end..];
            }
            None => {
                if nodes.is_empty() {
                    return None;
                }
                nodes.push(rest.trim().to_string());
                break;
            }
        }
    }
    Some((nodes, ops))
}

fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}

/// Splits `id<delim>label<delim>` into `(id, shape, label)`. Falls back to a bare identifier
/// (rect, label = id) when no delimiter pair is present.
fn parse_node_ref(token: &str) -> (String, Option<NodeShape>, Option<String>) {
    let token = token.trim();
    if let Some(c) = SHAPE_DEF.captures(token) {
        let id = c["id"].to_string();
        if let Some(m) = c.name("circle") {
            return (id, Some(NodeShape::Circle), Some(clean_label(m.as_str())));
        }
        if let Some(m) = c.name("stadium") {
            return (id, Some(NodeShape::Stadium), Some(clean_label(m.as_str())));
        }
        if let Some(m) = c.name("diamond") {
            return (id, Some(NodeShape::Diamond), Some(clean_label(m.as_str())));
        }
        if let Some(m) = c.name("rect") {
            return (id, Some(NodeShape::Rect), Some(clean_label(m.as_str())));
        }
        if let Some(m) = c.name("round") {
            return (id, Some(NodeShape::Round), Some(clean_label(m.as_str())));
        }
    }
    (token.to_string(), None, None)
}

/// Joins multi-line labels: coalesces lines whenever open `[({` exceeds close `])}`.
fn preprocess(source: &str) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    let mut depth: i64 = 0;

    for (idx, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if pending.is_none() && (trimmed.is_empty() || trimmed.starts_with("%%")) {
            continue;
        }
        depth += bracket_delta(trimmed);

        match &mut pending {
            Some((_, acc)) => {
                acc.push(' ');
                acc.push_str(trimmed);
            }
            None => pending = Some((idx + 1, trimmed.to_string())),
        }

        if depth <= 0 {
            depth = 0;
            if let Some(done) = pending.take() {
                out.push(done);
            }
        }
    }
    if let Some(done) = pending.take() {
        out.push(done);
    }
    out
}

fn bracket_delta(line: &str) -> i64 {
    let mut delta: i64 = 0;
    for c in line.chars() {
        match c {
            '[' | '(' | '{' => delta += 1,
            ']' | ')' | '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}

fn is_structural(line: &str) -> bool {
    SUBGRAPH.is_match(line) || END.is_match(line) || DIRECTION.is_match(line) || HEADER.is_match(line)
}

pub fn parse(source: &str) -> Result<Graph> {
    let lines = preprocess(source);

    let direction = HEADER
        .captures(source)
        .and_then(|c| match c[2].to_lowercase().as_str() {
            "tb" | "td" => Some(RankDir::TB),
            "bt" => Some(RankDir::BT),
            "lr" => Some(RankDir::LR),
            "rl" => Some(RankDir::RL),
            _ => None,
        })
        .unwrap_or(RankDir::TB);

    let mut definitions: IndexMap<String, (NodeShape, String)> = IndexMap::new();
    for (_, line) in &lines {
        if is_structural(line) {
            continue;
        }
        for c in SHAPE_DEF.captures_iter(line) {
            let id = c["id"].to_string();
            if definitions.contains_key(&id) {
                continue;
            }
            let (shape, label) = if let Some(m) = c.name("circle") {
                (NodeShape::Circle, clean_label(m.as_str()))
            } else if let Some(m) = c.name("stadium") {
                (NodeShape::Stadium, clean_label(m.as_str()))
            } else if let Some(m) = c.name("diamond") {
                (NodeShape::Diamond, clean_label(m.as_str()))
            } else if let Some(m) = c.name("rect") {
                (NodeShape::Rect, clean_label(m.as_str()))
            } else if let Some(m) = c.name("round") {
                (NodeShape::Round, clean_label(m.as_str()))
            } else {
                continue;
            };
            definitions.insert(id, (shape, label));
        }
    }

    let mut graph = Graph::new(direction, Dialect::Flowchart);
    let mut stack: Vec<String> = Vec::new();
    let mut edge_counter: usize = 0;

    let ensure_node = |graph: &mut Graph, token: &str, stack: &[String]| -> String {
        let (id, shape, label) = parse_node_ref(token);
        if graph.subgraphs.contains_key(&id) {
            return id;
        }
        if !graph.nodes.contains_key(&id) {
            let (def_shape, def_label) = definitions
                .get(&id)
                .cloned()
                .unwrap_or((NodeShape::Rect, id.clone()));
            let kind = shape.unwrap_or(def_shape);
            let label = label.unwrap_or(def_label);
            let parent = stack.last().cloned();
            graph.nodes.insert(
                id.clone(),
                Node {
                    id: id.clone(),
                    label,
                    kind,
                    parent: parent.clone(),
                    c4: None,
                },
            );
            if let Some(p) = parent
                && let Some(sg) = graph.subgraphs.get_mut(&p)
            {
                sg.children.push(id.clone());
            }
        }
        id
    };

    for (line_no, line) in &lines {
        if HEADER.is_match(line) && !SUBGRAPH.is_match(line) {
            continue;
        }
        if let Some(c) = SUBGRAPH.captures(line) {
            let tail = c["tail"].trim();
            let (id, title) = parse_subgraph_header(tail, *line_no);
            graph.subgraphs.insert(
                id.clone(),
                Subgraph {
                    id: id.clone(),
                    label: title,
                    parent: stack.last().cloned(),
                    children: Vec::new(),
                    direction: None,
                    boundary_type: None,
                },
            );
            stack.push(id);
            continue;
        }
        if END.is_match(line) {
            stack.pop();
            continue;
        }
        if let Some(c) = DIRECTION.captures(line) {
            let dir = match c[1].to_lowercase().as_str() {
                "tb" | "td" => RankDir::TB,
                "bt" => RankDir::BT,
                "lr" => RankDir::LR,
                "rl" => RankDir::RL,
                _ => RankDir::TB,
            };
            if let Some(top) = stack.last()
                && let Some(sg) = graph.subgraphs.get_mut(top)
            {
                sg.direction = Some(dir);
            }
            continue;
        }

        if let Some(m) = find_edge_labeled(line) {
            let from = ensure_node(&mut graph, &m.left, &stack);
            let to = ensure_node(&mut graph, &m.right, &stack);
            let label = m.label.map(|l| clean_label(&l)).filter(|l| !l.is_empty());
            make_edge(&mut graph, from, to, &m.op, label, &mut edge_counter);
            continue;
        }

        if let Some((tokens, ops)) = split_chain(line) {
            let ids: Vec<String> = tokens
                .iter()
                .map(|t| ensure_node(&mut graph, t, &stack))
                .collect();
            for (i, op) in ops.iter().enumerate() {
                make_edge(&mut graph, ids[i].clone(), ids[i + 1].clone(), op, None, &mut edge_counter);
            }
            continue;
        }

        // Standalone node declaration, or an unrecognized line: best-effort skip.
        if SHAPE_DEF.is_match(line) || Regex::new(&format!(r"^{ID}$")).unwrap().is_match(line) {
            ensure_node(&mut graph, line, &stack);
        }
    }

    if let Err(reason) = graph.check_invariants() {
        return Err(ParseError::new(0, reason));
    }
    Ok(graph)
}

fn make_edge(
    graph: &mut Graph,
    from: String,
    to: String,
    op: &str,
    label: Option<String>,
    edge_counter: &mut usize,
) {
    let kind = if op == "<->" {
        EdgeKind::Bidirectional
    } else {
        EdgeKind::Directed
    };
    let id = format!("e-{from}-{to}-{edge_counter}");
    *edge_counter += 1;
    graph.edges.insert(
        id.clone(),
        Edge {
            id,
            from,
            to,
            label,
            kind,
            c4: None,
        },
    );
}

fn parse_subgraph_header(tail: &str, line_idx: usize) -> (String, Option<String>) {
    if tail.len() >= 2 && tail.starts_with('"') && tail.ends_with('"') {
        let title = clean_label(tail);
        let id = slugify(&title);
        let id = if id.is_empty() { format!("sg-{line_idx}") } else { id };
        return (id, Some(title));
    }
    if let Some(c) = SUBGRAPH_BRACKET.captures(tail) {
        return (c["id"].to_string(), Some(clean_label(&c["title"])));
    }
    if tail.contains(' ') {
        // Latent-bug behavior (§9 Open Questions): the whole tail becomes the title *and*
        // is slugged into a new id, shadowing a same-named earlier id. Preserved intentionally.
        let id = slugify(tail);
        let id = if id.is_empty() { format!("sg-{line_idx}") } else { id };
        return (id, Some(tail.to_string()));
    }
    (tail.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeShape;

    #[test]
    fn s1_linear_flowchart() {
        let g = parse("graph TD\nA[Start] --> B[Middle] --> C[End]").unwrap();
        assert_eq!(g.meta.direction, RankDir::TB);
        assert_eq!(g.nodes.len(), 3);
        for id in ["A", "B", "C"] {
            assert_eq!(g.nodes[id].kind, NodeShape::Rect);
        }
        assert!(g.edges.contains_key("e-A-B-0"));
        assert!(g.edges.contains_key("e-B-C-1"));
        assert!(g.subgraphs.is_empty());
    }

    #[test]
    fn s2_labeled_branch() {
        let g = parse("graph TD\nA{Choice}\nA -->|yes| B[Ok]\nA -->|no| C[Fail]").unwrap();
        assert_eq!(g.nodes["A"].kind, NodeShape::Diamond);
        let ab = g.edges.values().find(|e| e.from == "A" && e.to == "B").unwrap();
        assert_eq!(ab.label.as_deref(), Some("yes"));
        let ac = g.edges.values().find(|e| e.from == "A" && e.to == "C").unwrap();
        assert_eq!(ac.label.as_deref(), Some("no"));
    }

    #[test]
    fn s3_nested_subgraphs() {
        let src = "graph TB\n subgraph outer\n  subgraph inner\n   X --> Y\n  end\n  Z\n end";
        let g = parse(src).unwrap();
        assert_eq!(g.subgraphs["inner"].parent.as_deref(), Some("outer"));
        assert_eq!(g.nodes["X"].parent.as_deref(), Some("inner"));
        assert_eq!(g.nodes["Y"].parent.as_deref(), Some("inner"));
        assert_eq!(g.nodes["Z"].parent.as_deref(), Some("outer"));
        assert_eq!(g.subgraphs["inner"].children, vec!["X", "Y"]);
        assert_eq!(g.subgraphs["outer"].children, vec!["Z"]);
    }

    #[test]
    fn s4_bidirectional() {
        let g = parse("graph LR\nA <-> B").unwrap();
        assert_eq!(g.meta.direction, RankDir::LR);
        let e = g.edges.values().next().unwrap();
        assert_eq!(e.kind, EdgeKind::Bidirectional);
    }

    #[test]
    fn empty_source_has_no_nodes() {
        let g = parse("").unwrap();
        assert!(g.nodes.is_empty());
        assert!(g.edges.is_empty());
    }

    #[test]
    fn first_definition_wins_for_shape() {
        let g = parse("graph TD\nA[Rect]\nB --> A\nA((Circle))").unwrap();
        assert_eq!(g.nodes["A"].kind, NodeShape::Rect);
    }

    #[test]
    fn edge_with_no_shapes_defaults_to_rect() {
        let g = parse("graph TD\nA --> B").unwrap();
        assert_eq!(g.nodes["A"].kind, NodeShape::Rect);
        assert_eq!(g.nodes["B"].kind, NodeShape::Rect);
    }

    #[test]
    fn edge_endpoint_naming_a_subgraph_connects_to_it() {
        let src = "graph TD\n subgraph S\n  A\n end\n S --> B";
        let g = parse(src).unwrap();
        let e = g.edges.values().next().unwrap();
        assert_eq!(e.from, "S");
        assert_eq!(e.to, "B");
    }
}
