//! Public facade: parse a diagram, auto-layout it, and hand off render-ready geometry.
//!
//! This crate glues [`meridian_core`] (text -> semantic graph) to [`meridian_layout`]
//! (per-subgraph layered layout) and owns the hierarchical composition pass that turns
//! many small interior layouts into one [`VisualState`].

pub mod error;
pub mod layout;
pub mod render;
pub mod visual;

pub use error::FacadeError;
pub use layout::{LayoutSpacing, auto_layout};
pub use render::{RenderGraph, to_renderer};
pub use visual::VisualState;

use meridian_core::Graph;

/// Parse diagram source into a semantic [`Graph`].
///
/// Thin re-export of [`meridian_core::parse`] so callers only need this one crate.
pub fn parse(source: &str) -> Result<Graph, meridian_core::ParseError> {
    meridian_core::parse(source)
}

/// Parses, lays out, and renders diagram source in one call (§6 `convert`).
pub fn convert(
    source: &str,
    prior: Option<&VisualState>,
) -> Result<(Graph, VisualState, RenderGraph), FacadeError> {
    let graph = parse(source)?;
    let visual = auto_layout(&graph, &LayoutSpacing::default(), prior);
    let records = to_renderer(&graph, &visual);
    Ok((graph, visual, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_parses_lays_out_and_renders() {
        let (graph, visual, records) = convert("graph TD\nA --> B", None).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(visual.nodes.len(), 2);
        assert_eq!(records.nodes.len(), 2);
    }
}
