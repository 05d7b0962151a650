#![forbid(unsafe_code)]

//! Dialect-sensitive diagram-source parser (§2, §4).
//!
//! Detects whether source is a Mermaid flowchart or a C4-Context diagram, parses it into a
//! semantic [`Graph`], and validates the graph's structural invariants before returning it.
//! Carries no geometry or layout state — that's [`meridian_layout`] and the `meridian` facade.

pub mod c4;
pub mod detect;
pub mod error;
pub mod flowchart;
pub mod geom;
pub mod graph;
pub mod text;

pub use error::{ParseError, Result};
pub use graph::{Dialect, Graph};

/// Detects the dialect and dispatches to the matching parser (§6 `parse` operation).
pub fn parse(source: &str) -> Result<Graph> {
    match detect::detect(source) {
        Dialect::Flowchart => flowchart::parse(source),
        Dialect::C4Context => c4::parse(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_dialect() {
        assert!(parse("graph TD\nA-->B").unwrap().meta.dialect == Some(Dialect::Flowchart));
        assert!(
            parse("C4Context\nPerson(a, \"A\")").unwrap().meta.dialect == Some(Dialect::C4Context)
        );
    }
}
