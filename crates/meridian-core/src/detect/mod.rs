//! Dialect detection (§4.1): trims leading whitespace and matches the first token
//! case-insensitively. Unknown headers default to flowchart.

use crate::graph::Dialect;

pub fn detect(source: &str) -> Dialect {
    let first_token = source.split_whitespace().next().unwrap_or("");
    if first_token.eq_ignore_ascii_case("c4context") {
        Dialect::C4Context
    } else {
        Dialect::Flowchart
    }
}
