// src/links/mod.rs
// =============================================================================
// Hyperlink extraction from HTML pages.
//
// Submodules:
// - extract: parses a page and yields classified links plus href errors
// =============================================================================

mod extract;

pub use extract::{Link, LinkExtractor, LinkKind, LinkParseError};
