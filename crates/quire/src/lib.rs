//! # quire
//!
//! A markup parsing and rendering engine.
//!
//! This crate provides:
//! - The mutable node tree from [`quire_ast`]
//! - The incremental parser from [`quire_parser`]
//! - The canonical markup renderer from [`quire_render`]
//! - JSON engine configuration and a unified [`Error`]
//!
//! ## Example
//!
//! ```rust
//! use quire::{AstArena, Options, parse_document, render_commonmark};
//!
//! let mut arena = AstArena::new();
//! let doc = parse_document(&mut arena, "Hello *world*\n", Options::DEFAULT);
//! assert_eq!(
//!     render_commonmark(&arena, doc, Options::DEFAULT, 0),
//!     "Hello *world*\n"
//! );
//! ```

mod config;
mod error;

pub use config::EngineConfig;
pub use error::{ConfigError, Error};

pub use quire_ast::{
    ALL_INLINES, AstArena, Children, EventType, ListDelimType, ListType, Node, NodeCodeBlock,
    NodeCustom, NodeHeading, NodeId, NodeLink, NodeList, NodeSpoiler, NodeType, NodeValue,
    Position, SerializeTree, Sourcepos, TOP_LEVEL_BLOCKS, Traverse, TreeError, TreeIter,
};
pub use quire_parser::{Options, ParseError, Parser, parse_document, parse_reader};
pub use quire_render::render_commonmark;

use tracing::debug;

/// Returns the version of the engine.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Parses `text` and renders it back as canonical markup using `config`.
///
/// # Example
///
/// ```rust
/// use quire::{EngineConfig, markdown_to_commonmark};
///
/// let config = EngineConfig::from_json(r#"{ "width": 20 }"#).unwrap();
/// let output = markdown_to_commonmark("one two three four five six\n", &config).unwrap();
/// assert_eq!(output, "one two three four\nfive six\n");
/// ```
pub fn markdown_to_commonmark(text: &str, config: &EngineConfig) -> Result<String, Error> {
    let options = config.resolve_options()?;
    let mut arena = AstArena::new();
    let doc = parse_document(&mut arena, text, options);
    debug!(nodes = arena.len(), "parsed document");
    Ok(render_commonmark(&arena, doc, options, config.width))
}
