//! # quire_render
//!
//! Writes a quire tree back out as canonical markup.
//!
//! ## Architecture
//!
//! - [`render_commonmark`] walks the tree with [`quire_ast::TreeIter`] and
//!   emits markup for each enter and exit event
//! - An internal writer owns the output buffer. It keeps the line prefix for
//!   block quotes and list items, defers line breaks so that consecutive
//!   requests collapse, and wraps text at the last space once a line passes
//!   the width
//! - Text is escaped so that reading the output back yields the same tree
//!
//! ## Example
//!
//! ```rust
//! use quire_ast::AstArena;
//! use quire_parser::{Options, parse_document};
//! use quire_render::render_commonmark;
//!
//! let mut arena = AstArena::new();
//! let doc = parse_document(&mut arena, "> a *b*\n", Options::DEFAULT);
//! assert_eq!(render_commonmark(&arena, doc, Options::DEFAULT, 0), "> a *b*\n");
//! ```

mod commonmark;
mod writer;

pub use commonmark::render_commonmark;
