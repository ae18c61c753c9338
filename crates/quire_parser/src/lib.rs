//! # quire_parser
//!
//! Incremental parser for the quire markup engine.
//!
//! This crate provides:
//! - A [`Parser`] that accepts input in arbitrary pieces and builds a tree in
//!   a [`quire_ast::AstArena`]
//! - Parsing into an existing node, so fragments can be grafted into a tree
//! - The [`Options`] flags shared with the renderer
//!
//! ## Architecture
//!
//! Parsing runs in two phases. The block phase consumes one line at a time
//! and maintains the chain of open blocks; paragraph and heading text is
//! collected raw. Once input ends, the inline phase parses that text into
//! emphasis, strikethrough, super- and subscript, links, images, code spans
//! and entities. Link reference definitions are gathered in the block phase,
//! so a reference may be used before it is defined.
//!
//! ## Example
//!
//! ```rust
//! use quire_ast::{AstArena, NodeType};
//! use quire_parser::{Options, parse_document};
//!
//! let mut arena = AstArena::new();
//! let doc = parse_document(&mut arena, "~~one~~ ^two^\n", Options::DEFAULT);
//!
//! let para = arena.first_child(doc).unwrap();
//! let strike = arena.first_child(para).unwrap();
//! assert_eq!(arena.node_type(strike), Some(NodeType::Strikethrough));
//! ```

mod blocks;
mod entity;
mod error;
mod inlines;
mod options;
mod references;
mod scanners;

pub use blocks::{Parser, parse_document, parse_reader};
pub use error::ParseError;
pub use options::Options;
pub use scanners::has_scheme;
