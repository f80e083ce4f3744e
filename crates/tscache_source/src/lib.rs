//! Source text indexing and source maps for emitted code.
//!
//! This crate provides [`LineIndex`] for converting absolute offsets into the
//! zero-based line/character positions diagnostics carry, and [`SourceMap`],
//! the structured v3 source map bound to the file it was produced for.

#![warn(missing_docs)]

pub mod line_index;
pub mod source_map;

pub use line_index::{utf16_offset, LineIndex};
pub use source_map::{fix_source_map, SourceMap};
