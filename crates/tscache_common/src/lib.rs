//! Shared foundational types used across the tscache workspace.
//!
//! This crate provides content digests for cache keys, millisecond file
//! timestamps for dependency validation, and the internal error type.

#![warn(missing_docs)]

pub mod hash;
pub mod mtime;
pub mod result;

pub use hash::ContentHash;
pub use mtime::Mtime;
pub use result::InternalError;
