//! Persistent result cache for compiled modules.
//!
//! A cache entry stores the emitted code, its source map, the formatted
//! diagnostics, and the modification time of every file the compilation
//! depended on. Entries are named after a digest of the cache identifier and
//! the host's request string, and are only reused after every recorded
//! dependency has been re-stat'ed and found unchanged.

#![warn(missing_docs)]

pub mod deps;
pub mod entry;
pub mod error;
pub mod key;
pub mod pool;
pub mod store;

pub use deps::{first_in_flux, DependencyStatter};
pub use entry::{CacheEntry, DependencyRecord};
pub use error::CacheError;
pub use key::cache_key;
pub use pool::{IoPool, MAX_IN_FLIGHT};
pub use store::{CacheStore, JsonFileStore};
