//! Cache key derivation.

use tscache_common::ContentHash;

/// Derives the cache key for a request.
///
/// The same identifier and request always produce the same key, so a module
/// built in the same environment keeps reusing one cache file.
///
/// XXH3-128 is not collision resistant. Two requests may share a key, so an
/// entry is only trusted after [`CacheEntry::check_request`] confirms it was
/// written for the same request.
///
/// [`CacheEntry::check_request`]: crate::CacheEntry::check_request
pub fn cache_key(identifier: &str, request: &str) -> ContentHash {
    ContentHash::of_lines(&[identifier, request])
}
