//! State threaded from the pitch phase to the normal phase.

use tscache_common::Mtime;

/// Per-request data the host keeps between [`pitch`](crate::Loader::pitch)
/// and [`run`](crate::Loader::run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestData {
    /// The request string the pitch looked up.
    pub remaining_request: Option<String>,
    /// Key of the cache entry for this request.
    pub cache_key: Option<String>,
    /// When the pitch decided to compile. Dependencies modified at or after
    /// this time are considered still in flux.
    pub start_time: Option<Mtime>,
}

impl RequestData {
    /// Creates empty request data.
    pub fn new() -> Self {
        Self::default()
    }
}
