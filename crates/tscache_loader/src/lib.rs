//! The build-host facing loader.
//!
//! The host calls [`Loader::pitch`] before resolving a module and
//! [`Loader::run`] with the module's source when the pitch did not answer
//! from the persistent cache. [`RequestData`] carries the pitch's decision
//! over to the normal phase.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod loader;
pub mod request;
pub mod writes;

pub use context::LoaderContext;
pub use error::LoaderError;
pub use loader::{Loader, LoaderBuilder, LoaderOutput, PitchOutcome};
pub use request::RequestData;
pub use writes::PendingWrites;
