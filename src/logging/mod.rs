//! Emitting side of the console: sinks, switches and the `tracing` bridge.

mod context;
mod layer;

pub use context::LoggingContext;
pub use layer::{level_from_tracing, ConsoleLayer};
