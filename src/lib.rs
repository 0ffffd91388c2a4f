//! logconsole - A filterable, colorized log console core written in Rust
//!
//! This library parses console log lines, keeps them in an append-only
//! history, filters them through a tri-state source tree and renders them
//! into colored text runs for any front end.
//!
//! ## Module Structure
//!
//! - [`parsers`] - Line grammar, record types and the encoded-line codec
//! - [`filter`] - Tri-state source path filter with search and persistence
//! - [`format`] - Record rendering into styled runs
//! - [`display`] - Field toggles, level mask and colors
//! - [`history`] - Append-only record store
//! - [`batch`] - Block-wise history loading on a bounded worker pool
//! - [`console`] - The console handle tying everything together
//! - [`logging`] - Emitting side: sinks, switches and the `tracing` layer
//! - [`session`] - Quick-start wiring of console, log file and settings
//! - [`settings`] - JSON persistence of console settings
//! - [`state`] - Core constants and the color type
//! - [`error`] - Error type for file-backed operations

pub mod batch;
pub mod console;
pub mod display;
pub mod error;
pub mod filter;
pub mod format;
pub mod history;
pub mod logging;
pub mod parsers;
pub mod session;
pub mod settings;
pub mod state;

pub use console::{LiveSender, LogConsole};
pub use error::{ConsoleError, Result};
