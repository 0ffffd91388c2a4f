pub mod encoding;
pub mod line;
pub mod types;

pub use line::LineParser;
pub use types::{split_path, Level, LogRecord, Parseable};
