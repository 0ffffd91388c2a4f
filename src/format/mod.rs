//! Rendering of records into colored text runs.

mod formatter;
mod styled;

pub use formatter::{RecordFormatter, RenderMode};
pub use styled::{StyledFragment, StyledRun};
