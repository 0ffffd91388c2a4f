//! Source-path filter.
//!
//! - `tree` - arena trie with tri-state enablement and visibility queries
//! - `flat` - flat key/value form for persistence
//! - `search` - name search that marks branches hidden/expanded

mod flat;
mod search;
pub mod tree;

pub use tree::{CheckState, FilterNode, FilterTree, NodeId};
