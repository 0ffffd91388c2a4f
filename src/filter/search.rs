//! Name search over the filter tree.
//!
//! Only presentation flags change: a node is expanded when its own name or
//! any descendant's name contains the query (case-insensitively), and hidden
//! otherwise. Enablement is never touched.

use super::tree::{FilterTree, NodeId};

impl FilterTree {
    /// Mark matching branches expanded and the rest hidden.
    ///
    /// Returns the number of matching nodes. An empty query matches every
    /// node.
    pub fn search(&mut self, query: &str) -> usize {
        let query = query.to_lowercase();
        let root = self.root();
        self.children(root)
            .to_vec()
            .into_iter()
            .map(|child| self.mark_matches(child, &query))
            .sum()
    }

    fn mark_matches(&mut self, id: NodeId, query: &str) -> usize {
        let mut matches: usize = self
            .children(id)
            .to_vec()
            .into_iter()
            .map(|child| self.mark_matches(child, query))
            .sum();

        let Some(node) = self.node_mut(id) else {
            return 0;
        };
        if node.name().to_lowercase().contains(query) {
            matches += 1;
        }
        node.hidden = matches == 0;
        node.expanded = matches > 0;
        matches
    }

    /// Drop search marks: everything visible, nothing expanded
    pub fn clear_search(&mut self) {
        for id in self.descendants(self.root()) {
            if let Some(node) = self.node_mut(id) {
                node.hidden = false;
                node.expanded = false;
            }
        }
    }
}
