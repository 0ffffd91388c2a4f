//! Flat key/value form of the filter, used for persistence.

use super::tree::{CheckState, FilterTree, NodeId};
use crate::parsers::split_path;
use crate::state::PATH_DELIMITER;

impl FilterTree {
    /// Depth-first list of resolved entries.
    ///
    /// Mixed nodes are expanded into their children; a resolved node is
    /// emitted once for its whole subtree.
    pub fn to_flat_list(&self) -> Vec<(String, bool)> {
        let mut out = Vec::new();
        self.flatten_into(self.root(), None, &mut out);
        out
    }

    fn flatten_into(&self, id: NodeId, prefix: Option<&str>, out: &mut Vec<(String, bool)>) {
        for &child in self.children(id) {
            let Some(node) = self.node(child) else {
                continue;
            };
            let key = match prefix {
                Some(prefix) => format!("{prefix}{PATH_DELIMITER}{}", node.name()),
                None => node.name().to_string(),
            };
            match node.state() {
                CheckState::PartiallyEnabled => self.flatten_into(child, Some(&key), out),
                resolved => out.push((key, resolved == CheckState::Enabled)),
            }
        }
    }

    /// Replay persisted entries: register each path, then apply its state.
    ///
    /// Empty keys are skipped.
    pub fn apply_flat_list<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, bool)>,
        K: AsRef<str>,
    {
        for (key, enabled) in entries {
            let key = key.as_ref();
            if key.is_empty() {
                continue;
            }
            let path = split_path(key);
            self.add_path(&path);
            self.set_leaf_state(&path, enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::tree::tests::assert_invariant;
    use crate::filter::{CheckState, FilterTree};

    fn tree() -> FilterTree {
        let mut tree = FilterTree::new();
        tree.add_path(&["A", "B"]);
        tree.add_path(&["A", "C", "d"]);
        tree.add_path(&["A", "C", "e"]);
        tree.add_path(&["Z"]);
        tree
    }

    #[test]
    fn test_resolved_tree_is_compact() {
        let tree = tree();
        assert_eq!(
            tree.to_flat_list(),
            vec![("A".to_string(), true), ("Z".to_string(), true)]
        );
    }

    #[test]
    fn test_mixed_nodes_are_expanded() {
        let mut tree = tree();
        tree.set_leaf_state(&["A", "C", "e"], false);
        assert_eq!(
            tree.to_flat_list(),
            vec![
                ("A::B".to_string(), true),
                ("A::C::d".to_string(), true),
                ("A::C::e".to_string(), false),
                ("Z".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_apply_flat_list_restores_states() {
        let mut saved = tree();
        saved.set_leaf_state(&["A", "C", "e"], false);
        saved.set_leaf_state(&["Z"], false);
        let flat = saved.to_flat_list();

        let mut restored = FilterTree::new();
        restored.apply_flat_list(flat.iter().map(|(k, v)| (k.as_str(), *v)));
        assert_invariant(&restored);
        assert_eq!(restored.to_flat_list(), flat);
        assert!(!restored.is_visible(&["A", "C", "e"]));
        assert!(restored.is_visible(&["A", "C", "d"]));
        assert!(!restored.is_visible(&["Z"]));
    }

    #[test]
    fn test_disabled_subtree_entry_survives_new_children() {
        let mut restored = FilterTree::new();
        restored.apply_flat_list([("Net", false), ("", true)]);
        assert_eq!(restored.len(), 1);

        restored.add_path(&["Net", "tcp", "read"]);
        assert!(!restored.is_visible(&["Net", "tcp", "read"]));
        assert_eq!(
            restored.state(restored.find(&["Net"]).unwrap()),
            Some(CheckState::Disabled)
        );
        assert_invariant(&restored);
    }
}
