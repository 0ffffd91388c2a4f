//! Arena-backed tri-state filter tree.
//!
//! Nodes live in a slot vector and are addressed by [`NodeId`]. Parents own
//! their children through id lists; the parent back-reference is used for
//! lookups only. State changes flow in one direction per call:
//! [`FilterTree::set_leaf_state`] recomputes ancestors bottom-up and
//! [`FilterTree::set_subtree_state`] forces descendants top-down before
//! recomputing ancestors.

use serde::{Deserialize, Serialize};

/// Index of a node inside a [`FilterTree`].
///
/// Slots of removed nodes are reused, so an id must not be kept across a
/// removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Tri-state enablement of a node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckState {
    #[default]
    Enabled,
    Disabled,
    PartiallyEnabled,
}

impl CheckState {
    pub fn from_bool(enabled: bool) -> Self {
        if enabled {
            CheckState::Enabled
        } else {
            CheckState::Disabled
        }
    }

    /// `Some(bool)` for a resolved state, `None` when mixed
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CheckState::Enabled => Some(true),
            CheckState::Disabled => Some(false),
            CheckState::PartiallyEnabled => None,
        }
    }

    /// Mixed states collapse to Enabled
    pub fn normalized(self) -> Self {
        match self {
            CheckState::PartiallyEnabled => CheckState::Enabled,
            resolved => resolved,
        }
    }
}

/// One segment of a source path
#[derive(Clone, Debug)]
pub struct FilterNode {
    name: String,
    state: CheckState,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(super) hidden: bool,
    pub(super) expanded: bool,
}

impl FilterNode {
    fn new(name: String, state: CheckState, parent: Option<NodeId>) -> Self {
        Self {
            name,
            state,
            parent,
            children: Vec::new(),
            hidden: false,
            expanded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion (or last sorted) order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Hidden by the last search
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Expanded by the last search
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}

/// Hierarchical enable/disable filter over source paths
#[derive(Clone, Debug)]
pub struct FilterTree {
    nodes: Vec<Option<FilterNode>>,
    free: Vec<usize>,
}

impl Default for FilterTree {
    fn default() -> Self {
        Self::new()
    }
}

const ROOT: NodeId = NodeId(0);

impl FilterTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(FilterNode::new(String::new(), CheckState::Enabled, None))],
            free: Vec::new(),
        }
    }

    /// The synthetic node standing for all paths
    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&FilterNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> Option<&mut FilterNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(FilterNode::children).unwrap_or_default()
    }

    pub fn state(&self, id: NodeId) -> Option<CheckState> {
        self.node(id).map(FilterNode::state)
    }

    /// Aggregate state of the whole tree, shown as the "select all" control
    pub fn select_all_state(&self) -> CheckState {
        self.state(ROOT).unwrap_or_default()
    }

    /// Number of nodes, not counting the root
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.children(ROOT).is_empty()
    }

    /// Remove every node and re-enable the root
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.node(child).is_some_and(|n| n.name == name))
    }

    /// Look up the node for a path; the empty path is the root
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter()
            .try_fold(ROOT, |current, segment| self.child_named(current, segment.as_ref()))
    }

    /// Segment names from the root down to `id`
    pub fn path_of(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            if node.parent.is_none() {
                break;
            }
            path.push(node.name.clone());
            current = node.parent;
        }
        path.reverse();
        path
    }

    fn insert(&mut self, parent: NodeId, name: &str) -> NodeId {
        // A new node under a resolved parent takes the parent's state so the
        // parent stays resolved; under a mixed parent it starts enabled.
        let state = self
            .state(parent)
            .map(CheckState::normalized)
            .unwrap_or_default();
        let node = FilterNode::new(name.to_string(), state, Some(parent));

        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Register a path, creating missing segments. Idempotent.
    pub fn add_path<S: AsRef<str>>(&mut self, path: &[S]) -> NodeId {
        let mut current = ROOT;
        let mut created = false;
        for segment in path {
            let segment = segment.as_ref();
            current = match self.child_named(current, segment) {
                Some(child) => child,
                None => {
                    created = true;
                    self.insert(current, segment)
                }
            };
        }
        if created {
            let parent = self.node(current).and_then(|n| n.parent);
            self.recompute_ancestors(parent);
        }
        current
    }

    /// Whether records from `path` should be shown.
    ///
    /// Unknown segments and lookups that end inside a mixed node are
    /// visible, so sources that were never registered are not hidden.
    pub fn is_visible<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let mut current = ROOT;
        for segment in path {
            let Some(child) = self.child_named(current, segment.as_ref()) else {
                return true;
            };
            match self.state(child) {
                Some(CheckState::Enabled) => return true,
                Some(CheckState::Disabled) => return false,
                Some(CheckState::PartiallyEnabled) => current = child,
                None => return true,
            }
        }
        true
    }

    /// Set the state of the node at `path` and recompute its ancestors.
    ///
    /// A node that has children is forced together with its subtree.
    /// Returns `false` if the path is not registered.
    pub fn set_leaf_state<S: AsRef<str>>(&mut self, path: &[S], enabled: bool) -> bool {
        match self.find(path) {
            Some(id) => self.set_node_state(id, enabled),
            None => false,
        }
    }

    /// Set a node by id; see [`FilterTree::set_leaf_state`]
    pub fn set_node_state(&mut self, id: NodeId, enabled: bool) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if !node.children.is_empty() {
            return self.set_subtree_state(id, CheckState::from_bool(enabled));
        }
        node.state = CheckState::from_bool(enabled);
        let parent = node.parent;
        self.recompute_ancestors(parent);
        true
    }

    /// Force `id` and every descendant to one resolved state, then
    /// recompute the ancestors. A mixed target state counts as Enabled.
    pub fn set_subtree_state(&mut self, id: NodeId, state: CheckState) -> bool {
        if !self.contains(id) {
            return false;
        }
        let state = state.normalized();

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                node.state = state;
                stack.extend(node.children.iter().copied());
            }
        }

        let parent = self.node(id).and_then(|n| n.parent);
        self.recompute_ancestors(parent);
        true
    }

    /// Clicking a checkbox: Enabled turns Disabled, anything else Enabled
    pub fn click(&mut self, id: NodeId) -> Option<CheckState> {
        let next = match self.state(id)? {
            CheckState::Enabled => CheckState::Disabled,
            CheckState::Disabled | CheckState::PartiallyEnabled => CheckState::Enabled,
        };
        self.set_subtree_state(id, next);
        Some(next)
    }

    fn aggregate(&self, id: NodeId) -> Option<CheckState> {
        let node = self.node(id)?;
        let mut any_on = false;
        let mut any_off = false;
        for state in node.children.iter().filter_map(|&c| self.state(c)) {
            match state {
                CheckState::Enabled => any_on = true,
                CheckState::Disabled => any_off = true,
                CheckState::PartiallyEnabled => {
                    any_on = true;
                    any_off = true;
                }
            }
        }
        Some(match (any_on, any_off) {
            (true, false) => CheckState::Enabled,
            (false, true) => CheckState::Disabled,
            (true, true) => CheckState::PartiallyEnabled,
            // leaf: keep its own resolved state
            (false, false) => node.state.normalized(),
        })
    }

    /// Walk from `start` up to the root recomputing each tri-state
    fn recompute_ancestors(&mut self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            let Some(state) = self.aggregate(id) else {
                break;
            };
            let Some(node) = self.node_mut(id) else {
                break;
            };
            node.state = state;
            current = node.parent;
        }
    }

    /// Remove a node and its subtree. Removing the root clears the tree.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == ROOT {
            self.clear();
            return true;
        }
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return false;
        };

        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current.0);
            }
        }

        self.recompute_ancestors(Some(parent));
        true
    }

    /// Remove the node registered for a non-empty path
    pub fn remove_path<S: AsRef<str>>(&mut self, path: &[S]) -> bool {
        if path.is_empty() {
            return false;
        }
        match self.find(path) {
            Some(id) => self.remove_node(id),
            None => false,
        }
    }

    /// Sort every child list by name
    pub fn sort_by_name(&mut self) {
        for index in 0..self.nodes.len() {
            let Some(node) = self.nodes[index].as_mut() else {
                continue;
            };
            let mut children = std::mem::take(&mut node.children);
            children.sort_by(|&a, &b| {
                let name = |id: NodeId| self.node(id).map(FilterNode::name).unwrap_or_default();
                name(a).cmp(name(b))
            });
            if let Some(node) = self.nodes[index].as_mut() {
                node.children = children;
            }
        }
    }

    /// Ids below `id` in depth-first order, parents before children
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }
}
