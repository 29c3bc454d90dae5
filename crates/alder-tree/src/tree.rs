//! Element tree (arena-based allocation)
//!
//! Owns the element arena and the name interner. Every mutation that can
//! change selector matching (class list, id, pseudo states, structure)
//! marks the element dirty and propagates a path-dirty flag to its
//! ancestors, so a style pass only descends into changed subtrees.

use crate::{Element, NodeId, PseudoStates, Symbol};

/// Structural operation errors
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("node {0:?} is not in this tree")]
    InvalidNode(NodeId),
    #[error("node {0:?} cannot be its own ancestor")]
    WouldCycle(NodeId),
}

/// Arena-based element tree
#[derive(Debug)]
pub struct ElementTree {
    nodes: Vec<Element>,
    interner: crate::StringInterner,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            interner: crate::StringInterner::new(),
        }
    }

    /// Create a detached element of the given type
    pub fn create_element(&mut self, type_name: &str) -> NodeId {
        let symbol = self.interner.intern(type_name);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Element::new(symbol));
        id
    }

    /// Get an element by id
    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.index())
    }

    /// Get a mutable element by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.index())
    }

    /// Number of elements in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The name interner backing this tree
    pub fn interner(&self) -> &crate::StringInterner {
        &self.interner
    }

    /// Intern a name into this tree's interner
    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    /// Resolve an interned symbol back to its string
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.get(parent).is_none() {
            return Err(TreeError::InvalidNode(parent));
        }
        if self.get(child).is_none() {
            return Err(TreeError::InvalidNode(child));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::WouldCycle(child));
        }

        let prev_last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev_last;
            node.next_sibling = NodeId::NONE;
        }
        if prev_last.is_none() {
            self.nodes[parent.index()].first_child = child;
        } else {
            self.nodes[prev_last.index()].next_sibling = child;
        }
        self.nodes[parent.index()].last_child = child;

        // The child subtree matches against a new ancestor path now
        self.mark_styles_dirty(child);
        Ok(())
    }

    /// Iterate the children of `parent`, first to last
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        Children { tree: self, next: first }
    }

    /// Iterate the ancestors of `node`, nearest first
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        let parent = self.get(node).map_or(NodeId::NONE, |n| n.parent);
        Ancestors { tree: self, next: parent }
    }

    /// Set the element's id name, replacing any previous one
    pub fn set_id(&mut self, node: NodeId, id: &str) {
        let symbol = self.interner.intern(id);
        if let Some(element) = self.nodes.get_mut(node.index()) {
            element.id = Some(symbol);
            self.mark_styles_dirty(node);
        }
    }

    /// Add a class to the element's class list
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        let symbol = self.interner.intern(class);
        if let Some(element) = self.nodes.get_mut(node.index()) {
            if !element.classes.contains(&symbol) {
                element.classes.push(symbol);
                self.mark_styles_dirty(node);
            }
        }
    }

    /// Remove a class from the element's class list
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(symbol) = self.interner.lookup(class) else {
            return;
        };
        if let Some(element) = self.nodes.get_mut(node.index()) {
            if let Some(pos) = element.classes.iter().position(|&c| c == symbol) {
                element.classes.remove(pos);
                self.mark_styles_dirty(node);
            }
        }
    }

    /// Replace the element's whole pseudo-state mask
    pub fn set_pseudo_states(&mut self, node: NodeId, states: PseudoStates) {
        if let Some(element) = self.nodes.get_mut(node.index()) {
            if element.pseudo_states != states {
                element.pseudo_states = states;
                self.mark_styles_dirty(node);
            }
        }
    }

    /// Set one pseudo-state flag
    pub fn insert_pseudo_state(&mut self, node: NodeId, state: PseudoStates) {
        if let Some(element) = self.get(node) {
            let states = element.pseudo_states.with(state);
            self.set_pseudo_states(node, states);
        }
    }

    /// Clear one pseudo-state flag
    pub fn remove_pseudo_state(&mut self, node: NodeId, state: PseudoStates) {
        if let Some(element) = self.get(node) {
            let states = element.pseudo_states.without(state);
            self.set_pseudo_states(node, states);
        }
    }

    /// Mark `node` as needing restyle and flag the path down to it
    ///
    /// Ancestors get `styles_path_dirty` so a style pass can find the
    /// dirty subtree without visiting clean siblings. Propagation stops
    /// at the first ancestor already on a dirty path.
    pub fn mark_styles_dirty(&mut self, node: NodeId) {
        let Some(element) = self.nodes.get_mut(node.index()) else {
            return;
        };
        element.styles_dirty = true;
        tracing::trace!("style invalidated: node {}", node.0);

        let mut current = element.parent;
        while !current.is_none() {
            let ancestor = &mut self.nodes[current.index()];
            if ancestor.styles_path_dirty {
                break;
            }
            ancestor.styles_path_dirty = true;
            current = ancestor.parent;
        }
    }

    /// Mark `node` and every descendant as needing restyle
    ///
    /// Used when a sheet attached at `node` changes: every descendant's
    /// matched-rule set is suspect, not just the root's.
    pub fn mark_subtree_styles_dirty(&mut self, node: NodeId) {
        if self.get(node).is_none() {
            return;
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(element) = self.nodes.get_mut(current.index()) {
                element.styles_dirty = true;
            }
            let mut child = self.get(current).map_or(NodeId::NONE, |n| n.first_child);
            while !child.is_none() {
                stack.push(child);
                child = self.get(child).map_or(NodeId::NONE, |n| n.next_sibling);
            }
        }
        // Flag the path above the subtree root
        self.mark_styles_dirty(node);
    }

    /// Clear both dirty flags, done by the style engine after a pass
    pub fn clear_dirty(&mut self, node: NodeId) {
        if let Some(element) = self.nodes.get_mut(node.index()) {
            element.styles_dirty = false;
            element.styles_path_dirty = false;
        }
    }
}

/// Iterator over the children of one element
pub struct Children<'a> {
    tree: &'a ElementTree,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over the ancestors of one element, nearest first
pub struct Ancestors<'a> {
    tree: &'a ElementTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next.is_none() {
            return None;
        }
        let current = self.next;
        self.next = self.tree.get(current).map_or(NodeId::NONE, |n| n.parent);
        Some(current)
    }
}
