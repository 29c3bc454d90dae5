//! Element - Compact retained UI node
//!
//! Link fields are [`NodeId`]s into the tree arena rather than pointers,
//! keeping the struct small and the tree relocatable. The fields the
//! style engine matches against (type name, id, classes, pseudo states)
//! are cached here as interned symbols.

use smallvec::SmallVec;

use crate::{NodeId, PseudoStates, Symbol};

/// One retained UI element
#[derive(Debug)]
pub struct Element {
    /// Parent element (NONE if root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,

    /// Element type name ("button", "panel", ...)
    pub type_name: Symbol,
    /// Optional unique name, matched by id selectors
    pub id: Option<Symbol>,
    /// Class list - inline for the common small counts
    pub classes: SmallVec<[Symbol; 4]>,
    /// Interaction state flags, matched by pseudo-class selectors
    pub pseudo_states: PseudoStates,

    /// This element needs its style recomputed
    pub styles_dirty: bool,
    /// Some descendant needs its style recomputed
    pub styles_path_dirty: bool,
}

impl Element {
    pub(crate) fn new(type_name: Symbol) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            type_name,
            id: None,
            classes: SmallVec::new(),
            pseudo_states: PseudoStates::EMPTY,
            // New elements have never been styled
            styles_dirty: true,
            styles_path_dirty: false,
        }
    }

    /// Whether this element carries the given class symbol
    #[inline]
    pub fn has_class(&self, class: Symbol) -> bool {
        self.classes.contains(&class)
    }

    /// Either dirty flag set
    #[inline]
    pub fn needs_style_pass(&self) -> bool {
        self.styles_dirty || self.styles_path_dirty
    }
}
