//! Alder Element Tree
//!
//! Arena-backed retained tree of UI elements. Each element carries the
//! identity the style engine matches against (type name, id, class list,
//! pseudo-state bitmask) plus two dirty flags that scope restyling to
//! changed subtrees.

mod element;
mod interner;
mod pseudo;
mod tree;

pub use element::Element;
pub use interner::{StringInterner, Symbol};
pub use pseudo::PseudoStates;
pub use tree::{Ancestors, Children, ElementTree, TreeError};

/// Element identifier (index into the tree arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Absent link (no parent, no sibling, ...)
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
