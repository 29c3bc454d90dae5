//! Simple-selector matching
//!
//! Pure predicate: does one simple selector match one element. All parts
//! must hold (AND semantics). Pseudo-class parts are not evaluated per
//! part; their constraints were folded into the selector's two state
//! masks at sheet build time and are tested with two bitwise ops.

use alder_tree::{Element, ElementTree};

use crate::sheet::{SelectorPart, SimpleSelector};

/// Match one simple selector against one element
///
/// No side effects; the walk decides what to do with the result.
pub fn matches_simple(tree: &ElementTree, element: &Element, selector: &SimpleSelector) -> bool {
    // State masks first: required bits all present, negated bits all
    // absent
    if !element.pseudo_states.contains_all(selector.required_states) {
        return false;
    }
    if element.pseudo_states.intersects(selector.negated_states) {
        return false;
    }

    for part in &selector.parts {
        let holds = match part {
            SelectorPart::Wildcard => true,
            SelectorPart::Type(name) => tree.resolve(element.type_name) == name.as_ref(),
            SelectorPart::Class(name) => match tree.interner().lookup(name) {
                Some(symbol) => element.has_class(symbol),
                // A class name no element ever carried cannot match
                None => false,
            },
            SelectorPart::Id(name) => match (element.id, tree.interner().lookup(name)) {
                (Some(id), Some(symbol)) => id == symbol,
                _ => false,
            },
            // Constraints already applied through the masks above
            SelectorPart::PseudoClass(_) => true,
        };
        if !holds {
            return false;
        }
    }

    true
}
