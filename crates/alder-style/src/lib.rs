//! Alder Style Engine
//!
//! Computes the effective per-element style for a retained UI tree by:
//! 1. Matching selector chains against elements during a dirty-scoped
//!    depth-first walk
//! 2. Applying matched rules in discovery order under a specificity gate
//! 3. Sharing resolved records through a content-addressed cache keyed
//!    by the matched-rule set
//!
//! Style sheets are immutable once built and identified by a stable id,
//! never by value. All shared state (the resolved-style cache, the
//! per-rule property-id memos, the base-style table) is owned by an
//! explicitly constructed [`StyleEngine`] rather than process statics.

mod apply;
mod cache;
mod engine;
mod matcher;
mod resolved;
mod schema;
mod sheet;
mod values;
mod walker;

pub use apply::{ApplyMode, SPECIFICITY_BASE, SPECIFICITY_INLINE};
pub use cache::{StyleCache, StyleStats};
pub use engine::{ResourceTable, StyleEngine};
pub use matcher::matches_simple;
pub use resolved::{CustomProperty, CustomRead, CustomValue, ResolvedStyle, Slot, StyleValue};
pub use schema::PropertyId;
pub use sheet::{
    Combinator, ComplexSelector, Declaration, Rule, RuleBuilder, SelectorBuilder, SelectorLink,
    SelectorPart, SheetBuilder, SheetId, SimpleSelector, SimpleSelectorBuilder, StyleSheet,
};
pub use values::{Color, Keyword, RawValue, ResourceId, ValueKind};

/// Sheet construction error
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("selector chain has no links")]
    EmptySelector,
    #[error("rule {0} declares no properties")]
    EmptyRule(usize),
    #[error("shorthand '{property}' takes 1 to 4 values, got {count}")]
    BadShorthandArity { property: String, count: usize },
}
