//! Specificity-ordered property application
//!
//! Builds one [`ResolvedStyle`] from a base seed, the matched rules in
//! walker discovery order, and any inline overrides. Matched rules are
//! NOT sorted by specificity first: each slot write is gated by a
//! `>=` compare, so a higher-specificity value survives later
//! lower-specificity writes, and among equals the later-discovered rule
//! wins. That exact policy is load-bearing for consumers and covered by
//! tests.

use smallvec::SmallVec;

use crate::engine::{InlineDeclarations, ResourceTable};
use crate::resolved::{ResolvedStyle, StyleValue};
use crate::schema::{PropertyId, RulePropertyCache, shorthand_value_indices};
use crate::sheet::{Declaration, StyleSheet};
use crate::values::{ResourceId, ValueKind};
use crate::walker::MatchedRule;

/// Specificity of the base/default seed layer
pub const SPECIFICITY_BASE: i32 = 0;
/// Specificity of inline/instance overrides; always wins, never loses
pub const SPECIFICITY_INLINE: i32 = i32::MAX;

/// How a value is written into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Unconditional overwrite; only the base seed uses this
    Copy,
    /// Overwrite iff incoming specificity >= the slot's. The normal
    /// cascade rule: last writer among equal-or-higher wins.
    CopyIfSpecificityGreaterOrEqual,
    /// Overwrite unless the slot already holds an inline override
    CopyIfNotAtMaxSpecificity,
}

/// Write one value into one slot under the given mode
pub(crate) fn write_slot(
    style: &mut ResolvedStyle,
    id: PropertyId,
    value: StyleValue,
    specificity: i32,
    mode: ApplyMode,
) {
    let slot = style.slot_mut(id);
    let write = match mode {
        ApplyMode::Copy => true,
        ApplyMode::CopyIfSpecificityGreaterOrEqual => specificity >= slot.specificity,
        ApplyMode::CopyIfNotAtMaxSpecificity => slot.specificity != SPECIFICITY_INLINE,
    };
    if write {
        slot.value = value;
        slot.specificity = specificity;
    }
}

/// Build the resolved record for one element
///
/// `matched` must be in the walker's discovery order.
pub(crate) fn build_resolved_style(
    base: Option<&[(PropertyId, StyleValue)]>,
    matched: &[MatchedRule],
    inline: Option<&InlineDeclarations>,
    rule_props: &mut RulePropertyCache,
    resources: &ResourceTable,
) -> ResolvedStyle {
    let mut style = ResolvedStyle::unset();

    if let Some(base) = base {
        for (id, value) in base {
            write_slot(&mut style, *id, value.clone(), SPECIFICITY_BASE, ApplyMode::Copy);
        }
    }

    for rule in matched {
        let ids = rule_props.get_or_build(&rule.sheet, rule.selector_index);
        let selector = &rule.sheet.selectors()[rule.selector_index as usize];
        for (decl, id) in selector.rule.declarations.iter().zip(ids.iter()) {
            match id {
                Some(property) => apply_declaration(
                    &mut style,
                    &rule.sheet,
                    decl,
                    *property,
                    rule.specificity,
                    ApplyMode::CopyIfSpecificityGreaterOrEqual,
                    resources,
                ),
                None => {
                    style.write_custom(&decl.property, rule.specificity, &rule.sheet, &decl.values);
                }
            }
        }
    }

    if let Some(inline) = inline {
        for (id, value) in &inline.declarations {
            write_slot(
                &mut style,
                *id,
                value.clone(),
                SPECIFICITY_INLINE,
                ApplyMode::CopyIfNotAtMaxSpecificity,
            );
        }
    }

    style
}

/// Decode one declaration and write it, fanning out shorthands
fn apply_declaration(
    style: &mut ResolvedStyle,
    sheet: &StyleSheet,
    decl: &Declaration,
    property: PropertyId,
    specificity: i32,
    mode: ApplyMode,
    resources: &ResourceTable,
) {
    if let Some(targets) = property.expansion() {
        let mut values: SmallVec<[f32; 4]> = SmallVec::new();
        for &handle in &decl.values {
            match sheet.read_float(handle) {
                Some(v) => values.push(v),
                None => {
                    tracing::warn!("shorthand '{}' has a non-numeric value", decl.property);
                    return;
                }
            }
        }
        let Some(indices) = shorthand_value_indices(values.len()) else {
            tracing::warn!("shorthand '{}' has {} values", decl.property, values.len());
            return;
        };
        for (target, value_index) in targets.into_iter().zip(indices) {
            write_slot(style, target, StyleValue::Float(values[value_index]), specificity, mode);
        }
        return;
    }

    let Some(&handle) = decl.values.first() else {
        return;
    };

    if property.value_kind() == ValueKind::Resource {
        apply_resource(style, sheet, decl, property, handle, specificity, mode, resources);
        return;
    }

    let value = match property.value_kind() {
        ValueKind::Float => sheet.read_float(handle).map(StyleValue::Float),
        ValueKind::Keyword => sheet.read_keyword(handle).map(StyleValue::Keyword),
        ValueKind::Color => sheet.read_color(handle).map(StyleValue::Color),
        ValueKind::Resource
        | ValueKind::Int
        | ValueKind::Bool
        | ValueKind::EnumName
        | ValueKind::Str => None,
    };

    match value {
        Some(value) => write_slot(style, property, value, specificity, mode),
        None => {
            tracing::warn!(
                "property '{}' has a value of the wrong kind ({:?} expected)",
                decl.property,
                property.value_kind()
            );
        }
    }
}

/// Resolve a resource declaration against the engine's table
///
/// Unresolved texture paths are substituted with the placeholder so
/// the slot is never left silently unset; other resource properties
/// stay unset.
fn apply_resource(
    style: &mut ResolvedStyle,
    sheet: &StyleSheet,
    decl: &Declaration,
    property: PropertyId,
    handle: crate::values::RawValue,
    specificity: i32,
    mode: ApplyMode,
    resources: &ResourceTable,
) {
    let Some(path) = sheet.read_resource_path(handle) else {
        tracing::warn!("property '{}' expects a resource path", decl.property);
        return;
    };
    match resources.resolve(path) {
        Some(id) => write_slot(style, property, StyleValue::Resource(id), specificity, mode),
        None => {
            tracing::warn!("unresolved resource '{}' for '{}'", path, decl.property);
            if property == PropertyId::BackgroundImage {
                write_slot(
                    style,
                    property,
                    StyleValue::Resource(ResourceId::PLACEHOLDER),
                    specificity,
                    mode,
                );
            }
        }
    }
}
