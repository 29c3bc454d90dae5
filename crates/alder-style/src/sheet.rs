//! Style sheets and selectors
//!
//! A sheet is an ordered list of complex selectors, each owning one
//! rule. Sheets are immutable after [`SheetBuilder::build`] and carry a
//! process-unique [`SheetId`]; everything downstream (cache keys, rule
//! memos) identifies a sheet by that id, never by value.
//!
//! Selector specificity and the pseudo-state masks are computed once at
//! build time from the selector's own shape and never touched again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use alder_tree::PseudoStates;
use smallvec::SmallVec;

use crate::SheetError;
use crate::schema::PropertyId;
use crate::values::{Color, Keyword, RawValue, ValuePool};

/// Specificity weight of an id selector part
const SPECIFICITY_ID: i32 = 100;
/// Specificity weight of a class or pseudo-class part
const SPECIFICITY_CLASS: i32 = 10;
/// Specificity weight of a type part
const SPECIFICITY_TYPE: i32 = 1;

/// Stable sheet identity, assigned at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SheetId(u32);

impl SheetId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        SheetId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Identity of one rule inside this sheet, used for cache keys
    #[inline]
    pub fn rule_key(self, selector_index: u32) -> u64 {
        ((self.0 as u64) << 32) | selector_index as u64
    }
}

/// Relation of a chain link to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Any depth below the previous link
    Descendant,
    /// Exactly one level below the previous link
    Child,
}

/// One match constraint inside a simple selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorPart {
    Wildcard,
    Type(Box<str>),
    Class(Box<str>),
    Id(Box<str>),
    PseudoClass(Box<str>),
}

/// A set of ANDed parts evaluated against one element
#[derive(Debug, Clone)]
pub struct SimpleSelector {
    pub parts: Vec<SelectorPart>,
    /// Pseudo-state bits the element must have
    pub required_states: PseudoStates,
    /// Pseudo-state bits the element must not have
    pub negated_states: PseudoStates,
}

/// One link of a complex selector chain
#[derive(Debug, Clone)]
pub struct SelectorLink {
    pub combinator: Combinator,
    pub selector: SimpleSelector,
}

/// A selector chain with its rule and precomputed specificity
#[derive(Debug)]
pub struct ComplexSelector {
    pub links: Vec<SelectorLink>,
    pub rule: Rule,
    pub specificity: i32,
}

/// Ordered property declarations, independent of any element
#[derive(Debug)]
pub struct Rule {
    pub declarations: Vec<Declaration>,
}

/// One `property: values` pair
#[derive(Debug)]
pub struct Declaration {
    pub property: Box<str>,
    pub values: SmallVec<[RawValue; 4]>,
}

/// Immutable, identity-keyed style sheet
#[derive(Debug)]
pub struct StyleSheet {
    id: SheetId,
    selectors: Vec<ComplexSelector>,
    pool: ValuePool,
}

impl StyleSheet {
    #[inline]
    pub fn id(&self) -> SheetId {
        self.id
    }

    #[inline]
    pub fn selectors(&self) -> &[ComplexSelector] {
        &self.selectors
    }

    pub fn rule_count(&self) -> usize {
        self.selectors.len()
    }

    pub fn read_float(&self, handle: RawValue) -> Option<f32> {
        self.pool.read_float(handle)
    }

    pub fn read_int(&self, handle: RawValue) -> Option<i32> {
        self.pool.read_int(handle)
    }

    pub fn read_bool(&self, handle: RawValue) -> Option<bool> {
        self.pool.read_bool(handle)
    }

    pub fn read_color(&self, handle: RawValue) -> Option<Color> {
        self.pool.read_color(handle)
    }

    pub fn read_keyword(&self, handle: RawValue) -> Option<Keyword> {
        self.pool.read_keyword(handle)
    }

    pub fn read_enum_name(&self, handle: RawValue) -> Option<&str> {
        self.pool.read_enum_name(handle)
    }

    pub fn read_str(&self, handle: RawValue) -> Option<&str> {
        self.pool.read_str(handle)
    }

    pub fn read_resource_path(&self, handle: RawValue) -> Option<&str> {
        self.pool.read_resource_path(handle)
    }
}

/// Required/negated state masks for one pseudo-class name
///
/// Unknown names constrain nothing; the selector is weaker, not
/// rejected.
fn pseudo_class_masks(name: &str) -> Option<(PseudoStates, PseudoStates)> {
    let empty = PseudoStates::EMPTY;
    Some(match name {
        "hover" => (PseudoStates::HOVER, empty),
        "active" => (PseudoStates::ACTIVE, empty),
        "inactive" => (empty, PseudoStates::ACTIVE),
        "focus" => (PseudoStates::FOCUS, empty),
        "selected" => (PseudoStates::SELECTED, empty),
        "checked" => (PseudoStates::CHECKED, empty),
        "disabled" => (PseudoStates::DISABLED, empty),
        "enabled" => (empty, PseudoStates::DISABLED),
        _ => return None,
    })
}

/// Specificity contribution of one part
fn part_specificity(part: &SelectorPart) -> i32 {
    match part {
        SelectorPart::Wildcard => 0,
        SelectorPart::Type(_) => SPECIFICITY_TYPE,
        SelectorPart::Class(_) | SelectorPart::PseudoClass(_) => SPECIFICITY_CLASS,
        SelectorPart::Id(_) => SPECIFICITY_ID,
    }
}

/// Builder for one simple selector
#[derive(Debug, Default)]
pub struct SimpleSelectorBuilder {
    parts: Vec<SelectorPart>,
}

impl SimpleSelectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wildcard(mut self) -> Self {
        self.parts.push(SelectorPart::Wildcard);
        self
    }

    pub fn type_name(mut self, name: &str) -> Self {
        self.parts.push(SelectorPart::Type(name.into()));
        self
    }

    pub fn class(mut self, name: &str) -> Self {
        self.parts.push(SelectorPart::Class(name.into()));
        self
    }

    pub fn id(mut self, name: &str) -> Self {
        self.parts.push(SelectorPart::Id(name.into()));
        self
    }

    pub fn pseudo(mut self, name: &str) -> Self {
        self.parts.push(SelectorPart::PseudoClass(name.into()));
        self
    }

    /// Resolve pseudo-class names into the two state masks
    fn finish(self) -> SimpleSelector {
        let mut required = PseudoStates::EMPTY;
        let mut negated = PseudoStates::EMPTY;
        for part in &self.parts {
            if let SelectorPart::PseudoClass(name) = part {
                match pseudo_class_masks(name) {
                    Some((req, neg)) => {
                        required = required.with(req);
                        negated = negated.with(neg);
                    }
                    None => {
                        tracing::warn!("unknown pseudo-class ':{}' ignored", name);
                    }
                }
            }
        }
        SimpleSelector {
            parts: self.parts,
            required_states: required,
            negated_states: negated,
        }
    }
}

/// Builder for a selector chain
#[derive(Debug)]
pub struct SelectorBuilder {
    links: Vec<(Combinator, SimpleSelectorBuilder)>,
}

impl SelectorBuilder {
    /// Start a chain at its leftmost simple selector
    pub fn simple(first: SimpleSelectorBuilder) -> Self {
        Self {
            // The first link's combinator is never consulted
            links: vec![(Combinator::Descendant, first)],
        }
    }

    /// Add a descendant-combinator link
    pub fn descendant(mut self, next: SimpleSelectorBuilder) -> Self {
        self.links.push((Combinator::Descendant, next));
        self
    }

    /// Add a child-combinator link
    pub fn child(mut self, next: SimpleSelectorBuilder) -> Self {
        self.links.push((Combinator::Child, next));
        self
    }
}

/// Builder value, interned into the sheet pools at build time
#[derive(Debug)]
enum BuilderValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Color(Color),
    Keyword(Keyword),
    EnumName(Box<str>),
    Str(Box<str>),
    Resource(Box<str>),
}

/// Builder for one rule body
#[derive(Debug, Default)]
pub struct RuleBuilder {
    declarations: Vec<(Box<str>, SmallVec<[BuilderValue; 4]>)>,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, property: &str, values: SmallVec<[BuilderValue; 4]>) -> Self {
        self.declarations.push((property.into(), values));
        self
    }

    pub fn float(self, property: &str, value: f32) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Float(value)])
    }

    /// Multi-value declaration, used by the shorthand properties
    pub fn floats(self, property: &str, values: &[f32]) -> Self {
        self.push(
            property,
            values.iter().map(|&v| BuilderValue::Float(v)).collect(),
        )
    }

    pub fn int(self, property: &str, value: i32) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Int(value)])
    }

    pub fn boolean(self, property: &str, value: bool) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Bool(value)])
    }

    pub fn color(self, property: &str, value: Color) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Color(value)])
    }

    pub fn keyword(self, property: &str, value: Keyword) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Keyword(value)])
    }

    pub fn enum_name(self, property: &str, value: &str) -> Self {
        self.push(
            property,
            smallvec::smallvec![BuilderValue::EnumName(value.into())],
        )
    }

    pub fn string(self, property: &str, value: &str) -> Self {
        self.push(property, smallvec::smallvec![BuilderValue::Str(value.into())])
    }

    pub fn resource(self, property: &str, path: &str) -> Self {
        self.push(
            property,
            smallvec::smallvec![BuilderValue::Resource(path.into())],
        )
    }
}

/// Builder producing an immutable [`StyleSheet`]
#[derive(Debug, Default)]
pub struct SheetBuilder {
    rules: Vec<(SelectorBuilder, RuleBuilder)>,
}

impl SheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `selector { rule }` pair, in cascade order
    pub fn rule(mut self, selector: SelectorBuilder, body: RuleBuilder) -> Self {
        self.rules.push((selector, body));
        self
    }

    pub fn build(self) -> Result<Arc<StyleSheet>, SheetError> {
        let mut pool = ValuePool::default();
        let mut selectors = Vec::with_capacity(self.rules.len());

        for (rule_index, (selector, body)) in self.rules.into_iter().enumerate() {
            if selector.links.is_empty() {
                return Err(SheetError::EmptySelector);
            }
            if body.declarations.is_empty() {
                return Err(SheetError::EmptyRule(rule_index));
            }

            let mut specificity = 0;
            let mut links = Vec::with_capacity(selector.links.len());
            for (combinator, simple) in selector.links {
                specificity += simple.parts.iter().map(part_specificity).sum::<i32>();
                links.push(SelectorLink {
                    combinator,
                    selector: simple.finish(),
                });
            }

            let mut declarations = Vec::with_capacity(body.declarations.len());
            for (property, values) in body.declarations {
                if let Some(id) = PropertyId::from_name(&property) {
                    if id.is_shorthand() && !(1..=4).contains(&values.len()) {
                        return Err(SheetError::BadShorthandArity {
                            property: property.into(),
                            count: values.len(),
                        });
                    }
                }
                let handles = values
                    .iter()
                    .map(|value| match value {
                        BuilderValue::Float(v) => pool.intern_float(*v),
                        BuilderValue::Int(v) => pool.intern_int(*v),
                        BuilderValue::Bool(v) => pool.intern_bool(*v),
                        BuilderValue::Color(v) => pool.intern_color(*v),
                        BuilderValue::Keyword(v) => pool.intern_keyword(*v),
                        BuilderValue::EnumName(v) => pool.intern_enum_name(v),
                        BuilderValue::Str(v) => pool.intern_string(v),
                        BuilderValue::Resource(v) => pool.intern_resource(v),
                    })
                    .collect();
                declarations.push(Declaration { property, values: handles });
            }

            selectors.push(ComplexSelector {
                links,
                rule: Rule { declarations },
                specificity,
            });
        }

        let id = SheetId::next();
        tracing::debug!("built sheet {:?} with {} rules", id, selectors.len());
        Ok(Arc::new(StyleSheet { id, selectors, pool }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specificity_weights() {
        let sheet = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(
                    SimpleSelectorBuilder::new().type_name("button").class("primary"),
                ),
                RuleBuilder::new().float("width", 10.0),
            )
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().id("header"))
                    .child(SimpleSelectorBuilder::new().wildcard()),
                RuleBuilder::new().float("width", 20.0),
            )
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().class("row").pseudo("hover")),
                RuleBuilder::new().float("width", 30.0),
            )
            .build()
            .unwrap();

        let specs: Vec<i32> = sheet.selectors().iter().map(|s| s.specificity).collect();
        assert_eq!(specs, vec![11, 100, 20]);
    }

    #[test]
    fn test_pseudo_masks_precomputed() {
        let sheet = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(
                    SimpleSelectorBuilder::new().pseudo("hover").pseudo("enabled"),
                ),
                RuleBuilder::new().float("opacity", 1.0),
            )
            .build()
            .unwrap();

        let simple = &sheet.selectors()[0].links[0].selector;
        assert_eq!(simple.required_states, PseudoStates::HOVER);
        assert_eq!(simple.negated_states, PseudoStates::DISABLED);
    }

    #[test]
    fn test_unknown_pseudo_contributes_nothing() {
        let sheet = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().pseudo("sparkly")),
                RuleBuilder::new().float("opacity", 0.5),
            )
            .build()
            .unwrap();

        let simple = &sheet.selectors()[0].links[0].selector;
        assert_eq!(simple.required_states, PseudoStates::EMPTY);
        assert_eq!(simple.negated_states, PseudoStates::EMPTY);
        // It still counts toward specificity like a class
        assert_eq!(sheet.selectors()[0].specificity, 10);
    }

    #[test]
    fn test_sheets_get_distinct_ids() {
        let build = || {
            SheetBuilder::new()
                .rule(
                    SelectorBuilder::simple(SimpleSelectorBuilder::new().wildcard()),
                    RuleBuilder::new().float("opacity", 1.0),
                )
                .build()
                .unwrap()
        };
        let a = build();
        let b = build();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_build_rejects_empty_rule() {
        let result = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().wildcard()),
                RuleBuilder::new(),
            )
            .build();
        assert!(matches!(result, Err(SheetError::EmptyRule(0))));
    }

    #[test]
    fn test_build_rejects_bad_shorthand_arity() {
        let result = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().wildcard()),
                RuleBuilder::new().floats("margin", &[1.0, 2.0, 3.0, 4.0, 5.0]),
            )
            .build();
        assert!(matches!(result, Err(SheetError::BadShorthandArity { .. })));
    }

    #[test]
    fn test_values_decode_through_sheet() {
        let sheet = SheetBuilder::new()
            .rule(
                SelectorBuilder::simple(SimpleSelectorBuilder::new().type_name("label")),
                RuleBuilder::new()
                    .float("font-size", 14.0)
                    .color("color", Color::rgb(20, 20, 20))
                    .enum_name("text-align", "center"),
            )
            .build()
            .unwrap();

        let decls = &sheet.selectors()[0].rule.declarations;
        assert_eq!(sheet.read_float(decls[0].values[0]), Some(14.0));
        assert_eq!(sheet.read_color(decls[1].values[0]), Some(Color::rgb(20, 20, 20)));
        assert_eq!(sheet.read_keyword(decls[2].values[0]), Some(Keyword::Center));
        // Kind-mismatched read is refused
        assert_eq!(sheet.read_color(decls[0].values[0]), None);
    }
}
