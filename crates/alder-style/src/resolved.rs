//! Resolved style records
//!
//! The output of the cascade: one typed slot per schema property, each
//! carrying the specificity that wrote it, plus a side table for custom
//! properties. Records are published into a shared cache and referenced
//! by many elements, so they are never mutated after publication.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::schema::PropertyId;
use crate::sheet::StyleSheet;
use crate::values::{Color, Keyword, RawValue, ResourceId, ValueKind};

/// One resolved value
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Unset,
    Float(f32),
    Int(i32),
    Bool(bool),
    Color(Color),
    Keyword(Keyword),
    Resource(ResourceId),
    Str(Arc<str>),
}

impl StyleValue {
    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, StyleValue::Unset)
    }
}

/// A property slot: value plus the specificity that wrote it
///
/// Specificity 0 means unset or base-layer seeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub value: StyleValue,
    pub specificity: i32,
}

impl Slot {
    pub(crate) const UNSET: Slot = Slot {
        value: StyleValue::Unset,
        specificity: 0,
    };
}

/// A custom-property entry: raw handles kept for lazy typed decoding
#[derive(Debug, Clone)]
pub struct CustomValue {
    pub specificity: i32,
    /// The sheet whose pools the handles index into
    pub sheet: Arc<StyleSheet>,
    pub handles: SmallVec<[RawValue; 4]>,
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        // Sheets compare by identity; handles are sheet-relative
        self.specificity == other.specificity
            && self.sheet.id() == other.sheet.id()
            && self.handles == other.handles
    }
}

/// Typed out-parameter for [`ResolvedStyle::apply_custom_property`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomProperty<T> {
    pub value: T,
    pub specificity: i32,
}

impl<T: CustomRead> Default for CustomProperty<T> {
    fn default() -> Self {
        Self {
            value: T::zero(),
            specificity: 0,
        }
    }
}

/// A type a custom property can be read as
pub trait CustomRead: Sized {
    /// The raw value kind this type decodes from
    const KIND: ValueKind;

    /// The value used when the property is absent or mistyped
    fn zero() -> Self;

    /// Decode one handle against its owning sheet
    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self>;
}

impl CustomRead for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn zero() -> Self {
        0.0
    }

    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self> {
        sheet.read_float(handle)
    }
}

impl CustomRead for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn zero() -> Self {
        0
    }

    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self> {
        sheet.read_int(handle)
    }
}

impl CustomRead for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn zero() -> Self {
        false
    }

    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self> {
        sheet.read_bool(handle)
    }
}

impl CustomRead for Color {
    const KIND: ValueKind = ValueKind::Color;

    fn zero() -> Self {
        Color::TRANSPARENT
    }

    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self> {
        sheet.read_color(handle)
    }
}

impl CustomRead for String {
    const KIND: ValueKind = ValueKind::Str;

    fn zero() -> Self {
        String::new()
    }

    fn read(sheet: &StyleSheet, handle: RawValue) -> Option<Self> {
        sheet.read_str(handle).map(str::to_owned)
    }
}

/// Final per-element style produced by the cascade
#[derive(Debug, PartialEq)]
pub struct ResolvedStyle {
    slots: Vec<Slot>,
    custom: HashMap<Box<str>, CustomValue>,
}

impl ResolvedStyle {
    /// A record with every slot unset
    pub(crate) fn unset() -> Self {
        Self {
            slots: vec![Slot::UNSET; PropertyId::COUNT],
            custom: HashMap::new(),
        }
    }

    #[inline]
    pub fn slot(&self, id: PropertyId) -> &Slot {
        &self.slots[id.index()]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, id: PropertyId) -> &mut Slot {
        &mut self.slots[id.index()]
    }

    /// Whether the cascade produced a value for this property
    pub fn is_set(&self, id: PropertyId) -> bool {
        !self.slot(id).value.is_unset()
    }

    pub fn float(&self, id: PropertyId) -> Option<f32> {
        match self.slot(id).value {
            StyleValue::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Specified-or-default read for float properties
    pub fn float_or(&self, id: PropertyId, default: f32) -> f32 {
        self.float(id).unwrap_or(default)
    }

    pub fn color(&self, id: PropertyId) -> Option<Color> {
        match self.slot(id).value {
            StyleValue::Color(v) => Some(v),
            _ => None,
        }
    }

    pub fn color_or(&self, id: PropertyId, default: Color) -> Color {
        self.color(id).unwrap_or(default)
    }

    pub fn keyword(&self, id: PropertyId) -> Option<Keyword> {
        match self.slot(id).value {
            StyleValue::Keyword(v) => Some(v),
            _ => None,
        }
    }

    pub fn keyword_or(&self, id: PropertyId, default: Keyword) -> Keyword {
        self.keyword(id).unwrap_or(default)
    }

    pub fn resource(&self, id: PropertyId) -> Option<ResourceId> {
        match self.slot(id).value {
            StyleValue::Resource(v) => Some(v),
            _ => None,
        }
    }

    pub fn resource_or(&self, id: PropertyId, default: ResourceId) -> ResourceId {
        self.resource(id).unwrap_or(default)
    }

    pub(crate) fn custom_entry(&self, name: &str) -> Option<&CustomValue> {
        self.custom.get(name)
    }

    /// Write a custom entry under the `>=` specificity policy
    pub(crate) fn write_custom(
        &mut self,
        name: &str,
        specificity: i32,
        sheet: &Arc<StyleSheet>,
        handles: &[RawValue],
    ) {
        match self.custom.get_mut(name) {
            Some(existing) => {
                if specificity >= existing.specificity {
                    existing.specificity = specificity;
                    existing.sheet = Arc::clone(sheet);
                    existing.handles = SmallVec::from_slice(handles);
                }
            }
            None => {
                self.custom.insert(
                    name.into(),
                    CustomValue {
                        specificity,
                        sheet: Arc::clone(sheet),
                        handles: SmallVec::from_slice(handles),
                    },
                );
            }
        }
    }

    /// Names of all custom properties the cascade collected
    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(|k| k.as_ref())
    }

    /// Read a custom property into a typed slot, decoding lazily
    ///
    /// Returns true when the slot received a cascade value. A kind
    /// mismatch between the declared raw value and the requested type
    /// logs a warning and leaves the slot at the type's zero value with
    /// specificity 0.
    pub fn apply_custom_property<T: CustomRead>(
        &self,
        name: &str,
        slot: &mut CustomProperty<T>,
    ) -> bool {
        let Some(entry) = self.custom.get(name) else {
            return false;
        };
        let Some(&handle) = entry.handles.first() else {
            return false;
        };

        if handle.kind != T::KIND {
            tracing::warn!(
                "custom property '{}' declared as {:?}, read as {:?}",
                name,
                handle.kind,
                T::KIND
            );
            slot.value = T::zero();
            slot.specificity = 0;
            return false;
        }

        match T::read(&entry.sheet, handle) {
            Some(value) => {
                slot.value = value;
                slot.specificity = entry.specificity;
                true
            }
            None => {
                tracing::warn!("custom property '{}' has a dangling value handle", name);
                slot.value = T::zero();
                slot.specificity = 0;
                false
            }
        }
    }

    /// Raw resource path of a resource-kind custom property
    pub fn custom_resource_path(&self, name: &str) -> Option<&str> {
        let entry = self.custom.get(name)?;
        let &handle = entry.handles.first()?;
        entry.sheet.read_resource_path(handle)
    }
}
