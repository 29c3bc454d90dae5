//! Property schema
//!
//! Closed enumeration of the style properties the engine understands,
//! including the three shorthands. Names outside this set are custom
//! properties and go to the resolved style's side table.
//!
//! The applicator dispatches over [`PropertyId`] with wildcard-free
//! `match` expressions, so adding an enumerant without teaching every
//! dispatch site about it is a compile error, not a runtime surprise.

use std::collections::HashMap;
use std::sync::Arc;

use crate::sheet::StyleSheet;
use crate::values::ValueKind;

/// Property identifier - uses enum for type safety and memory efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PropertyId {
    // Box model
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,

    // Flex
    FlexGrow,
    FlexShrink,
    FlexBasis,
    FlexDirection,
    JustifyContent,
    AlignItems,
    AlignSelf,

    // Positioning
    Position,
    Top,
    Right,
    Bottom,
    Left,

    // Margin (shorthand + sides)
    Margin,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,

    // Padding (shorthand + sides)
    Padding,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,

    // Border
    BorderWidth,
    BorderColor,
    BorderRadius,
    BorderTopLeftRadius,
    BorderTopRightRadius,
    BorderBottomRightRadius,
    BorderBottomLeftRadius,

    // Paint
    Color,
    BackgroundColor,
    BackgroundImage,
    Opacity,

    // Text
    FontSize,
    Font,
    TextAlign,

    // Visibility
    Display,
    Visibility,
    Overflow,
}

impl PropertyId {
    /// Every enumerant, in declaration order
    pub const ALL: [PropertyId; 45] = [
        Self::Width,
        Self::Height,
        Self::MinWidth,
        Self::MinHeight,
        Self::MaxWidth,
        Self::MaxHeight,
        Self::FlexGrow,
        Self::FlexShrink,
        Self::FlexBasis,
        Self::FlexDirection,
        Self::JustifyContent,
        Self::AlignItems,
        Self::AlignSelf,
        Self::Position,
        Self::Top,
        Self::Right,
        Self::Bottom,
        Self::Left,
        Self::Margin,
        Self::MarginTop,
        Self::MarginRight,
        Self::MarginBottom,
        Self::MarginLeft,
        Self::Padding,
        Self::PaddingTop,
        Self::PaddingRight,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::BorderWidth,
        Self::BorderColor,
        Self::BorderRadius,
        Self::BorderTopLeftRadius,
        Self::BorderTopRightRadius,
        Self::BorderBottomRightRadius,
        Self::BorderBottomLeftRadius,
        Self::Color,
        Self::BackgroundColor,
        Self::BackgroundImage,
        Self::Opacity,
        Self::FontSize,
        Self::Font,
        Self::TextAlign,
        Self::Display,
        Self::Visibility,
        Self::Overflow,
    ];

    /// Number of properties in the closed schema
    pub const COUNT: usize = Self::ALL.len();

    /// Slot index of this property
    #[inline]
    pub fn index(self) -> usize {
        self as u16 as usize
    }

    /// Parse a property name into a PropertyId
    ///
    /// `None` means the name is outside the closed schema and is treated
    /// as a custom property.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "width" => Self::Width,
            "height" => Self::Height,
            "min-width" => Self::MinWidth,
            "min-height" => Self::MinHeight,
            "max-width" => Self::MaxWidth,
            "max-height" => Self::MaxHeight,

            "flex-grow" => Self::FlexGrow,
            "flex-shrink" => Self::FlexShrink,
            "flex-basis" => Self::FlexBasis,
            "flex-direction" => Self::FlexDirection,
            "justify-content" => Self::JustifyContent,
            "align-items" => Self::AlignItems,
            "align-self" => Self::AlignSelf,

            "position" => Self::Position,
            "top" => Self::Top,
            "right" => Self::Right,
            "bottom" => Self::Bottom,
            "left" => Self::Left,

            "margin" => Self::Margin,
            "margin-top" => Self::MarginTop,
            "margin-right" => Self::MarginRight,
            "margin-bottom" => Self::MarginBottom,
            "margin-left" => Self::MarginLeft,

            "padding" => Self::Padding,
            "padding-top" => Self::PaddingTop,
            "padding-right" => Self::PaddingRight,
            "padding-bottom" => Self::PaddingBottom,
            "padding-left" => Self::PaddingLeft,

            "border-width" => Self::BorderWidth,
            "border-color" => Self::BorderColor,
            "border-radius" => Self::BorderRadius,
            "border-top-left-radius" => Self::BorderTopLeftRadius,
            "border-top-right-radius" => Self::BorderTopRightRadius,
            "border-bottom-right-radius" => Self::BorderBottomRightRadius,
            "border-bottom-left-radius" => Self::BorderBottomLeftRadius,

            "color" => Self::Color,
            "background-color" => Self::BackgroundColor,
            "background-image" => Self::BackgroundImage,
            "opacity" => Self::Opacity,

            "font-size" => Self::FontSize,
            "font" => Self::Font,
            "text-align" => Self::TextAlign,

            "display" => Self::Display,
            "visibility" => Self::Visibility,
            "overflow" => Self::Overflow,

            _ => return None,
        })
    }

    /// The value kind stored in this property's slot
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Width
            | Self::Height
            | Self::MinWidth
            | Self::MinHeight
            | Self::MaxWidth
            | Self::MaxHeight
            | Self::FlexGrow
            | Self::FlexShrink
            | Self::FlexBasis
            | Self::Top
            | Self::Right
            | Self::Bottom
            | Self::Left
            | Self::Margin
            | Self::MarginTop
            | Self::MarginRight
            | Self::MarginBottom
            | Self::MarginLeft
            | Self::Padding
            | Self::PaddingTop
            | Self::PaddingRight
            | Self::PaddingBottom
            | Self::PaddingLeft
            | Self::BorderWidth
            | Self::BorderRadius
            | Self::BorderTopLeftRadius
            | Self::BorderTopRightRadius
            | Self::BorderBottomRightRadius
            | Self::BorderBottomLeftRadius
            | Self::Opacity
            | Self::FontSize => ValueKind::Float,

            Self::FlexDirection
            | Self::JustifyContent
            | Self::AlignItems
            | Self::AlignSelf
            | Self::Position
            | Self::TextAlign
            | Self::Display
            | Self::Visibility
            | Self::Overflow => ValueKind::Keyword,

            Self::Color | Self::BackgroundColor | Self::BorderColor => ValueKind::Color,

            Self::BackgroundImage | Self::Font => ValueKind::Resource,
        }
    }

    /// The four scalar sub-properties of a shorthand, in write order
    ///
    /// Write order is top/right/bottom/left for the side shorthands and
    /// top-left/top-right/bottom-right/bottom-left for the corner one;
    /// both use the same 1/2/3/4-value expansion law.
    pub fn expansion(self) -> Option<[PropertyId; 4]> {
        match self {
            Self::Margin => Some([
                Self::MarginTop,
                Self::MarginRight,
                Self::MarginBottom,
                Self::MarginLeft,
            ]),
            Self::Padding => Some([
                Self::PaddingTop,
                Self::PaddingRight,
                Self::PaddingBottom,
                Self::PaddingLeft,
            ]),
            Self::BorderRadius => Some([
                Self::BorderTopLeftRadius,
                Self::BorderTopRightRadius,
                Self::BorderBottomRightRadius,
                Self::BorderBottomLeftRadius,
            ]),
            _ => None,
        }
    }

    /// Whether this id expands into sub-properties
    #[inline]
    pub fn is_shorthand(self) -> bool {
        self.expansion().is_some()
    }
}

/// Which declared value lands in each expanded slot, by value count
///
/// 1 value: all four sides. 2: vertical | horizontal. 3: top |
/// horizontal | bottom. 4: top | right | bottom | left.
pub(crate) fn shorthand_value_indices(count: usize) -> Option<[usize; 4]> {
    match count {
        1 => Some([0, 0, 0, 0]),
        2 => Some([0, 1, 0, 1]),
        3 => Some([0, 1, 2, 1]),
        4 => Some([0, 1, 2, 3]),
        _ => None,
    }
}

/// Memoized per-(sheet, rule) property-id arrays
///
/// The declaration names of a rule never change after sheet build, so
/// the name lookup is done once per rule and shared by every element
/// that rule applies to. `None` entries are custom properties. Cleared
/// together with the resolved-style cache.
#[derive(Debug, Default)]
pub(crate) struct RulePropertyCache {
    map: HashMap<u64, Arc<[Option<PropertyId>]>>,
}

impl RulePropertyCache {
    pub fn get_or_build(
        &mut self,
        sheet: &StyleSheet,
        selector_index: u32,
    ) -> Arc<[Option<PropertyId>]> {
        let key = sheet.id().rule_key(selector_index);
        if let Some(ids) = self.map.get(&key) {
            return Arc::clone(ids);
        }

        let rule = &sheet.selectors()[selector_index as usize].rule;
        let ids: Arc<[Option<PropertyId>]> = rule
            .declarations
            .iter()
            .map(|decl| PropertyId::from_name(&decl.property))
            .collect();
        self.map.insert(key, Arc::clone(&ids));
        ids
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}
