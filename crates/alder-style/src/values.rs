//! Raw style values
//!
//! Sheets do not store typed property values inline. Each declaration
//! holds [`RawValue`] handles into per-kind pools owned by the sheet;
//! decoding happens when a rule is applied (or, for custom properties,
//! on first typed read). Pools are deduplicated at build time, so a
//! value repeated across many rules is stored once.

/// Kind tag of one raw value handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Color,
    Keyword,
    /// Enum value spelled by name, decoded against [`Keyword`] on read
    EnumName,
    Str,
    /// Resource path, resolved against the engine's resource table
    Resource,
}

/// Handle to one value inside its owning sheet's pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawValue {
    pub kind: ValueKind,
    pub index: u32,
}

/// Resource handle produced by the engine's resource table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Fallback asset substituted for unresolved texture paths
    pub const PLACEHOLDER: ResourceId = ResourceId(0);
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color (#RGB, #RRGGBB, #RRGGBBAA)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Self::rgba(r, g, b, a))
            }
            _ => None,
        }
    }
}

/// Keyword values for the enum-typed properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Common
    None,
    Auto,
    Hidden,
    Visible,

    // Display
    Flex,

    // Position
    Relative,
    Absolute,

    // Flex direction
    Row,
    RowReverse,
    Column,
    ColumnReverse,

    // Justify / align
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    Stretch,

    // Text align
    Left,
    Right,
    Justify,

    // Overflow
    Scroll,
    Clip,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "none" => Self::None,
            "auto" => Self::Auto,
            "hidden" => Self::Hidden,
            "visible" => Self::Visible,
            "flex" => Self::Flex,
            "relative" => Self::Relative,
            "absolute" => Self::Absolute,
            "row" => Self::Row,
            "row-reverse" => Self::RowReverse,
            "column" => Self::Column,
            "column-reverse" => Self::ColumnReverse,
            "flex-start" => Self::FlexStart,
            "flex-end" => Self::FlexEnd,
            "center" => Self::Center,
            "space-between" => Self::SpaceBetween,
            "space-around" => Self::SpaceAround,
            "stretch" => Self::Stretch,
            "left" => Self::Left,
            "right" => Self::Right,
            "justify" => Self::Justify,
            "scroll" => Self::Scroll,
            "clip" => Self::Clip,
            _ => return None,
        })
    }
}

/// Per-kind value pools owned by one sheet
///
/// Interning the same value twice returns the same handle.
#[derive(Debug, Default)]
pub(crate) struct ValuePool {
    floats: Vec<f32>,
    ints: Vec<i32>,
    colors: Vec<Color>,
    keywords: Vec<Keyword>,
    enum_names: Vec<Box<str>>,
    strings: Vec<Box<str>>,
    resources: Vec<Box<str>>,
}

impl ValuePool {
    pub fn intern_float(&mut self, value: f32) -> RawValue {
        let index = match self.floats.iter().position(|v| v.to_bits() == value.to_bits()) {
            Some(i) => i,
            None => {
                self.floats.push(value);
                self.floats.len() - 1
            }
        };
        RawValue { kind: ValueKind::Float, index: index as u32 }
    }

    pub fn intern_int(&mut self, value: i32) -> RawValue {
        let index = match self.ints.iter().position(|&v| v == value) {
            Some(i) => i,
            None => {
                self.ints.push(value);
                self.ints.len() - 1
            }
        };
        RawValue { kind: ValueKind::Int, index: index as u32 }
    }

    pub fn intern_bool(&mut self, value: bool) -> RawValue {
        // Bools carry the value in the handle itself
        RawValue { kind: ValueKind::Bool, index: value as u32 }
    }

    pub fn intern_color(&mut self, value: Color) -> RawValue {
        let index = match self.colors.iter().position(|&v| v == value) {
            Some(i) => i,
            None => {
                self.colors.push(value);
                self.colors.len() - 1
            }
        };
        RawValue { kind: ValueKind::Color, index: index as u32 }
    }

    pub fn intern_keyword(&mut self, value: Keyword) -> RawValue {
        let index = match self.keywords.iter().position(|&v| v == value) {
            Some(i) => i,
            None => {
                self.keywords.push(value);
                self.keywords.len() - 1
            }
        };
        RawValue { kind: ValueKind::Keyword, index: index as u32 }
    }

    pub fn intern_enum_name(&mut self, value: &str) -> RawValue {
        let index = Self::intern_str(&mut self.enum_names, value);
        RawValue { kind: ValueKind::EnumName, index }
    }

    pub fn intern_string(&mut self, value: &str) -> RawValue {
        let index = Self::intern_str(&mut self.strings, value);
        RawValue { kind: ValueKind::Str, index }
    }

    pub fn intern_resource(&mut self, path: &str) -> RawValue {
        let index = Self::intern_str(&mut self.resources, path);
        RawValue { kind: ValueKind::Resource, index }
    }

    fn intern_str(pool: &mut Vec<Box<str>>, value: &str) -> u32 {
        match pool.iter().position(|v| v.as_ref() == value) {
            Some(i) => i as u32,
            None => {
                pool.push(value.into());
                (pool.len() - 1) as u32
            }
        }
    }

    pub fn read_float(&self, handle: RawValue) -> Option<f32> {
        match handle.kind {
            ValueKind::Float => self.floats.get(handle.index as usize).copied(),
            _ => None,
        }
    }

    pub fn read_int(&self, handle: RawValue) -> Option<i32> {
        match handle.kind {
            ValueKind::Int => self.ints.get(handle.index as usize).copied(),
            _ => None,
        }
    }

    pub fn read_bool(&self, handle: RawValue) -> Option<bool> {
        match handle.kind {
            ValueKind::Bool => Some(handle.index != 0),
            _ => None,
        }
    }

    pub fn read_color(&self, handle: RawValue) -> Option<Color> {
        match handle.kind {
            ValueKind::Color => self.colors.get(handle.index as usize).copied(),
            _ => None,
        }
    }

    pub fn read_keyword(&self, handle: RawValue) -> Option<Keyword> {
        match handle.kind {
            ValueKind::Keyword => self.keywords.get(handle.index as usize).copied(),
            ValueKind::EnumName => self
                .enum_names
                .get(handle.index as usize)
                .and_then(|name| Keyword::from_str(name)),
            _ => None,
        }
    }

    pub fn read_enum_name(&self, handle: RawValue) -> Option<&str> {
        match handle.kind {
            ValueKind::EnumName => self.enum_names.get(handle.index as usize).map(|s| s.as_ref()),
            _ => None,
        }
    }

    pub fn read_str(&self, handle: RawValue) -> Option<&str> {
        match handle.kind {
            ValueKind::Str => self.strings.get(handle.index as usize).map(|s| s.as_ref()),
            _ => None,
        }
    }

    pub fn read_resource_path(&self, handle: RawValue) -> Option<&str> {
        match handle.kind {
            ValueKind::Resource => self.resources.get(handle.index as usize).map(|s| s.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let red = Color::from_hex("#ff0000").unwrap();
        assert_eq!(red, Color::rgb(255, 0, 0));

        let short = Color::from_hex("#f00").unwrap();
        assert_eq!(short, Color::rgb(255, 0, 0));

        let with_alpha = Color::from_hex("#00ff0080").unwrap();
        assert_eq!(with_alpha, Color::rgba(0, 255, 0, 128));

        assert!(Color::from_hex("#notacolor").is_none());
        assert!(Color::from_hex("#ffff").is_none());
    }

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("flex"), Some(Keyword::Flex));
        assert_eq!(Keyword::from_str("space-between"), Some(Keyword::SpaceBetween));
        assert_eq!(Keyword::from_str("bogus"), None);
    }

    #[test]
    fn test_pool_deduplicates() {
        let mut pool = ValuePool::default();
        let a = pool.intern_float(5.0);
        let b = pool.intern_float(5.0);
        assert_eq!(a, b);

        let c = pool.intern_float(6.0);
        assert_ne!(a, c);

        let s1 = pool.intern_resource("icons/close.png");
        let s2 = pool.intern_resource("icons/close.png");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_pool_kind_checked_reads() {
        let mut pool = ValuePool::default();
        let float = pool.intern_float(2.5);
        let color = pool.intern_color(Color::WHITE);

        assert_eq!(pool.read_float(float), Some(2.5));
        assert_eq!(pool.read_float(color), None);
        assert_eq!(pool.read_color(color), Some(Color::WHITE));
        assert_eq!(pool.read_color(float), None);
    }

    #[test]
    fn test_enum_name_decodes_to_keyword() {
        let mut pool = ValuePool::default();
        let by_name = pool.intern_enum_name("column");
        assert_eq!(pool.read_keyword(by_name), Some(Keyword::Column));

        let unknown = pool.intern_enum_name("sideways");
        assert_eq!(pool.read_keyword(unknown), None);
    }

    #[test]
    fn test_bool_in_handle() {
        let mut pool = ValuePool::default();
        let t = pool.intern_bool(true);
        let f = pool.intern_bool(false);
        assert_eq!(pool.read_bool(t), Some(true));
        assert_eq!(pool.read_bool(f), Some(false));
    }
}
