//! String Interner - Deduplicate element names to save memory
//!
//! Type names, ids and class names repeat heavily across a UI tree
//! ("button", "label", "selected", ...). Each distinct string is stored
//! once and referenced by a 4-byte [`Symbol`], so identity checks during
//! selector matching are integer compares.

use std::collections::HashMap;

/// Interned string handle - just 4 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Symbol(pub u32);

impl Symbol {
    /// The empty string, pre-interned at index 0
    pub const EMPTY: Symbol = Symbol(0);
}

/// Span of one interned string inside the shared buffer
#[derive(Debug, Clone, Copy)]
struct Span {
    start: u32,
    len: u32,
}

/// String interner for element names
///
/// All strings live in one contiguous buffer; a [`Symbol`] indexes a
/// span table. Interning the same string twice returns the same symbol.
#[derive(Debug, Default)]
pub struct StringInterner {
    buffer: String,
    spans: Vec<Span>,
    map: HashMap<Box<str>, u32>,
}

impl StringInterner {
    /// Create an interner with common element type names pre-interned
    pub fn new() -> Self {
        let mut interner = Self {
            buffer: String::with_capacity(1024),
            spans: Vec::with_capacity(64),
            map: HashMap::with_capacity(64),
        };

        // Empty string at index 0
        interner.intern("");

        const COMMON_TYPES: &[&str] = &[
            "panel", "button", "label", "image", "text-field", "toggle",
            "slider", "scroll-view", "list-view", "foldout", "box",
        ];
        for name in COMMON_TYPES {
            interner.intern(name);
        }

        interner
    }

    /// Intern a string, returning its symbol
    ///
    /// Returns the existing symbol if the string was interned before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&index) = self.map.get(s) {
            return Symbol(index);
        }

        let index = self.spans.len() as u32;
        let start = self.buffer.len() as u32;
        self.buffer.push_str(s);
        self.spans.push(Span {
            start,
            len: s.len() as u32,
        });
        self.map.insert(s.into(), index);

        Symbol(index)
    }

    /// Look up a symbol without interning
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).map(|&index| Symbol(index))
    }

    /// Get the string for a symbol
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        match self.spans.get(symbol.0 as usize) {
            Some(span) => {
                let start = span.start as usize;
                &self.buffer[start..start + span.len as usize]
            }
            None => "",
        }
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total memory held by the interner
    pub fn memory_usage(&self) -> usize {
        self.buffer.capacity()
            + self.spans.capacity() * std::mem::size_of::<Span>()
            + self.map.capacity()
                * (std::mem::size_of::<Box<str>>() + std::mem::size_of::<u32>())
    }
}
