//! Font abstraction consumed by the inventory and coverage logic.

use crate::alloc::{format, Cow, String};

/// Read-only view of a font's glyph table and naming metadata.
///
/// [`Font`](crate::Font) is the bundled implementation. Other font parsers can implement
/// this trait to be used with [`FontInventory`](crate::FontInventory) and coverage checks.
pub trait GlyphSet {
    /// Returns the number of glyphs.
    fn glyph_count(&self) -> u16;

    /// Returns information about the glyph with the specified index, which is guaranteed
    /// to be less than [`Self::glyph_count()`].
    fn glyph(&self, idx: u16) -> GlyphInfo<'_>;

    /// Returns naming metadata as stored in the font.
    fn names(&self) -> FontNames;

    /// Iterates over all glyphs in the ascending index order.
    fn glyphs(&self) -> impl Iterator<Item = GlyphInfo<'_>> + '_
    where
        Self: Sized,
    {
        (0..self.glyph_count()).map(|idx| self.glyph(idx))
    }
}

/// Information about a single glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct GlyphInfo<'a> {
    /// Index of the glyph in the font.
    pub idx: u16,
    /// Unicode code point mapped to this glyph, if any. Not guaranteed to be a valid `char`.
    pub unicode: Option<u32>,
    /// Glyph name stored in the font.
    pub name: Option<&'a str>,
    /// Whether the glyph has renderable outline data.
    pub has_outline: bool,
}

impl<'a> GlyphInfo<'a> {
    /// Creates glyph info with the specified index and otherwise empty data.
    pub fn new(idx: u16) -> Self {
        Self {
            idx,
            unicode: None,
            name: None,
            has_outline: false,
        }
    }

    /// Sets the Unicode code point.
    #[must_use]
    pub fn with_unicode(mut self, unicode: u32) -> Self {
        self.unicode = Some(unicode);
        self
    }

    /// Sets the glyph name.
    #[must_use]
    pub fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Marks the glyph as having an outline.
    #[must_use]
    pub fn with_outline(mut self) -> Self {
        self.has_outline = true;
        self
    }

    /// Returns the glyph name, or a name derived from the glyph index (e.g., `glyph12`)
    /// if the font doesn't provide one.
    pub fn display_name(&self) -> Cow<'a, str> {
        match self.name {
            Some(name) if !name.is_empty() => Cow::Borrowed(name),
            _ => Cow::Owned(format!("glyph{}", self.idx)),
        }
    }
}

/// Naming metadata as stored in a font. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct FontNames {
    /// Font family name (name ID 1).
    pub family: Option<String>,
    /// Font subfamily name (name ID 2), such as "Regular".
    pub subfamily: Option<String>,
    /// Full font name (name ID 4).
    pub full_name: Option<String>,
    /// PostScript name (name ID 6).
    pub postscript_name: Option<String>,
}
