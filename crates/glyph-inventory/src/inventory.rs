//! Glyph inventory: the deduplicated, sorted set of chars a font can render.

use core::{fmt, str::FromStr};

use serde::Serialize;

use crate::{
    alloc::{Box, String, ToOwned, Vec},
    errors::UnknownFormatError,
    glyphs::{FontNames, GlyphSet},
    printable::{is_control, is_printable, is_trimmed_whitespace},
    Font, ParseError,
};

type CharFilter = Box<dyn Fn(char) -> bool + Send + Sync>;

/// Options for building a [`FontInventory`].
///
/// A glyph is included into the inventory only if it passes *all* enabled filters; the custom
/// filter can thus only restrict the inventory further, but never override control char
/// or printable char exclusion.
pub struct InventoryOptions {
    printable_only: bool,
    include_control_chars: bool,
    filter: Option<CharFilter>,
}

impl fmt::Debug for InventoryOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InventoryOptions")
            .field("printable_only", &self.printable_only)
            .field("include_control_chars", &self.include_control_chars)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

impl Default for InventoryOptions {
    fn default() -> Self {
        Self {
            printable_only: true,
            include_control_chars: false,
            filter: None,
        }
    }
}

impl InventoryOptions {
    /// Sets whether only [printable](crate::is_printable()) chars are included. On by default.
    #[must_use]
    pub fn printable_only(mut self, printable_only: bool) -> Self {
        self.printable_only = printable_only;
        self
    }

    /// Sets whether control chars `U+0000..=U+001F` are included. Off by default.
    #[must_use]
    pub fn include_control_chars(mut self, include: bool) -> Self {
        self.include_control_chars = include;
        self
    }

    /// Sets a custom filter. Only chars for which the filter returns `true` are included.
    ///
    /// The filter receives only the char; its code point is `u32::from(ch)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use glyph_inventory::InventoryOptions;
    /// // Only include chars from the Basic Multilingual Plane.
    /// let options = InventoryOptions::default().filter(|ch| u32::from(ch) <= 0xffff);
    /// ```
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    fn includes(&self, ch: char) -> bool {
        if !self.include_control_chars && is_control(ch) {
            return false;
        }
        if self.printable_only && !is_printable(ch) {
            return false;
        }
        self.filter.as_ref().is_none_or(|filter| filter(ch))
    }
}

/// Single entry in a [`FontInventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct GlyphRecord {
    /// Unicode code point.
    pub unicode: u32,
    /// Char corresponding to the code point.
    #[serde(rename = "char")]
    pub ch: char,
    /// Glyph name. Synthesized from the glyph index if the font doesn't provide a name.
    pub name: String,
    /// Whether the glyph has renderable outline data.
    pub has_outline: bool,
}

/// Font naming metadata with fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct FontMetadata {
    /// Font family name; `Unknown` if not specified in the font.
    pub family: String,
    /// Font subfamily name; `Unknown` if not specified in the font.
    pub subfamily: String,
    /// Full font name; defaults to the family and subfamily joined by a space.
    pub full_name: String,
    /// PostScript name; defaults to the full name with whitespace removed.
    pub postscript_name: String,
}

impl FontMetadata {
    const UNKNOWN: &'static str = "Unknown";

    /// Applies fallbacks to the provided names. Whitespace removed from the full name
    /// to get the PostScript name is the same as in [`is_printable()`](crate::is_printable()).
    pub fn new(names: FontNames) -> Self {
        let family = names.family.unwrap_or_else(|| Self::UNKNOWN.to_owned());
        let subfamily = names.subfamily.unwrap_or_else(|| Self::UNKNOWN.to_owned());
        let full_name = names
            .full_name
            .unwrap_or_else(|| crate::alloc::format!("{family} {subfamily}"));
        let postscript_name = names.postscript_name.unwrap_or_else(|| {
            full_name
                .chars()
                .filter(|&ch| !is_trimmed_whitespace(ch))
                .collect()
        });
        Self {
            family,
            subfamily,
            full_name,
            postscript_name,
        }
    }
}

/// Presentation format for a [`FontInventory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Concatenated chars.
    #[default]
    Text,
    /// JSON array of [`GlyphRecord`]s.
    Json,
    /// JSON array of chars.
    Array,
}

impl OutputFormat {
    /// All supported formats.
    pub const ALL: [Self; 3] = [Self::Text, Self::Json, Self::Array];

    /// Returns the name of this format, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| UnknownFormatError { name: s.to_owned() })
    }
}

/// Deduplicated set of chars renderable by a font, sorted by code point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontInventory {
    metadata: FontMetadata,
    glyphs: Vec<GlyphRecord>,
}

impl FontInventory {
    /// Takes inventory of the provided glyph set.
    ///
    /// Glyphs without a Unicode mapping are skipped, as are glyphs whose code point
    /// is not a valid char (the latter are logged as warnings). If several glyphs map to
    /// the same char, the glyph with the lowest index is recorded.
    pub fn new(font: &impl GlyphSet, options: &InventoryOptions) -> Self {
        let mut glyphs = Vec::<GlyphRecord>::new();
        let mut seen_chars = crate::alloc::BTreeSet::new();
        for glyph_idx in 0..font.glyph_count() {
            let glyph = font.glyph(glyph_idx);
            let Some(unicode) = glyph.unicode else {
                continue;
            };
            let Some(ch) = char::from_u32(unicode) else {
                log::warn!(
                    "skipped glyph #{glyph_idx}: code point {unicode:#x} is not a valid char"
                );
                continue;
            };
            if !options.includes(ch) || !seen_chars.insert(ch) {
                continue;
            }

            glyphs.push(GlyphRecord {
                unicode,
                ch,
                name: glyph.display_name().into_owned(),
                has_outline: glyph.has_outline,
            });
        }
        glyphs.sort_by_key(|record| record.unicode);

        let metadata = FontMetadata::new(font.names());
        log::debug!(
            "took inventory of font `{}`: {} of {} glyphs are included",
            metadata.full_name,
            glyphs.len(),
            font.glyph_count()
        );
        Self { metadata, glyphs }
    }

    /// Parses a TrueType font and takes its inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be parsed.
    pub fn from_bytes(bytes: &[u8], options: &InventoryOptions) -> Result<Self, ParseError> {
        let font = Font::new(bytes)?;
        Ok(Self::new(&font, options))
    }

    /// Returns font metadata.
    pub fn metadata(&self) -> &FontMetadata {
        &self.metadata
    }

    /// Returns glyph records sorted by code point.
    pub fn glyphs(&self) -> &[GlyphRecord] {
        &self.glyphs
    }

    /// Returns the number of included glyphs.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Returns all included chars concatenated in the code point order.
    pub fn extracted_text(&self) -> String {
        self.chars().collect()
    }

    /// Iterates over included chars in the code point order.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.glyphs.iter().map(|record| record.ch)
    }

    /// Checks whether the inventory contains the specified char.
    pub fn contains(&self, ch: char) -> bool {
        self.glyphs
            .binary_search_by_key(&u32::from(ch), |record| record.unicode)
            .is_ok()
    }

    /// Renders this inventory in the specified format.
    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.extracted_text(),
            OutputFormat::Json => to_json(&self.glyphs),
            OutputFormat::Array => to_json(&self.chars().collect::<Vec<_>>()),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    // Serializing plain records to a string cannot fail.
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| unreachable!("failed serializing to JSON: {err}"))
}

impl fmt::Display for FontInventory {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.extracted_text())
    }
}
