//! Checking whether a font covers the chars of a string.

use serde::Serialize;

use crate::{
    alloc::{BTreeMap, String, ToOwned, Vec},
    glyphs::{GlyphInfo, GlyphSet},
};

/// Result of checking a single char against a font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CharCheck {
    /// Checked char.
    #[serde(rename = "char")]
    pub ch: char,
    /// Code point of the char.
    pub unicode: u32,
    /// Whether the font has a glyph for the char.
    pub exists: bool,
    /// Name of the glyph for the char, if it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph_name: Option<String>,
}

impl CharCheck {
    fn new(ch: char, glyph: Option<&GlyphInfo<'_>>) -> Self {
        Self {
            ch,
            unicode: ch.into(),
            exists: glyph.is_some(),
            glyph_name: glyph.map(|glyph| glyph.display_name().into_owned()),
        }
    }
}

/// Result of checking a string against a font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TextCheck {
    /// Checked string.
    pub text: String,
    /// Per-char results in the order of chars in the string. Repeated chars are checked
    /// as many times as they occur.
    pub chars: Vec<CharCheck>,
    /// Whether all chars have glyphs in the font.
    pub all_exists: bool,
    /// Chars missing from the font in the order of their occurrence, including repetitions.
    pub missing_chars: Vec<char>,
}

impl TextCheck {
    fn new(text: &str, chars: Vec<CharCheck>) -> Self {
        let missing_chars: Vec<_> = chars
            .iter()
            .filter(|check| !check.exists)
            .map(|check| check.ch)
            .collect();
        Self {
            text: text.to_owned(),
            chars,
            all_exists: missing_chars.is_empty(),
            missing_chars,
        }
    }

    /// Returns missing chars without repetitions, in the order of their first occurrence.
    pub fn distinct_missing_chars(&self) -> Vec<char> {
        let mut seen = crate::alloc::BTreeSet::new();
        self.missing_chars
            .iter()
            .copied()
            .filter(|&ch| seen.insert(ch))
            .collect()
    }
}

/// Checks whether the font has a glyph for the specified char.
///
/// This performs a linear scan over the glyphs; the first glyph mapped to the char is reported.
/// To check many chars at once, use [`check_text()`].
pub fn check_char(font: &impl GlyphSet, ch: char) -> CharCheck {
    let code_point = u32::from(ch);
    let glyph = font
        .glyphs()
        .find(|glyph| glyph.unicode == Some(code_point));
    CharCheck::new(ch, glyph.as_ref())
}

/// Checks whether the font has glyphs for all chars in the string.
///
/// The string is split into Unicode scalar values, so chars outside the Basic Multilingual Plane
/// are checked as single chars. The font glyphs are scanned once, regardless of the string length.
pub fn check_text(font: &impl GlyphSet, text: &str) -> TextCheck {
    let glyph_map = GlyphMap::new(font);
    let chars = text
        .chars()
        .map(|ch| CharCheck::new(ch, glyph_map.get(ch)))
        .collect();
    let check = TextCheck::new(text, chars);
    log::debug!(
        "checked {} chars against font: {} missing",
        check.chars.len(),
        check.missing_chars.len()
    );
    check
}

/// Checks multiple strings using [`check_text()`]. Results are returned in the order of `texts`.
pub fn check_texts<S: AsRef<str>>(font: &impl GlyphSet, texts: &[S]) -> Vec<TextCheck> {
    texts
        .iter()
        .map(|text| check_text(font, text.as_ref()))
        .collect()
}

/// Mapping from code points to glyphs.
#[derive(Debug)]
struct GlyphMap<'a> {
    inner: BTreeMap<u32, GlyphInfo<'a>>,
}

impl<'a> GlyphMap<'a> {
    fn new(font: &'a impl GlyphSet) -> Self {
        let mut inner = BTreeMap::new();
        for glyph in font.glyphs() {
            if let Some(unicode) = glyph.unicode {
                // The glyph with the lowest index wins, consistently with `check_char()`.
                inner.entry(unicode).or_insert(glyph);
            }
        }
        Self { inner }
    }

    fn get(&self, ch: char) -> Option<&GlyphInfo<'a>> {
        self.inner.get(&u32::from(ch))
    }
}
