//! Printable-character classification.

use core::ops;

/// Named Unicode ranges whose chars are always considered printable.
const PRINTABLE_BLOCKS: [(&str, ops::RangeInclusive<u32>); 13] = [
    ("Basic Latin", 0x20..=0x7e),
    ("Latin-1 Supplement", 0xa0..=0xff),
    ("Latin Extended-A", 0x100..=0x17f),
    ("Latin Extended-B", 0x180..=0x24f),
    ("Greek", 0x370..=0x3ff),
    ("Cyrillic", 0x400..=0x4ff),
    ("Hiragana", 0x3040..=0x309f),
    ("Katakana", 0x30a0..=0x30ff),
    ("Hangul Syllables", 0xac00..=0xd7af),
    ("CJK Unified Ideographs", 0x4e00..=0x9fff),
    ("CJK Extension A", 0x3400..=0x4dbf),
    ("CJK Extension B", 0x2_0000..=0x2_a6df),
    ("Emoji & Symbols", 0x1_f300..=0x1_f9ff),
];

/// Last C0 control char.
const LAST_CONTROL_CHAR: u32 = 0x1f;

/// Checks whether a char is a C0 control char (`U+0000..=U+001F`).
pub(crate) fn is_control(ch: char) -> bool {
    u32::from(ch) <= LAST_CONTROL_CHAR
}

/// Returns the name of the named printable range containing `ch`, such as `"Cyrillic"`.
///
/// # Examples
///
/// ```
/// # use glyph_inventory::printable_block;
/// assert_eq!(printable_block('Ж'), Some("Cyrillic"));
/// assert_eq!(printable_block('中'), Some("CJK Unified Ideographs"));
/// assert_eq!(printable_block('\u{2603}'), None);
/// ```
pub fn printable_block(ch: char) -> Option<&'static str> {
    let code_point = u32::from(ch);
    PRINTABLE_BLOCKS
        .iter()
        .find(|(_, range)| range.contains(&code_point))
        .map(|(name, _)| *name)
}

/// Checks whether a char is printable.
///
/// A char is printable if it belongs to one of the named ranges (Latin, Greek, Cyrillic,
/// kana, Hangul syllables, CJK ideographs, emoji), or, failing that, if it is not a control
/// char and not whitespace. The second rule is deliberately permissive: e.g., `U+007F..=U+009F`
/// and unassigned code points are classified as printable.
///
/// Whitespace is determined by the same set of chars that `String.prototype.trim` strips
/// in JavaScript; it differs from [`char::is_whitespace()`] in `U+0085` (not whitespace)
/// and `U+FEFF` (whitespace).
///
/// # Examples
///
/// ```
/// # use glyph_inventory::is_printable;
/// assert!(is_printable('A'));
/// assert!(is_printable(' '));
/// assert!(is_printable('\u{2603}')); // snowman, via the fallback rule
/// assert!(!is_printable('\t'));
/// assert!(!is_printable('\u{3000}')); // ideographic space
/// ```
pub fn is_printable(ch: char) -> bool {
    if printable_block(ch).is_some() {
        return true;
    }
    // Surrogates cannot be represented as `char`s, so they don't need to be checked here.
    u32::from(ch) > LAST_CONTROL_CHAR && !is_trimmed_whitespace(ch)
}

/// Checks whether a char is whitespace as understood by `String.prototype.trim` in JavaScript.
pub(crate) fn is_trimmed_whitespace(ch: char) -> bool {
    matches!(
        ch,
        '\u{9}'..='\u{d}'
            | '\u{20}'
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}
