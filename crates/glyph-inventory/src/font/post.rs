//! `post` table processing. Only glyph names are read from the table.

use super::Cursor;
use crate::{
    alloc::{vec, Vec},
    errors::ParseErrorKind,
    ParseError,
};

#[derive(Debug)]
enum GlyphNames<'a> {
    /// Version 1.0: glyphs are named after the standard Macintosh glyph set.
    Standard,
    /// Version 2.0.
    Indexed {
        name_indices: Cursor<'a>,
        /// Custom names in the order of their appearance; `None` for non-ASCII names.
        custom_names: Vec<Option<&'a str>>,
    },
    /// Other versions (e.g., 3.0) don't provide glyph names.
    None,
}

#[derive(Debug)]
pub(crate) struct PostTable<'a> {
    names: GlyphNames<'a>,
}

impl<'a> PostTable<'a> {
    const HEADER_LEN: usize = 32;

    pub(super) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let version = cursor.read_u32()?;
        let names = match version {
            0x_0001_0000 => GlyphNames::Standard,
            0x_0002_0000 => {
                cursor.skip(Self::HEADER_LEN - 4)?;
                Self::parse_indexed_names(cursor)?
            }
            0x_0002_5000 | 0x_0003_0000 | 0x_0004_0000 => GlyphNames::None,
            _ => return Err(cursor.err(ParseErrorKind::UnexpectedTableVersion { version })),
        };
        Ok(Self { names })
    }

    fn parse_indexed_names(mut cursor: Cursor<'a>) -> Result<GlyphNames<'a>, ParseError> {
        let glyph_count = usize::from(cursor.read_u16()?);
        let name_indices = cursor.split_at(2 * glyph_count)?;

        let mut custom_names = vec![];
        while let Some(&len) = cursor.bytes.first() {
            cursor.skip(1)?;
            let name = cursor.split_at(usize::from(len))?.bytes;
            // `unwrap()` is safe: ASCII is valid UTF-8
            let name = name
                .is_ascii()
                .then(|| core::str::from_utf8(name).unwrap());
            custom_names.push(name);
        }
        Ok(GlyphNames::Indexed {
            name_indices,
            custom_names,
        })
    }

    pub(crate) fn glyph_name(&self, glyph_idx: u16) -> Option<&'a str> {
        match &self.names {
            GlyphNames::Standard => STANDARD_GLYPH_NAMES.get(usize::from(glyph_idx)).copied(),
            GlyphNames::Indexed {
                name_indices,
                custom_names,
            } => {
                let mut cursor = *name_indices;
                cursor.skip(2 * usize::from(glyph_idx)).ok()?;
                let name_idx = usize::from(cursor.read_u16().ok()?);
                if let Some(&name) = STANDARD_GLYPH_NAMES.get(name_idx) {
                    return Some(name);
                }
                custom_names
                    .get(name_idx - STANDARD_GLYPH_NAMES.len())
                    .copied()
                    .flatten()
            }
            GlyphNames::None => None,
        }
    }
}

/// The 258 glyph names defined for Macintosh TrueType fonts.
#[rustfmt::skip]
static STANDARD_GLYPH_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign", "dollar",
    "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma",
    "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B",
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U",
    "V", "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum",
    "underscore", "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde", "Adieresis", "Aring", "Ccedilla", "Eacute", "Ntilde", "Odieresis", "Udieresis",
    "aacute", "agrave", "acircumflex", "adieresis", "atilde", "aring", "ccedilla", "eacute",
    "egrave", "ecircumflex", "edieresis", "iacute", "igrave", "icircumflex", "idieresis", "ntilde",
    "oacute", "ograve", "ocircumflex", "odieresis", "otilde", "uacute", "ugrave", "ucircumflex",
    "udieresis", "dagger", "degree", "cent", "sterling", "section", "bullet", "paragraph",
    "germandbls", "registered", "copyright", "trademark", "acute", "dieresis", "notequal", "AE",
    "Oslash", "infinity", "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff",
    "summation", "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae",
    "oslash", "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal",
    "Delta", "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered", "quotesinglbase",
    "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute", "Edieresis", "Egrave",
    "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute", "Ocircumflex", "apple", "Ograve",
    "Uacute", "Ucircumflex", "Ugrave", "dotlessi", "circumflex", "tilde", "macron", "breve",
    "dotaccent", "ring", "cedilla", "hungarumlaut", "ogonek", "caron", "Lslash", "lslash",
    "Scaron", "scaron", "Zcaron", "zcaron", "brokenbar", "Eth", "eth", "Yacute", "yacute", "Thorn",
    "thorn", "minus", "multiply", "onesuperior", "twosuperior", "threesuperior", "onehalf",
    "onequarter", "threequarters", "franc", "Gbreve", "gbreve", "Idotaccent", "Scedilla",
    "scedilla", "Cacute", "cacute", "Ccaron", "ccaron", "dcroat",
];
