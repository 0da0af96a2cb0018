//! OpenType parsing logic.

use core::{fmt, ops};

pub(crate) use self::{
    cmap::CmapTable,
    glyph::GlyphOutline,
    name::{NameId, NameTable},
    post::PostTable,
};
use crate::{
    alloc::{vec, Vec},
    errors::{MapError, ParseErrorKind},
    glyphs::{FontNames, GlyphInfo, GlyphSet},
    ParseError,
};

mod cmap;
mod glyph;
mod name;
mod post;

/// Position in the font data. Tracks the absolute offset and the current table for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    pub(crate) bytes: &'a [u8],
    offset: usize,
    table: Option<TableTag>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            table: None,
        }
    }

    fn for_table(mut self, tag: TableTag) -> Self {
        self.table = Some(tag);
        self
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            offset: self.offset,
            table: self.table,
        }
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        if self.bytes.len() < n {
            Err(self.err(ParseErrorKind::UnexpectedEof))
        } else {
            self.bytes = &self.bytes[n..];
            self.offset += n;
            Ok(())
        }
    }

    /// Splits off the first `len` bytes into a separate cursor and advances this cursor past them.
    pub(crate) fn split_at(&mut self, len: usize) -> Result<Self, ParseError> {
        if self.bytes.len() < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        let (head, tail) = self.bytes.split_at(len);
        let head = Self {
            bytes: head,
            ..*self
        };
        self.bytes = tail;
        self.offset += len;
        Ok(head)
    }

    /// Narrows this cursor to the specified range relative to its current position.
    pub(crate) fn range(&self, range: ops::Range<usize>) -> Result<Self, ParseError> {
        let bytes = self.bytes.get(range.clone()).ok_or_else(|| {
            self.err(ParseErrorKind::RangeOutOfBounds {
                range: range.clone(),
                len: self.bytes.len(),
            })
        })?;
        Ok(Self {
            bytes,
            offset: self.offset + range.start,
            table: self.table,
        })
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let head = self.split_at(N)?;
        // `unwrap()` is safe: `head` has exactly `N` bytes
        Ok(head.bytes.try_into().unwrap())
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_byte_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_byte_array().map(u32::from_be_bytes)
    }

    /// Reads a `u16` and validates it, reporting validation errors at the value offset.
    pub(crate) fn read_u16_checked<T>(
        &mut self,
        check: impl FnOnce(u16) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u16()?;
        check(value).map_err(|kind| prev.err(kind))
    }

    pub(crate) fn read_u32_checked<T>(
        &mut self,
        check: impl FnOnce(u32) -> Result<T, ParseErrorKind>,
    ) -> Result<T, ParseError> {
        let prev = *self;
        let value = self.read_u32()?;
        check(value).map_err(|kind| prev.err(kind))
    }
}

/// OpenType table tag, such as `cmap` or `glyf`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableTag(pub(crate) [u8; 4]);

impl fmt::Debug for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "TableTag({self})")
    }
}

impl fmt::Display for TableTag {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(formatter, "{}", char::from(byte))?;
            } else {
                write!(formatter, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

impl TableTag {
    /// Character to glyph mapping.
    pub const CMAP: Self = Self(*b"cmap");
    /// Glyph data.
    pub const GLYF: Self = Self(*b"glyf");
    /// Font header.
    pub const HEAD: Self = Self(*b"head");
    /// Index to location.
    pub const LOCA: Self = Self(*b"loca");
    /// Maximum profile.
    pub const MAXP: Self = Self(*b"maxp");
    /// Naming table.
    pub const NAME: Self = Self(*b"name");
    /// PostScript information, including glyph names.
    pub const POST: Self = Self(*b"post");

    /// Returns the raw tag bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum LocaFormat {
    Short,
    Long,
}

impl LocaFormat {
    const fn bytes_per_offset(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 4,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LocaTable<'a> {
    format: LocaFormat,
    cursor: Cursor<'a>,
}

impl<'a> LocaTable<'a> {
    fn new(format: LocaFormat, glyph_count: u16, cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let expected = format.bytes_per_offset() * (usize::from(glyph_count) + 1);
        // Some fonts have trailing padding after the last offset, so only a short table is an error.
        if cursor.bytes.len() < expected {
            return Err(cursor.err(ParseErrorKind::UnexpectedTableLen {
                expected,
                actual: cursor.bytes.len(),
            }));
        }
        Ok(Self { format, cursor })
    }

    fn glyph_range(&self, glyph_idx: u16) -> Result<ops::Range<usize>, ParseError> {
        let glyph_idx = usize::from(glyph_idx);
        let mut cursor = self.cursor;
        Ok(match self.format {
            LocaFormat::Short => {
                cursor.skip(glyph_idx * 2)?;
                let start_offset = usize::from(cursor.read_u16()?) * 2;
                let end_offset = usize::from(cursor.read_u16()?) * 2;
                start_offset..end_offset
            }
            LocaFormat::Long => {
                cursor.skip(glyph_idx * 4)?;
                let start_offset = cursor.read_u32()? as usize;
                let end_offset = cursor.read_u32()? as usize;
                start_offset..end_offset
            }
        })
    }
}

/// OpenType font with TrueType outlines.
///
/// The font borrows the data it was parsed from. Parsing only reads tables necessary to
/// take glyph inventory: `head`, `maxp`, `cmap`, `loca` and `glyf` are required, `post` and `name`
/// are read if present.
#[derive(Debug)]
pub struct Font<'a> {
    pub(crate) cmap: CmapTable<'a>,
    pub(crate) loca: LocaTable<'a>,
    pub(crate) glyf: Cursor<'a>,
    pub(crate) post: Option<PostTable<'a>>,
    pub(crate) name: Option<NameTable<'a>>,
    glyph_count: u16,
    /// Lowest code point mapped to each glyph by `cmap`.
    unicodes: Vec<Option<u32>>,
}

impl<'a> Font<'a> {
    pub(crate) const SFNT_VERSION: u32 = 0x_0001_0000;
    const LOCA_FORMAT_OFFSET: usize = 50;

    /// Parses a font from the provided bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be parsed, e.g. if it's not a TrueType font or
    /// lacks one of the required tables.
    pub fn new(bytes: &'a [u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(bytes);
        cursor.read_u32_checked(|version| {
            if version != Self::SFNT_VERSION {
                return Err(ParseErrorKind::UnexpectedFontVersion);
            }
            Ok(())
        })?;
        let table_count = cursor.read_u16()?;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let (mut cmap, mut head, mut maxp, mut loca, mut glyf) = (None, None, None, None, None);
        let (mut post, mut name) = (None, None);
        for _ in 0..table_count {
            let (tag, table) = Self::parse_table_record(&mut cursor, bytes)?;
            match tag {
                TableTag::CMAP => cmap = Some(table),
                TableTag::HEAD => head = Some(table),
                TableTag::MAXP => maxp = Some(table),
                TableTag::LOCA => loca = Some(table),
                TableTag::GLYF => glyf = Some(table),
                TableTag::POST => post = Some(table),
                TableTag::NAME => name = Some(table),
                _ => { /* skip table */ }
            }
        }

        let head = head.ok_or_else(|| ParseError::missing_table(TableTag::HEAD))?;
        let loca_format = Self::parse_loca_format(head)?;
        let maxp = maxp.ok_or_else(|| ParseError::missing_table(TableTag::MAXP))?;
        let glyph_count = Self::parse_glyph_count(maxp)?;
        let loca = loca.ok_or_else(|| ParseError::missing_table(TableTag::LOCA))?;
        let loca = LocaTable::new(loca_format, glyph_count, loca)?;
        let cmap = cmap.ok_or_else(|| ParseError::missing_table(TableTag::CMAP))?;
        let cmap = CmapTable::parse(cmap)?;
        let unicodes = Self::collect_unicodes(&cmap, glyph_count);

        let this = Self {
            cmap,
            loca,
            glyf: glyf.ok_or_else(|| ParseError::missing_table(TableTag::GLYF))?,
            post: post.map(PostTable::parse).transpose()?,
            name: name.map(NameTable::parse).transpose()?,
            glyph_count,
            unicodes,
        };
        log::debug!(
            "parsed font with {glyph_count} glyphs; {} glyphs are mapped to chars",
            this.unicodes.iter().filter(|unicode| unicode.is_some()).count()
        );
        Ok(this)
    }

    fn parse_table_record(
        header: &mut Cursor<'_>,
        font_bytes: &'a [u8],
    ) -> Result<(TableTag, Cursor<'a>), ParseError> {
        let tag = TableTag(header.read_byte_array()?);
        header.skip(4)?; // checksum
        let offset = header.read_u32()? as usize;
        let len = header.read_u32()? as usize;
        let table = Cursor::new(font_bytes)
            .range(offset..offset.saturating_add(len))?
            .for_table(tag);
        Ok((tag, table))
    }

    fn parse_loca_format(mut head: Cursor<'_>) -> Result<LocaFormat, ParseError> {
        head.read_u32_checked(|version| {
            if version != 0x_0001_0000 {
                return Err(ParseErrorKind::UnexpectedTableVersion { version });
            }
            Ok(())
        })?;
        head.skip(Self::LOCA_FORMAT_OFFSET - 4)?;
        // ^ fontRevision, checksumAdjustment, magicNumber, flags, unitsPerEm, created, modified,
        // bounding box, macStyle, lowestRecPPEM, fontDirectionHint

        head.read_u16_checked(|format| match format {
            0 => Ok(LocaFormat::Short),
            1 => Ok(LocaFormat::Long),
            _ => Err(ParseErrorKind::UnexpectedLocaFormat { format }),
        })
    }

    fn parse_glyph_count(mut maxp: Cursor<'_>) -> Result<u16, ParseError> {
        maxp.read_u32_checked(|version| {
            if version != 0x_0000_5000 && version != 0x_0001_0000 {
                return Err(ParseErrorKind::UnexpectedTableVersion { version });
            }
            Ok(())
        })?;
        maxp.read_u16()
    }

    fn collect_unicodes(cmap: &CmapTable<'_>, glyph_count: u16) -> Vec<Option<u32>> {
        let mut unicodes = vec![None; usize::from(glyph_count)];
        let mut out_of_range = 0_usize;
        for (code_point, glyph_idx) in cmap.mappings() {
            if glyph_idx == 0 {
                continue; // mapped to the missing glyph
            }
            let Some(slot) = unicodes.get_mut(usize::from(glyph_idx)) else {
                if out_of_range == 0 {
                    log::warn!(
                        "`cmap` maps U+{code_point:04X} to glyph #{glyph_idx}, but the font only has {glyph_count} glyphs"
                    );
                }
                out_of_range += 1;
                continue;
            };
            // Mappings are not necessarily ordered by code point (e.g., with overlapping segments)
            if slot.is_none_or(|existing| code_point < existing) {
                *slot = Some(code_point);
            }
        }
        if out_of_range > 1 {
            log::warn!("ignored {out_of_range} `cmap` mappings to glyphs beyond the glyph count");
        }
        unicodes
    }

    /// Returns the number of glyphs in this font.
    pub fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    /// Maps a char to a glyph index using the `cmap` table. Index 0 means the missing glyph.
    ///
    /// # Errors
    ///
    /// Returns an error if the `cmap` table cannot map the char.
    pub fn map_char(&self, ch: char) -> Result<u16, MapError> {
        self.cmap.map_char(ch)
    }

    /// Returns the lowest code point mapped to the specified glyph.
    pub fn glyph_unicode(&self, glyph_idx: u16) -> Option<u32> {
        self.unicodes.get(usize::from(glyph_idx)).copied().flatten()
    }

    /// Returns the glyph name from the `post` table, if any.
    pub fn glyph_name(&self, glyph_idx: u16) -> Option<&'a str> {
        self.post.as_ref()?.glyph_name(glyph_idx)
    }

    pub(crate) fn outline(&self, glyph_idx: u16) -> Result<GlyphOutline, ParseError> {
        let range = self.loca.glyph_range(glyph_idx)?;
        if range.is_empty() {
            return Ok(GlyphOutline::Empty);
        }
        GlyphOutline::parse(self.glyf.range(range)?)
    }

    /// Checks whether the specified glyph has renderable outline data.
    ///
    /// Malformed glyph data is logged and reported as having no outline.
    pub fn has_outline(&self, glyph_idx: u16) -> bool {
        match self.outline(glyph_idx) {
            Ok(outline) => outline.is_renderable(),
            Err(err) => {
                log::warn!("failed reading outline for glyph #{glyph_idx}: {err}");
                false
            }
        }
    }
}

impl GlyphSet for Font<'_> {
    fn glyph_count(&self) -> u16 {
        self.glyph_count
    }

    fn glyph(&self, idx: u16) -> GlyphInfo<'_> {
        GlyphInfo {
            idx,
            unicode: self.glyph_unicode(idx),
            name: self.glyph_name(idx),
            has_outline: self.has_outline(idx),
        }
    }

    fn names(&self) -> FontNames {
        let Some(name) = &self.name else {
            return FontNames::default();
        };
        FontNames {
            family: name.get(NameId::FAMILY),
            subfamily: name.get(NameId::SUBFAMILY),
            full_name: name.get(NameId::FULL_NAME),
            postscript_name: name.get(NameId::POSTSCRIPT_NAME),
        }
    }
}
