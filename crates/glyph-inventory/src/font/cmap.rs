//! `cmap` table processing.

use super::Cursor;
use crate::{
    alloc::{Box, Vec},
    errors::{MapError, ParseErrorKind},
    ParseError,
};

/// Max Unicode code point. Format 12 groups are clamped to it when enumerating mappings.
const MAX_CODE_POINT: u32 = 0x10_ffff;

#[derive(Debug, Clone, Copy)]
pub(crate) struct SegmentWithDelta {
    pub(crate) start_code: u16,
    pub(crate) end_code: u16,
    pub(crate) id_delta: u16,
    pub(crate) id_range_offset: u16,
}

/// Segment mapping to delta values (format 4) subtable of the `cmap` table.
#[derive(Debug, Clone)]
pub(crate) struct SegmentDeltas<'a> {
    pub(crate) segments: Vec<SegmentWithDelta>,
    pub(crate) glyph_id_array: &'a [u8],
}

impl<'a> SegmentDeltas<'a> {
    fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        cursor.read_u16_checked(|format| {
            if format != 4 {
                return Err(ParseErrorKind::UnexpectedTableFormat { format });
            }
            Ok(())
        })?;

        let remaining_len = cursor.read_u16_checked(|subtable_len| {
            Ok(subtable_len
                .checked_sub(4)
                .ok_or(ParseErrorKind::UnexpectedEof)? as usize)
        })?;
        cursor = cursor.range(0..remaining_len)?;

        cursor.skip(2)?; // language
        let segment_count = cursor.read_u16()? / 2;
        cursor.skip(6)?; // searchRange, entrySelector, rangeShift

        let vec_len = 2 * usize::from(segment_count);
        let mut end_codes = cursor.split_at(vec_len)?;
        cursor.skip(2)?; // reserved padding
        let mut start_codes = cursor.split_at(vec_len)?;
        let mut id_deltas = cursor.split_at(vec_len)?;
        let mut id_range_offsets = cursor.split_at(vec_len)?;

        let segments = (0..segment_count).map(|_| {
            Ok(SegmentWithDelta {
                start_code: start_codes.read_u16()?,
                end_code: end_codes.read_u16()?,
                id_delta: id_deltas.read_u16()?,
                id_range_offset: id_range_offsets.read_u16()?,
            })
        });

        Ok(Self {
            segments: segments.collect::<Result<_, ParseError>>()?,
            glyph_id_array: cursor.bytes,
        })
    }

    fn map_char(&self, c: char) -> Result<u16, MapError> {
        let c = u16::try_from(c as u32).map_err(|_| MapError::CharTooLarge)?;

        let segment_idx = self
            .segments
            .binary_search_by_key(&c, |segment| segment.end_code)
            .unwrap_or_else(|pos| pos);
        let Some(segment) = self.segments.get(segment_idx) else {
            return Ok(0); // `c` exceeds `end_code` for the last segment
        };
        if segment.start_code > c {
            return Ok(0); // missing glyph
        }
        self.map_in_segment(segment_idx, c)
    }

    /// Maps `c` which is known to be within the segment with the specified index.
    fn map_in_segment(&self, segment_idx: usize, c: u16) -> Result<u16, MapError> {
        let segment = &self.segments[segment_idx];
        if segment.id_range_offset == 0 {
            Ok(segment.id_delta.wrapping_add(c))
        } else {
            // Offset is counted from the start of `idRangeOffsets`
            let mut byte_offset = 2 * segment_idx;
            byte_offset += usize::from(segment.id_range_offset);
            byte_offset += 2 * usize::from(c - segment.start_code);

            if byte_offset < 2 * self.segments.len() {
                return Err(MapError::InvalidOffset);
            }
            // Shift the offset to count from the start of `glyphIdArray`
            byte_offset -= 2 * self.segments.len();
            let glyph_id_bytes = self
                .glyph_id_array
                .get(byte_offset..(byte_offset + 2))
                .ok_or(MapError::InvalidOffset)?;
            let glyph_id = u16::from_be_bytes(glyph_id_bytes.try_into().unwrap());
            if glyph_id == 0 {
                return Ok(0); // `idDelta` is not applied to the missing glyph
            }
            Ok(segment.id_delta.wrapping_add(glyph_id))
        }
    }

    fn mappings(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .flat_map(move |(segment_idx, segment)| {
                (segment.start_code..=segment.end_code).filter_map(move |c| {
                    if c == u16::MAX {
                        return None; // the terminating segment
                    }
                    match self.map_in_segment(segment_idx, c) {
                        Ok(glyph_idx) => Some((u32::from(c), glyph_idx)),
                        Err(err) => {
                            log::warn!("skipped mapping U+{c:04X} from `cmap`: {err}");
                            None
                        }
                    }
                })
            })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SequentialMapGroup {
    pub(crate) start_char_code: u32,
    pub(crate) end_char_code: u32,
    pub(crate) start_glyph_id: u32,
}

impl SequentialMapGroup {
    fn map_code_point(&self, code_point: u32) -> Result<u16, MapError> {
        let glyph_id = code_point
            .checked_sub(self.start_char_code)
            .and_then(|offset| offset.checked_add(self.start_glyph_id))
            .ok_or(MapError::InvalidGlyphId)?;
        glyph_id.try_into().map_err(|_| MapError::InvalidGlyphId)
    }
}

/// Segmented coverage (format 12) subtable of the `cmap` table.
#[derive(Debug, Default, Clone)]
pub(crate) struct SegmentedCoverage {
    pub(crate) groups: Vec<SequentialMapGroup>,
}

impl SegmentedCoverage {
    fn parse(mut cursor: Cursor<'_>) -> Result<Self, ParseError> {
        cursor.read_u16_checked(|format| {
            if format != 12 {
                return Err(ParseErrorKind::UnexpectedTableFormat { format });
            }
            Ok(())
        })?;

        cursor.skip(2)?; // reserved

        let remaining_len = cursor.read_u32_checked(|subtable_len| {
            Ok(subtable_len
                .checked_sub(8)
                .ok_or(ParseErrorKind::UnexpectedEof)? as usize)
        })?;
        cursor = cursor.range(0..remaining_len)?;

        cursor.skip(4)?; // language
        let num_groups = cursor.read_u32()?;
        let groups = (0..num_groups).map(|_| {
            Ok(SequentialMapGroup {
                start_char_code: cursor.read_u32()?,
                end_char_code: cursor.read_u32()?,
                start_glyph_id: cursor.read_u32()?,
            })
        });

        Ok(Self {
            groups: groups.collect::<Result<_, ParseError>>()?,
        })
    }

    fn map_char(&self, ch: char) -> Result<u16, MapError> {
        let ch = u32::from(ch);
        let group_idx = self
            .groups
            .binary_search_by_key(&ch, |group| group.end_char_code)
            .unwrap_or_else(|pos| pos);
        let Some(group) = self.groups.get(group_idx) else {
            return Ok(0); // `ch` exceeds `end_char_code` for the last segment
        };
        if group.start_char_code > ch {
            return Ok(0); // missing glyph
        }
        group.map_code_point(ch)
    }

    fn mappings(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.groups.iter().flat_map(|group| {
            let end = group.end_char_code.min(MAX_CODE_POINT);
            let mut reported = false;
            (group.start_char_code..=end).filter_map(move |code_point| {
                match group.map_code_point(code_point) {
                    Ok(glyph_idx) => Some((code_point, glyph_idx)),
                    Err(err) => {
                        // Logged once per group
                        if !reported {
                            reported = true;
                            log::warn!(
                                "skipped mappings from U+{code_point:04X} in `cmap` group \
                                 U+{:04X}..=U+{end:04X}: {err}",
                                group.start_char_code
                            );
                        }
                        None
                    }
                }
            })
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CmapTable<'a> {
    Deltas(SegmentDeltas<'a>),
    Coverage(SegmentedCoverage),
}

impl<'a> CmapTable<'a> {
    pub(crate) const UNICODE_PLATFORM: u16 = 0;
    pub(crate) const WINDOWS_PLATFORM: u16 = 3;

    /// Parses the table. If the table contains both a BMP-only (format 4) and a full-repertoire
    /// (format 12) Unicode subtable, the latter is used.
    pub(super) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let table_cursor = cursor;
        cursor.read_u16_checked(|version| {
            if version != 0 {
                return Err(ParseErrorKind::UnexpectedTableVersion {
                    version: version.into(),
                });
            }
            Ok(())
        })?;

        let num_tables = cursor.read_u16()?;
        let (mut deltas_offset, mut coverage_offset) = (None, None);
        for _ in 0..num_tables {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let offset = cursor.read_u32()? as usize;
            match (platform_id, encoding_id) {
                (Self::UNICODE_PLATFORM, 3) | (Self::WINDOWS_PLATFORM, 1) => {
                    deltas_offset.get_or_insert(offset);
                }
                (Self::UNICODE_PLATFORM, 4) | (Self::WINDOWS_PLATFORM, 10) => {
                    coverage_offset.get_or_insert(offset);
                }
                _ => { /* unsupported table format */ }
            }
        }

        let subtable_at = |offset: usize| {
            let mut subtable = table_cursor;
            subtable
                .skip(offset)
                .map_err(|_| cursor.err(ParseErrorKind::OffsetOutOfBounds(offset)))?;
            Ok::<_, ParseError>(subtable)
        };
        if let Some(offset) = coverage_offset {
            Ok(Self::Coverage(SegmentedCoverage::parse(subtable_at(offset)?)?))
        } else if let Some(offset) = deltas_offset {
            Ok(Self::Deltas(SegmentDeltas::parse(subtable_at(offset)?)?))
        } else {
            Err(cursor.err(ParseErrorKind::NoSupportedCmap))
        }
    }

    pub(super) fn map_char(&self, ch: char) -> Result<u16, MapError> {
        match self {
            Self::Deltas(deltas) => deltas.map_char(ch),
            Self::Coverage(coverage) => coverage.map_char(ch),
        }
    }

    /// Iterates over all `(code_point, glyph_idx)` mappings in the table.
    pub(super) fn mappings(&self) -> Box<dyn Iterator<Item = (u32, u16)> + '_> {
        match self {
            Self::Deltas(deltas) => Box::new(deltas.mappings()),
            Self::Coverage(coverage) => Box::new(coverage.mappings()),
        }
    }
}
