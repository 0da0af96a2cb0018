//! `GlyphOutline` and related types.

use super::Cursor;
use crate::{alloc::Vec, ParseError};

/// Outline data of a glyph as stored in the `glyf` table.
#[derive(Debug, PartialEq)]
pub(crate) enum GlyphOutline {
    /// Glyph without data, e.g. a space.
    Empty,
    Simple {
        contour_count: u16,
    },
    Composite {
        /// Indices of component glyphs in the order of their descriptors.
        components: Vec<u16>,
    },
}

impl GlyphOutline {
    pub(super) fn parse(raw: Cursor<'_>) -> Result<Self, ParseError> {
        if raw.bytes.is_empty() {
            return Ok(Self::Empty);
        }

        let mut cursor = raw;
        let number_of_contours = cursor.read_u16()?;
        if number_of_contours > i16::MAX as u16 {
            cursor.skip(8)?; // xMin, yMin, xMax, yMax
            let mut has_more_components = true;
            let mut components = Vec::with_capacity(1);
            while has_more_components {
                let (glyph_idx, new_has_more_components) = Self::read_component(&mut cursor)?;
                components.push(glyph_idx);
                has_more_components = new_has_more_components;
            }
            Ok(Self::Composite { components })
        } else {
            Ok(Self::Simple {
                contour_count: number_of_contours,
            })
        }
    }

    /// Reads a component descriptor, returning the component glyph index and whether more
    /// components follow.
    fn read_component(cursor: &mut Cursor<'_>) -> Result<(u16, bool), ParseError> {
        const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
        const WE_HAVE_A_SCALE: u16 = 0x008;
        const MORE_COMPONENTS: u16 = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

        let flags = cursor.read_u16()?;
        let glyph_idx = cursor.read_u16()?;
        let args_len = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            4
        } else {
            2
        };
        let transform_len = if flags & WE_HAVE_A_SCALE != 0 {
            2
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            4
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            8
        } else {
            0
        };
        cursor.skip(args_len + transform_len)?;

        let has_more_components = flags & MORE_COMPONENTS != 0;
        Ok((glyph_idx, has_more_components))
    }

    /// Checks whether the glyph has path data that can be rendered.
    pub(crate) fn is_renderable(&self) -> bool {
        match self {
            Self::Empty => false,
            Self::Simple { contour_count } => *contour_count > 0,
            Self::Composite { components } => !components.is_empty(),
        }
    }
}
