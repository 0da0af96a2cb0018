use std::{collections::BTreeMap, iter};

use allsorts::{binary::read::ReadScope, font::MatchingPresentation, font_data::FontData};
use test_casing::test_casing;

use crate::{
    check_text, Font, FontInventory, FontMetadata, FontNames, GlyphInfo, GlyphSet,
    InventoryOptions, ParseErrorKind, TableTag,
};

/// In-memory glyph set.
#[derive(Debug, Default)]
pub(crate) struct MockGlyphSet {
    glyphs: Vec<(Option<u32>, Option<&'static str>, bool)>,
    names: FontNames,
}

impl MockGlyphSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn glyph(
        mut self,
        unicode: Option<u32>,
        name: Option<&'static str>,
        has_outline: bool,
    ) -> Self {
        self.glyphs.push((unicode, name, has_outline));
        self
    }
}

impl GlyphSet for MockGlyphSet {
    fn glyph_count(&self) -> u16 {
        self.glyphs.len().try_into().unwrap()
    }

    fn glyph(&self, idx: u16) -> GlyphInfo<'_> {
        let (unicode, name, has_outline) = self.glyphs[usize::from(idx)];
        GlyphInfo {
            idx,
            unicode,
            name,
            has_outline,
        }
    }

    fn names(&self) -> FontNames {
        self.names.clone()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum TestOutline {
    Empty,
    Simple,
    /// Composite glyph referencing the glyph with the specified index.
    Composite(u16),
}

impl TestOutline {
    fn write(self, buffer: &mut Vec<u8>) {
        const BOUNDING_BOX: [u8; 8] = [0, 0, 0, 0, 0, 100, 0, 100];

        match self {
            Self::Empty => { /* no data */ }
            Self::Simple => {
                write_u16(buffer, 1); // numberOfContours
                buffer.extend_from_slice(&BOUNDING_BOX);
                write_u16(buffer, 0); // endPtsOfContours[0]
                write_u16(buffer, 0); // instructionLength
                buffer.push(1); // flags: ON_CURVE_POINT, 16-bit coordinates
                write_u16(buffer, 100); // x
                write_u16(buffer, 100); // y
                buffer.push(0); // padding
            }
            Self::Composite(component_idx) => {
                write_u16(buffer, u16::MAX); // numberOfContours = -1
                buffer.extend_from_slice(&BOUNDING_BOX);
                write_u16(buffer, 0x0002); // flags: ARGS_ARE_XY_VALUES
                write_u16(buffer, component_idx);
                buffer.extend_from_slice(&[0, 0]); // 8-bit args
            }
        }
    }
}

#[derive(Debug)]
struct TestGlyph {
    name: &'static str,
    chars: Vec<char>,
    outline: TestOutline,
}

/// Builder of minimal TrueType fonts.
#[derive(Debug)]
pub(crate) struct TestFontBuilder {
    glyphs: Vec<TestGlyph>,
    names: Vec<(u16, &'static str)>,
    long_loca: bool,
    glyph_names: bool,
    skipped_tables: Vec<TableTag>,
}

fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0_u32, |acc, chunk| {
        let mut word = [0_u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        acc.wrapping_add(u32::from_be_bytes(word))
    })
}

impl TestFontBuilder {
    const HHEA: TableTag = TableTag(*b"hhea");
    const HMTX: TableTag = TableTag(*b"hmtx");

    pub(crate) fn new() -> Self {
        Self {
            glyphs: vec![TestGlyph {
                name: ".notdef",
                chars: vec![],
                outline: TestOutline::Simple,
            }],
            names: vec![],
            long_loca: false,
            glyph_names: true,
            skipped_tables: vec![],
        }
    }

    /// Adds a glyph mapped to all `chars`. An empty name is written as a zero-length `post` string.
    pub(crate) fn glyph(mut self, name: &'static str, chars: &str, outline: TestOutline) -> Self {
        self.glyphs.push(TestGlyph {
            name,
            chars: chars.chars().collect(),
            outline,
        });
        self
    }

    pub(crate) fn name(mut self, name_id: u16, value: &'static str) -> Self {
        self.names.push((name_id, value));
        self
    }

    pub(crate) fn long_loca(mut self, long_loca: bool) -> Self {
        self.long_loca = long_loca;
        self
    }

    pub(crate) fn without_glyph_names(mut self) -> Self {
        self.glyph_names = false;
        self
    }

    pub(crate) fn without_table(mut self, tag: TableTag) -> Self {
        self.skipped_tables.push(tag);
        self
    }

    fn glyph_count(&self) -> u16 {
        self.glyphs.len().try_into().unwrap()
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let (glyf, loca) = self.write_glyf_and_loca();
        let mut tables = BTreeMap::from([
            (TableTag::CMAP, self.write_cmap()),
            (TableTag::GLYF, glyf),
            (TableTag::HEAD, self.write_head()),
            (Self::HHEA, self.write_hhea()),
            (Self::HMTX, self.write_hmtx()),
            (TableTag::LOCA, loca),
            (TableTag::MAXP, self.write_maxp()),
            (TableTag::NAME, self.write_name()),
            (TableTag::POST, self.write_post()),
        ]);
        for tag in &self.skipped_tables {
            tables.remove(tag);
        }
        Self::assemble(&tables)
    }

    fn assemble(tables: &BTreeMap<TableTag, Vec<u8>>) -> Vec<u8> {
        let table_count = u16::try_from(tables.len()).unwrap();
        let mut buffer = vec![];
        write_u32(&mut buffer, Font::SFNT_VERSION);
        write_u16(&mut buffer, table_count);
        let entry_selector = u16::try_from(table_count.ilog2()).unwrap();
        let search_range = 16 << entry_selector;
        write_u16(&mut buffer, search_range);
        write_u16(&mut buffer, entry_selector);
        write_u16(&mut buffer, 16 * table_count - search_range);

        let data_offset = 12 + 16 * tables.len();
        let mut table_data = vec![];
        for (tag, table) in tables {
            let offset = data_offset + table_data.len();
            buffer.extend_from_slice(tag.as_bytes());
            write_u32(&mut buffer, checksum(table));
            write_u32(&mut buffer, offset.try_into().unwrap());
            write_u32(&mut buffer, table.len().try_into().unwrap());

            table_data.extend_from_slice(table);
            let padding = (4 - table_data.len() % 4) % 4;
            table_data.extend(iter::repeat_n(0_u8, padding));
        }
        assert_eq!(buffer.len(), data_offset);
        buffer.extend(table_data);
        buffer
    }

    fn write_glyf_and_loca(&self) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = vec![];
        let mut locations = vec![0];
        for glyph in &self.glyphs {
            glyph.outline.write(&mut glyf);
            locations.push(glyf.len());
        }

        let mut loca = vec![];
        for location in locations {
            if self.long_loca {
                write_u32(&mut loca, location.try_into().unwrap());
            } else {
                write_u16(&mut loca, (location / 2).try_into().unwrap());
            }
        }
        (glyf, loca)
    }

    fn write_head(&self) -> Vec<u8> {
        let mut buffer = vec![];
        write_u32(&mut buffer, 0x_0001_0000); // version
        write_u32(&mut buffer, 0x_0001_0000); // fontRevision
        write_u32(&mut buffer, 0); // checksumAdjustment
        write_u32(&mut buffer, 0x_5f0f_3cf5); // magicNumber
        write_u16(&mut buffer, 0x000b); // flags
        write_u16(&mut buffer, 1_000); // unitsPerEm
        buffer.extend_from_slice(&[0; 16]); // created, modified
        buffer.extend_from_slice(&[0, 0, 0, 0, 0, 100, 0, 100]); // bounding box
        write_u16(&mut buffer, 0); // macStyle
        write_u16(&mut buffer, 8); // lowestRecPPEM
        write_u16(&mut buffer, 2); // fontDirectionHint
        write_u16(&mut buffer, u16::from(self.long_loca)); // indexToLocFormat
        write_u16(&mut buffer, 0); // glyphDataFormat
        assert_eq!(buffer.len(), 54);
        buffer
    }

    fn write_hhea(&self) -> Vec<u8> {
        let mut buffer = vec![];
        write_u32(&mut buffer, 0x_0001_0000); // version
        write_u16(&mut buffer, 800); // ascender
        buffer.extend_from_slice(&(-200_i16).to_be_bytes()); // descender
        write_u16(&mut buffer, 0); // lineGap
        write_u16(&mut buffer, 500); // advanceWidthMax
        buffer.extend_from_slice(&[0; 4]); // minLeftSideBearing, minRightSideBearing
        write_u16(&mut buffer, 100); // xMaxExtent
        write_u16(&mut buffer, 1); // caretSlopeRise
        buffer.extend_from_slice(&[0; 4]); // caretSlopeRun, caretOffset
        buffer.extend_from_slice(&[0; 8]); // reserved
        write_u16(&mut buffer, 0); // metricDataFormat
        write_u16(&mut buffer, self.glyph_count()); // numberOfHMetrics
        assert_eq!(buffer.len(), 36);
        buffer
    }

    fn write_hmtx(&self) -> Vec<u8> {
        let mut buffer = vec![];
        for _ in &self.glyphs {
            write_u16(&mut buffer, 500); // advanceWidth
            write_u16(&mut buffer, 0); // lsb
        }
        buffer
    }

    fn write_maxp(&self) -> Vec<u8> {
        let mut buffer = vec![];
        write_u32(&mut buffer, 0x_0000_5000);
        write_u16(&mut buffer, self.glyph_count());
        buffer
    }

    fn char_map(&self) -> Vec<(u32, u16)> {
        let mut map: Vec<_> = self
            .glyphs
            .iter()
            .enumerate()
            .flat_map(|(idx, glyph)| {
                let idx = u16::try_from(idx).unwrap();
                glyph.chars.iter().map(move |&ch| (u32::from(ch), idx))
            })
            .collect();
        map.sort_unstable();
        map
    }

    /// Writes a format 4 subtable for BMP chars and, if necessary, a format 12 subtable for all chars.
    fn write_cmap(&self) -> Vec<u8> {
        let map = self.char_map();
        let bmp_map: Vec<_> = map
            .iter()
            .copied()
            .filter(|&(code_point, _)| code_point < u32::from(u16::MAX))
            .collect();
        let mut subtables = vec![((3, 1), Self::write_segment_deltas(&bmp_map))];
        if bmp_map.len() < map.len() {
            subtables.push(((3, 10), Self::write_segmented_coverage(&map)));
        }

        let mut buffer = vec![];
        write_u16(&mut buffer, 0); // version
        write_u16(&mut buffer, subtables.len().try_into().unwrap());
        let mut offset = 4 + 8 * subtables.len();
        for ((platform_id, encoding_id), subtable) in &subtables {
            write_u16(&mut buffer, *platform_id);
            write_u16(&mut buffer, *encoding_id);
            write_u32(&mut buffer, offset.try_into().unwrap());
            offset += subtable.len();
        }
        for (_, subtable) in subtables {
            buffer.extend(subtable);
        }
        buffer
    }

    /// Groups sequential mappings into `(start_code, end_code, start_glyph_id)` ranges.
    fn group_mappings(map: &[(u32, u16)]) -> Vec<(u32, u32, u16)> {
        let mut groups: Vec<(u32, u32, u16)> = vec![];
        for &(code_point, glyph_idx) in map {
            if let Some((start, end, start_glyph)) = groups.last_mut() {
                let expected_glyph = u32::from(*start_glyph) + code_point - *start;
                if code_point == *end + 1 && u32::from(glyph_idx) == expected_glyph {
                    *end += 1;
                    continue;
                }
            }
            groups.push((code_point, code_point, glyph_idx));
        }
        groups
    }

    fn write_segment_deltas(map: &[(u32, u16)]) -> Vec<u8> {
        let mut segments: Vec<_> = Self::group_mappings(map)
            .into_iter()
            .map(|(start, end, start_glyph)| {
                let start = u16::try_from(start).unwrap();
                let end = u16::try_from(end).unwrap();
                (start, end, start_glyph.wrapping_sub(start))
            })
            .collect();
        // Terminating segment; maps U+FFFF to the missing glyph.
        segments.push((u16::MAX, u16::MAX, 1));

        let segment_count = u16::try_from(segments.len()).unwrap();
        let mut buffer = vec![];
        write_u16(&mut buffer, 4); // format
        write_u16(&mut buffer, 16 + 8 * segment_count); // length
        write_u16(&mut buffer, 0); // language
        write_u16(&mut buffer, 2 * segment_count);
        let entry_selector = u16::try_from(segment_count.ilog2()).unwrap();
        let search_range = 1 << (entry_selector + 1);
        write_u16(&mut buffer, search_range);
        write_u16(&mut buffer, entry_selector);
        write_u16(&mut buffer, 2 * segment_count - search_range);

        for &(_, end, _) in &segments {
            write_u16(&mut buffer, end);
        }
        write_u16(&mut buffer, 0); // reserved padding
        for &(start, _, _) in &segments {
            write_u16(&mut buffer, start);
        }
        for &(_, _, delta) in &segments {
            write_u16(&mut buffer, delta);
        }
        for _ in &segments {
            write_u16(&mut buffer, 0); // idRangeOffset
        }
        buffer
    }

    fn write_segmented_coverage(map: &[(u32, u16)]) -> Vec<u8> {
        let groups = Self::group_mappings(map);
        let mut buffer = vec![];
        write_u16(&mut buffer, 12); // format
        write_u16(&mut buffer, 0); // reserved
        write_u32(&mut buffer, (16 + 12 * groups.len()).try_into().unwrap());
        write_u32(&mut buffer, 0); // language
        write_u32(&mut buffer, groups.len().try_into().unwrap());
        for (start, end, start_glyph) in groups {
            write_u32(&mut buffer, start);
            write_u32(&mut buffer, end);
            write_u32(&mut buffer, start_glyph.into());
        }
        buffer
    }

    fn write_post(&self) -> Vec<u8> {
        let mut buffer = vec![];
        let version = if self.glyph_names {
            0x_0002_0000
        } else {
            0x_0003_0000
        };
        write_u32(&mut buffer, version);
        buffer.resize(32, 0); // italicAngle, underline metrics, isFixedPitch, memory usage
        if !self.glyph_names {
            return buffer;
        }

        write_u16(&mut buffer, self.glyph_count());
        let mut custom_names = vec![];
        for glyph in &self.glyphs {
            if glyph.name == ".notdef" {
                write_u16(&mut buffer, 0);
            } else {
                write_u16(&mut buffer, 258 + u16::try_from(custom_names.len()).unwrap());
                custom_names.push(glyph.name);
            }
        }
        for name in custom_names {
            buffer.push(name.len().try_into().unwrap());
            buffer.extend_from_slice(name.as_bytes());
        }
        buffer
    }

    fn write_name(&self) -> Vec<u8> {
        let mut names = self.names.clone();
        names.sort_unstable_by_key(|(id, _)| *id);

        let mut buffer = vec![];
        let mut storage = vec![];
        write_u16(&mut buffer, 0); // version
        let count = u16::try_from(names.len()).unwrap();
        write_u16(&mut buffer, count);
        write_u16(&mut buffer, 6 + 12 * count); // storageOffset
        for (name_id, value) in names {
            let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
            write_u16(&mut buffer, 3); // Windows platform
            write_u16(&mut buffer, 1); // Unicode BMP encoding
            write_u16(&mut buffer, 0x0409); // English (US)
            write_u16(&mut buffer, name_id);
            write_u16(&mut buffer, encoded.len().try_into().unwrap());
            write_u16(&mut buffer, storage.len().try_into().unwrap());
            storage.extend(encoded);
        }
        buffer.extend(storage);
        buffer
    }
}

fn sample_font() -> Vec<u8> {
    TestFontBuilder::new()
        .glyph("space", " \u{a0}", TestOutline::Empty)
        .glyph("A", "A", TestOutline::Simple)
        .glyph("B", "B", TestOutline::Simple)
        .glyph("Aacute", "Á", TestOutline::Composite(2))
        .glyph("uni4E2D", "中", TestOutline::Simple)
        .glyph("u1F600", "😀", TestOutline::Simple)
        .glyph("u20000", "\u{20000}", TestOutline::Simple)
        .glyph("A.ss01", "", TestOutline::Simple)
        .glyph("", "\t", TestOutline::Empty)
        .name(1, "Test Sans")
        .name(2, "Regular")
        .build()
}

#[test]
fn parsing_synthesized_font() {
    let bytes = sample_font();
    let font = Font::new(&bytes).unwrap();
    assert_eq!(font.glyph_count(), 10);

    assert_eq!(font.glyph_unicode(0), None);
    // Lowest code point wins if a glyph is mapped from several chars.
    assert_eq!(font.glyph_unicode(1), Some(0x20));
    assert_eq!(font.glyph_unicode(2), Some(0x41));
    assert_eq!(font.glyph_unicode(7), Some(0x2_0000));
    assert_eq!(font.glyph_unicode(8), None);

    assert_eq!(font.glyph_name(0), Some(".notdef"));
    assert_eq!(font.glyph_name(4), Some("Aacute"));
    assert_eq!(font.glyph(9).display_name(), "glyph9");

    assert!(font.has_outline(0));
    assert!(!font.has_outline(1));
    assert!(font.has_outline(4)); // composite

    assert_eq!(font.map_char('B').unwrap(), 3);
    assert_eq!(font.map_char('\u{20000}').unwrap(), 7);
    assert_eq!(font.map_char('C').unwrap(), 0);

    let names = font.names();
    assert_eq!(names.family.as_deref(), Some("Test Sans"));
    assert_eq!(names.subfamily.as_deref(), Some("Regular"));
    assert_eq!(names.full_name, None);
}

#[test_casing(2, [false, true])]
fn reading_font_matches_reference_parser(long_loca: bool) {
    let bytes = TestFontBuilder::new()
        .glyph("A", "AÀ", TestOutline::Simple)
        .glyph("B", "B", TestOutline::Simple)
        .glyph("C", "C", TestOutline::Simple)
        .glyph("Cyrillic", "ЖЗ", TestOutline::Simple)
        .glyph("u20000", "\u{20000}", TestOutline::Simple)
        .long_loca(long_loca)
        .build();
    let font = Font::new(&bytes).unwrap();

    let font_file = ReadScope::new(&bytes).read::<FontData<'_>>().unwrap();
    let font_provider = font_file.table_provider(0).unwrap();
    let mut reference_font = allsorts::Font::new(font_provider).unwrap();

    for ch in "ABCDÀЖЗИ\u{20000}\u{20001} ".chars() {
        let idx = font.map_char(ch).unwrap();
        let (expected_idx, _) =
            reference_font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_eq!(idx, expected_idx, "{ch:?}");
    }
}

#[test]
fn taking_inventory_of_parsed_font() {
    let bytes = sample_font();
    let inventory = FontInventory::from_bytes(&bytes, &InventoryOptions::default()).unwrap();
    assert_eq!(inventory.extracted_text(), " ABÁ中😀\u{20000}");
    assert_eq!(inventory.glyph_count(), 7);
    assert!(inventory
        .glyphs()
        .windows(2)
        .all(|pair| pair[0].unicode < pair[1].unicode));

    let space = &inventory.glyphs()[0];
    assert_eq!(space.name, "space");
    assert!(!space.has_outline);

    let metadata = inventory.metadata();
    assert_eq!(metadata.full_name, "Test Sans Regular");
    assert_eq!(metadata.postscript_name, "TestSansRegular");
}

#[test]
fn checking_text_against_parsed_font() {
    let bytes = sample_font();
    let font = Font::new(&bytes).unwrap();

    let check = check_text(&font, "AB中\u{20000}X");
    assert_eq!(check.chars.len(), 5);
    assert_eq!(check.missing_chars, ['X']);
    assert_eq!(check.chars[3].glyph_name.as_deref(), Some("u20000"));

    // No-break space shares a glyph with the space, and only the lowest code point is recorded
    // for the glyph.
    let check = check_text(&font, " \u{a0}");
    assert_eq!(check.missing_chars, ['\u{a0}']);
}

#[test]
fn fallback_glyph_and_font_names() {
    let bytes = TestFontBuilder::new()
        .glyph("A", "A", TestOutline::Simple)
        .without_glyph_names()
        .without_table(TableTag::NAME)
        .build();
    let inventory = FontInventory::from_bytes(&bytes, &InventoryOptions::default()).unwrap();
    assert_eq!(inventory.glyphs()[0].name, "glyph1");
    assert_eq!(
        *inventory.metadata(),
        FontMetadata::new(FontNames::default())
    );
    assert_eq!(inventory.metadata().family, "Unknown");
}

#[test_casing(3, [TableTag::CMAP, TableTag::HEAD, TableTag::LOCA])]
fn missing_required_table(tag: TableTag) {
    let bytes = TestFontBuilder::new()
        .glyph("A", "A", TestOutline::Simple)
        .without_table(tag)
        .build();
    let err = Font::new(&bytes).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::MissingTable), "{err}");
    assert_eq!(err.table(), Some(tag));
}

#[test]
fn cff_fonts_are_not_supported() {
    let mut bytes = TestFontBuilder::new().build();
    bytes[..4].copy_from_slice(b"OTTO");
    let err = Font::new(&bytes).unwrap_err();
    assert!(
        matches!(err.kind(), ParseErrorKind::UnexpectedFontVersion),
        "{err}"
    );
    assert!(FontInventory::from_bytes(&bytes, &InventoryOptions::default()).is_err());
}

#[test]
fn truncated_font() {
    let bytes = sample_font();
    let err = Font::new(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(
        matches!(err.kind(), ParseErrorKind::RangeOutOfBounds { .. }),
        "{err}"
    );

    let err = Font::new(&bytes[..10]).unwrap_err();
    assert!(matches!(err.kind(), ParseErrorKind::UnexpectedEof), "{err}");
}

#[test]
fn corrupted_glyph_data_is_not_fatal() {
    let bytes = TestFontBuilder::new()
        .glyph("A", "A", TestOutline::Simple)
        .glyph("B", "B", TestOutline::Simple)
        .build();
    let mut font = Font::new(&bytes).unwrap();
    // Truncate `glyf` so that the last glyph is out of bounds.
    font.glyf = font.glyf.range(0..40).unwrap();

    assert!(font.has_outline(1));
    assert!(!font.has_outline(2));
    let inventory = FontInventory::new(&font, &InventoryOptions::default());
    assert_eq!(inventory.extracted_text(), "AB");
    assert!(!inventory.glyphs()[1].has_outline);
}

fn table_offset(font_bytes: &[u8], tag: TableTag) -> usize {
    let table_count = usize::from(u16::from_be_bytes([font_bytes[4], font_bytes[5]]));
    let record = font_bytes[12..12 + 16 * table_count]
        .chunks(16)
        .find(|record| record[..4] == *tag.as_bytes())
        .unwrap();
    u32::from_be_bytes(record[8..12].try_into().unwrap()) as usize
}

#[test]
fn out_of_bounds_cmap_subtable() {
    let mut bytes = TestFontBuilder::new()
        .glyph("A", "A", TestOutline::Simple)
        .build();
    // Offset of the first encoding record
    let offset = table_offset(&bytes, TableTag::CMAP) + 8;
    bytes[offset..offset + 4].copy_from_slice(&0x_ffff_u32.to_be_bytes());

    let err = Font::new(&bytes).unwrap_err();
    assert!(
        matches!(err.kind(), ParseErrorKind::OffsetOutOfBounds(0x_ffff)),
        "{err}"
    );
    assert_eq!(err.table(), Some(TableTag::CMAP));
}
