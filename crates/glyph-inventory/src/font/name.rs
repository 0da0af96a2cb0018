//! `name` table processing.

use super::Cursor;
use crate::{
    alloc::{String, Vec},
    errors::ParseErrorKind,
    ParseError,
};

/// Name identifier in the `name` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameId(pub(crate) u16);

impl NameId {
    pub(crate) const FAMILY: Self = Self(1);
    pub(crate) const SUBFAMILY: Self = Self(2);
    pub(crate) const FULL_NAME: Self = Self(4);
    pub(crate) const POSTSCRIPT_NAME: Self = Self(6);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf16Be,
    MacRoman,
}

#[derive(Debug, Clone, Copy)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: NameId,
    /// Range in the string storage.
    range: (usize, usize),
}

impl NameRecord {
    const WINDOWS_ENGLISH_US: u16 = 0x0409;

    fn encoding(&self) -> Option<Encoding> {
        match (self.platform_id, self.encoding_id) {
            (0, _) | (3, 0 | 1 | 10) => Some(Encoding::Utf16Be),
            (1, 0) => Some(Encoding::MacRoman),
            _ => None,
        }
    }

    /// Lower is better; `None` means the record cannot be used.
    fn priority(&self) -> Option<u8> {
        self.encoding()?;
        match self.platform_id {
            3 if self.language_id == Self::WINDOWS_ENGLISH_US => Some(0),
            0 => Some(1),
            1 if self.language_id == 0 => Some(2),
            _ => None,
        }
    }
}

/// Naming table. Only English names are read.
#[derive(Debug)]
pub(crate) struct NameTable<'a> {
    records: Vec<NameRecord>,
    storage: &'a [u8],
}

impl<'a> NameTable<'a> {
    pub(super) fn parse(mut cursor: Cursor<'a>) -> Result<Self, ParseError> {
        let table_cursor = cursor;
        cursor.read_u16_checked(|version| {
            if version > 1 {
                return Err(ParseErrorKind::UnexpectedTableVersion {
                    version: version.into(),
                });
            }
            Ok(())
        })?;
        let count = cursor.read_u16()?;
        let storage_offset = usize::from(cursor.read_u16()?);

        let records = (0..count).map(|_| {
            let platform_id = cursor.read_u16()?;
            let encoding_id = cursor.read_u16()?;
            let language_id = cursor.read_u16()?;
            let name_id = NameId(cursor.read_u16()?);
            let len = usize::from(cursor.read_u16()?);
            let offset = usize::from(cursor.read_u16()?);
            Ok(NameRecord {
                platform_id,
                encoding_id,
                language_id,
                name_id,
                range: (offset, offset + len),
            })
        });
        let records = records.collect::<Result<_, ParseError>>()?;

        let storage = table_cursor
            .range(storage_offset..table_cursor.bytes.len())?
            .bytes;
        Ok(Self { records, storage })
    }

    /// Gets the English name with the specified ID. Empty names are treated as missing.
    pub(crate) fn get(&self, id: NameId) -> Option<String> {
        let record = self
            .records
            .iter()
            .filter(|record| record.name_id == id)
            .filter_map(|record| Some((record.priority()?, record)))
            .min_by_key(|(priority, _)| *priority)?
            .1;

        let (start, end) = record.range;
        let Some(raw) = self.storage.get(start..end) else {
            log::warn!("`name` record #{} is out of bounds: {start}..{end}", id.0);
            return None;
        };
        let name = match record.encoding()? {
            Encoding::Utf16Be => decode_utf16_be(raw),
            Encoding::MacRoman => raw.iter().copied().map(decode_mac_roman).collect(),
        };
        Some(name).filter(|name| !name.is_empty())
    }
}

fn decode_utf16_be(raw: &[u8]) -> String {
    let units = raw
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]));
    char::decode_utf16(units)
        .map(|res| res.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn decode_mac_roman(raw: u8) -> char {
    const START_REMAP: u8 = 128;

    if raw < START_REMAP {
        char::from(raw)
    } else {
        let code_point = MAC_ROMAN_DECODE[usize::from(raw - START_REMAP)];
        char::from_u32(code_point.into()).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Unicode values of Mac OS Roman bytes `128..=255`.
#[rustfmt::skip]
static MAC_ROMAN_DECODE: [u16; 128] = [
    196, 197, 199, 201, 209, 214, 220, 225, 224, 226, 228, 227, 229, 231, 233,
    232, 234, 235, 237, 236, 238, 239, 241, 243, 242, 244, 246, 245, 250, 249,
    251, 252, 8224, 176, 162, 163, 167, 8226, 182, 223, 174, 169, 8482, 180,
    168, 8800, 198, 216, 8734, 177, 8804, 8805, 165, 181, 8706, 8721, 8719,
    960, 8747, 170, 186, 937, 230, 248, 191, 161, 172, 8730, 402, 8776, 8710,
    171, 187, 8230, 160, 192, 195, 213, 338, 339, 8211, 8212, 8220, 8221, 8216,
    8217, 247, 9674, 255, 376, 8260, 8364, 8249, 8250, 64257, 64258, 8225, 183,
    8218, 8222, 8240, 194, 202, 193, 203, 200, 205, 206, 207, 204, 211, 212,
    63743, 210, 218, 219, 217, 305, 710, 732, 175, 728, 729, 730, 184, 733,
    731, 711,
];
