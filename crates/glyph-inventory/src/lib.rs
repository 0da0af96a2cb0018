//! Glyph inventory and text coverage checks for TrueType fonts.
//!
//! The crate answers two questions about a font: which characters can it render
//! ([`FontInventory`]), and can it render a specific string ([`check_text()`]).
//! Both are generic over the [`GlyphSet`] abstraction; [`Font`] is the bundled
//! TrueType implementation.
//!
//! # Crate features
//!
//! ## `std`
//!
//! *(On by default)*
//!
//! Enables `std`-specific functionality, such as [`Error`](std::error::Error) trait implementations
//! for error types. Without this feature, the crate is `no_std`-compatible, but still requires
//! an allocator.

#![cfg_attr(not(feature = "std"), no_std)]
#![doc(html_root_url = "https://docs.rs/glyph-inventory/0.1.0")]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

mod coverage;
mod errors;
mod font;
mod glyphs;
mod inventory;
mod printable;
#[cfg(test)]
pub(crate) mod tests;

pub use crate::{
    coverage::{check_char, check_text, check_texts, CharCheck, TextCheck},
    errors::{MapError, ParseError, ParseErrorKind, UnknownFormatError},
    font::{Font, TableTag},
    glyphs::{FontNames, GlyphInfo, GlyphSet},
    inventory::{FontInventory, FontMetadata, GlyphRecord, InventoryOptions, OutputFormat},
    printable::{is_printable, printable_block},
};

mod alloc {
    pub(crate) use std::{
        borrow::{Cow, ToOwned},
        boxed::Box,
        collections::{BTreeMap, BTreeSet},
        format,
        string::String,
        vec,
        vec::Vec,
    };
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
