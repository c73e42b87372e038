//! Conversion of tab markup into chord sheets.

mod chords;
mod sheet;

pub use chords::{
    extract_root_note, is_chord_token, normalize_chord_name, ChordFrequency, ChordParser,
    ChordStats,
};
pub use sheet::{format_body, ConversionResult, SheetConverter, UNKNOWN_KEY};

use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required field is missing; nothing was rendered.
    #[error("Validation failed: {0}")]
    Validation(String),
}
