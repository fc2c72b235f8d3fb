use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Unparsable amount '{raw}' (normalized to '{normalized}')")]
    Unparsable { raw: String, normalized: String },
}

/// Turn a raw amount ("5,00", "7.5", "1050") into an exact decimal.
///
/// Input is the digit group captured by the classifier, which never carries
/// a sign.
///
/// A comma separator becomes a dot. When no separator survives and the text
/// is longer than two characters, the last two digits are taken as cents,
/// which repairs readings where OCR lost the decimal point. Text of one or
/// two characters stays an integer: "5" is 5, not 0.05.
pub fn normalize_amount(raw: &str) -> Result<Decimal, AmountError> {
    let mut normalized = raw.trim().replace(',', ".");

    if !normalized.contains('.') && normalized.chars().count() > 2 {
        // Byte offset of the second-to-last char.
        if let Some((idx, _)) = normalized.char_indices().rev().nth(1) {
            normalized.insert(idx, '.');
        }
    }

    Decimal::from_str(&normalized).map_err(|_| AmountError::Unparsable {
        raw: raw.to_string(),
        normalized,
    })
}
