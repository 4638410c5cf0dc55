//! Parsing of attendant-typed numeric fields before they reach the ledger.

use crate::errors::LedgerError;

/// Digits allowed after the decimal point in a decimal field.
pub const MAX_FRACTION_DIGITS: usize = 3;

/// Parses the text of a numeric entry field.
///
/// Accepts plain digits, or for decimal fields digits with one `.` followed by
/// at most three digits. Signs, exponents, separators and empty input are
/// rejected.
pub fn parse_amount(text: &str, decimal: bool) -> Result<f64, LedgerError> {
    let trimmed = text.trim();
    let invalid = || LedgerError::Validation(format!("`{text}` is not a valid amount"));
    let (whole, fraction) = match trimmed.split_once('.') {
        Some(_) if !decimal => return Err(invalid()),
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (trimmed, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) {
        return Err(invalid());
    }
    if let Some(fraction) = fraction {
        if !all_digits(fraction) || fraction.len() > MAX_FRACTION_DIGITS {
            return Err(invalid());
        }
    }
    if whole.is_empty() && fraction.map_or(true, str::is_empty) {
        return Err(invalid());
    }
    trimmed.parse::<f64>().map_err(|_| invalid())
}
