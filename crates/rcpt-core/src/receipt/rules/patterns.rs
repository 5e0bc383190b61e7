//! Common regex patterns for receipt extraction.
//!
//! Amount patterns depend on the configured currency symbols and are built
//! per extractor in [`super::amounts`].
//!
//! Digits are ASCII `[0-9]` throughout; `\d` would also match other
//! scripts' digits, which neither `Decimal` nor `chrono` can parse.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 31/12/2023 or 31-12-2023
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"[0-9]{2}[/-][0-9]{2}[/-][0-9]{4}"
    ).unwrap();

    // 2023-12-31
    pub static ref DATE_ISO: Regex = Regex::new(
        r"[0-9]{4}[/-][0-9]{2}[/-][0-9]{2}"
    ).unwrap();

    // 31/12/23
    pub static ref DATE_SHORT_YEAR: Regex = Regex::new(
        r"[0-9]{2}[/-][0-9]{2}[/-][0-9]{2}"
    ).unwrap();

    // December 2023, Jan 2024
    pub static ref DATE_MONTH_YEAR: Regex = Regex::new(
        r"[A-Za-z]+\s+[0-9]{4}"
    ).unwrap();

    // December 8, 2023
    pub static ref DATE_MONTH_DAY_YEAR: Regex = Regex::new(
        r"[A-Za-z]+\s+[0-9]{1,2},\s*[0-9]{4}"
    ).unwrap();

    /// Date shapes in priority order.
    pub static ref DATE_PATTERNS: [&'static Regex; 5] = [
        &*DATE_NUMERIC,
        &*DATE_ISO,
        &*DATE_SHORT_YEAR,
        &*DATE_MONTH_YEAR,
        &*DATE_MONTH_DAY_YEAR,
    ];

    // Bare year used by the last date fallback
    pub static ref YEAR_20XX: Regex = Regex::new(
        r"20[0-9]{2}"
    ).unwrap();

    // First numeric run of a cleaned amount candidate
    pub static ref NUMERIC_RUN: Regex = Regex::new(
        r"[0-9.]+"
    ).unwrap();

    // Line marking an invoice header
    pub static ref INVOICE_MARKER: Regex = Regex::new(
        r"(?i)invoice"
    ).unwrap();

    pub static ref DATE_WORD: Regex = Regex::new(
        r"(?i)date"
    ).unwrap();

    pub static ref ANY_DIGIT: Regex = Regex::new(
        r"[0-9]"
    ).unwrap();
}

/// Amount label patterns, in priority order, without the currency part.
///
/// `{sym}` is replaced with an optional currency symbol group.
pub const AMOUNT_LABEL_TEMPLATES: [(&str, &str); 3] = [
    ("total", r"Total\s*[:\-]?\s*{sym}\s?[0-9]+[\.,][0-9]{2}"),
    ("amount due", r"Amount\s*Due\s*[:\-]?\s*{sym}\s?[0-9]+[\.,][0-9]{2}"),
    ("grand total", r"Grand\s*Total\s*[:\-]?\s*{sym}\s?[0-9]+[\.,][0-9]{2}"),
];

/// Symbol-prefixed grouped decimal, `{sym}` being a required symbol group.
pub const AMOUNT_SYMBOL_TEMPLATE: &str = r"{sym}\s?[0-9]{1,3}(?:,[0-9]{3})*(?:\.[0-9]{2})?";

/// Bare decimal with two fraction digits.
pub const AMOUNT_BARE: &str = r"[0-9,]+[\.,][0-9]{2}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_patterns_in_priority_order() {
        assert!(DATE_PATTERNS[0].is_match("31/12/2023"));
        assert!(DATE_PATTERNS[1].is_match("2023-12-31"));
        assert!(DATE_PATTERNS[2].is_match("31/12/23"));
        assert!(DATE_PATTERNS[3].is_match("December 2023"));
        assert!(DATE_PATTERNS[4].is_match("December 8, 2023"));
    }

    #[test]
    fn test_numeric_date_needs_four_digit_year() {
        assert!(!DATE_NUMERIC.is_match("2024-01-01"));
        assert!(DATE_SHORT_YEAR.is_match("2024-01-01"));
    }
}
