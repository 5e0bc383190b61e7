//! Receipt data models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category used when the vendor is unknown or unmapped.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Currency used when no currency symbol is detected.
pub const DEFAULT_CURRENCY: &str = "Unknown";

/// Structured fields extracted from one receipt transcript.
///
/// `category` and `currency` are always populated (falling back to sentinel
/// values); the remaining fields are absent when nothing usable was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReceipt {
    /// Merchant name.
    pub vendor: Option<String>,

    /// Receipt date in `YYYY-MM-DD` form.
    pub date: Option<String>,

    /// Receipt total.
    pub amount: Option<Decimal>,

    /// Spending category.
    pub category: String,

    /// ISO currency code or the `Unknown` sentinel.
    pub currency: String,
}

impl ParsedReceipt {
    /// A record with every optional field absent and sentinel defaults.
    pub fn empty() -> Self {
        Self {
            vendor: None,
            date: None,
            amount: None,
            category: DEFAULT_CATEGORY.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Whether the extractors produced none of the optional fields.
    pub fn is_blank(&self) -> bool {
        self.vendor.is_none() && self.date.is_none() && self.amount.is_none()
    }
}

impl Default for ParsedReceipt {
    fn default() -> Self {
        Self::empty()
    }
}

/// A receipt as persisted, with its storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReceipt {
    /// Storage-assigned identifier.
    pub id: i64,

    /// Extracted (or since edited) fields.
    #[serde(flatten)]
    pub receipt: ParsedReceipt,

    /// Original upload file name.
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_empty_receipt_has_sentinels() {
        let receipt = ParsedReceipt::empty();
        assert_eq!(receipt.category, "Other");
        assert_eq!(receipt.currency, "Unknown");
        assert!(receipt.is_blank());
    }

    #[test]
    fn test_stored_receipt_serializes_flat() {
        let stored = StoredReceipt {
            id: 7,
            receipt: ParsedReceipt {
                vendor: Some("Amazon".to_string()),
                date: Some("2024-01-01".to_string()),
                amount: Some(Decimal::from_str("123.45").unwrap()),
                category: "Shopping".to_string(),
                currency: "USD".to_string(),
            },
            filename: Some("amazon.txt".to_string()),
        };

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["vendor"], "Amazon");
        assert_eq!(json["amount"], "123.45");
        assert_eq!(json["filename"], "amazon.txt");

        let back: StoredReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back, stored);
    }
}
