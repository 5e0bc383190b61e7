//! Receipt listing filters and field updates.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Value;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Column a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Amount,
    Date,
    Vendor,
    Category,
    Currency,
}

impl SortField {
    fn order_expr(self) -> &'static str {
        match self {
            SortField::Amount => "CAST(amount AS REAL)",
            SortField::Date => "date",
            SortField::Vendor => "vendor",
            SortField::Category => "category",
            SortField::Currency => "currency",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amount" => Ok(SortField::Amount),
            "date" => Ok(SortField::Date),
            "vendor" => Ok(SortField::Vendor),
            "category" => Ok(SortField::Category),
            "currency" => Ok(SortField::Currency),
            other => Err(format!(
                "unknown sort field {:?} (expected amount, date, vendor, category or currency)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order {:?} (expected asc or desc)", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

/// Filters, ordering and paging for listing receipts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptQuery {
    /// Substring matched against vendor, category and filename.
    pub search: Option<String>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    pub sort_by: Option<SortField>,
    pub order: SortOrder,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ReceiptQuery {
    fn default() -> Self {
        Self {
            search: None,
            vendor: None,
            category: None,
            currency: None,
            min_amount: None,
            max_amount: None,
            date_from: None,
            date_to: None,
            sort_by: None,
            order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ReceiptQuery {
    /// `WHERE ... ORDER BY ...` clause and its positional parameters.
    pub(crate) fn filter_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = vec!["1=1".to_string()];
        let mut params = Vec::new();

        if let Some(ref search) = self.search {
            clauses.push("(vendor LIKE ? OR category LIKE ? OR filename LIKE ?)".to_string());
            let pattern = format!("%{}%", search);
            params.extend(std::iter::repeat_n(Value::Text(pattern), 3));
        }

        let exact = [
            ("vendor", &self.vendor),
            ("category", &self.category),
            ("currency", &self.currency),
        ];
        for (column, value) in exact {
            if let Some(value) = value {
                clauses.push(format!("{} = ?", column));
                params.push(Value::Text(value.clone()));
            }
        }

        let bounds = [(">=", self.min_amount), ("<=", self.max_amount)];
        for (op, bound) in bounds {
            if let Some(bound) = bound.and_then(|b| b.to_f64()) {
                clauses.push(format!("CAST(amount AS REAL) {} ?", op));
                params.push(Value::Real(bound));
            }
        }

        if let Some(ref from) = self.date_from {
            clauses.push("date >= ?".to_string());
            params.push(Value::Text(from.clone()));
        }
        if let Some(ref to) = self.date_to {
            clauses.push("date <= ?".to_string());
            params.push(Value::Text(to.clone()));
        }

        let mut sql = format!(" WHERE {}", clauses.join(" AND "));
        match self.sort_by {
            Some(field) => {
                sql.push_str(&format!(" ORDER BY {} {}, id ASC", field.order_expr(), self.order))
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        (sql, params)
    }

    /// `(limit, offset)` of the requested page.
    pub(crate) fn limit_offset(&self) -> (i64, i64) {
        let page = self.page.max(1) as i64;
        let size = self.page_size as i64;
        (size, (page - 1).saturating_mul(size))
    }
}

/// Explicit edits to a stored receipt.
///
/// Values are raw user input; dates and amounts are validated before any
/// write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptUpdate {
    pub vendor: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
    pub category: Option<String>,
    pub currency: Option<String>,
    pub filename: Option<String>,
}

impl ReceiptUpdate {
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    fn assignments(&self) -> Vec<(&'static str, &String)> {
        [
            ("vendor", &self.vendor),
            ("date", &self.date),
            ("amount", &self.amount),
            ("category", &self.category),
            ("currency", &self.currency),
            ("filename", &self.filename),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_ref().map(|v| (column, v)))
        .collect()
    }

    /// Validated `(column, value)` pairs in column order.
    pub(crate) fn validated(&self) -> Result<Vec<(&'static str, Value)>, StorageError> {
        let assignments = self.assignments();
        if assignments.is_empty() {
            return Err(StorageError::NoFieldsToUpdate);
        }

        assignments
            .into_iter()
            .map(|(column, raw)| -> Result<_, StorageError> {
                let value = match column {
                    "date" => canonical_date(raw)?,
                    "amount" => amount_to_text(parse_stored_amount(raw)?),
                    _ => raw.clone(),
                };
                Ok((column, Value::Text(value)))
            })
            .collect()
    }
}

fn canonical_date(raw: &str) -> Result<String, StorageError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| StorageError::InvalidField {
            field: "date".to_string(),
            value: raw.to_string(),
        })
}

fn parse_stored_amount(raw: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|d| !d.is_sign_negative())
        .ok_or_else(|| StorageError::InvalidField {
            field: "amount".to_string(),
            value: raw.to_string(),
        })
}

/// Canonical text form of a stored amount: no trailing zeros beyond cents.
pub(crate) fn amount_to_text(amount: Decimal) -> String {
    let mut amount = amount.normalize();
    if amount.scale() < 2 {
        amount.rescale(2);
    }
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_query() {
        let query = ReceiptQuery::default();
        let (sql, params) = query.filter_sql();
        assert_eq!(sql, " WHERE 1=1 ORDER BY id ASC");
        assert!(params.is_empty());
        assert_eq!(query.limit_offset(), (20, 0));
    }

    #[test]
    fn test_filters_and_sort() {
        let query = ReceiptQuery {
            search: Some("mart".to_string()),
            currency: Some("USD".to_string()),
            min_amount: Some(Decimal::new(1000, 2)),
            sort_by: Some(SortField::Amount),
            order: SortOrder::Desc,
            page: 3,
            page_size: 10,
            ..ReceiptQuery::default()
        };
        let (sql, params) = query.filter_sql();
        assert_eq!(
            sql,
            " WHERE 1=1 AND (vendor LIKE ? OR category LIKE ? OR filename LIKE ?) \
             AND currency = ? AND CAST(amount AS REAL) >= ? \
             ORDER BY CAST(amount AS REAL) DESC, id ASC"
        );
        assert_eq!(params.len(), 5);
        assert_eq!(params[4], Value::Real(10.0));
        assert_eq!(query.limit_offset(), (10, 20));
    }

    #[test]
    fn test_far_page_offset_saturates() {
        let query = ReceiptQuery {
            page: u32::MAX,
            page_size: u32::MAX,
            ..ReceiptQuery::default()
        };
        assert_eq!(query.limit_offset(), (u32::MAX as i64, i64::MAX));
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("Vendor".parse::<SortField>(), Ok(SortField::Vendor));
        assert!("filename".parse::<SortField>().is_err());
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
    }

    #[test]
    fn test_update_validation() {
        assert!(matches!(
            ReceiptUpdate::default().validated(),
            Err(StorageError::NoFieldsToUpdate)
        ));

        let update = ReceiptUpdate {
            date: Some("2024-02-30".to_string()),
            ..ReceiptUpdate::default()
        };
        assert!(matches!(
            update.validated(),
            Err(StorageError::InvalidField { field, .. }) if field == "date"
        ));

        let update = ReceiptUpdate {
            amount: Some("-3".to_string()),
            ..ReceiptUpdate::default()
        };
        assert!(matches!(
            update.validated(),
            Err(StorageError::InvalidField { field, .. }) if field == "amount"
        ));

        let update = ReceiptUpdate {
            vendor: Some("Walmart".to_string()),
            amount: Some("12.5".to_string()),
            ..ReceiptUpdate::default()
        };
        assert_eq!(
            update.validated().unwrap(),
            vec![
                ("vendor", Value::Text("Walmart".to_string())),
                ("amount", Value::Text("12.50".to_string())),
            ]
        );
    }

    #[test]
    fn test_amount_to_text() {
        assert_eq!(amount_to_text(Decimal::new(15000, 2)), "150.00");
        assert_eq!(amount_to_text(Decimal::new(1500, 3)), "1.50");
        assert_eq!(amount_to_text(Decimal::new(1234, 3)), "1.234");
        assert_eq!(amount_to_text(Decimal::new(7, 0)), "7.00");
    }
}
