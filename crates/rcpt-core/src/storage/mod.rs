//! SQLite persistence for extracted receipts.

mod query;
mod stats;

pub use query::{ReceiptQuery, ReceiptUpdate, SortField, SortOrder, DEFAULT_PAGE_SIZE};
pub use stats::Summary;

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::models::receipt::{ParsedReceipt, StoredReceipt};

use query::amount_to_text;

type Result<T> = std::result::Result<T, StorageError>;

const MIGRATIONS: [(&str, &str); 1] = [(
    "001_create_receipts.sql",
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/migrations/001_create_receipts.sql"
    )),
)];

const SELECT_COLUMNS: &str =
    "SELECT id, vendor, date, amount, category, currency, filename FROM receipts";

/// Result of storing a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored under the given id.
    Inserted(i64),
    /// A receipt with the same vendor, date and amount already exists.
    Duplicate,
}

/// Receipt table backed by one SQLite connection.
pub struct ReceiptStore {
    conn: Mutex<Connection>,
}

impl ReceiptStore {
    /// Open (or create) a database file and apply pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!("Opened receipt database {}", path.display());
        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        run_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Store a receipt unless one with the same vendor, date and amount exists.
    pub fn insert(&self, receipt: &ParsedReceipt, filename: Option<&str>) -> Result<InsertOutcome> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO receipts (vendor, date, amount, category, currency, filename)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                receipt.vendor,
                receipt.date,
                receipt.amount.map(amount_to_text),
                receipt.category,
                receipt.currency,
                filename,
            ],
        )?;

        if changed == 0 {
            warn!(
                "Skipping duplicate receipt vendor={:?} date={:?} amount={:?}",
                receipt.vendor, receipt.date, receipt.amount
            );
            return Ok(InsertOutcome::Duplicate);
        }

        let id = conn.last_insert_rowid();
        debug!("Stored receipt {}", id);
        Ok(InsertOutcome::Inserted(id))
    }

    pub fn get(&self, id: i64) -> Result<Option<StoredReceipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))?;
        let receipt = stmt.query_row(params![id], row_to_receipt).optional()?;
        Ok(receipt)
    }

    /// One page of receipts matching the query.
    pub fn list(&self, query: &ReceiptQuery) -> Result<Vec<StoredReceipt>> {
        let (filter, mut params) = query.filter_sql();
        let (limit, offset) = query.limit_offset();
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));

        self.select(&format!("{}{} LIMIT ? OFFSET ?", SELECT_COLUMNS, filter), params)
    }

    /// Every receipt matching the query's filters, ignoring paging.
    pub fn list_all(&self, query: &ReceiptQuery) -> Result<Vec<StoredReceipt>> {
        let (filter, params) = query.filter_sql();
        self.select(&format!("{}{}", SELECT_COLUMNS, filter), params)
    }

    /// Number of receipts matching the query's filters.
    pub fn count(&self, query: &ReceiptQuery) -> Result<usize> {
        let (filter, params) = query.filter_sql();
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM receipts{}", filter),
            params_from_iter(params),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn select(&self, sql: &str, params: Vec<Value>) -> Result<Vec<StoredReceipt>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let receipts = stmt
            .query_map(params_from_iter(params), row_to_receipt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(receipts)
    }

    /// Apply explicit edits, returning the names of the updated fields.
    pub fn update(&self, id: i64, update: &ReceiptUpdate) -> Result<Vec<String>> {
        let assignments = update.validated()?;

        let set = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect::<Vec<_>>()
            .join(", ");
        let fields: Vec<String> = assignments.iter().map(|(c, _)| c.to_string()).collect();

        let mut params: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        params.push(Value::Integer(id));

        let conn = self.conn()?;
        let changed = conn.execute(
            &format!("UPDATE receipts SET {} WHERE id = ?", set),
            params_from_iter(params),
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }

        info!("Updated receipt {}: {}", id, fields.join(", "));
        Ok(fields)
    }

    /// Statistics over every stored receipt.
    pub fn aggregate(&self) -> Result<Summary> {
        let receipts = self.list_all(&ReceiptQuery::default())?;
        Ok(Summary::from_receipts(receipts.iter().map(|r| &r.receipt)))
    }
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let applied: Option<String> = conn
            .query_row(
                "SELECT name FROM schema_migrations WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if applied.is_none() {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                params![name],
            )?;
            tx.commit()?;
            debug!("Applied migration {}", name);
        }
    }

    Ok(())
}

fn row_to_receipt(row: &Row) -> rusqlite::Result<StoredReceipt> {
    let amount: Option<String> = row.get(3)?;
    let amount = amount
        .map(|text| {
            Decimal::from_str(&text)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))
        })
        .transpose()?;

    Ok(StoredReceipt {
        id: row.get(0)?,
        receipt: ParsedReceipt {
            vendor: row.get(1)?,
            date: row.get(2)?,
            amount,
            category: row.get(4)?,
            currency: row.get(5)?,
        },
        filename: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn receipt(vendor: &str, date: &str, amount: &str, category: &str, currency: &str) -> ParsedReceipt {
        ParsedReceipt {
            vendor: Some(vendor.to_string()),
            date: Some(date.to_string()),
            amount: Some(dec(amount)),
            category: category.to_string(),
            currency: currency.to_string(),
        }
    }

    fn seeded() -> ReceiptStore {
        let store = ReceiptStore::open_in_memory().unwrap();
        let rows = [
            receipt("Walmart", "2024-01-05", "42.10", "Groceries", "USD"),
            receipt("Amazon", "2024-01-15", "120.00", "Shopping", "USD"),
            receipt("Airtel", "2024-02-01", "9.99", "Telecom", "INR"),
            receipt("Big Bazaar", "2024-03-10", "1500.00", "Groceries", "INR"),
        ];
        for (i, r) in rows.iter().enumerate() {
            store.insert(r, Some(&format!("r{}.txt", i))).unwrap();
        }
        store
    }

    fn vendors(receipts: &[StoredReceipt]) -> Vec<&str> {
        receipts
            .iter()
            .map(|r| r.receipt.vendor.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let store = ReceiptStore::open_in_memory().unwrap();
        let original = receipt("Amazon", "2024-01-01", "123.45", "Shopping", "USD");

        let InsertOutcome::Inserted(id) = store.insert(&original, Some("amazon.png")).unwrap() else {
            panic!("expected insert");
        };
        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.receipt, original);
        assert_eq!(stored.filename.as_deref(), Some("amazon.png"));
        assert_eq!(store.get(id + 100).unwrap(), None);
    }

    #[test]
    fn test_duplicates_suppressed() {
        let store = ReceiptStore::open_in_memory().unwrap();
        let r = receipt("Walmart", "2024-01-05", "42.10", "Groceries", "USD");
        assert!(matches!(store.insert(&r, Some("a.jpg")).unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(store.insert(&r, Some("b.jpg")).unwrap(), InsertOutcome::Duplicate);

        // Same amount written with a different scale.
        let mut rescaled = r.clone();
        rescaled.amount = Some(dec("42.1"));
        assert_eq!(store.insert(&rescaled, None).unwrap(), InsertOutcome::Duplicate);
    }

    #[test]
    fn test_duplicates_suppressed_with_absent_fields() {
        let store = ReceiptStore::open_in_memory().unwrap();
        let blank = ParsedReceipt::empty();
        assert!(matches!(store.insert(&blank, None).unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(store.insert(&blank, None).unwrap(), InsertOutcome::Duplicate);

        let vendor_only = ParsedReceipt {
            vendor: Some("Cafe".to_string()),
            ..ParsedReceipt::empty()
        };
        assert!(matches!(store.insert(&vendor_only, None).unwrap(), InsertOutcome::Inserted(_)));
        assert_eq!(store.insert(&vendor_only, None).unwrap(), InsertOutcome::Duplicate);
        assert_eq!(store.count(&ReceiptQuery::default()).unwrap(), 2);
    }

    #[test]
    fn test_filters() {
        let store = seeded();

        let query = ReceiptQuery {
            currency: Some("INR".to_string()),
            ..ReceiptQuery::default()
        };
        assert_eq!(vendors(&store.list(&query).unwrap()), vec!["Airtel", "Big Bazaar"]);

        let query = ReceiptQuery {
            min_amount: Some(dec("10")),
            max_amount: Some(dec("200")),
            ..ReceiptQuery::default()
        };
        assert_eq!(vendors(&store.list(&query).unwrap()), vec!["Walmart", "Amazon"]);

        let query = ReceiptQuery {
            date_from: Some("2024-01-15".to_string()),
            date_to: Some("2024-02-01".to_string()),
            ..ReceiptQuery::default()
        };
        assert_eq!(vendors(&store.list(&query).unwrap()), vec!["Amazon", "Airtel"]);

        let query = ReceiptQuery {
            search: Some("grocer".to_string()),
            ..ReceiptQuery::default()
        };
        assert_eq!(vendors(&store.list(&query).unwrap()), vec!["Walmart", "Big Bazaar"]);

        let query = ReceiptQuery {
            search: Some("r2.txt".to_string()),
            ..ReceiptQuery::default()
        };
        assert_eq!(vendors(&store.list(&query).unwrap()), vec!["Airtel"]);
    }

    #[test]
    fn test_amount_sort_is_numeric() {
        let store = seeded();
        let query = ReceiptQuery {
            sort_by: Some(SortField::Amount),
            order: SortOrder::Desc,
            ..ReceiptQuery::default()
        };
        assert_eq!(
            vendors(&store.list(&query).unwrap()),
            vec!["Big Bazaar", "Amazon", "Walmart", "Airtel"]
        );
    }

    #[test]
    fn test_paging() {
        let store = seeded();
        let page = |page| ReceiptQuery {
            sort_by: Some(SortField::Vendor),
            page,
            page_size: 3,
            ..ReceiptQuery::default()
        };
        assert_eq!(
            vendors(&store.list(&page(1)).unwrap()),
            vec!["Airtel", "Amazon", "Big Bazaar"]
        );
        assert_eq!(vendors(&store.list(&page(2)).unwrap()), vec!["Walmart"]);
        assert!(store.list(&page(3)).unwrap().is_empty());
        assert_eq!(store.list_all(&page(2)).unwrap().len(), 4);
    }

    #[test]
    fn test_update() {
        let store = seeded();
        let update = ReceiptUpdate {
            vendor: Some("Walmart Supercenter".to_string()),
            amount: Some("45".to_string()),
            ..ReceiptUpdate::default()
        };
        assert_eq!(store.update(1, &update).unwrap(), vec!["vendor", "amount"]);

        let stored = store.get(1).unwrap().unwrap();
        assert_eq!(stored.receipt.vendor.as_deref(), Some("Walmart Supercenter"));
        assert_eq!(stored.receipt.amount, Some(dec("45.00")));
        assert_eq!(stored.receipt.category, "Groceries");
    }

    #[test]
    fn test_update_errors() {
        let store = seeded();
        assert!(matches!(
            store.update(1, &ReceiptUpdate::default()),
            Err(StorageError::NoFieldsToUpdate)
        ));

        let update = ReceiptUpdate {
            category: Some("Travel".to_string()),
            ..ReceiptUpdate::default()
        };
        assert!(matches!(store.update(99, &update), Err(StorageError::NotFound(99))));

        let update = ReceiptUpdate {
            date: Some("yesterday".to_string()),
            ..ReceiptUpdate::default()
        };
        assert!(matches!(store.update(1, &update), Err(StorageError::InvalidField { .. })));
    }

    #[test]
    fn test_aggregate() {
        let store = seeded();
        let summary = store.aggregate().unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.sum, dec("1672.09"));
        assert_eq!(summary.category_spend["Groceries"], dec("1542.10"));
        assert_eq!(summary.monthly_spend["2024-01"], dec("162.10"));
    }

    #[test]
    fn test_aggregate_of_huge_amounts() {
        let store = ReceiptStore::open_in_memory().unwrap();
        let max = Decimal::MAX.to_string();
        for day in 1..=4 {
            let date = format!("2024-03-0{}", day);
            store
                .insert(&receipt("Shop X", &date, &max, "Other", "USD"), None)
                .unwrap();
        }

        let summary = store.aggregate().unwrap();
        assert_eq!(summary.count, 4);
        assert_eq!(summary.sum, Decimal::MAX);
        assert_eq!(summary.median, Some(Decimal::MAX));
    }

    #[test]
    fn test_far_page_is_empty() {
        let store = seeded();
        let query = ReceiptQuery {
            page: u32::MAX,
            page_size: u32::MAX,
            ..ReceiptQuery::default()
        };
        assert!(store.list(&query).unwrap().is_empty());
    }

    #[test]
    fn test_migrations_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("receipts.db");

        {
            let store = ReceiptStore::open(&path).unwrap();
            store
                .insert(&receipt("Amazon", "2024-01-01", "1.00", "Shopping", "USD"), None)
                .unwrap();
        }

        let store = ReceiptStore::open(&path).unwrap();
        assert_eq!(store.count(&ReceiptQuery::default()).unwrap(), 1);
    }
}
