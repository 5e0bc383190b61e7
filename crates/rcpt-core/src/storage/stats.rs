//! Spending statistics over stored receipts.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::models::receipt::ParsedReceipt;

/// Aggregate view of all stored receipts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of receipts, with or without an amount.
    pub count: usize,
    /// Sum of all known amounts.
    ///
    /// Totals stop growing at the first amount that would overflow
    /// `Decimal`; that amount is left out with a warning.
    pub sum: Decimal,
    /// Mean amount, rounded to cents.
    pub mean: Option<Decimal>,
    pub median: Option<Decimal>,
    /// Most frequent amount; the earliest one on ties.
    pub mode: Option<Decimal>,
    /// Receipts per vendor.
    pub vendor_frequency: BTreeMap<String, usize>,
    /// Total amount per category.
    pub category_spend: BTreeMap<String, Decimal>,
    /// Total amount per `YYYY-MM` month.
    pub monthly_spend: BTreeMap<String, Decimal>,
}

impl Summary {
    /// Summarize receipts given in storage order.
    pub fn from_receipts<'a>(receipts: impl IntoIterator<Item = &'a ParsedReceipt>) -> Self {
        let mut summary = Summary::default();
        let mut amounts = Vec::new();

        for receipt in receipts {
            summary.count += 1;

            if let Some(ref vendor) = receipt.vendor {
                *summary.vendor_frequency.entry(vendor.clone()).or_insert(0) += 1;
            }

            let Some(amount) = receipt.amount else {
                continue;
            };
            amounts.push(amount);
            accumulate(&mut summary.sum, amount, "sum");

            let category = summary
                .category_spend
                .entry(receipt.category.clone())
                .or_insert(Decimal::ZERO);
            accumulate(category, amount, &receipt.category);

            let month = receipt
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                .map(|d| d.format("%Y-%m").to_string());
            if let Some(month) = month {
                let total = summary.monthly_spend.entry(month.clone()).or_insert(Decimal::ZERO);
                accumulate(total, amount, &month);
            }
        }

        if !amounts.is_empty() {
            summary.mean = Some((summary.sum / Decimal::from(amounts.len())).round_dp(2));
            summary.mode = mode(&amounts);
            summary.median = Some(median(&mut amounts));
        }

        summary
    }
}

fn accumulate(total: &mut Decimal, amount: Decimal, label: &str) {
    match total.checked_add(amount) {
        Some(next) => *total = next,
        None => warn!("Amount {} overflows the {} total, leaving it out", amount, label),
    }
}

fn median(amounts: &mut [Decimal]) -> Decimal {
    amounts.sort();
    let mid = amounts.len() / 2;
    if amounts.len() % 2 == 0 {
        let (low, high) = (amounts[mid - 1], amounts[mid]);
        match low.checked_add(high) {
            Some(total) => total / Decimal::TWO,
            // Only same-signed values overflow, and then the gap cannot.
            None => low + (high - low) / Decimal::TWO,
        }
    } else {
        amounts[mid]
    }
}

fn mode(amounts: &[Decimal]) -> Option<Decimal> {
    let mut counts: HashMap<Decimal, usize> = HashMap::new();
    for amount in amounts {
        *counts.entry(amount.normalize()).or_insert(0) += 1;
    }

    // Scanning in input order keeps the earliest value among equal counts.
    let mut best: Option<(Decimal, usize)> = None;
    for amount in amounts {
        let count = counts[&amount.normalize()];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((*amount, count));
        }
    }
    best.map(|(amount, _)| amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn receipt(vendor: &str, date: Option<&str>, amount: Option<&str>, category: &str) -> ParsedReceipt {
        ParsedReceipt {
            vendor: Some(vendor.to_string()),
            date: date.map(String::from),
            amount: amount.map(|a| Decimal::from_str(a).unwrap()),
            category: category.to_string(),
            currency: "USD".to_string(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_summary() {
        let summary = Summary::from_receipts(&Vec::<ParsedReceipt>::new());
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.mean, None);
    }

    #[test]
    fn test_summary() {
        let receipts = vec![
            receipt("Walmart", Some("2024-01-03"), Some("10.00"), "Groceries"),
            receipt("Amazon", Some("2024-01-20"), Some("25.00"), "Shopping"),
            receipt("Walmart", Some("2024-02-01"), Some("10.00"), "Groceries"),
            receipt("Cafe", None, Some("5.00"), "Other"),
            receipt("Cafe", Some("2024-02-11"), None, "Other"),
        ];
        let summary = Summary::from_receipts(&receipts);

        assert_eq!(summary.count, 5);
        assert_eq!(summary.sum, dec("50.00"));
        assert_eq!(summary.mean, Some(dec("12.50")));
        // 5, 10, 10, 25
        assert_eq!(summary.median, Some(dec("10.00")));
        assert_eq!(summary.mode, Some(dec("10.00")));
        assert_eq!(summary.vendor_frequency["Walmart"], 2);
        assert_eq!(summary.vendor_frequency["Cafe"], 2);
        assert_eq!(summary.category_spend["Groceries"], dec("20.00"));
        assert_eq!(summary.category_spend["Other"], dec("5.00"));
        assert_eq!(
            summary.monthly_spend.into_iter().collect::<Vec<_>>(),
            vec![
                ("2024-01".to_string(), dec("35.00")),
                ("2024-02".to_string(), dec("10.00")),
            ]
        );
    }

    #[test]
    fn test_median_of_even_count_and_mode_tie() {
        let receipts = vec![
            receipt("A", None, Some("3.00"), "Other"),
            receipt("B", None, Some("1.00"), "Other"),
            receipt("C", None, Some("2.00"), "Other"),
            receipt("D", None, Some("8.00"), "Other"),
        ];
        let summary = Summary::from_receipts(&receipts);
        assert_eq!(summary.median, Some(dec("2.50")));
        // Every amount occurs once, so the first one wins.
        assert_eq!(summary.mode, Some(dec("3.00")));
        assert_eq!(summary.mean, Some(dec("3.50")));
    }

    #[test]
    fn test_huge_amounts_do_not_overflow() {
        let max = Decimal::MAX.to_string();
        let receipts = vec![
            receipt("Shop X", Some("2024-03-01"), Some(&max), "Other"),
            receipt("Shop X", Some("2024-03-02"), Some(&max), "Other"),
            receipt("Shop X", Some("2024-03-03"), Some("1.00"), "Other"),
            receipt("Shop X", Some("2024-03-04"), Some(&max), "Other"),
        ];
        let summary = Summary::from_receipts(&receipts);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.sum, Decimal::MAX);
        assert_eq!(summary.category_spend["Other"], Decimal::MAX);
        assert_eq!(summary.monthly_spend["2024-03"], Decimal::MAX);
        assert_eq!(summary.median, Some(Decimal::MAX));
        assert_eq!(summary.mode, Some(Decimal::MAX));
    }
}
