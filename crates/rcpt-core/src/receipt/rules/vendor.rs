//! Vendor (merchant name) resolution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::{ANY_DIGIT, DATE_WORD, INVOICE_MARKER};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::config::VendorEntry;

/// Number of lines after an invoice marker examined for a merchant name.
const INVOICE_LOOKAHEAD: usize = 3;

/// How a vendor name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStrategy {
    /// Matched an entry of the known-vendor table.
    KnownVendor,
    /// Free text found just below an invoice marker.
    InvoiceHeader,
    /// First line of the transcript.
    FirstLine,
}

/// A resolved vendor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorMatch {
    pub name: String,
    pub strategy: VendorStrategy,
}

/// Resolves the merchant from transcript lines.
///
/// Strategies are tried in order, first hit wins: known vendors (table
/// order, case-insensitive substring), the first digit-free non-date line
/// among the three following an "invoice" line, then the first line.
pub struct VendorResolver {
    /// (canonical name, lowercase name) in table order.
    known: Vec<(String, String)>,
}

impl VendorResolver {
    pub fn new(vendors: &[VendorEntry]) -> Self {
        Self {
            known: vendors
                .iter()
                .map(|v| (v.name.clone(), v.name.to_lowercase()))
                .collect(),
        }
    }

    fn known_vendor(&self, lines: &[&str]) -> Option<ExtractionMatch<VendorMatch>> {
        for (index, line) in lines.iter().enumerate() {
            let lowered = line.to_lowercase();
            for (name, needle) in &self.known {
                if lowered.contains(needle.as_str()) {
                    return Some(
                        ExtractionMatch::new(
                            VendorMatch {
                                name: name.clone(),
                                strategy: VendorStrategy::KnownVendor,
                            },
                            0.9,
                            *line,
                        )
                        .on_line(index),
                    );
                }
            }
        }
        None
    }

    fn after_invoice_marker(&self, lines: &[&str]) -> Option<ExtractionMatch<VendorMatch>> {
        for (index, line) in lines.iter().enumerate() {
            if !INVOICE_MARKER.is_match(line) {
                continue;
            }

            let window = lines.iter().enumerate().skip(index + 1).take(INVOICE_LOOKAHEAD);
            for (candidate_index, candidate) in window {
                if !ANY_DIGIT.is_match(candidate) && !DATE_WORD.is_match(candidate) {
                    return Some(
                        ExtractionMatch::new(
                            VendorMatch {
                                name: candidate.to_string(),
                                strategy: VendorStrategy::InvoiceHeader,
                            },
                            0.6,
                            *candidate,
                        )
                        .on_line(candidate_index),
                    );
                }
            }
        }
        None
    }

    fn first_line(&self, lines: &[&str]) -> Option<ExtractionMatch<VendorMatch>> {
        lines.first().map(|line| {
            ExtractionMatch::new(
                VendorMatch {
                    name: line.to_string(),
                    strategy: VendorStrategy::FirstLine,
                },
                0.3,
                *line,
            )
            .on_line(0)
        })
    }
}

impl FieldExtractor for VendorResolver {
    type Output = ExtractionMatch<VendorMatch>;

    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        let found = self
            .known_vendor(lines)
            .or_else(|| self.after_invoice_marker(lines))
            .or_else(|| self.first_line(lines));

        if let Some(ref m) = found {
            debug!("Vendor {:?} via {:?}", m.value.name, m.value.strategy);
        }
        found
    }

    /// One candidate per strategy that produced something, in priority order.
    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        [
            self.known_vendor(lines),
            self.after_invoice_marker(lines),
            self.first_line(lines),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
