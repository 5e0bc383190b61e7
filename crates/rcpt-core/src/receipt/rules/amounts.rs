//! Amount and currency extraction.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, trace};

use super::patterns::{AMOUNT_BARE, AMOUNT_LABEL_TEMPLATES, AMOUNT_SYMBOL_TEMPLATE, NUMERIC_RUN};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;
use crate::models::config::CurrencySymbol;

/// A parsed monetary value and the currency code its symbol mapped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountCandidate {
    pub value: Decimal,
    pub currency: Option<String>,
}

struct AmountPattern {
    label: &'static str,
    confidence: f32,
    regex: Regex,
}

/// Amount field extractor.
///
/// Every pattern is run over every line; the first match of a pattern on a
/// line becomes a candidate. All candidates are pooled and the largest one
/// is taken as the receipt total.
pub struct AmountExtractor {
    patterns: Vec<AmountPattern>,
    symbols: Vec<CurrencySymbol>,
}

impl AmountExtractor {
    /// Build the pattern set for a currency table.
    ///
    /// With an empty table the symbol-prefixed pattern is skipped and the
    /// labelled patterns lose their optional symbol.
    pub fn new(symbols: &[CurrencySymbol]) -> Result<Self, ExtractionError> {
        let group = symbol_group(symbols);
        let mut sources: Vec<(&'static str, f32, String)> = Vec::new();

        if let Some(ref group) = group {
            sources.push(("symbol", 0.7, AMOUNT_SYMBOL_TEMPLATE.replace("{sym}", group)));
        }

        let optional = group.as_ref().map(|g| format!("{}?", g)).unwrap_or_default();
        for (label, template) in AMOUNT_LABEL_TEMPLATES {
            let confidence = if label == "grand total" { 0.9 } else { 0.8 };
            sources.push((label, confidence, template.replace("{sym}", &optional)));
        }

        sources.push(("bare", 0.4, AMOUNT_BARE.to_string()));

        let patterns = sources
            .into_iter()
            .map(|(label, confidence, source)| {
                Regex::new(&format!("(?i){}", source))
                    .map(|regex| AmountPattern {
                        label,
                        confidence,
                        regex,
                    })
                    .map_err(|e| ExtractionError::Pattern {
                        field: format!("amount ({})", label),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            symbols: symbols.to_vec(),
        })
    }

    fn candidates<'a>(
        &'a self,
        lines: &'a [&'a str],
    ) -> impl Iterator<Item = ExtractionMatch<AmountCandidate>> + 'a {
        self.patterns.iter().flat_map(move |pattern| {
            lines.iter().enumerate().filter_map(move |(index, line)| {
                let fragment = pattern.regex.find(line)?.as_str();
                match parse_amount(fragment, &self.symbols) {
                    Some(candidate) => Some(
                        ExtractionMatch::new(candidate, pattern.confidence, fragment)
                            .on_line(index),
                    ),
                    None => {
                        trace!(
                            "Dropping unparseable {} amount {:?}",
                            pattern.label,
                            fragment
                        );
                        None
                    }
                }
            })
        })
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<AmountCandidate>;

    /// The largest candidate, carrying the resolved receipt currency.
    ///
    /// The currency is the winner's own when it has one, otherwise that of
    /// the largest candidate with a symbol. Ties go to the earlier candidate.
    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        let mut best: Option<ExtractionMatch<AmountCandidate>> = None;
        let mut best_with_symbol: Option<(Decimal, String)> = None;

        for candidate in self.candidates(lines) {
            if let Some(ref code) = candidate.value.currency {
                let larger = best_with_symbol
                    .as_ref()
                    .is_none_or(|(value, _)| candidate.value.value > *value);
                if larger {
                    best_with_symbol = Some((candidate.value.value, code.clone()));
                }
            }

            let larger = best
                .as_ref()
                .is_none_or(|b| candidate.value.value > b.value.value);
            if larger {
                best = Some(candidate);
            }
        }

        let mut winner = best?;
        if winner.value.currency.is_none() {
            winner.value.currency = best_with_symbol.map(|(_, code)| code);
        }

        debug!(
            "Amount {} ({:?}) from {:?}",
            winner.value.value, winner.value.currency, winner.source
        );
        Some(winner)
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        self.candidates(lines).collect()
    }
}

/// Parse one matched amount fragment.
///
/// The currency is the first table symbol present in the fragment. Symbols
/// and thousands separators are removed and the first numeric run is read
/// as a decimal; a leading `.` reads as `0.`.
pub fn parse_amount(fragment: &str, symbols: &[CurrencySymbol]) -> Option<AmountCandidate> {
    let currency = symbols
        .iter()
        .find(|s| !s.symbol.is_empty() && fragment.contains(s.symbol.as_str()))
        .map(|s| s.code.clone());

    let mut cleaned = fragment.replace(',', "");
    for symbol in symbols.iter().filter(|s| !s.symbol.is_empty()) {
        cleaned = cleaned.replace(symbol.symbol.as_str(), "");
    }

    let run = NUMERIC_RUN.find(&cleaned)?.as_str();
    let value = if run.starts_with('.') {
        Decimal::from_str(&format!("0{}", run))
    } else {
        Decimal::from_str(run)
    }
    .ok()?;

    Some(AmountCandidate { value, currency })
}

fn symbol_group(symbols: &[CurrencySymbol]) -> Option<String> {
    let alternatives: Vec<String> = symbols
        .iter()
        .filter(|s| !s.symbol.is_empty())
        .map(|s| regex::escape(&s.symbol))
        .collect();

    if alternatives.is_empty() {
        None
    } else {
        Some(format!("(?:{})", alternatives.join("|")))
    }
}
