//! Date extraction for receipts.

use chrono::NaiveDate;
use tracing::{debug, trace};

use super::patterns::{DATE_PATTERNS, YEAR_20XX};
use super::{ExtractionMatch, FieldExtractor};

/// How much of a date was actually present in the matched fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateResolution {
    /// Day, month and year were all read from the fragment.
    Exact,
    /// Only month and year; the day defaults to the 1st.
    MonthStart,
    /// Only a year; month and day default to January 1st.
    YearStart,
}

impl DateResolution {
    fn confidence(self) -> f32 {
        match self {
            DateResolution::Exact => 0.9,
            DateResolution::MonthStart => 0.6,
            DateResolution::YearStart => 0.3,
        }
    }
}

/// Date field extractor.
///
/// Patterns are tried in priority order and each one is exhausted across
/// all lines before the next is considered, so a high-priority shape on a
/// late line beats a low-priority shape on an early one.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    fn candidates<'a>(
        &self,
        lines: &'a [&'a str],
    ) -> impl Iterator<Item = ExtractionMatch<NaiveDate>> + 'a {
        DATE_PATTERNS.iter().flat_map(move |pattern| {
            lines.iter().enumerate().filter_map(move |(index, line)| {
                let fragment = pattern.find(line)?.as_str();
                match normalize_date(fragment) {
                    Some((date, resolution)) => Some(
                        ExtractionMatch::new(date, resolution.confidence(), fragment)
                            .on_line(index),
                    ),
                    None => {
                        trace!("Discarding unparseable date fragment {:?}", fragment);
                        None
                    }
                }
            })
        })
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, lines: &[&str]) -> Option<Self::Output> {
        let found = self.candidates(lines).next();
        if let Some(ref m) = found {
            debug!("Date {} from {:?}", m.value, m.source);
        }
        found
    }

    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output> {
        self.candidates(lines).collect()
    }
}

/// Normalize a matched date fragment.
///
/// Tries a day-first parse, then the fragment as the first day of a month,
/// then a bare `20xx` year as January 1st.
pub fn normalize_date(fragment: &str) -> Option<(NaiveDate, DateResolution)> {
    if let Some(date) = parse_day_first(fragment) {
        return Some((date, DateResolution::Exact));
    }

    if let Some(date) = parse_day_first(&format!("01 {}", fragment)) {
        return Some((date, DateResolution::MonthStart));
    }

    let year: i32 = YEAR_20XX.find(fragment)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1).map(|date| (date, DateResolution::YearStart))
}

/// Parse a date with day-first interpretation.
///
/// Accepts three numeric fields (`31/12/2023`, `2023-12-31`, `31-12-23`) or
/// a month name with a day and a year (`December 8, 2023`, `8 Dec 2023`).
/// Any other word makes the parse fail; a missing day is never filled in.
pub fn parse_day_first(fragment: &str) -> Option<NaiveDate> {
    let mut numbers: Vec<&str> = Vec::new();
    let mut month = None;

    for token in fragment
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if token.chars().all(|c| c.is_ascii_digit()) {
            numbers.push(token);
        } else if let Some(m) = month_from_name(token) {
            if month.replace(m).is_some() {
                return None;
            }
        } else {
            return None;
        }
    }

    match (month, numbers.as_slice()) {
        (None, [first, second, third]) => numeric_date(first, second, third),
        (Some(month), [first, second]) => textual_date(month, first, second),
        _ => None,
    }
}

fn numeric_date(first: &str, second: &str, third: &str) -> Option<NaiveDate> {
    let a: u32 = first.parse().ok()?;
    let b: u32 = second.parse().ok()?;

    if first.len() == 4 {
        let c: u32 = third.parse().ok()?;
        let year = a as i32;
        return NaiveDate::from_ymd_opt(year, b, c).or_else(|| NaiveDate::from_ymd_opt(year, c, b));
    }

    let year = parse_year(third)?;
    // Day first, month first only when day-first is impossible.
    NaiveDate::from_ymd_opt(year, b, a).or_else(|| NaiveDate::from_ymd_opt(year, a, b))
}

fn textual_date(month: u32, first: &str, second: &str) -> Option<NaiveDate> {
    let (day, year) = if first.len() == 4 {
        (second, first)
    } else {
        (first, second)
    };

    if day.len() > 2 {
        return None;
    }

    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(parse_year(year)?, month, day)
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        4 => Some(year),
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        2 if year <= 50 => Some(2000 + year),
        2 => Some(1900 + year),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
