//! Fetch/parse layer: tabular sources into plain records
//!
//! Two shapes of input arrive from the spreadsheet:
//! - CSV text from a published export, whose header row names the fields
//! - values-range arrays from the Sheets API, mapped positionally
//!
//! Blank rows are skipped in both. With dynamic typing enabled, numeric
//! cells become numbers, `true`/`false` become booleans and empty cells
//! become `Null`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{Item, ItemId, ITEM_COLUMNS};
use crate::Result;

/// A single parsed cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce a raw cell according to the parse options
    pub fn from_cell(raw: &str, dynamic_typing: bool) -> Self {
        if !dynamic_typing {
            return FieldValue::Text(raw.to_string());
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Null;
        }
        match trimmed {
            "true" | "TRUE" | "True" => return FieldValue::Bool(true),
            "false" | "FALSE" | "False" => return FieldValue::Bool(false),
            _ => {}
        }
        if looks_numeric(trimmed) {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return FieldValue::Number(n);
                }
            }
        }
        FieldValue::Text(raw.to_string())
    }

    /// Text form of the value; `Null` renders as an empty string
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Only plain decimal notation counts as numeric (no `inf`, `nan`, hex)
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut prev = ' ';

    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot && !seen_exp => seen_dot = true,
            'e' | 'E' if seen_digit && !seen_exp => seen_exp = true,
            '+' | '-' if prev == 'e' || prev == 'E' => {}
            _ => return false,
        }
        prev = c;
    }
    seen_digit && !matches!(prev, 'e' | 'E' | '+' | '-')
}

/// One row keyed by column name
pub type Record = BTreeMap<String, FieldValue>;

/// Parse options for tabular sources
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub dynamic_typing: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dynamic_typing: true,
        }
    }
}

/// Parse CSV text whose first row is the header
///
/// Ragged rows are accepted: missing cells are absent from the record,
/// extra cells without a header are dropped.
pub fn parse_csv(text: &str, options: ParseOptions) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let record = headers
            .iter()
            .zip(row.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), FieldValue::from_cell(cell, options.dynamic_typing)))
            .collect();
        records.push(record);
    }

    tracing::debug!(record_count = records.len(), "Parsed CSV source");
    Ok(records)
}

/// Map values-range rows (no header row) onto the item columns
///
/// Blank rows are skipped; positions of the remaining rows become item ids.
pub fn items_from_values(rows: &[Vec<String>], sheet_id: &str) -> Vec<Item> {
    rows.iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .enumerate()
        .map(|(idx, row)| Item::from_row(ItemId(idx), row, sheet_id))
        .collect()
}

/// Build items from header-keyed records (published CSV export)
///
/// Header names are matched against the item columns ignoring case,
/// spaces and punctuation, so `Image URLs`, `image_urls` and `imageUrls`
/// all land in the same field.
pub fn items_from_records(records: &[Record], sheet_id: &str) -> Vec<Item> {
    records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let normalized: BTreeMap<String, String> = record
                .iter()
                .map(|(k, v)| (normalize_header(k), v.as_text()))
                .collect();

            let row: Vec<String> = ITEM_COLUMNS
                .iter()
                .map(|column| {
                    normalized
                        .get(&normalize_header(column))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();

            Item::from_row(ItemId(idx), &row, sheet_id)
        })
        .collect()
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
