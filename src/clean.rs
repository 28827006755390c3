//! Batch cleaning of raw listing rows.
//!
//! Two explicit passes: [`parse_rows`] coerces text to numbers and
//! [`ColumnMeans::collect`] computes per-column means over the whole batch;
//! only then can [`impute`] fill the gaps.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::store::{RawRow, MISSING};

/// Category used when a listing has no energy rating.
pub const BLANK_RATING: &str = "Vierge";

static SURFACE_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"m²|\s").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    Surface,
    Rooms,
    Bedrooms,
    Bathrooms,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Surface,
        NumericColumn::Rooms,
        NumericColumn::Bedrooms,
        NumericColumn::Bathrooms,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Self::Surface => "Surface",
            Self::Rooms => "NbrPieces",
            Self::Bedrooms => "NbrChambres",
            Self::Bathrooms => "NbrSdb",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A raw row after type coercion, before imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub city: String,
    pub property_type: String,
    pub energy_rating: String,
    pub values: [Option<f64>; 4],
    pub price: Option<i64>,
}

impl ParsedRow {
    pub fn get(&self, col: NumericColumn) -> Option<f64> {
        self.values[col.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub city: String,
    pub property_type: String,
    pub energy_rating: String,
    pub values: [f64; 4],
    pub price: i64,
}

/// Batch means per numeric column; `None` when the column has no value at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMeans {
    means: [Option<f64>; 4],
}

impl ColumnMeans {
    pub fn collect(rows: &[ParsedRow]) -> Self {
        let mut sums = [0.0f64; 4];
        let mut counts = [0usize; 4];
        for row in rows {
            for (i, value) in row.values.iter().enumerate() {
                if let Some(v) = value {
                    sums[i] += v;
                    counts[i] += 1;
                }
            }
        }

        let means =
            std::array::from_fn(|i| (counts[i] > 0).then(|| sums[i] / counts[i] as f64));
        Self { means }
    }

    pub fn get(&self, col: NumericColumn) -> Option<f64> {
        self.means[col.index()]
    }
}

pub fn parse_rows(raw: &[RawRow]) -> Vec<ParsedRow> {
    raw.iter().map(parse_row).collect()
}

pub fn parse_row(raw: &RawRow) -> ParsedRow {
    let energy_rating = if raw.energy_rating.trim() == MISSING {
        BLANK_RATING.to_string()
    } else {
        raw.energy_rating.trim().to_string()
    };

    ParsedRow {
        city: raw.city.clone(),
        property_type: raw.property_type.clone(),
        energy_rating,
        values: [
            parse_surface(&raw.surface),
            parse_number(&raw.room_count),
            parse_number(&raw.bedroom_count),
            parse_number(&raw.bathroom_count),
        ],
        price: raw.price.trim().parse().ok(),
    }
}

/// "120 m²" → 120.0; the sentinel is missing, not zero.
pub fn parse_surface(text: &str) -> Option<f64> {
    parse_number(&SURFACE_NOISE_RE.replace_all(text, ""))
}

/// Sentinel and non-numeric text both become missing. A decimal comma is accepted.
pub fn parse_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() || t == MISSING {
        return None;
    }
    t.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fill missing numeric cells with the column mean. Rows that remain
/// incomplete (a column with no value anywhere, or no usable price) are dropped.
pub fn impute(rows: Vec<ParsedRow>, means: &ColumnMeans) -> Vec<CleanedRow> {
    rows.into_iter()
        .filter_map(|row| {
            let mut values = [0.0; 4];
            for col in NumericColumn::ALL {
                values[col.index()] = row.get(col).or(means.get(col))?;
            }
            let Some(price) = row.price else {
                debug!("Dropping row for {}: unusable price", row.city);
                return None;
            };
            Some(CleanedRow {
                city: row.city,
                property_type: row.property_type,
                energy_rating: row.energy_rating,
                values,
                price,
            })
        })
        .collect()
}

pub fn clean(raw: &[RawRow]) -> Vec<CleanedRow> {
    let parsed = parse_rows(raw);
    let means = ColumnMeans::collect(&parsed);
    for col in NumericColumn::ALL {
        let missing = parsed.iter().filter(|r| r.get(col).is_none()).count();
        debug!(column = col.header(), missing, mean = ?means.get(col), "Column stats");
    }

    let cleaned = impute(parsed, &means);
    let dropped = raw.len() - cleaned.len();
    info!("Cleaned {} rows ({} dropped as incomplete)", cleaned.len(), dropped);
    cleaned
}

/// Indicator columns for one categorical column, one per distinct observed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHot {
    prefix: &'static str,
    categories: Vec<String>,
}

impl OneHot {
    pub fn fit<'a>(prefix: &'static str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        Self {
            prefix,
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.prefix, c))
            .collect()
    }

    pub fn encode(&self, value: &str) -> Vec<bool> {
        self.categories.iter().map(|c| c == value).collect()
    }
}

// ── Tests ──
