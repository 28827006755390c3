use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use tracing::{debug, info};

use crate::canonical::canonicalize;
use crate::clean::CleanedRow;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CityRecord {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Gazetteer indexed by canonical key, first record per key wins.
pub struct Gazetteer {
    by_key: HashMap<String, (f64, f64)>,
}

impl Gazetteer {
    pub fn new(records: &[CityRecord]) -> Self {
        let mut by_key = HashMap::with_capacity(records.len());
        for r in records {
            by_key
                .entry(canonicalize(&r.label))
                .or_insert((r.latitude, r.longitude));
        }
        debug!("Gazetteer: {} records, {} distinct keys", records.len(), by_key.len());
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn coordinates(&self, city: &str) -> Option<(f64, f64)> {
        self.by_key.get(&canonicalize(city)).copied()
    }
}

/// A cleaned row with the city replaced by its coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub property_type: String,
    pub energy_rating: String,
    pub values: [f64; 4],
    pub price: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Left join: every row is kept, unmatched cities get no coordinates.
pub fn join(rows: Vec<CleanedRow>, gazetteer: &Gazetteer) -> Vec<JoinedRow> {
    let mut unmatched = BTreeSet::new();

    let joined: Vec<JoinedRow> = rows
        .into_iter()
        .map(|row| {
            let coords = gazetteer.coordinates(&row.city);
            if coords.is_none() {
                unmatched.insert(canonicalize(&row.city));
            }
            JoinedRow {
                property_type: row.property_type,
                energy_rating: row.energy_rating,
                values: row.values,
                price: row.price,
                latitude: coords.map(|c| c.0),
                longitude: coords.map(|c| c.1),
            }
        })
        .collect();

    let matched = joined.iter().filter(|r| r.latitude.is_some()).count();
    info!(
        "Joined {} rows: {} matched, {} without coordinates",
        joined.len(),
        matched,
        joined.len() - matched
    );
    if !unmatched.is_empty() {
        debug!("Unmatched city keys: {:?}", unmatched);
    }

    joined
}

// ── Tests ──
