use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::crawl::Rejection;
use crate::dataset::FinalDataset;
use crate::geo::CityRecord;

/// Text form of a field the listing did not provide.
pub const MISSING: &str = "-";

/// A listing flattened to text, as handed from the crawl to the cleaner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Ville")]
    pub city: String,
    #[serde(rename = "Type")]
    pub property_type: String,
    #[serde(rename = "Surface")]
    pub surface: String,
    #[serde(rename = "NbrPieces")]
    pub room_count: String,
    #[serde(rename = "NbrChambres")]
    pub bedroom_count: String,
    #[serde(rename = "NbrSdb")]
    pub bathroom_count: String,
    #[serde(rename = "DPE")]
    pub energy_rating: String,
    #[serde(rename = "Prix")]
    pub price: String,
}

impl RawRow {
    pub fn to_line(&self) -> String {
        [
            &self.city,
            &self.property_type,
            &self.surface,
            &self.room_count,
            &self.bedroom_count,
            &self.bathroom_count,
            &self.energy_rating,
            &self.price,
        ]
        .map(String::as_str)
        .join(",")
    }
}

pub fn write_raw_rows<W: Write>(writer: W, rows: &[RawRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_raw_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn save_raw_rows(path: &Path, rows: &[RawRow]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_raw_rows(file, rows)?;
    info!("Wrote {} raw rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn load_raw_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rows = read_raw_rows(file).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Loaded {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Gazetteer rows; rows that do not deserialize (blank coordinates, stray
/// header repeats) are skipped.
pub fn read_gazetteer<R: Read>(reader: R, delimiter: u8) -> Result<Vec<CityRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.deserialize::<CityRecord>() {
        match result {
            Ok(r) => records.push(r),
            Err(e) => {
                skipped += 1;
                if skipped <= 5 {
                    warn!("Skipping gazetteer row: {}", e);
                }
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} unreadable gazetteer rows", skipped);
    }
    Ok(records)
}

pub fn load_gazetteer(path: &Path, delimiter: u8) -> Result<Vec<CityRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records = read_gazetteer(file, delimiter)?;
    info!("Loaded {} gazetteer rows from {}", records.len(), path.display());
    Ok(records)
}

pub fn write_dataset<W: Write>(writer: W, dataset: &FinalDataset) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.columns())?;
    for record in dataset.records() {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_dataset(path: &Path, dataset: &FinalDataset) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_dataset(file, dataset)?;
    info!(
        "Wrote {} rows x {} columns to {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    Ok(())
}

/// `raw.csv` → `raw.rejections.json`
pub fn rejections_path(raw: &Path) -> PathBuf {
    raw.with_extension("rejections.json")
}

pub fn save_rejections(path: &Path, rejections: &[Rejection]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, rejections)?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(city: &str, surface: &str) -> RawRow {
        RawRow {
            city: city.into(),
            property_type: "Maison".into(),
            surface: surface.into(),
            room_count: "5".into(),
            bedroom_count: MISSING.into(),
            bathroom_count: "1".into(),
            energy_rating: MISSING.into(),
            price: "250000".into(),
        }
    }

    #[test]
    fn raw_rows_use_dataset_headers() {
        let mut buf = Vec::new();
        write_raw_rows(&mut buf, &[row("Nice", "80")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("Ville,Type,Surface,NbrPieces,NbrChambres,NbrSdb,DPE,Prix")
        );
        assert_eq!(text.lines().nth(1), Some("Nice,Maison,80,5,-,1,-,250000"));
    }

    #[test]
    fn raw_rows_survive_commas_in_city() {
        let rows = vec![row("Aix, centre", "80"), row("Nice", MISSING)];
        let mut buf = Vec::new();
        write_raw_rows(&mut buf, &rows).unwrap();
        assert_eq!(read_raw_rows(buf.as_slice()).unwrap(), rows);
    }

    #[test]
    fn gazetteer_skips_bad_rows_and_extra_columns() {
        let csv = "code;label;latitude;longitude\n\
                   06030;Le Cannet;43.5769;7.0191\n\
                   99999;Nulle Part;;\n\
                   75056;Paris;48.8566;2.3522\n";
        let records = read_gazetteer(csv.as_bytes(), b';').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "Le Cannet");
        assert_eq!(records[1].longitude, 2.3522);
    }

    #[test]
    fn rejections_sit_next_to_raw_file() {
        assert_eq!(
            rejections_path(Path::new("data/raw.csv")),
            PathBuf::from("data/raw.rejections.json")
        );
    }
}
