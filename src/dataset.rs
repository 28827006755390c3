use crate::clean::{self, NumericColumn, OneHot};
use crate::geo::{self, Gazetteer, JoinedRow};
use crate::store::RawRow;

/// Final table: numeric columns, price, coordinates, then one indicator per
/// observed property type and energy rating.
pub struct FinalDataset {
    columns: Vec<String>,
    types: OneHot,
    ratings: OneHot,
    rows: Vec<JoinedRow>,
}

impl FinalDataset {
    pub fn from_joined(rows: Vec<JoinedRow>) -> Self {
        let types = OneHot::fit("Type", rows.iter().map(|r| r.property_type.as_str()));
        let ratings = OneHot::fit("DPE", rows.iter().map(|r| r.energy_rating.as_str()));

        let mut columns: Vec<String> = NumericColumn::ALL
            .iter()
            .map(|c| c.header().to_string())
            .collect();
        columns.extend(["Prix", "latitude", "longitude"].map(String::from));
        columns.extend(types.column_names());
        columns.extend(ratings.column_names());

        Self {
            columns,
            types,
            ratings,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as text cells in column order; missing coordinates are empty cells.
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|row| {
            let mut cells: Vec<String> = row.values.iter().map(f64::to_string).collect();
            cells.push(row.price.to_string());
            cells.push(row.latitude.map(|v| v.to_string()).unwrap_or_default());
            cells.push(row.longitude.map(|v| v.to_string()).unwrap_or_default());
            let flags = self
                .types
                .encode(&row.property_type)
                .into_iter()
                .chain(self.ratings.encode(&row.energy_rating));
            cells.extend(flags.map(|f| f.to_string()));
            cells
        })
    }
}

/// clean → canonical join → one-hot, over one fully loaded batch.
pub fn build(raw: &[RawRow], gazetteer: &Gazetteer) -> FinalDataset {
    let cleaned = clean::clean(raw);
    let joined = geo::join(cleaned, gazetteer);
    FinalDataset::from_joined(joined)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::CityRecord;
    use crate::store::MISSING;

    fn raw(city: &str, kind: &str, surface: &str, dpe: &str, price: &str) -> RawRow {
        RawRow {
            city: city.into(),
            property_type: kind.into(),
            surface: surface.into(),
            room_count: "3".into(),
            bedroom_count: "2".into(),
            bathroom_count: "1".into(),
            energy_rating: dpe.into(),
            price: price.into(),
        }
    }

    fn gazetteer() -> Gazetteer {
        Gazetteer::new(&[
            CityRecord { label: "Le Cannet".into(), latitude: 43.5769, longitude: 7.0191 },
            CityRecord { label: "Paris".into(), latitude: 48.8566, longitude: 2.3522 },
        ])
    }

    #[test]
    fn columns_follow_observed_categories() {
        let rows = vec![
            raw("Le Cannet", "Maison", "120", "B", "450000"),
            raw("Paris 11ème", "Appartement", MISSING, MISSING, "520000"),
        ];
        let ds = build(&rows, &gazetteer());
        assert_eq!(
            ds.columns(),
            [
                "Surface",
                "NbrPieces",
                "NbrChambres",
                "NbrSdb",
                "Prix",
                "latitude",
                "longitude",
                "Type_Appartement",
                "Type_Maison",
                "DPE_B",
                "DPE_Vierge"
            ]
        );
    }

    #[test]
    fn records_fill_imputed_values_and_coordinates() {
        let rows = vec![
            raw("Le Cannet", "Maison", "120", "B", "450000"),
            raw("Paris 11ème", "Appartement", MISSING, MISSING, "520000"),
            raw("Nowhere", "Maison", "60", "B", "150000"),
        ];
        let ds = build(&rows, &gazetteer());
        let records: Vec<Vec<String>> = ds.records().collect();
        assert_eq!(ds.len(), 3);
        assert_eq!(
            records[1],
            ["90", "3", "2", "1", "520000", "48.8566", "2.3522", "true", "false", "false", "true"]
        );
        assert_eq!(records[2][5], "");
        assert_eq!(records[2][6], "");
    }

    #[test]
    fn empty_batch_has_only_fixed_columns() {
        let ds = build(&[], &gazetteer());
        assert!(ds.is_empty());
        assert_eq!(ds.columns().len(), 7);
    }
}
