pub mod extract;

use thiserror::Error;

use crate::document::ParsedDocument;
use crate::store::{RawRow, MISSING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    House,
    Apartment,
}

impl PropertyType {
    /// Only the two exact site labels are accepted; anything else is a rejection.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Maison" => Some(Self::House),
            "Appartement" => Some(Self::Apartment),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::House => "Maison",
            Self::Apartment => "Appartement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    pub label: String,
    pub value: Option<String>,
}

/// Ordered label/value pairs from the "Caractéristiques :" list of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacteristicsTable {
    entries: Vec<Characteristic>,
}

impl CharacteristicsTable {
    pub fn new(entries: Vec<Characteristic>) -> Self {
        Self { entries }
    }

    /// Value of the first entry whose label contains `label`.
    ///
    /// A missing entry and an entry without a value are both `None`; lookups
    /// never fail.
    pub fn lookup(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label.contains(label))
            .and_then(|e| e.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("field `{0}` not found")]
    FieldMissing(&'static str),
    #[error("field `{field}` is malformed: {value:?}")]
    FieldMalformed { field: &'static str, value: String },
    #[error("price {0} is below the {min} floor", min = extract::MIN_PRICE)]
    PriceTooLow(i64),
    #[error("unsupported property type {0:?}")]
    TypeInvalid(String),
    #[error("section {0:?} not found")]
    SectionMissing(&'static str),
}

impl ExtractError {
    /// Short tag used to group rejections in crawl summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FieldMissing(_) => "field_missing",
            Self::FieldMalformed { .. } => "field_malformed",
            Self::PriceTooLow(_) => "price_too_low",
            Self::TypeInvalid(_) => "type_invalid",
            Self::SectionMissing(_) => "section_missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid listing: {0}")]
pub struct InvalidListing(#[from] pub ExtractError);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub city: String,
    pub property_type: PropertyType,
    pub surface: Option<String>,
    pub room_count: Option<String>,
    pub bedroom_count: Option<String>,
    pub bathroom_count: Option<String>,
    pub energy_rating: Option<String>,
    pub price: i64,
}

impl Listing {
    pub fn to_raw_row(&self) -> RawRow {
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
        RawRow {
            city: self.city.clone(),
            property_type: self.property_type.label().to_string(),
            surface: text(&self.surface),
            room_count: text(&self.room_count),
            bedroom_count: text(&self.bedroom_count),
            bathroom_count: text(&self.bathroom_count),
            energy_rating: text(&self.energy_rating),
            price: self.price.to_string(),
        }
    }
}

/// Build one listing from a detail page. The first failing field rejects the
/// whole document.
pub fn validate(doc: &ParsedDocument) -> Result<Listing, InvalidListing> {
    let city = extract::extract_city(doc)?;
    let table = extract::extract_characteristics(doc)?;
    let property_type = extract::extract_type(&table)?;
    let surface = extract::extract_surface(&table);
    let room_count = table.lookup(extract::ROOMS_LABEL).map(str::to_string);
    let bedroom_count = table.lookup(extract::BEDROOMS_LABEL).map(str::to_string);
    let bathroom_count = table.lookup(extract::BATHROOMS_LABEL).map(str::to_string);
    let energy_rating = table.lookup(extract::ENERGY_LABEL).map(str::to_string);
    let price = extract::extract_price(doc)?;

    Ok(Listing {
        city,
        property_type,
        surface,
        room_count,
        bedroom_count,
        bathroom_count,
        energy_rating,
        price,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> ParsedDocument {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        ParsedDocument::parse(&html)
    }

    #[test]
    fn maison_le_cannet_row() {
        let listing = validate(&fixture("annonce_maison")).unwrap();
        assert_eq!(listing.city, "Le Cannet");
        assert_eq!(listing.property_type, PropertyType::House);
        assert_eq!(listing.price, 450000);
        assert_eq!(
            listing.to_raw_row().to_line(),
            "Le Cannet,Maison,120,5,4,2,B,450000"
        );
    }

    #[test]
    fn sparse_appartement_keeps_missing_fields_as_sentinel() {
        let listing = validate(&fixture("annonce_appartement")).unwrap();
        assert_eq!(listing.property_type, PropertyType::Apartment);
        assert_eq!(listing.surface.as_deref(), Some("48"));
        assert_eq!(listing.room_count.as_deref(), Some("2"));
        assert_eq!(listing.bedroom_count, None);
        assert_eq!(listing.energy_rating, None);
        assert_eq!(
            listing.to_raw_row().to_line(),
            "Saint-Germain-en-Laye,Appartement,48,2,-,-,-,185000"
        );
    }

    #[test]
    fn terrain_is_rejected_not_categorised() {
        let err = validate(&fixture("annonce_terrain")).unwrap_err();
        assert_eq!(err, InvalidListing(ExtractError::TypeInvalid("Terrain".into())));
    }

    #[test]
    fn first_failure_wins() {
        // No heading and no price: the city is checked first.
        let doc = ParsedDocument::parse("<p>Caractéristiques :</p><ul><li>Type : Maison</li></ul>");
        assert_eq!(
            validate(&doc).unwrap_err().0,
            ExtractError::FieldMissing("city")
        );
    }

    #[test]
    fn missing_type_entry_is_type_invalid() {
        let doc = ParsedDocument::parse(
            r#"<div class="product-identity-container">Studio, Nice</div>
               <h3>Caractéristiques :</h3>
               <ul><li>Surface : 20 m²</li></ul>
               <div class="product-price">95 000 €</div>"#,
        );
        let err = validate(&doc).unwrap_err().0;
        assert_eq!(err, ExtractError::TypeInvalid(MISSING.into()));
        assert_eq!(err.kind(), "type_invalid");
    }

    #[test]
    fn low_price_rejects_whole_listing() {
        let doc = ParsedDocument::parse(
            r#"<div class="product-identity-container">Studio, Nice</div>
               <h3>Caractéristiques :</h3>
               <ul><li>Type de bien : Appartement</li></ul>
               <div class="product-price">950 €</div>"#,
        );
        assert_eq!(validate(&doc).unwrap_err().0, ExtractError::PriceTooLow(950));
    }

    #[test]
    fn lookup_matches_by_containment_in_order() {
        let table = CharacteristicsTable::new(vec![
            Characteristic { label: "Nb. de chambres".into(), value: Some("3".into()) },
            Characteristic { label: "Nb. de pièces".into(), value: Some("5".into()) },
            Characteristic { label: "Piscine".into(), value: None },
        ]);
        assert_eq!(table.lookup("Nb. de pièces"), Some("5"));
        assert_eq!(table.lookup("Nb. de"), Some("3"));
        assert_eq!(table.lookup("Piscine"), None);
        assert_eq!(table.lookup("Garage"), None);
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ExtractError::PriceTooLow(1).kind(), "price_too_low");
        assert_eq!(
            InvalidListing(ExtractError::SectionMissing("x")).to_string(),
            "invalid listing: section \"x\" not found"
        );
    }
}
