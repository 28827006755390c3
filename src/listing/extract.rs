use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{Characteristic, CharacteristicsTable, ExtractError, PropertyType};
use crate::document::{element_text, ParsedDocument};
use crate::store::MISSING;

/// Anything cheaper is treated as a typo or a rental, not a sale price.
pub const MIN_PRICE: i64 = 10_000;

pub const CHARACTERISTICS_HEADER: &str = "Caractéristiques :";
pub const TYPE_LABEL: &str = "Type";
pub const SURFACE_LABEL: &str = "Surface";
pub const ROOMS_LABEL: &str = "Nb. de pièces";
pub const BEDROOMS_LABEL: &str = "Nb. de chambres";
pub const BATHROOMS_LABEL: &str = "Nb. de salles";
pub const ENERGY_LABEL: &str = "Classe énergie";

const CITY_SEPARATOR: &str = ", ";

static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".product-price").unwrap());
static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".product-identity-container").unwrap());
static ANY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body *").unwrap());
static PRICE_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[€\s]").unwrap());
static SURFACE_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"m²|\s").unwrap());

pub fn extract_price(doc: &ParsedDocument) -> Result<i64, ExtractError> {
    let text = doc
        .first_text(&PRICE_SEL)
        .ok_or(ExtractError::FieldMissing("price"))?;
    parse_price(&text)
}

/// "450 000 €" → 450000, enforcing the price floor.
pub fn parse_price(text: &str) -> Result<i64, ExtractError> {
    let digits = PRICE_NOISE_RE.replace_all(text, "");
    let malformed = || ExtractError::FieldMalformed {
        field: "price",
        value: text.to_string(),
    };
    // Digits only: `i64::from_str` would also take a sign.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let price: i64 = digits.parse().map_err(|_| malformed())?;
    if price < MIN_PRICE {
        return Err(ExtractError::PriceTooLow(price));
    }
    Ok(price)
}

pub fn extract_city(doc: &ParsedDocument) -> Result<String, ExtractError> {
    let heading = doc
        .first_text(&HEADING_SEL)
        .ok_or(ExtractError::FieldMissing("city"))?;
    city_from_heading(&heading)
        .map(str::to_string)
        .ok_or(ExtractError::FieldMissing("city"))
}

/// Everything after the last ", " of the heading.
pub fn city_from_heading(heading: &str) -> Option<&str> {
    let idx = heading.rfind(CITY_SEPARATOR)?;
    let city = heading[idx + CITY_SEPARATOR.len()..].trim();
    if city.is_empty() {
        None
    } else {
        Some(city)
    }
}

pub fn extract_characteristics(doc: &ParsedDocument) -> Result<CharacteristicsTable, ExtractError> {
    let header = doc
        .select(&ANY_SEL)
        .find(|el| is_section_header(*el))
        .ok_or(ExtractError::SectionMissing(CHARACTERISTICS_HEADER))?;

    let entries = items_after(header).into_iter().map(parse_item).collect();
    Ok(CharacteristicsTable::new(entries))
}

/// A missing type entry reads as the sentinel and is rejected like any other
/// unsupported value.
pub fn extract_type(table: &CharacteristicsTable) -> Result<PropertyType, ExtractError> {
    let value = table.lookup(TYPE_LABEL).unwrap_or(MISSING);
    PropertyType::from_label(value).ok_or_else(|| ExtractError::TypeInvalid(value.to_string()))
}

/// Surface with its unit stripped ("120 m²" → "120").
pub fn extract_surface(table: &CharacteristicsTable) -> Option<String> {
    table
        .lookup(SURFACE_LABEL)
        .map(|v| SURFACE_UNIT_RE.replace_all(v, "").to_string())
        .filter(|v| !v.is_empty())
}

/// The innermost element whose whole text is the header label, so a wrapper
/// `<div>` around `<h3>Caractéristiques :</h3>` does not shadow the heading.
fn is_section_header(el: ElementRef<'_>) -> bool {
    element_text(el) == CHARACTERISTICS_HEADER
        && !el
            .children()
            .filter_map(ElementRef::wrap)
            .any(|child| element_text(child) == CHARACTERISTICS_HEADER)
}

/// List items immediately following the header: either the items of the next
/// `<ul>`/`<ol>`, or a run of sibling `<li>`. When the header is the last
/// child of its parent (`<h3><strong>…</strong></h3>`), the parent is used.
fn items_after(header: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut anchor = header;
    while next_element(anchor).is_none() {
        match anchor.parent().and_then(ElementRef::wrap) {
            Some(parent) => anchor = parent,
            None => return Vec::new(),
        }
    }

    let mut items = Vec::new();
    for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
        match sibling.value().name() {
            "ul" | "ol" if items.is_empty() => {
                return sibling
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "li")
                    .collect();
            }
            "li" => items.push(sibling),
            _ => break,
        }
    }
    items
}

fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// `<li><span>Surface</span><span>120 m²</span></li>` or `<li>Surface : 120 m²</li>`.
fn parse_item(li: ElementRef<'_>) -> Characteristic {
    let parts: Vec<String> = li
        .children()
        .filter_map(ElementRef::wrap)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();

    if parts.len() >= 2 {
        return Characteristic {
            label: parts[0].trim_end_matches(':').trim().to_string(),
            value: Some(parts[1..].join(" ")),
        };
    }

    let text = element_text(li);
    match text.split_once(':') {
        Some((label, value)) => Characteristic {
            label: label.trim().to_string(),
            value: Some(value.trim().to_string()).filter(|v| !v.is_empty()),
        },
        None => Characteristic {
            label: text,
            value: None,
        },
    }
}

// ── Tests ──
