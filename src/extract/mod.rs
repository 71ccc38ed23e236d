//! Field extraction from travel-package pages
//!
//! [`parse_circuit_page`] turns one HTML document into a [`CircuitRecord`].
//! Each field is produced by an ordered chain of rules; a field with no
//! matching rule is left empty rather than guessed.

pub mod categories;
pub mod content;
pub mod dates;
pub mod dom;
pub mod geography;
pub mod images;
pub mod itinerary;
pub mod meta;
pub mod tables;
pub mod text;
pub mod title;

pub use dom::Page;
pub use title::{build_title, TitleParts, TITLE_BUDGET};

use crate::record::CircuitRecord;
use crate::ExtractError;
use chrono::Utc;
use scraper::Html;

/// Parses an HTML document fetched from `url` into a circuit record
///
/// # Arguments
///
/// * `html` - The raw document body
/// * `url` - The page URL, used for URL-based fallbacks and to resolve images
///
/// # Returns
///
/// The extracted record, or an error if the body is empty or clearly not
/// HTML. Missing fields never cause an error.
pub fn parse_circuit_page(html: &str, url: &str) -> Result<CircuitRecord, ExtractError> {
    let trimmed = html.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::EmptyDocument);
    }
    if !trimmed.contains('<') {
        let preview: String = trimmed.chars().take(40).collect();
        return Err(ExtractError::NotHtml(preview));
    }

    let doc = Html::parse_document(html);
    let mut page = Page::new(&doc, url);

    let mut record = CircuitRecord::empty(url);

    record.meta_title = meta::meta_title(&page);
    record.meta_description = meta::meta_description(&page);
    page.meta_title = record.meta_title.clone();

    record.cities = geography::cities(&page);
    record.countries = geography::countries(&page, &record.cities);

    let length = dates::trip_length(&page);
    record.days = length.days;
    record.nights = length.nights;
    record.travel_dates = dates::travel_dates(&page);

    let images = images::images(&page);
    record.image_banner = images.banner;
    record.image_thumbnail = images.thumbnail;

    record.origins = geography::origins(&page);

    let categories = categories::categories(&page);
    record.category_primary = categories.primary;
    record.category_secondary = categories.secondary;
    record.category_tertiary = categories.tertiary;
    record.extra_categories = categories.extra;

    record.title = build_title(&TitleParts {
        meta_title: &record.meta_title,
        category: &record.category_primary,
        category2: record.category_secondary.as_deref().unwrap_or_default(),
        countries: &record.countries,
        cities: &record.cities,
        days: record.days,
    });
    record.date_text = dates::date_text(record.travel_dates.as_deref());

    record.trip_includes = content::extract_section(&page, content::INCLUDES_KEYWORDS);
    record.excursions_included =
        content::extract_section(&page, content::EXCURSIONS_INCLUDED_KEYWORDS);
    record.excursions_optional =
        content::extract_section(&page, content::EXCURSIONS_OPTIONAL_KEYWORDS);
    record.hotels = content::hotels(&page);
    record.price_footer = content::price_footer(&page);
    record.short_description =
        meta::short_description(&record.meta_description, &record.meta_title);
    record.price = content::price(&page);

    let itinerary = itinerary::itinerary(&page);
    record.itinerary_days = itinerary.days;
    record.itinerary_texts = itinerary.texts;

    record.scraped_at = Utc::now();
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://www.traveltool.es/circuitos/asia/japon/japon-clasico-10-dias";

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Japón clásico | Traveltool</title>
  <meta name="description" content="Recorre Japón de Tokio a Kioto.">
  <meta property="og:image" content="https://cdn.traveltool.es/resize/crop/1200/600/p/1200_600.jpg">
</head>
<body>
  <div class="header-summary__info-subtitle">Japón, 10 días · Circuito clásico</div>
  <p>Duración: 10 días / 8 noches</p>
  <div class="summary-product__box-departure-content">Enero 2025 hasta Diciembre 2025</div>
  <span class="price__int">2.450</span>
  <h3>El precio incluye</h3>
  <ul><li>Vuelos internacionales</li><li>Guía de habla hispana</li></ul>
  <div class="itinerary-day"><h4>Día 1: Madrid - Tokio</h4><p>Vuelo a Tokio.</p></div>
  <div class="itinerary-day"><h4>Día 2: Tokio - Kioto</h4><p>Tren bala.</p></div>
</body>
</html>"#;

    #[test]
    fn test_parse_full_page() {
        let record = parse_circuit_page(PAGE, URL).unwrap();

        assert_eq!(record.url, URL);
        assert_eq!(record.meta_title, "Japón clásico");
        assert_eq!(record.meta_description, "Recorre Japón de Tokio a Kioto.");
        assert_eq!(record.short_description, "Recorre Japón de Tokio a Kioto.");
        assert_eq!(record.days, Some(10));
        assert_eq!(record.nights, Some(8));
        assert_eq!(record.travel_dates.as_deref(), Some("Enero 2025 - Diciembre 2025"));
        assert_eq!(record.date_text, "Salidas desde Enero 2025 hasta Diciembre 2025");
        assert_eq!(record.price, Some(2450));
        assert_eq!(record.category_primary, "Circuito clásico");
        assert_eq!(record.trip_includes, "Vuelos internacionales\nGuía de habla hispana");
        assert_eq!(record.itinerary_days, vec!["@Tokio", "@Kioto"]);
        assert_eq!(record.itinerary_texts.len(), 2);
        assert!(record.image_banner.is_some());
        assert!(record.image_thumbnail.is_some());
        assert!(!record.from_cache);
    }

    #[test]
    fn test_title_uses_first_country() {
        let record = parse_circuit_page(PAGE, URL).unwrap();
        if let Some(country) = record.countries.first() {
            assert!(record.title.contains(country.as_str()));
        }
        assert!(record.title.chars().count() <= TITLE_BUDGET);
    }

    #[test]
    fn test_sparse_page_yields_empty_fields() {
        let record = parse_circuit_page("<html><body><p>Hola</p></body></html>", URL).unwrap();
        assert_eq!(record.price, None);
        assert_eq!(record.trip_includes, "");
        assert!(record.itinerary_days.is_empty());
        assert!(record.itinerary_texts.is_empty());
        assert_eq!(record.short_description, "Descubre este circuito en un viaje organizado.");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_circuit_page("   ", URL), Err(ExtractError::EmptyDocument));
    }

    #[test]
    fn test_not_html() {
        assert!(matches!(
            parse_circuit_page("{\"ok\": true}", URL),
            Err(ExtractError::NotHtml(_))
        ));
    }
}
