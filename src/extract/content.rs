//! Free-text sections and price

use crate::extract::dom::{
    element_text, list_items, next_element, outermost, parent_element, select_within, Page,
};
use crate::extract::text::{char_len, len_between, truncate_chars};
use scraper::ElementRef;

/// Heading keywords for the trip inclusions section
pub const INCLUDES_KEYWORDS: &[&str] = &[
    "el viaje incluye",
    "el precio incluye",
    "incluye",
    "servicios incluidos",
];

/// Heading keywords for the included excursions section
pub const EXCURSIONS_INCLUDED_KEYWORDS: &[&str] = &["excursiones incluidas", "visitas incluidas"];

/// Heading keywords for the optional excursions section
pub const EXCURSIONS_OPTIONAL_KEYWORDS: &[&str] =
    &["excursiones opcionales", "visitas opcionales", "facultativas"];

const SECTION_HEADINGS: &str = "h2, h3, h4, h5, .section-title, .accordion-title, .tab-title";
const SECTION_PANELS: &str = r#".accordion-panel, .tab-panel, .collapse-content, [class*="accordion"]"#;

const HOTEL_SECTIONS: &[&str] = &[r#"[class*="hotel"]"#, ".hoteles", ".accommodation", ".alojamiento"];
const HOTEL_ITEMS: &str = "li, .hotel-name, .hotel-item, tr td:first-child, h4, h5";
const HOTEL_MAX_SIBLINGS: usize = 10;

const PRICE_FOOTER_SELECTORS: &[&str] = &[
    ".price-conditions",
    ".conditions",
    r#"[class*="condicion"]"#,
    ".price-footer",
    ".nota-precios",
    ".price-notes",
    ".legal-text",
];
const PRICE_FOOTER_MAX_CHARS: usize = 1000;

const PRICE_SELECTORS: &[&str] = &[
    ".header-summary__price-value",
    ".price .amount",
    ".precio .amount",
    ".tour-price",
    r#"[class*="price"] .amount"#,
    ".price",
    ".precio",
];

/// Prices must fall strictly inside this range to be accepted
const PRICE_FLOOR: u32 = 50;
const PRICE_CEILING: u32 = 50_000;

fn matches_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn container_text(container: ElementRef<'_>) -> Option<String> {
    let items = list_items(container);
    if !items.is_empty() {
        return Some(items.join("\n"));
    }
    let text = element_text(container);
    (char_len(&text) > 10).then_some(text)
}

/// Extracts a free-text section introduced by a heading
///
/// Finds the first heading whose text contains one of `keywords` and
/// collects the list or paragraph items of the element that follows it (or
/// of its parent when it has no following sibling). Falls back to
/// accordion and tab panels whose text mentions a keyword.
pub fn extract_section(page: &Page<'_>, keywords: &[&str]) -> String {
    for heading in page.select(SECTION_HEADINGS) {
        if !matches_keyword(element_text(heading).as_str(), keywords) {
            continue;
        }
        let container = next_element(heading).or_else(|| parent_element(heading));
        if let Some(text) = container.and_then(container_text) {
            return text;
        }
    }

    for panel in page.select(SECTION_PANELS) {
        if !matches_keyword(&element_text(panel), keywords) {
            continue;
        }
        let items = list_items(panel);
        if !items.is_empty() {
            return items.join("\n");
        }
    }

    String::new()
}

fn hotel_section_items(page: &Page<'_>) -> Option<String> {
    HOTEL_SECTIONS.iter().find_map(|css| {
        let sections = outermost(page.select(css));
        let items: Vec<String> = sections
            .into_iter()
            .flat_map(|section| select_within(section, HOTEL_ITEMS))
            .map(element_text)
            .filter(|t| len_between(t, 3, 200))
            .collect();
        (!items.is_empty()).then(|| items.join("\n"))
    })
}

fn is_section_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h2" | "h3" | "h4")
}

fn hotel_heading_items(page: &Page<'_>) -> Option<String> {
    for heading in page.select("h2, h3, h4") {
        if !element_text(heading).to_lowercase().contains("hotel") {
            continue;
        }

        let mut items = Vec::new();
        let mut next = next_element(heading);
        let mut count = 0;
        while let Some(sibling) = next {
            if count >= HOTEL_MAX_SIBLINGS || is_section_heading(sibling) {
                break;
            }
            let text = element_text(sibling);
            if char_len(&text) > 3 {
                items.push(text);
            }
            next = next_element(sibling);
            count += 1;
        }

        if !items.is_empty() {
            return Some(items.join("\n"));
        }
    }
    None
}

/// Extracts the hotel list, one hotel per line
pub fn hotels(page: &Page<'_>) -> String {
    hotel_section_items(page)
        .or_else(|| hotel_heading_items(page))
        .unwrap_or_default()
}

/// Extracts the price-conditions legal text, at most 1000 characters
pub fn price_footer(page: &Page<'_>) -> String {
    PRICE_FOOTER_SELECTORS
        .iter()
        .find_map(|css| {
            let text = element_text(page.first(css)?);
            (char_len(&text) > 10).then(|| truncate_chars(&text, PRICE_FOOTER_MAX_CHARS))
        })
        .unwrap_or_default()
}

fn in_price_range(value: u32) -> bool {
    value > PRICE_FLOOR && value < PRICE_CEILING
}

/// Parses the integer part of a display price
///
/// Dots are thousands separators and a comma starts the decimals, so
/// `"1.299,00 €"` is 1299.
pub fn parse_display_price(text: &str) -> Option<u32> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let without_thousands = kept.replace('.', "");
    let integer: String = without_thousands
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    integer.parse::<u32>().ok()
}

fn price_int(page: &Page<'_>) -> Option<u32> {
    let text = element_text(page.first("span.price__int")?);
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|p| in_price_range(*p))
}

/// Extracts the starting price
///
/// `span.price__int` first, then a cascade of price selectors. A value is
/// accepted only strictly between 50 and 50000.
pub fn price(page: &Page<'_>) -> Option<u32> {
    price_int(page).or_else(|| {
        PRICE_SELECTORS.iter().find_map(|css| {
            let text = element_text(page.first(css)?);
            parse_display_price(&text).filter(|p| in_price_range(*p))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn with_page<T>(html: &str, f: impl FnOnce(&Page<'_>) -> T) -> T {
        let doc = Html::parse_document(html);
        let page = Page::new(&doc, "https://example.com/x");
        f(&page)
    }

    #[test]
    fn test_section_from_following_list() {
        let html = r#"
            <h3>El precio incluye</h3>
            <ul><li>Vuelos internacionales</li><li>Hoteles 4*</li><li>ok</li></ul>"#;
        let section = with_page(html, |p| extract_section(p, INCLUDES_KEYWORDS));
        assert_eq!(section, "Vuelos internacionales\nHoteles 4*");
    }

    #[test]
    fn test_section_from_plain_text_sibling() {
        let html = r#"<h4>Visitas incluidas</h4><div>Visita panorámica de Roma</div>"#;
        let section = with_page(html, |p| extract_section(p, EXCURSIONS_INCLUDED_KEYWORDS));
        assert_eq!(section, "Visita panorámica de Roma");
    }

    #[test]
    fn test_section_from_panel() {
        let html = r#"<div class="accordion-panel"><strong>Excursiones opcionales</strong>
            <p>Capri y Pompeya</p></div>"#;
        let section = with_page(html, |p| extract_section(p, EXCURSIONS_OPTIONAL_KEYWORDS));
        assert_eq!(section, "Capri y Pompeya");
    }

    #[test]
    fn test_missing_section() {
        let section = with_page("<h3>Itinerario</h3><p>Día 1</p>", |p| {
            extract_section(p, INCLUDES_KEYWORDS)
        });
        assert_eq!(section, "");
    }

    #[test]
    fn test_hotels_from_section() {
        let html = r#"<div class="hotel-list"><ul>
            <li>Hotel Roma Centro 4*</li><li>Hotel Firenze 3*</li></ul></div>"#;
        assert_eq!(with_page(html, hotels), "Hotel Roma Centro 4*\nHotel Firenze 3*");
    }

    #[test]
    fn test_hotels_from_heading_siblings() {
        let html = r#"<h3>Hoteles previstos</h3><p>Hilton Cairo</p><p>Mena House</p>
            <h3>Notas</h3><p>Otra cosa</p>"#;
        assert_eq!(with_page(html, hotels), "Hilton Cairo\nMena House");
    }

    #[test]
    fn test_price_footer_truncated() {
        let long = "a".repeat(1500);
        let html = format!(r#"<div class="legal-text">{}</div>"#, long);
        assert_eq!(with_page(&html, price_footer).chars().count(), 1000);
    }

    #[test]
    fn test_price_from_price_int() {
        let html = r#"<span class="price__int">1.299</span>"#;
        assert_eq!(with_page(html, price), Some(1299));
    }

    #[test]
    fn test_price_below_floor_is_absent() {
        let html = r#"<span class="price__int">3€</span>"#;
        assert_eq!(with_page(html, price), None);
        let html = r#"<div class="price">3€</div>"#;
        assert_eq!(with_page(html, price), None);
    }

    #[test]
    fn test_price_cascade() {
        let html = r#"<div class="price"><span class="amount">desde 1.450,50 €</span></div>"#;
        assert_eq!(with_page(html, price), Some(1450));
    }

    #[test]
    fn test_parse_display_price() {
        assert_eq!(parse_display_price("1.299,00 €"), Some(1299));
        assert_eq!(parse_display_price("995€"), Some(995));
        assert_eq!(parse_display_price("consultar"), None);
    }
}
