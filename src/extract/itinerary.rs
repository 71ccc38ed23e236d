//! Day-by-day itinerary
//!
//! Two independent sequences are produced: `@City` labels, one per day, and
//! `{Title: body` texts. Both prefer itinerary container markup and fall
//! back to "Día N:" lines in the page text.

use crate::extract::dom::{element_text, outermost, select_within, text_excluding, Page};
use crate::extract::text::{char_len, collapse_whitespace, truncate_chars};
use crate::record::MAX_ITINERARY_DAYS;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

const DAY_CONTAINERS: &str = r#".itinerary-day, .day-item, [class*="itinerary"] [class*="day"], .itinerary__day, .accordion-item"#;
const DAY_TITLES: &str = "h3, h4, h5, .day-title, .title, .accordion-title, .itinerary__day-title";
const TEXT_TITLES: &str = "h3, h4, h5, .day-title, .title, .accordion-title";

static DAY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)d[ií]a\s*\d+\s*[:.\-]?\s*").expect("valid regex"));
static LEG_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–>]").expect("valid regex"));
static TRANSIT_LEG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)ciudad\s+de\s+origen|salida|llegada|vuelo|regreso").expect("valid regex")
});
static ORIGIN_LEG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ciudad\s+de\s+origen|salida").expect("valid regex"));
static BODY_DAY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[Dd][ií]a\s*(\d+)\s*[:.\-]\s*([^\n\r]{3,100})").expect("valid regex")
});
static BODY_DAY_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([Dd][ií]a\s*\d+\s*[:.\-]\s*[^\n]{10,500})").expect("valid regex")
});

/// Parallel day labels and day texts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Itinerary {
    pub days: Vec<String>,
    pub texts: Vec<String>,
}

fn day_containers<'a>(page: &Page<'a>) -> Vec<ElementRef<'a>> {
    outermost(page.select(DAY_CONTAINERS))
}

fn legs(text: &str) -> impl Iterator<Item = &str> {
    LEG_SEPARATOR.split(text).map(str::trim)
}

/// Turns a day heading into a `@City` label
///
/// The "Día N:" prefix is dropped and the heading split into legs; the last
/// leg that is not a departure or arrival note names the city.
fn day_label(heading: &str) -> Option<String> {
    let text = DAY_PREFIX.replace_all(heading, "").trim().to_string();

    let last_city = legs(&text)
        .filter(|leg| {
            let len = char_len(leg);
            len > 1 && len < 50 && !TRANSIT_LEG.is_match(leg)
        })
        .last();

    match last_city {
        Some(city) => Some(format!("@{}", city)),
        None if char_len(&text) > 1 => Some(format!("@{}", truncate_chars(&text, 50))),
        None => None,
    }
}

fn container_days(containers: &[ElementRef<'_>]) -> Vec<String> {
    containers
        .iter()
        .filter_map(|container| select_within(*container, DAY_TITLES).into_iter().next())
        .filter_map(|title| day_label(&element_text(title)))
        .collect()
}

fn body_days(body: &str) -> Vec<String> {
    BODY_DAY_LINE
        .captures_iter(body)
        .filter_map(|caps| {
            let line = caps[2].trim();
            let last = legs(line)
                .filter(|leg| char_len(leg) > 1 && !ORIGIN_LEG.is_match(leg))
                .last()?;
            let city = last.split('.').next().unwrap_or(last).trim();
            Some(format!("@{}", city))
        })
        .collect()
}

fn container_texts(containers: &[ElementRef<'_>]) -> Vec<String> {
    containers
        .iter()
        .filter_map(|container| {
            let title = select_within(*container, TEXT_TITLES)
                .into_iter()
                .next()
                .map(element_text)
                .unwrap_or_default();
            let body = collapse_whitespace(&text_excluding(*container, TEXT_TITLES));

            match (title.is_empty(), body.is_empty()) {
                (true, true) => None,
                (_, true) => Some(format!("{{{}", title)),
                _ => Some(format!("{{{}: {}", title, body)),
            }
        })
        .collect()
}

fn body_texts(body: &str) -> Vec<String> {
    BODY_DAY_TEXT
        .captures_iter(body)
        .map(|caps| format!("{{{}", caps[1].trim()))
        .collect()
}

/// Extracts the itinerary day labels and texts, at most 60 of each
pub fn itinerary(page: &Page<'_>) -> Itinerary {
    let containers = day_containers(page);

    let mut days = container_days(&containers);
    if days.is_empty() {
        days = body_days(&page.body_text);
    }

    let mut texts = container_texts(&containers);
    if texts.is_empty() {
        texts = body_texts(&page.body_text);
    }

    days.truncate(MAX_ITINERARY_DAYS);
    texts.truncate(MAX_ITINERARY_DAYS);
    Itinerary { days, texts }
}
