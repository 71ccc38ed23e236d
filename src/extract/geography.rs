//! Countries, cities and departure origins

use crate::extract::dom::{element_text, first_match, text_excluding, Page};
use crate::extract::tables::{lookup, CAPITAL_TO_COUNTRY, COUNTRY_ALIASES, SPAIN_CITY_TO_REGION};
use crate::extract::text::{char_len, collapse_whitespace, len_between, normalize_key, push_unique, title_case};
use once_cell::sync::Lazy;
use regex::Regex;

static AND_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+[ye]\s+").expect("valid regex"));
static LIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;/|]").expect("valid regex"));
static DAYS_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*\d+\s*d[ií]as?.*$").expect("valid regex"));
static FILLER_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:circuito|viaje|tour|pa[ií]s)\b").expect("valid regex"));
static LABEL_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[:·]").expect("valid regex"));
static BREADCRUMB_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)circuito|viaje|inicio|home").expect("valid regex"));
static LEADING_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:,]+)").expect("valid regex"));
static CONTINENT_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:europa|asia|america|africa|oceania)/([^/?#]+)").expect("valid regex")
});
static HEADING_COUNTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-ZÁÉÍÓÚÑ][a-záéíóúñ]+(?:\s[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+)*)\s*[,:·]")
        .expect("valid regex")
});

static TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*(.+)").expect("valid regex"));
static TITLE_NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+\s*d[ií]as?|circuito\s*\w*|desde\s+\w+").expect("valid regex")
});
static TITLE_AND: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+y\s+").expect("valid regex"));
static TRIP_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)viaje|tour|crucero").expect("valid regex"));
static DAY_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)d[ií]a\s*\d+\s*[:.\-]?\s*").expect("valid regex"));
static LEG_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–>]").expect("valid regex"));
static NOT_A_CITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)salida|llegada|vuelo|ciudad\s+de\s+origen|regreso").expect("valid regex")
});
static IMAGE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)shim|not-available|banner").expect("valid regex"));
static ORIGIN_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)salida|fecha|enero|febrero").expect("valid regex"));
static PLACEHOLDER_OPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)selecciona|elige|todos|--").expect("valid regex"));

/// Splits a free-text country list on commas, `;`, `/`, `|`, " y " and " e "
pub fn split_countries(text: &str) -> Vec<String> {
    let unified = AND_SEPARATOR.replace_all(text, ", ");
    let unified = LIST_SEPARATOR.replace_all(&unified, ",");
    unified
        .split(',')
        .map(str::trim)
        .filter(|c| char_len(c) > 1)
        .map(str::to_string)
        .collect()
}

/// Cleans one country label and maps it to its canonical spelling
///
/// Returns None when nothing meaningful is left.
pub fn normalize_country_label(raw: &str) -> Option<String> {
    let cleaned = DAYS_TAIL.replace(raw, "");
    let cleaned = FILLER_WORDS.replace_all(&cleaned, "");
    let cleaned = LABEL_PUNCT.replace_all(&cleaned, " ");
    let cleaned = collapse_whitespace(&cleaned);
    if cleaned.is_empty() {
        return None;
    }

    let key = normalize_key(&cleaned);
    match lookup(COUNTRY_ALIASES, &key) {
        Some(alias) => Some(alias.to_string()),
        None => Some(title_case(&cleaned)),
    }
}

fn country_labels(raw: &str) -> Vec<String> {
    split_countries(raw)
        .iter()
        .filter_map(|part| normalize_country_label(part))
        .filter(|label| char_len(label) < 60)
        .collect()
}

fn non_empty(labels: Vec<String>) -> Option<Vec<String>> {
    (!labels.is_empty()).then_some(labels)
}

fn is_breadcrumb_country(text: &str) -> bool {
    len_between(text, 2, 30) && !BREADCRUMB_NOISE.is_match(text)
}

/// Countries from breadcrumb navigation
///
/// Reads the own text of the last structured breadcrumb item, then the
/// structured links from index 3 down to 1, then generic breadcrumb links
/// from index 3 down to 2.
fn breadcrumb_countries(page: &Page<'_>) -> Option<Vec<String>> {
    let mut labels = Vec::new();

    if let Some(last) = page.select(".breadcrumbs-rxjs__item").last() {
        let own_text = text_excluding(*last, "a, i, div, p");
        if let Some(caps) = LEADING_LABEL.captures(own_text.trim()) {
            labels.extend(country_labels(&caps[1]));
        }
    }

    let links: Vec<String> = page
        .select(".breadcrumbs-rxjs__link")
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if links.len() > 1 {
        for i in (1..=3.min(links.len() - 1)).rev() {
            if is_breadcrumb_country(&links[i]) {
                labels.extend(country_labels(&links[i]));
            }
        }
    }

    let generic: Vec<String> = page
        .select(r#".breadcrumb a, .breadcrumbs a, nav[aria-label="breadcrumb"] a, .breadcrumb li a"#)
        .into_iter()
        .map(element_text)
        .collect();
    if generic.len() > 2 {
        for i in (2..=3.min(generic.len() - 1)).rev() {
            if is_breadcrumb_country(&generic[i]) {
                labels.extend(country_labels(&generic[i]));
            }
        }
    }

    non_empty(labels)
}

/// Country from a `/<continent>/<country>/` URL path segment
fn url_country(page: &Page<'_>) -> Option<Vec<String>> {
    let caps = CONTINENT_PATH.captures(page.url)?;
    let segment = &caps[1];
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    non_empty(country_labels(&decoded.replace('-', " ")))
}

/// Country from a capitalized lead-in of the header subtitle
fn heading_country(page: &Page<'_>) -> Option<Vec<String>> {
    let summary = [".header-summary__subtitle", ".header-summary", "h1"]
        .iter()
        .map(|css| page.text_of(css))
        .find(|t| !t.is_empty())?;

    let caps = HEADING_COUNTRY.captures(&summary)?;
    non_empty(country_labels(&caps[1]))
}

/// Extracts the ordered, deduplicated country list
///
/// The page-level chain is breadcrumbs, then URL path, then heading. The
/// result is then back-filled from `cities`: the country of every
/// recognized capital is added, the capitals themselves follow the
/// countries, and Spanish regions are added only when Spain is listed.
pub fn countries(page: &Page<'_>, cities: &[String]) -> Vec<String> {
    let mut candidates = first_match(page, &[breadcrumb_countries, url_country, heading_country])
        .unwrap_or_default();

    let mut capitals: Vec<String> = Vec::new();
    let mut regions: Vec<String> = Vec::new();
    for city in cities {
        let key = normalize_key(city);
        if let Some(country) = lookup(CAPITAL_TO_COUNTRY, &key) {
            candidates.extend(country_labels(country));
            if !capitals.iter().any(|c| normalize_key(c) == key) {
                capitals.push(city.clone());
            }
        }
        if let Some(region) = lookup(SPAIN_CITY_TO_REGION, &key) {
            push_unique(&mut regions, region.to_string());
        }
    }

    let mut result: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for candidate in candidates {
        let key = normalize_key(&candidate);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(candidate);
    }

    let has_spain = seen.iter().any(|k| k == "espana");
    result.extend(capitals);
    if has_spain {
        result.extend(regions);
    }
    result
}

fn collect_unique(values: impl IntoIterator<Item = String>) -> Option<Vec<String>> {
    let mut out = Vec::new();
    for value in values {
        push_unique(&mut out, value);
    }
    non_empty(out)
}

fn card_cities(page: &Page<'_>) -> Option<Vec<String>> {
    collect_unique(
        page.select("h3.card-effect-mask-rxjs__title")
            .into_iter()
            .map(element_text)
            .filter(|t| len_between(t, 1, 50)),
    )
}

fn carousel_cities(page: &Page<'_>) -> Option<Vec<String>> {
    collect_unique(
        page.select(".carousel-rxjs__slide img")
            .into_iter()
            .filter_map(|img| {
                let el = img.value();
                el.attr("alt")
                    .filter(|a| !a.is_empty())
                    .or_else(|| el.attr("title"))
                    .map(|a| a.trim().to_string())
            })
            .filter(|city| len_between(city, 1, 50) && !IMAGE_NOISE.is_match(city)),
    )
}

fn title_cities(page: &Page<'_>) -> Option<Vec<String>> {
    let caps = TITLE_SUFFIX.captures(&page.meta_title)?;
    let cleaned = TITLE_NOISE.replace_all(&caps[1], "");
    let cleaned = TITLE_AND.replace_all(&cleaned, ", ");
    collect_unique(
        cleaned
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| char_len(c) > 1 && !TRIP_WORDS.is_match(c)),
    )
}

fn itinerary_heading_cities(page: &Page<'_>) -> Option<Vec<String>> {
    let mut cities = Vec::new();
    for heading in page.select(".itinerary-day h3, .itinerary-day h4, .day-title, .itinerary__day-title") {
        let text = element_text(heading);
        let text = DAY_LABEL.replace_all(&text, "");
        for leg in LEG_SEPARATOR.split(text.trim()) {
            let city = leg.trim();
            if len_between(city, 2, 40) && !NOT_A_CITY.is_match(city) {
                push_unique(&mut cities, city.to_string());
            }
        }
    }
    non_empty(cities)
}

/// Extracts the ordered, deduplicated city list
///
/// Card captions, then carousel image alt text, then the part of the meta
/// title after a colon, then itinerary day headings.
pub fn cities(page: &Page<'_>) -> Vec<String> {
    first_match(
        page,
        &[card_cities, carousel_cities, title_cities, itinerary_heading_cities],
    )
    .unwrap_or_default()
}

const ORIGIN_SELECTORS: &[&str] = &[
    r#"select[name*="origin"] option"#,
    r#"select[name*="salida"] option"#,
    r#"select[name*="departure"] option"#,
    ".origin-selector option",
    ".departure-selector option",
    ".filter-origin option",
    ".airport-list li",
    ".origin-list li",
    "[data-origin]",
];

fn departure_summary_origins(page: &Page<'_>) -> Option<Vec<String>> {
    let boxes = page.select(".summary-product__box-departure-content");
    let text = element_text(*boxes.get(1)?);
    if char_len(&text) <= 3 || ORIGIN_NOISE.is_match(&text) {
        return None;
    }
    let text = text.strip_suffix("...").unwrap_or(&text);
    non_empty(
        text.split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect(),
    )
}

fn option_origins(page: &Page<'_>) -> Option<Vec<String>> {
    ORIGIN_SELECTORS.iter().find_map(|css| {
        non_empty(
            page.select(css)
                .into_iter()
                .map(element_text)
                .filter(|t| len_between(t, 2, 50) && !PLACEHOLDER_OPTION.is_match(t))
                .collect(),
        )
    })
}

/// Extracts departure origins
pub fn origins(page: &Page<'_>) -> Vec<String> {
    first_match(page, &[departure_summary_origins, option_origins]).unwrap_or_default()
}
