//! Trip length and travel-date range

use crate::extract::dom::{element_text, first_match, Page};
use once_cell::sync::Lazy;
use regex::Regex;

const MONTHS: &str =
    "Enero|Febrero|Marzo|Abril|Mayo|Junio|Julio|Agosto|Septiembre|Octubre|Noviembre|Diciembre";

/// Longest trip length accepted as a day count
const MAX_DAYS: u32 = 365;

static DAYS_AND_NIGHTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*d[ií]as?\s*[/·,\-]\s*(\d+)\s*noches").expect("valid regex")
});
static DAYS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*d[ií]as").expect("valid regex"));
static URL_DAYS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)[_-]?dias").expect("valid regex"));

static FROM_UNTIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)({m})\s+(\d{{4}})\s+hasta\s+({m})\s+(\d{{4}})", m = MONTHS))
        .expect("valid regex")
});
static MONTH_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)({m})\s+(\d{{4}})\s*[-–a]\s*({m})\s+(\d{{4}})", m = MONTHS))
        .expect("valid regex")
});
static MONTH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^(?:{})", MONTHS)).expect("valid regex"));
static DEPARTURES_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)salidas?\s+desde\s*").expect("valid regex"));
static RANGE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").expect("valid regex"));

/// Day and night counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TripLength {
    pub days: Option<u32>,
    pub nights: Option<u32>,
}

impl TripLength {
    fn from_days(days: u32) -> Self {
        Self {
            days: Some(days),
            nights: Some(days.saturating_sub(1)),
        }
    }
}

fn parse_days(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|d| (1..=MAX_DAYS).contains(d))
}

fn days_and_nights(page: &Page<'_>) -> Option<TripLength> {
    let caps = DAYS_AND_NIGHTS.captures(&page.body_text)?;
    let days = parse_days(&caps[1])?;
    let nights = caps[2].parse::<u32>().ok()?;
    Some(TripLength {
        days: Some(days),
        nights: Some(nights),
    })
}

fn body_days(page: &Page<'_>) -> Option<TripLength> {
    let caps = DAYS_ONLY.captures(&page.body_text)?;
    parse_days(&caps[1]).map(TripLength::from_days)
}

fn url_days(page: &Page<'_>) -> Option<TripLength> {
    let caps = URL_DAYS.captures(page.url)?;
    parse_days(&caps[1]).map(TripLength::from_days)
}

fn title_days(page: &Page<'_>) -> Option<TripLength> {
    let caps = DAYS_ONLY.captures(&page.meta_title)?;
    parse_days(&caps[1]).map(TripLength::from_days)
}

/// Extracts day and night counts
///
/// Tries "N días / M noches" in the page text, then "N días" alone (nights
/// being one less), then a days count in the URL, then in the title. A
/// count outside 1..=365 is ignored and the next rule is tried.
pub fn trip_length(page: &Page<'_>) -> TripLength {
    first_match(page, &[days_and_nights, body_days, url_days, title_days]).unwrap_or_default()
}

fn format_range(caps: &regex::Captures<'_>) -> String {
    format!("{} {} - {} {}", &caps[1], &caps[2], &caps[3], &caps[4])
}

fn departure_box_dates(page: &Page<'_>) -> Option<String> {
    let text = element_text(page.first(".summary-product__box-departure-content")?);

    if let Some(caps) = FROM_UNTIL.captures(&text) {
        return Some(format_range(&caps));
    }
    if let Some(caps) = MONTH_RANGE.captures(&text) {
        return Some(format_range(&caps));
    }
    if let Some(found) = DEPARTURES_FROM.find(&text) {
        if text.chars().count() < 100 {
            // Only a leading phrase is stripped; a mid-sentence one keeps its context.
            let rest = if found.start() == 0 {
                text[found.end()..].trim()
            } else {
                text.trim()
            };
            return (!rest.is_empty()).then(|| rest.to_string());
        }
    }
    None
}

fn body_dates(page: &Page<'_>) -> Option<String> {
    MONTH_RANGE
        .captures(&page.body_text)
        .map(|caps| format_range(&caps))
}

fn option_dates(page: &Page<'_>) -> Option<String> {
    let months: Vec<String> = page
        .select("select option, .month-list li, .dates-selector span, [data-month]")
        .into_iter()
        .map(element_text)
        .filter(|t| MONTH_PREFIX.is_match(t))
        .collect();

    match (months.first(), months.last()) {
        (Some(first), Some(last)) if months.len() >= 2 => Some(format!("{} - {}", first, last)),
        _ => None,
    }
}

/// Extracts the travel-date range as free text
///
/// The departure summary box, then a month-year range anywhere on the page,
/// then the first and last month-prefixed option labels.
pub fn travel_dates(page: &Page<'_>) -> Option<String> {
    first_match(page, &[departure_box_dates, body_dates, option_dates])
}

/// Renders a date range as a departures sentence
///
/// `"Enero 2025 - Junio 2025"` becomes `"Salidas desde Enero 2025 hasta Junio 2025"`.
pub fn date_text(travel_dates: Option<&str>) -> String {
    match travel_dates {
        Some(dates) if !dates.is_empty() => {
            format!("Salidas desde {}", RANGE_DASH.replace(dates, " hasta "))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn with_page<T>(html: &str, url: &str, title: &str, f: impl FnOnce(&Page<'_>) -> T) -> T {
        let doc = Html::parse_document(html);
        let mut page = Page::new(&doc, url);
        page.meta_title = title.to_string();
        f(&page)
    }

    const URL: &str = "https://example.com/circuito";

    #[test]
    fn test_days_and_nights_pattern() {
        let length = with_page("<p>Duración: 9 días / 7 noches</p>", URL, "", trip_length);
        assert_eq!(length, TripLength { days: Some(9), nights: Some(7) });
    }

    #[test]
    fn test_days_only_pattern() {
        let length = with_page("<p>Un viaje de 12 dias por Perú</p>", URL, "", trip_length);
        assert_eq!(length, TripLength { days: Some(12), nights: Some(11) });
    }

    #[test]
    fn test_days_from_url_then_title() {
        let length = with_page("<p>sin datos</p>", "https://example.com/japon-10-dias", "", trip_length);
        assert_eq!(length.days, Some(10));

        let length = with_page("<p>sin datos</p>", URL, "Egipto 8 días", trip_length);
        assert_eq!(length, TripLength { days: Some(8), nights: Some(7) });
    }

    #[test]
    fn test_implausible_days_are_skipped() {
        let length = with_page("<p>0 días de espera</p>", "https://example.com/x-6-dias", "", trip_length);
        assert_eq!(length.days, Some(6));
    }

    #[test]
    fn test_no_days() {
        assert_eq!(with_page("<p>nada</p>", URL, "", trip_length), TripLength::default());
    }

    #[test]
    fn test_dates_from_departure_box() {
        let html = r#"<div class="summary-product__box-departure-content">
            Enero 2025 hasta Diciembre 2025</div>"#;
        assert_eq!(
            with_page(html, URL, "", travel_dates),
            Some("Enero 2025 - Diciembre 2025".to_string())
        );
    }

    #[test]
    fn test_dates_departures_from_phrase() {
        let html = r#"<div class="summary-product__box-departure-content">Salidas desde Marzo</div>"#;
        assert_eq!(with_page(html, URL, "", travel_dates), Some("Marzo".to_string()));
    }

    #[test]
    fn test_dates_departures_phrase_mid_sentence() {
        let html = r#"<div class="summary-product__box-departure-content">Fechas: salidas desde Marzo todos los lunes</div>"#;
        assert_eq!(
            with_page(html, URL, "", travel_dates),
            Some("Fechas: salidas desde Marzo todos los lunes".to_string())
        );
    }

    #[test]
    fn test_dates_from_body_range() {
        let html = "<p>Fechas: Abril 2025 – Octubre 2025</p>";
        assert_eq!(
            with_page(html, URL, "", travel_dates),
            Some("Abril 2025 - Octubre 2025".to_string())
        );
    }

    #[test]
    fn test_dates_from_options() {
        let html = r#"<select><option>Elige mes</option><option>Mayo 2025</option>
            <option>Junio 2025</option><option>Julio 2025</option></select>"#;
        assert_eq!(
            with_page(html, URL, "", travel_dates),
            Some("Mayo 2025 - Julio 2025".to_string())
        );
    }

    #[test]
    fn test_single_option_is_not_a_range() {
        let html = "<select><option>Mayo 2025</option></select>";
        assert_eq!(with_page(html, URL, "", travel_dates), None);
    }

    #[test]
    fn test_date_text() {
        assert_eq!(
            date_text(Some("Enero 2025 - Junio 2025")),
            "Salidas desde Enero 2025 hasta Junio 2025"
        );
        assert_eq!(date_text(None), "");
    }
}
