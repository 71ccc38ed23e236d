//! Category normalization
//!
//! The primary category is read from the header subtitle and mapped through
//! an ordered table of keyword rules to one canonical label. Tag badges that
//! were not used as the primary input are kept verbatim.

use crate::extract::dom::{element_text, Page};
use crate::extract::text::len_between;
use once_cell::sync::Lazy;
use regex::Regex;

static AFTER_DAYS_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*[Dd][ií]as?\s*[·•]\s*(.+)").expect("valid regex"));
static BEFORE_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?),?\s*\d+\s*[Dd][ií]as").expect("valid regex"));
static BODY_AFTER_DAYS_DOT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*[Dd][ií]as?\s*[·•]\s*([^\n\r<]{3,40})").expect("valid regex"));

/// Which text a category rule is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The raw category text
    Raw,
    /// The header subtitle before the day count
    Prefix,
    /// The meta title
    Title,
    /// Raw text, prefix and title together
    All,
}

/// One keyword-to-label mapping
#[derive(Debug)]
pub struct CategoryRule {
    pub scope: Scope,
    pub pattern: Regex,
    pub label: &'static str,
}

/// Ordered keyword rules; the first match wins
pub static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    use Scope::*;

    let rules: &[(Scope, &'static str, &'static str)] = &[
        (Raw, r"coche|fly.*drive|drive.*fly|self[- ]?drive", "Ruta en coche"),
        (Raw, r"a tu aire.*flexible|flexible.*a tu aire", "Viajes Flexibles"),
        (Raw, r"a tu aire", "A tu aire"),
        (Raw, r"terrestre|s[oó]lo circuito", "Sólo Circuito"),
        (Raw, r"cl[aá]sico", "Circuito clásico"),
        (Raw, r"privado", "Circuito privado"),
        (Raw, r"combinado", "Combinados"),
        (Raw, r"crucero", "Viajes con crucero"),
        (Raw, r"safari", "Safaris"),
        (Raw, r"gran viaje", "Grandes Viajes"),
        (Raw, r"cultural", "Viajes Culturales"),
        (Raw, r"tren", "Viajes en Tren"),
        (Raw, r"todo incluido", "Todo incluido"),
        (All, r"isla.*(paradis|ex[oó]tic)|ex[oó]tic.*isla|paradis.*isla", "Islas Exóticas y Playas"),
        (Raw, r"playa", "Viajes de playa"),
        (Raw, r"novios", "Viaje de Novios"),
        (Raw, r"singles", "Viajes Singles"),
        (Raw, r"\bbus\b|autob[uú]s", "Circuitos en bus"),
        (Raw, r"escapada", "Escapadas"),
        (Raw, r"gu[ií]as?|con gu[ií]a", "Con guías"),
        (Raw, r"familiar", "Viajes con Niños"),
        (Raw, r"^exploratravel$", "ExploraTravel"),
        (Raw, r"mayores?\s+de\s+55", "Viajes para Mayores de 55 años"),
        (Raw, r"mayores|seniors?", "Viajes para Mayores"),
        (Raw, r"j[oó]venes", "Viajes para Jóvenes"),
        (Prefix, r"vuelta al mundo", "Vuelta al mundo"),
        (Title, r"disney|legoland|port\s*aventura", "Parques Temáticos"),
        (All, r"semana santa", "Viajes Semana Santa"),
        (All, r"puente de mayo", "Viajes Puente de Mayo"),
        (All, r"puente.*andaluc", "Viajes Puente de Andalucía"),
        (All, r"nochevieja", "Nochevieja"),
        (All, r"fin de a[ñn]o", "Viajes Fin de Año"),
        (All, r"navidad", "Viajes Navidad"),
        (All, r"corpus", "Viajes Día de Corpus"),
        (All, r"puente", "Puentes"),
    ];

    rules
        .iter()
        .map(|(scope, pattern, label)| CategoryRule {
            scope: *scope,
            pattern: Regex::new(&format!("(?i){}", pattern)).expect("valid category pattern"),
            label: *label,
        })
        .collect()
});

/// Maps raw category text to its canonical label
///
/// Falls back to the raw text when no rule matches.
pub fn normalize_category(raw: &str, subtitle_prefix: &str, meta_title: &str) -> String {
    let raw_lower = raw.trim().to_lowercase();
    let prefix = subtitle_prefix.to_lowercase();
    let title = meta_title.to_lowercase();
    let all = format!("{} {} {}", raw_lower, prefix, title);

    CATEGORY_RULES
        .iter()
        .find(|rule| {
            let haystack = match rule.scope {
                Scope::Raw => &raw_lower,
                Scope::Prefix => &prefix,
                Scope::Title => &title,
                Scope::All => &all,
            };
            rule.pattern.is_match(haystack)
        })
        .map(|rule| rule.label.to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

/// Category inputs read from the header subtitle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SubtitleCategory {
    raw: Option<String>,
    prefix: String,
}

fn subtitle_category(page: &Page<'_>) -> SubtitleCategory {
    let mut found = SubtitleCategory::default();
    let Some(subtitle) = page.first(".header-summary__info-subtitle") else {
        return found;
    };

    let text = element_text(subtitle);
    if let Some(caps) = AFTER_DAYS_DOT.captures(&text) {
        found.raw = Some(caps[1].trim().to_string()).filter(|r| !r.is_empty());
    }
    if let Some(caps) = BEFORE_DAYS.captures(&text) {
        found.prefix = caps[1].trim().to_string();
    }
    found
}

fn body_category(page: &Page<'_>) -> Option<String> {
    BODY_AFTER_DAYS_DOT
        .captures(&page.body_text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|r| !r.is_empty())
}

/// Tag badge texts of 3 to 59 characters
pub fn tag_badges(page: &Page<'_>) -> Vec<String> {
    page.select(".summary-product__box-tag")
        .into_iter()
        .map(element_text)
        .filter(|t| len_between(t, 2, 60))
        .collect()
}

/// Primary, secondary, tertiary and overflow categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categories {
    pub primary: String,
    pub secondary: Option<String>,
    pub tertiary: Option<String>,
    pub extra: Vec<String>,
}

/// Extracts the categories of a page
///
/// The primary input is the subtitle text after "N días ·", else the same
/// pattern in the page text, else the first tag badge. Remaining badges
/// become secondary, tertiary and overflow categories.
pub fn categories(page: &Page<'_>) -> Categories {
    let subtitle = subtitle_category(page);
    let mut badges = tag_badges(page);

    let raw = match subtitle.raw.or_else(|| body_category(page)) {
        Some(raw) => raw,
        None if !badges.is_empty() => badges.remove(0),
        None => String::new(),
    };

    let primary = normalize_category(&raw, &subtitle.prefix, &page.meta_title);

    let mut rest = badges.into_iter();
    Categories {
        primary,
        secondary: rest.next(),
        tertiary: rest.next(),
        extra: rest.collect(),
    }
}
