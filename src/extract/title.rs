//! Composite display title
//!
//! `"{trip type} {country}: {cities} | {N} días"`, kept within a
//! 100-character budget by dropping cities first, then the day count, and
//! finally truncating with an ellipsis.

use crate::extract::text::{char_len, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest display title, in characters
pub const TITLE_BUDGET: usize = 100;

const MAX_TITLE_CITIES: usize = 3;

fn pattern(re: &str) -> Regex {
    Regex::new(&format!("(?i){}", re)).expect("valid trip type pattern")
}

static CAR: Lazy<Regex> =
    Lazy::new(|| pattern(r"a tu aire.*coche|en coche|fly.*drive|drive.*fly|autocar|self[- ]?drive"));
static FLY_DRIVE: Lazy<Regex> = Lazy::new(|| pattern(r"fly.*drive|drive.*fly"));
static CRUISE: Lazy<Regex> = Lazy::new(|| pattern(r"crucero"));
static COMBO: Lazy<Regex> = Lazy::new(|| pattern(r"combinado"));
static GRAND_TOUR: Lazy<Regex> = Lazy::new(|| pattern(r"gran viaje"));
static ARCHAEOLOGICAL: Lazy<Regex> = Lazy::new(|| pattern(r"arque[oó]l"));
static CLASSIC: Lazy<Regex> = Lazy::new(|| pattern(r"cl[aá]sico"));
static EXPRESS: Lazy<Regex> = Lazy::new(|| pattern(r"express|exprés"));
static COMPLETE: Lazy<Regex> = Lazy::new(|| pattern(r"completo"));
static NATURE: Lazy<Regex> = Lazy::new(|| pattern(r"naturaleza|natural"));
static CULTURAL: Lazy<Regex> = Lazy::new(|| pattern(r"cultural"));

/// Inputs to [`build_title`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleParts<'a> {
    pub meta_title: &'a str,
    pub category: &'a str,
    pub category2: &'a str,
    pub countries: &'a [String],
    pub cities: &'a [String],
    pub days: Option<u32>,
}

/// Picks the trip-type prefix
///
/// Matched against category, second category and meta title together,
/// except the classic-tour rule which only looks at the primary category.
pub fn trip_type_label(category: &str, category2: &str, meta_title: &str) -> &'static str {
    let all = format!("{} {} {}", category, category2, meta_title).to_lowercase();
    let car = CAR.is_match(&all);
    let cruise = CRUISE.is_match(&all);
    let archaeological = ARCHAEOLOGICAL.is_match(&all);

    if car && FLY_DRIVE.is_match(&all) {
        "Fly and Drive por"
    } else if car {
        "Ruta en Coche por"
    } else if cruise && archaeological {
        "Crucero arqueológico por"
    } else if cruise {
        "Crucero por"
    } else if COMBO.is_match(&all) {
        "Viaje combinado a"
    } else if GRAND_TOUR.is_match(&all) {
        "Gran viaje a"
    } else if archaeological {
        "Ruta arqueológica por"
    } else if EXPRESS.is_match(&all) {
        "Circuito express por"
    } else if COMPLETE.is_match(&all) {
        "Circuito completo por"
    } else if NATURE.is_match(&all) {
        "Ruta natural por"
    } else if CULTURAL.is_match(&all) {
        "Ruta cultural por"
    } else if CLASSIC.is_match(category) {
        "Circuito clásico por"
    } else {
        "Viaje a"
    }
}

fn fits(text: &str) -> bool {
    char_len(text) <= TITLE_BUDGET
}

fn with_days(title: &str, days: Option<&str>) -> String {
    match days {
        Some(days) => format!("{} | {}", title, days),
        None => title.to_string(),
    }
}

/// Builds the composite display title
///
/// Empty when neither a country nor a meta title is known; the meta title
/// alone (cut to the budget) when only the country is missing.
pub fn build_title(parts: &TitleParts<'_>) -> String {
    let main_country = parts
        .countries
        .first()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty());

    let Some(country) = main_country else {
        return truncate_chars(parts.meta_title, TITLE_BUDGET);
    };

    let label = trip_type_label(parts.category, parts.category2, parts.meta_title);
    let days = parts.days.map(|d| format!("{} días", d));
    let mut title = format!("{} {}", label, country);

    let cities: Vec<&str> = parts
        .cities
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    for n in (1..=cities.len().min(MAX_TITLE_CITIES)).rev() {
        let candidate = format!("{}: {}", title, cities[..n].join(", "));
        if fits(&with_days(&candidate, days.as_deref())) {
            title = candidate;
            break;
        }
    }

    let full = with_days(&title, days.as_deref());
    if fits(&full) {
        title = full;
    }

    if char_len(&title) > TITLE_BUDGET {
        title = format!("{}...", truncate_chars(&title, TITLE_BUDGET - 3));
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trip_type_order() {
        assert_eq!(trip_type_label("Ruta en coche", "Fly & Drive", ""), "Fly and Drive por");
        assert_eq!(trip_type_label("", "", "Islandia en coche"), "Ruta en Coche por");
        assert_eq!(
            trip_type_label("Viajes con crucero", "", "Egipto arqueológico"),
            "Crucero arqueológico por"
        );
        assert_eq!(trip_type_label("Viajes con crucero", "", ""), "Crucero por");
        assert_eq!(trip_type_label("Combinados", "", ""), "Viaje combinado a");
        assert_eq!(trip_type_label("Grandes Viajes", "", "Gran viaje a China"), "Gran viaje a");
        assert_eq!(trip_type_label("", "", "México arqueológico"), "Ruta arqueológica por");
        assert_eq!(trip_type_label("", "", "Japón express"), "Circuito express por");
        assert_eq!(trip_type_label("", "", "Perú completo"), "Circuito completo por");
        assert_eq!(trip_type_label("", "", "Costa Rica natural"), "Ruta natural por");
        assert_eq!(trip_type_label("Viajes Culturales", "", ""), "Ruta cultural por");
        assert_eq!(trip_type_label("Circuito clásico", "", ""), "Circuito clásico por");
        assert_eq!(trip_type_label("", "", "Tailandia clásica"), "Viaje a");
    }

    #[test]
    fn test_full_title() {
        let countries = strings(&["Japón", "Corea del Sur"]);
        let cities = strings(&["Tokio", "Kioto", "Osaka", "Hiroshima"]);
        let parts = TitleParts {
            meta_title: "Japón clásico",
            category: "Circuito clásico",
            countries: &countries,
            cities: &cities,
            days: Some(10),
            ..Default::default()
        };
        assert_eq!(
            build_title(&parts),
            "Circuito clásico por Japón: Tokio, Kioto, Osaka | 10 días"
        );
    }

    #[test]
    fn test_cities_dropped_to_fit_budget() {
        let countries = strings(&["Japón"]);
        let long = "X".repeat(40);
        let cities = vec![long.clone(), long.clone(), "Kioto".to_string()];
        let parts = TitleParts {
            countries: &countries,
            cities: &cities,
            days: Some(9),
            ..Default::default()
        };
        let title = build_title(&parts);
        assert_eq!(title, format!("Viaje a Japón: {} | 9 días", long));
        assert!(title.chars().count() <= TITLE_BUDGET);
    }

    #[test]
    fn test_overlong_title_is_truncated() {
        let countries = vec!["Y".repeat(120)];
        let parts = TitleParts {
            countries: &countries,
            ..Default::default()
        };
        let title = build_title(&parts);
        assert_eq!(title.chars().count(), TITLE_BUDGET);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_without_country() {
        let parts = TitleParts {
            meta_title: "Circuito por los fiordos",
            ..Default::default()
        };
        assert_eq!(build_title(&parts), "Circuito por los fiordos");
        assert_eq!(build_title(&TitleParts::default()), "");
    }
}
