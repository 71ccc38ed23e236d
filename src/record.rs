//! Record types produced by the scraping pipeline
//!
//! Every submitted URL resolves to one [`ScrapeOutcome`]: either a full
//! [`CircuitRecord`] or a [`ScrapeFailure`], never both.

use crate::state::ErrorKind;
use crate::{FetchError, UrlError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of itinerary entries kept per sequence
pub const MAX_ITINERARY_DAYS: usize = 60;

/// Fixed catalog values the downstream importer expects on every row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConstants {
    pub circuit_type: u32,
    pub regional_config: u32,
    pub promotions: u32,
    pub provider: u32,
    pub catalog_origins: u32,
}

impl Default for CatalogConstants {
    fn default() -> Self {
        Self {
            circuit_type: 8,
            regional_config: 1,
            promotions: 1,
            provider: 14,
            catalog_origins: 593,
        }
    }
}

/// Structured data extracted from one travel-package page
///
/// Absent data is represented by empty strings, empty lists or `None`; the
/// extractor never invents values to fill a field.
///
/// `itinerary_days` and `itinerary_texts` describe the same conceptual day
/// index but are extracted independently, so their lengths may differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitRecord {
    /// Source page URL
    pub url: String,

    /// Composite display title (trip type, country, cities, days)
    pub title: String,

    pub meta_title: String,
    pub meta_description: String,

    /// Countries visited, ordered and deduplicated
    pub countries: Vec<String>,

    /// Cities visited, ordered and deduplicated
    pub cities: Vec<String>,

    pub days: Option<u32>,
    pub nights: Option<u32>,

    /// Travel-date range as shown on the page, e.g. "Enero 2025 - Diciembre 2025"
    pub travel_dates: Option<String>,

    /// Travel-date range rendered as a departures sentence
    pub date_text: String,

    /// Absolute banner image URL
    pub image_banner: Option<String>,

    /// Absolute thumbnail image URL derived from the banner
    pub image_thumbnail: Option<String>,

    /// Departure cities or airports
    pub origins: Vec<String>,

    /// Canonical primary category
    pub category_primary: String,
    pub category_secondary: Option<String>,
    pub category_tertiary: Option<String>,
    pub extra_categories: Vec<String>,

    pub trip_includes: String,
    pub excursions_included: String,
    pub excursions_optional: String,
    pub hotels: String,
    pub price_footer: String,
    pub short_description: String,

    /// Starting price in whole currency units
    pub price: Option<u32>,

    pub catalog: CatalogConstants,

    /// Per-day destination labels, each prefixed with `@`
    pub itinerary_days: Vec<String>,

    /// Per-day narratives, each prefixed with `{`
    pub itinerary_texts: Vec<String>,

    pub scraped_at: DateTime<Utc>,

    /// Whether this record was served from the result cache
    pub from_cache: bool,
}

impl CircuitRecord {
    /// Creates an empty record for `url`
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            meta_title: String::new(),
            meta_description: String::new(),
            countries: Vec::new(),
            cities: Vec::new(),
            days: None,
            nights: None,
            travel_dates: None,
            date_text: String::new(),
            image_banner: None,
            image_thumbnail: None,
            origins: Vec::new(),
            category_primary: String::new(),
            category_secondary: None,
            category_tertiary: None,
            extra_categories: Vec::new(),
            trip_includes: String::new(),
            excursions_included: String::new(),
            excursions_optional: String::new(),
            hotels: String::new(),
            price_footer: String::new(),
            short_description: String::new(),
            price: None,
            catalog: CatalogConstants::default(),
            itinerary_days: Vec::new(),
            itinerary_texts: Vec::new(),
            scraped_at: Utc::now(),
            from_cache: false,
        }
    }

    /// Number of itinerary columns this record needs in a tabular export
    pub fn itinerary_width(&self) -> usize {
        self.itinerary_days
            .len()
            .max(self.itinerary_texts.len())
            .max(self.days.unwrap_or(0) as usize)
    }
}

/// Error payload for one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeFailure {
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ScrapeFailure {
    pub fn new(url: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    /// Builds the failure for a URL rejected by the validator
    pub fn rejected(url: impl Into<String>, error: &UrlError) -> Self {
        Self::new(url, ErrorKind::Unknown, error.to_string())
    }

    /// Builds the failure for a URL whose fetch failed
    pub fn fetch(url: impl Into<String>, error: &FetchError) -> Self {
        Self::new(url, error.kind, error.message.clone())
    }
}

/// Outcome of scraping one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScrapeOutcome {
    Success(Box<CircuitRecord>),
    Error(ScrapeFailure),
}

impl ScrapeOutcome {
    pub fn url(&self) -> &str {
        match self {
            Self::Success(record) => &record.url,
            Self::Error(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn record(&self) -> Option<&CircuitRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Error(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ScrapeFailure> {
        match self {
            Self::Success(_) => None,
            Self::Error(failure) => Some(failure),
        }
    }

    /// Returns true if the record was served from the result cache
    pub fn from_cache(&self) -> bool {
        self.record().map(|r| r.from_cache).unwrap_or(false)
    }
}

impl From<CircuitRecord> for ScrapeOutcome {
    fn from(record: CircuitRecord) -> Self {
        Self::Success(Box::new(record))
    }
}

impl From<ScrapeFailure> for ScrapeOutcome {
    fn from(failure: ScrapeFailure) -> Self {
        Self::Error(failure)
    }
}
