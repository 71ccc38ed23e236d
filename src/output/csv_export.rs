//! Spreadsheet CSV export
//!
//! The column layout matches the import template used downstream: 29 fixed
//! columns followed by one `día N` column and one `itinerarioN` column per
//! itinerary day. Cells are clamped to a per-column length and neutralised
//! so a spreadsheet never evaluates them as formulas.

use crate::output::traits::{ExportError, ExportResult};
use crate::record::{CircuitRecord, MAX_ITINERARY_DAYS};
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Largest number of records accepted by one export
pub const MAX_EXPORT_ITEMS: usize = 300;

const BOM: &str = "\u{FEFF}";

const BASE_HEADERS: [&str; 29] = [
    "url",
    "titulo",
    "meta description",
    "países visitados",
    "número de días",
    "Fecha 1",
    "visitando",
    "imagen principal",
    "imagen lateral pequeña",
    "origen",
    "categoría 1",
    "categoría 2",
    "precio",
    "categoría 3",
    "titulo",
    "descripción larga",
    "Fecha 1",
    "tipo de circuito",
    "el viaje incluye",
    "excursiones incluidas",
    "excursiones opcionales",
    "hoteles previstos",
    "pie de tabla de precios",
    "descripción corta",
    "configuración regional",
    "promociones",
    "proveedor",
    "catalogo origenes",
    "origen inicial",
];

const DAY_LABEL_MAX: usize = 500;
const DAY_TEXT_MAX: usize = 12_000;

/// Truncates `value` to at most `max_chars` characters
pub fn clamp_text(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Prefixes values a spreadsheet would read as a formula
pub fn sanitize_cell(value: &str) -> String {
    match value.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{}", value),
        _ => value.to_string(),
    }
}

fn safe_cell(value: &str, max_chars: usize) -> String {
    sanitize_cell(clamp_text(value, max_chars))
}

fn optional_cell(value: Option<&str>, max_chars: usize) -> String {
    value.map(|v| safe_cell(v, max_chars)).unwrap_or_default()
}

fn number_cell(value: Option<u32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Number of itinerary column pairs needed for `records`, capped at 60
pub fn itinerary_columns(records: &[&CircuitRecord]) -> usize {
    records
        .iter()
        .map(|record| record.itinerary_width())
        .max()
        .unwrap_or(0)
        .min(MAX_ITINERARY_DAYS)
}

/// Header row for an export `width` itinerary days wide
pub fn headers(width: usize) -> Vec<String> {
    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    headers.extend((1..=width).map(|i| format!("día {}", i)));
    headers.extend((1..=width).map(|i| format!("itinerario{}", i)));
    headers
}

/// One data row, aligned with [`headers`]
pub fn record_row(record: &CircuitRecord, width: usize) -> Vec<String> {
    let catalog = &record.catalog;
    let mut row = vec![
        safe_cell(&record.url, 2000),
        safe_cell(&record.meta_title, 500),
        safe_cell(&record.meta_description, 5000),
        safe_cell(&record.countries.join(", "), 500),
        number_cell(record.days),
        optional_cell(record.travel_dates.as_deref(), 200),
        safe_cell(&record.cities.join(", "), 2000),
        optional_cell(record.image_banner.as_deref(), 2000),
        optional_cell(record.image_thumbnail.as_deref(), 2000),
        safe_cell(&record.origins.join(", "), 2000),
        safe_cell(&record.category_primary, 200),
        optional_cell(record.category_secondary.as_deref(), 200),
        number_cell(record.price),
        optional_cell(record.category_tertiary.as_deref(), 200),
        safe_cell(&record.title, 500),
        safe_cell(&record.meta_description, 5000),
        safe_cell(&record.date_text, 500),
        catalog.circuit_type.to_string(),
        safe_cell(&record.trip_includes, 15_000),
        safe_cell(&record.excursions_included, 10_000),
        safe_cell(&record.excursions_optional, 10_000),
        safe_cell(&record.hotels, 10_000),
        safe_cell(&record.price_footer, 8000),
        safe_cell(&record.short_description, 3000),
        catalog.regional_config.to_string(),
        catalog.promotions.to_string(),
        catalog.provider.to_string(),
        catalog.catalog_origins.to_string(),
        String::new(),
    ];

    row.extend((0..width).map(|i| {
        optional_cell(record.itinerary_days.get(i).map(String::as_str), DAY_LABEL_MAX)
    }));
    row.extend((0..width).map(|i| {
        optional_cell(record.itinerary_texts.get(i).map(String::as_str), DAY_TEXT_MAX)
    }));
    row
}

/// Writes `records` as a BOM-prefixed CSV
///
/// Every cell is quoted and rows end in CRLF.
///
/// # Returns
///
/// * `Ok(usize)` - Number of data rows written
/// * `Err(ExportError::Empty)` - No records were given
/// * `Err(ExportError::TooMany)` - More than 300 records were given
pub fn write_csv<W: Write>(mut out: W, records: &[&CircuitRecord]) -> ExportResult<usize> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }
    if records.len() > MAX_EXPORT_ITEMS {
        return Err(ExportError::TooMany {
            size: records.len(),
            max: MAX_EXPORT_ITEMS,
        });
    }

    let width = itinerary_columns(records);
    out.write_all(BOM.as_bytes())?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::CRLF)
        .from_writer(&mut out);
    writer.write_record(headers(width))?;
    for record in records {
        writer.write_record(record_row(record, width))?;
    }
    writer.flush()?;
    drop(writer);
    out.flush()?;

    tracing::debug!(
        "Exported {} records with {} itinerary columns",
        records.len(),
        width
    );
    Ok(records.len())
}

/// Writes the CSV export to `path`, creating parent directories
pub fn export_csv(path: &Path, records: &[&CircuitRecord]) -> ExportResult<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), records)
}

/// Default export file name for the given date
pub fn default_filename(date: NaiveDate) -> String {
    format!("scraping_traveltool_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> CircuitRecord {
        let mut record = CircuitRecord::empty("https://www.example.com/circuito/japon");
        record.title = "Circuito por Japón: Tokio, Kioto | 10 días".to_string();
        record.meta_title = "Japón Esencial".to_string();
        record.countries = vec!["Japón".to_string()];
        record.cities = vec!["Tokio".to_string(), "Kioto".to_string()];
        record.days = Some(3);
        record.price = Some(2450);
        record.itinerary_days = vec!["@Tokio".to_string(), "@Kioto".to_string()];
        record.itinerary_texts = vec!["{Día 1: Llegada".to_string()];
        record
    }

    fn parse(bytes: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(bytes).unwrap();
        let text = text.strip_prefix(BOM).unwrap();
        text.split("\r\n").filter(|l| !l.is_empty()).map(String::from).collect()
    }

    #[test]
    fn test_sanitize_cell() {
        assert_eq!(sanitize_cell("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_cell("+34 600"), "'+34 600");
        assert_eq!(sanitize_cell("-10%"), "'-10%");
        assert_eq!(sanitize_cell("@Tokio"), "'@Tokio");
        assert_eq!(sanitize_cell("Tokio"), "Tokio");
        assert_eq!(sanitize_cell(""), "");
    }

    #[test]
    fn test_clamp_text_counts_chars() {
        assert_eq!(clamp_text("Japón", 4), "Japó");
        assert_eq!(clamp_text("abc", 10), "abc");
    }

    #[test]
    fn test_headers_layout() {
        let headers = headers(2);
        assert_eq!(headers.len(), 33);
        assert_eq!(headers[0], "url");
        assert_eq!(headers[28], "origen inicial");
        assert_eq!(headers[29], "día 1");
        assert_eq!(headers[31], "itinerario1");
    }

    #[test]
    fn test_width_uses_longest_record_and_caps() {
        let short = sample();
        let mut long = sample();
        long.days = Some(90);

        assert_eq!(itinerary_columns(&[&short]), 3);
        assert_eq!(itinerary_columns(&[&short, &long]), 60);
    }

    #[test]
    fn test_write_csv() {
        let record = sample();
        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[&record]).unwrap(), 1);

        let lines = parse(&out);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\"url\",\"titulo\""));
        assert!(lines[1].contains("\"Japón\""));
        assert!(lines[1].contains("\"Tokio, Kioto\""));
        assert!(lines[1].contains("\"'@Tokio\""));
        assert!(lines[1].contains("\"2450\""));
    }

    #[test]
    fn test_quotes_are_doubled() {
        let mut record = sample();
        record.hotels = "Hotel \"Sakura\" 4*".to_string();

        let mut out = Vec::new();
        write_csv(&mut out, &[&record]).unwrap();
        assert!(parse(&out)[1].contains("\"Hotel \"\"Sakura\"\" 4*\""));
    }

    #[test]
    fn test_multiline_cells_read_back() {
        let mut record = sample();
        record.hotels = "Hotel Sakura, 4*\nRyokan \"Kioto\"".to_string();

        let mut out = Vec::new();
        write_csv(&mut out, &[&record]).unwrap();

        let body = out.strip_prefix(BOM.as_bytes()).unwrap();
        let mut reader = csv::ReaderBuilder::new().from_reader(body);
        let header = reader.headers().unwrap().clone();
        let column = header.iter().position(|h| h == "hoteles previstos").unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), header.len());
        assert_eq!(&rows[0][column], "Hotel Sakura, 4*\nRyokan \"Kioto\"");
    }

    #[test]
    fn test_batch_bounds() {
        let mut out = Vec::new();
        assert!(matches!(write_csv(&mut out, &[]), Err(ExportError::Empty)));

        let record = sample();
        let many: Vec<&CircuitRecord> = std::iter::repeat(&record).take(301).collect();
        assert!(matches!(
            write_csv(&mut out, &many),
            Err(ExportError::TooMany { size: 301, max: 300 })
        ));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join(default_filename(
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        ));

        let record = sample();
        export_csv(&path, &[&record]).unwrap();

        assert!(path.ends_with("scraping_traveltool_2025-03-14.csv"));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(BOM.as_bytes()));
    }
}
