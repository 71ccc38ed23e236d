//! Page metadata: title and description

use crate::extract::dom::{element_text, first_match, Page};
use once_cell::sync::Lazy;
use regex::Regex;

static PIPE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|.*$").expect("valid regex"));
static BRAND_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*(?:Kerala|Viajes).*$").expect("valid regex"));

/// Drops `| Site` and ` - Viajes ...` style suffixes
pub fn clean_title(raw: &str) -> String {
    let without_pipe = PIPE_SUFFIX.replace(raw, "");
    BRAND_SUFFIX.replace(&without_pipe, "").trim().to_string()
}

fn og_title(page: &Page<'_>) -> Option<String> {
    page.attr_of(r#"meta[property="og:title"]"#, "content")
        .map(|t| clean_title(&t))
}

fn document_title(page: &Page<'_>) -> Option<String> {
    let title = page.text_of("title");
    (!title.is_empty()).then(|| clean_title(&title))
}

fn first_heading(page: &Page<'_>) -> Option<String> {
    page.first("h1")
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Meta title: `og:title`, then `<title>`, then the first `<h1>`
pub fn meta_title(page: &Page<'_>) -> String {
    first_match(page, &[og_title, document_title, first_heading]).unwrap_or_default()
}

/// Meta description: `description`, then `og:description`
pub fn meta_description(page: &Page<'_>) -> String {
    page.attr_of(r#"meta[name="description"]"#, "content")
        .or_else(|| page.attr_of(r#"meta[property="og:description"]"#, "content"))
        .unwrap_or_default()
}

/// Short description, synthesized from the title when the page has none
pub fn short_description(meta_description: &str, meta_title: &str) -> String {
    if !meta_description.is_empty() {
        return meta_description.to_string();
    }
    let subject = if meta_title.is_empty() {
        "este circuito"
    } else {
        meta_title
    };
    format!("Descubre {} en un viaje organizado.", subject)
}
