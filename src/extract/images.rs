//! Banner and thumbnail images

use crate::extract::dom::{first_match, select_within, Page};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(['"]?([^'")\s]+)['"]?\)"#).expect("valid regex"));
static RESIZE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"resize/crop/\d+/\d+").expect("valid regex"));
static SIZED_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+_\d+\.jpg").expect("valid regex"));
static LEGACY_CDN: Lazy<Regex> = Lazy::new(|| Regex::new(r"cdn\.traveltool\.es").expect("valid regex"));

const BANNER: &str = ".header-summary__bg";

/// Banner and thumbnail, both absolute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Images {
    pub banner: Option<String>,
    pub thumbnail: Option<String>,
}

/// Resolves an image reference against the page URL
///
/// Absolute and protocol-relative references are kept (the latter forced to
/// https); anything else is joined onto `page_url`.
pub fn to_absolute_image_url(image_url: &str, page_url: &str) -> Option<String> {
    let raw = image_url.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(raw.to_string());
    }
    if raw.starts_with("//") {
        return Some(format!("https:{}", raw));
    }

    match Url::parse(page_url).and_then(|base| base.join(raw)) {
        Ok(joined) => Some(joined.to_string()),
        Err(_) if raw.starts_with('/') => Some(format!("https://{}", raw.trim_start_matches('/'))),
        Err(_) => Some(raw.to_string()),
    }
}

/// Derives the thumbnail variant of a banner URL
///
/// Rewrites the CDN resize path to 385x280, sized file names to 900_900 and
/// the legacy CDN host to the current one.
pub fn thumbnail_for(banner: &str) -> String {
    let small = RESIZE_PATH.replace_all(banner, "resize/crop/385/280");
    let small = SIZED_FILENAME.replace_all(&small, "900_900.jpg");
    LEGACY_CDN.replace_all(&small, "cdn.smy.travel").into_owned()
}

fn banner_style(page: &Page<'_>) -> Option<String> {
    let style = page.attr_of(BANNER, "style")?;
    CSS_URL.captures(&style).map(|caps| caps[1].to_string())
}

fn banner_data_attr(page: &Page<'_>) -> Option<String> {
    page.attr_of(BANNER, "data-bg")
        .or_else(|| page.attr_of(BANNER, "data-background"))
}

fn img_source(img: scraper::ElementRef<'_>) -> Option<String> {
    let el = img.value();
    el.attr("src")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| el.attr("data-src"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn banner_nested_img(page: &Page<'_>) -> Option<String> {
    let bg = page.first(BANNER)?;
    select_within(bg, "img").into_iter().next().and_then(img_source)
}

fn header_img(page: &Page<'_>) -> Option<String> {
    page.first(r#"[class*="header-summary"] img"#).and_then(img_source)
}

fn og_image(page: &Page<'_>) -> Option<String> {
    page.attr_of(r#"meta[property="og:image"]"#, "content")
}

/// Extracts the banner and derives its thumbnail
///
/// Banner background style `url(...)`, then its `data-bg`/`data-background`
/// attribute, then an image nested in it, then any header image, then the
/// Open Graph image.
pub fn images(page: &Page<'_>) -> Images {
    let banner = first_match(
        page,
        &[banner_style, banner_data_attr, banner_nested_img, header_img, og_image],
    )
    .and_then(|raw| to_absolute_image_url(&raw, page.url));

    let thumbnail = banner
        .as_deref()
        .and_then(|b| to_absolute_image_url(&thumbnail_for(b), page.url));

    Images { banner, thumbnail }
}
