use url::Url;

/// Normalizes a URL into the key used by the result cache
///
/// # Normalization Steps
///
/// 1. Parse the URL; if it does not parse, the trimmed input is the key
/// 2. Lowercase the host (the parser already lowercases the scheme)
/// 3. Strip every trailing slash from the path; an empty path becomes `/`
/// 4. Keep the query string as-is, dropping an empty one (`?` alone)
/// 5. Drop the fragment
///
/// Query parameters are neither filtered nor reordered: two spellings that
/// differ only in parameter order are distinct pages as far as the cache is
/// concerned.
///
/// # Examples
///
/// ```
/// use circuit_scraper::url::normalize_cache_key;
///
/// assert_eq!(
///     normalize_cache_key("https://WWW.Example.com/viajes/japon/"),
///     "https://www.example.com/viajes/japon"
/// );
/// ```
pub fn normalize_cache_key(url_str: &str) -> String {
    let url = match Url::parse(url_str.trim()) {
        Ok(url) => url,
        Err(_) => return url_str.trim().to_string(),
    };

    let host = match url.host_str() {
        Some(host) => host.to_lowercase(),
        None => return url.to_string(),
    };

    let mut key = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        key.push_str(&format!(":{}", port));
    }

    key.push_str(&normalize_path(url.path()));

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        key.push('?');
        key.push_str(query);
    }

    key
}

/// Removes trailing slashes, keeping a bare `/` for the root
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
