/// Checks if a host is covered by an allow-list entry
///
/// An entry covers its own host and every subdomain of it. A leading `*.` is
/// accepted for readability and means the same thing:
///
/// - `"example.com"` matches `"example.com"` and `"www.example.com"`
/// - `"*.example.com"` matches the same set
///
/// Both sides are compared case-insensitively.
///
/// # Examples
///
/// ```
/// use circuit_scraper::url::matches_allowed_host;
///
/// assert!(matches_allowed_host("traveltool.es", "www.traveltool.es"));
/// assert!(matches_allowed_host("*.traveltool.es", "traveltool.es"));
/// assert!(!matches_allowed_host("traveltool.es", "eviltraveltool.es"));
/// ```
pub fn matches_allowed_host(entry: &str, host: &str) -> bool {
    let entry = entry.trim().to_lowercase();
    let base = entry.strip_prefix("*.").unwrap_or(&entry);
    if base.is_empty() {
        return false;
    }

    let host = host.to_lowercase();
    host == base || host.ends_with(&format!(".{}", base))
}
