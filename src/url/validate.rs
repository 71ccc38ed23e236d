use crate::url::matcher::matches_allowed_host;
use crate::UrlError;
use std::net::Ipv4Addr;
use url::{Host, Url};

/// Hostnames that always resolve to the local machine
const LOCAL_HOSTNAMES: &[&str] = &["localhost", "localhost."];

/// Target policy applied to every URL before it reaches the fetcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Hosts (and their subdomains) that may be scraped; empty allows any public host
    allowed_hosts: Vec<String>,

    /// Skip the private-network check
    ///
    /// Only meant for local development against mock servers bound to
    /// loopback; never set from configuration.
    allow_private_networks: bool,
}

impl UrlPolicy {
    /// Creates a policy with the given host allow-list
    pub fn new(allowed_hosts: Vec<String>) -> Self {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Self {
            allowed_hosts,
            allow_private_networks: false,
        }
    }

    /// Returns a copy of this policy that accepts loopback and private targets
    pub fn allowing_private_networks(mut self) -> Self {
        self.allow_private_networks = true;
        self
    }

    /// Returns the configured allow-list
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }
}

/// Validates a candidate target URL
///
/// # Rules, in order
///
/// 1. Must parse as an absolute URL
/// 2. Scheme must be `http` or `https`
/// 3. Host must not be `localhost`, a private or loopback IPv4 literal
///    (`10/8`, `127/8`, `169.254/16`, `172.16/12`, `192.168/16`, `0/8`), or any
///    IPv6 literal
/// 4. If an allow-list is configured, host must equal or be a subdomain of an entry
///
/// # Returns
///
/// * `Ok(Url)` - The parsed, normalized absolute URL
/// * `Err(UrlError)` - The reason the URL was rejected
///
/// # Examples
///
/// ```
/// use circuit_scraper::url::{validate_target_url, UrlPolicy};
///
/// let policy = UrlPolicy::default();
/// assert!(validate_target_url("https://example.com/path", &policy).is_ok());
/// assert!(validate_target_url("http://127.0.0.1/x", &policy).is_err());
/// assert!(validate_target_url("ftp://host/x", &policy).is_err());
/// assert!(validate_target_url("not a url", &policy).is_err());
/// ```
pub fn validate_target_url(raw: &str, policy: &UrlPolicy) -> Result<Url, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host().ok_or(UrlError::MissingDomain)?;
    let hostname = match &host {
        Host::Domain(domain) => domain.to_lowercase(),
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => addr.to_string(),
    };

    if !policy.allow_private_networks && is_private_host(&host) {
        return Err(UrlError::PrivateHost(hostname));
    }

    if !policy.allowed_hosts.is_empty()
        && !policy
            .allowed_hosts
            .iter()
            .any(|entry| matches_allowed_host(entry, &hostname))
    {
        return Err(UrlError::HostNotAllowed(hostname));
    }

    Ok(url)
}

/// Returns true if the host points at the local machine or a private network
fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            LOCAL_HOSTNAMES.contains(&domain.as_str())
        }
        Host::Ipv4(addr) => is_private_ipv4(addr),
        // IPv6 literals are rejected wholesale rather than range-checked
        Host::Ipv6(_) => true,
    }
}

fn is_private_ipv4(addr: &Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local() || addr.octets()[0] == 0
}
