//! URL handling module
//!
//! This module provides target validation, cache-key normalization, domain
//! extraction for politeness bookkeeping and allow-list host matching.

mod domain;
mod matcher;
mod normalize;
mod validate;

// Re-export main functions
pub use domain::{domain_of, extract_domain};
pub use matcher::matches_allowed_host;
pub use normalize::normalize_cache_key;
pub use validate::{validate_target_url, UrlPolicy};
