//! Result cache module
//!
//! A process-wide TTL store that lets repeat submissions of the same page skip
//! the fetcher and the extractor.

mod entry;
mod result_cache;

pub use entry::CacheEntry;
pub use result_cache::{CacheStats, ResultCache, DEFAULT_CACHE_TTL};
