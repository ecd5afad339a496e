//! Brand-site scraping: candidate discovery, HEAD probing, browser-pool
//! page fetching, near-duplicate collapse, and the two-tier cache that
//! fronts all of it.

mod canonical;
mod dedupe;
mod discover;
mod error;
mod fast_cache;
mod fast_tier;
mod fetch;
mod probe;
mod scraper;
mod two_tier;

pub use canonical::canonicalize;
pub use error::{Result, ScrapeError};
pub use fast_tier::FastTier;
pub use scraper::Scraper;
pub use two_tier::TwoTierCache;
