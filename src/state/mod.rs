//! State module for tracking a single check run
//!
//! # Components
//!
//! - `LinkState`: The terminal verdict recorded for each checked link
//! - `CrawlCache`: Per-run dedup set plus rate-limit and error-retry bookkeeping

mod crawl_cache;
mod link_state;

// Re-export main types
pub use crawl_cache::CrawlCache;
pub use link_state::LinkState;
