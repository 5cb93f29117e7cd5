//! Edge Cache - a multi-region in-memory cache engine
//!
//! TTL entries with tag and pattern invalidation, pluggable eviction
//! (LRU, LFU, TTL, adaptive, geographic), per-region isolation, versioned
//! keys and stale-while-revalidate reads, plus an HTTP admin surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
