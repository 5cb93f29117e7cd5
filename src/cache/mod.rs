//! Cache Module
//!
//! Edge cache engine: TTL entries with tag and pattern invalidation, five
//! eviction strategies, per-region isolation, and the backend-based helpers
//! for versioned keys, stale-while-revalidate and warming.

mod backend;
mod clock;
mod edge;
mod entry;
mod eviction;
mod frequency;
mod geo;
mod lru;
mod pattern;
mod stats;
mod store;
mod swr;
mod tags;
mod versioning;
mod warmer;


// Re-export public types
pub use backend::{BackendExt, CacheBackend, InMemoryBackend};
pub use clock::{current_timestamp_ms, duration_ms, Clock, ManualClock, SystemClock};
pub use edge::EdgeCache;
pub use entry::{compute_fingerprint, CacheEntry, EntryInfo};
pub use eviction::{select_victim, AdaptiveWeights, Eviction, EvictionPath, EvictionStrategy};
pub use frequency::FrequencyTracker;
pub use geo::{GeoCache, RegionSizes, Regions};
pub use lru::LruTracker;
pub use pattern::KeyPattern;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
pub use swr::StaleWhileRevalidate;
pub use tags::TagIndex;
pub use versioning::TagVersionRegistry;
pub use warmer::{BoxFuture, CacheWarmer, GeneratorError, WarmingStatus};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum number of tags on a single entry
pub const MAX_TAGS_PER_ENTRY: usize = 32;
