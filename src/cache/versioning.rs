//! Tag Version Module
//!
//! Lazy invalidation by tag version. Bumping a tag changes every versioned
//! key derived from it; the old keys are never deleted, only orphaned until
//! the backend's own expiry reclaims them.

use std::collections::BTreeSet;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::cache::{BackendExt, CacheBackend, Clock};
use crate::error::Result;

const TAG_PREFIX: &str = "cache_tag:";
const VERSION_HASH_LEN: usize = 8;

// == Tag Version Registry ==
#[derive(Debug, Clone)]
pub struct TagVersionRegistry {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
}

impl TagVersionRegistry {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Current version of `tag`, initialized to the current time on first use.
    pub fn get_version(&self, tag: &str) -> Result<u64> {
        let key = tag_key(tag);
        if let Some(version) = self.backend.get_value::<u64>(&key)? {
            return Ok(version);
        }
        let version = self.clock.now_ms();
        self.backend.set_value(&key, &version, None)?;
        Ok(version)
    }

    /// Moves `tag` to a new version and returns it.
    ///
    /// The new version is the current time, or one past the previous version
    /// if the clock has not advanced beyond it.
    pub fn bump(&self, tag: &str) -> Result<u64> {
        let key = tag_key(tag);
        let now = self.clock.now_ms();
        let version = match self.backend.get_value::<u64>(&key)? {
            Some(previous) => now.max(previous + 1),
            None => now,
        };
        self.backend.set_value(&key, &version, None)?;
        info!(tag, version, "Bumped tag version");
        Ok(version)
    }

    /// Folds the sorted current versions of `tags` into `base_key`.
    ///
    /// An empty tag set leaves the key unchanged. Duplicate tags and their
    /// order do not affect the result.
    pub fn derive_key<S: AsRef<str>>(&self, base_key: &str, tags: &[S]) -> Result<String> {
        let tags: BTreeSet<&str> = tags.iter().map(|t| t.as_ref()).collect();
        if tags.is_empty() {
            return Ok(base_key.to_string());
        }

        let mut versions = tags
            .iter()
            .map(|tag| self.get_version(tag))
            .collect::<Result<Vec<u64>>>()?;
        versions.sort_unstable();

        let joined = versions
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(":");
        let digest = Sha256::digest(joined.as_bytes());
        let mut hash = hex::encode(digest);
        hash.truncate(VERSION_HASH_LEN);
        Ok(format!("{}:v{}", base_key, hash))
    }
}

fn tag_key(tag: &str) -> String {
    format!("{}{}", TAG_PREFIX, tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::tests::FailingBackend;
    use crate::cache::{InMemoryBackend, ManualClock};
    use crate::error::CacheError;
    use std::time::Duration;

    fn registry() -> (TagVersionRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(5_000));
        let backend = Arc::new(InMemoryBackend::new(clock.clone()));
        (TagVersionRegistry::new(backend, clock.clone()), clock)
    }

    #[test]
    fn test_version_initialized_lazily() {
        let (reg, clock) = registry();
        assert_eq!(reg.get_version("posts").unwrap(), 5_000);

        clock.advance(Duration::from_secs(10));
        assert_eq!(reg.get_version("posts").unwrap(), 5_000);
    }

    #[test]
    fn test_bump_is_strictly_increasing() {
        let (reg, _) = registry();
        let v0 = reg.get_version("posts").unwrap();
        let v1 = reg.bump("posts").unwrap();
        let v2 = reg.bump("posts").unwrap();

        assert!(v1 > v0);
        assert!(v2 > v1);
    }

    #[test]
    fn test_derive_key_deterministic() {
        let (reg, clock) = registry();
        let first = reg.derive_key("page:home", &["posts", "menu"]).unwrap();
        clock.advance(Duration::from_secs(1));
        let second = reg.derive_key("page:home", &["menu", "posts", "menu"]).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("page:home:v"));
        assert_eq!(first.len(), "page:home:v".len() + 8);
    }

    #[test]
    fn test_bump_changes_derived_keys() {
        let (reg, _) = registry();
        let home = reg.derive_key("page:home", &["posts", "menu"]).unwrap();
        let about = reg.derive_key("page:about", &["menu"]).unwrap();
        let other = reg.derive_key("page:feed", &["feed"]).unwrap();

        reg.bump("menu").unwrap();

        assert_ne!(reg.derive_key("page:home", &["posts", "menu"]).unwrap(), home);
        assert_ne!(reg.derive_key("page:about", &["menu"]).unwrap(), about);
        assert_eq!(reg.derive_key("page:feed", &["feed"]).unwrap(), other);
    }

    #[test]
    fn test_empty_tags_keep_base_key() {
        let (reg, _) = registry();
        let tags: [&str; 0] = [];
        assert_eq!(reg.derive_key("k", &tags).unwrap(), "k");
    }

    #[test]
    fn test_backend_errors_propagate() {
        let reg = TagVersionRegistry::new(
            Arc::new(FailingBackend),
            Arc::new(ManualClock::new(0)),
        );
        assert!(matches!(reg.get_version("t"), Err(CacheError::Backend(_))));
        assert!(matches!(reg.bump("t"), Err(CacheError::Backend(_))));
    }
}
