//! Tag Index Module
//!
//! Reverse index from tag to the keys carrying it, kept in lockstep with the
//! entry table.

use std::collections::{BTreeSet, HashMap, HashSet};

// == Tag Index ==
/// Maps tags to keys and keys back to their tags.
///
/// Tags with no remaining keys are dropped, so every tag present in the
/// index is carried by at least one key.
#[derive(Debug, Default, Clone)]
pub struct TagIndex {
    by_tag: HashMap<String, HashSet<String>>,
    by_key: HashMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // == Attach ==
    /// Associates `key` with `tags`, replacing any previous association.
    pub fn attach(&mut self, key: &str, tags: &BTreeSet<String>) {
        self.detach(key);
        if tags.is_empty() {
            return;
        }
        for tag in tags {
            self.by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        self.by_key.insert(key.to_string(), tags.clone());
    }

    // == Detach ==
    /// Removes `key` from every tag it was attached to.
    pub fn detach(&mut self, key: &str) {
        let Some(tags) = self.by_key.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(&tag);
                }
            }
        }
    }

    // == Lookup ==
    /// Keys currently carrying `tag`; empty for an unknown tag.
    pub fn keys_for(&self, tag: &str) -> HashSet<String> {
        self.by_tag.get(tag).cloned().unwrap_or_default()
    }

    /// Tags currently attached to `key`.
    pub fn tags_for(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.by_key.get(key)
    }

    /// Number of distinct tags in the index.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.by_tag.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.by_tag.clear();
        self.by_key.clear();
    }
}
