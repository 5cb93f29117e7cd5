//! Key Pattern Module
//!
//! Shell-style key patterns where `*` matches any run of characters.
//! Matching is anchored at both ends and no other metacharacter exists.

/// A parsed wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    /// Literal pieces between `*`s, in order
    parts: Vec<String>,
    /// Pattern contains at least one `*`
    has_wildcard: bool,
}

impl KeyPattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            parts: pattern.split('*').map(str::to_string).collect(),
            has_wildcard: pattern.contains('*'),
        }
    }

    /// Returns true if the whole of `key` matches the pattern.
    pub fn matches(&self, key: &str) -> bool {
        if !self.has_wildcard {
            return self.parts[0] == key;
        }

        let first = &self.parts[0];
        let last = &self.parts[self.parts.len() - 1];
        if key.len() < first.len() + last.len()
            || !key.starts_with(first.as_str())
            || !key.ends_with(last.as_str())
        {
            return false;
        }

        // Middle literals are matched greedily left to right in the span
        // between the anchored prefix and suffix.
        let mut rest = &key[first.len()..key.len() - last.len()];
        for part in &self.parts[1..self.parts.len() - 1] {
            match rest.find(part.as_str()) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern() {
        let p = KeyPattern::new("user:*");
        assert!(p.matches("user:1"));
        assert!(p.matches("user:"));
        assert!(!p.matches("order:1"));
        assert!(!p.matches("xuser:1"));
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        let p = KeyPattern::new("user:1");
        assert!(p.matches("user:1"));
        assert!(!p.matches("user:10"));
    }

    #[test]
    fn test_anchored_not_substring() {
        let p = KeyPattern::new("*:1");
        assert!(p.matches("user:1"));
        assert!(!p.matches("user:12"));
    }

    #[test]
    fn test_middle_wildcards() {
        let p = KeyPattern::new("page:*:en:*");
        assert!(p.matches("page:home:en:v2"));
        assert!(p.matches("page::en:"));
        assert!(!p.matches("page:home:fr:v2"));
    }

    #[test]
    fn test_overlapping_prefix_suffix() {
        let p = KeyPattern::new("ab*ba");
        assert!(!p.matches("aba"));
        assert!(p.matches("abba"));
    }

    #[test]
    fn test_star_matches_everything() {
        let p = KeyPattern::new("*");
        assert!(p.matches(""));
        assert!(p.matches("anything"));
    }

    #[test]
    fn test_non_ascii_keys() {
        let p = KeyPattern::new("café:*");
        assert!(p.matches("café:menü"));
        assert!(!p.matches("cafe:menu"));
    }
}
