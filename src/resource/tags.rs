//! Ownership tags applied to every resource aftctl creates.

use serde::Serialize;
use std::collections::BTreeMap;

/// Tag key marking a resource as created by aftctl.
pub const CREATED_BY_KEY: &str = "created-by-aftctl";

/// Tag value paired with [`CREATED_BY_KEY`].
pub const CREATED_BY_VALUE: &str = "true";

/// An ordered set of resource tags.
///
/// Tags are applied once at creation time and never reconciled afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet {
    tags: BTreeMap<String, String>,
}

impl TagSet {
    /// Creates the fixed aftctl ownership tag set.
    #[must_use]
    pub fn aftctl() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(CREATED_BY_KEY.to_string(), CREATED_BY_VALUE.to_string());
        Self { tags }
    }

    /// Iterates over key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl Default for TagSet {
    fn default() -> Self {
        Self::aftctl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aftctl_tag_set_is_singleton() {
        let tags = TagSet::aftctl();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get(CREATED_BY_KEY), Some("true"));
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec![("created-by-aftctl", "true")]
        );
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let json = serde_json::to_value(TagSet::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "created-by-aftctl": "true" }));
    }
}
