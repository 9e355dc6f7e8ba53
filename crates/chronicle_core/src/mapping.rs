//! Flat path to content mapping.
//!
//! One commit's full file state: every file path (slash separated, relative to
//! the tree root) mapped to its bytes. Backed by a `BTreeMap` so iteration,
//! equality and listings are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Path to content mapping for one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatContentMapping {
    entries: BTreeMap<String, Vec<u8>>,
}

impl FlatContentMapping {
    /// Create an empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert content for a path, returning the previous content if any
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
        self.entries.insert(path.into(), content.into())
    }

    /// Content for a path
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Check if a path is present
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove a path
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.entries.remove(path)
    }

    /// Number of paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if mapping is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total content bytes across all paths
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().map(|v| v.len() as u64).sum()
    }

    /// Paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate `(path, content)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// One `path : content` line per entry, content rendered lossily as UTF-8
    #[must_use]
    pub fn as_list_string(&self) -> String {
        let mut out = String::new();
        for (path, content) in self.iter() {
            out.push_str(path);
            out.push_str(" : ");
            out.push_str(&String::from_utf8_lossy(content));
            out.push('\n');
        }
        out
    }
}

impl IntoIterator for FlatContentMapping {
    type Item = (String, Vec<u8>);
    type IntoIter = btree_map::IntoIter<String, Vec<u8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for FlatContentMapping {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (path, content) in iter {
            mapping.insert(path, content);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut mapping = FlatContentMapping::new();
        assert!(mapping.is_empty());

        assert_eq!(mapping.insert("a.txt", b"1".to_vec()), None);
        assert_eq!(mapping.insert("a.txt", b"3".to_vec()), Some(b"1".to_vec()));
        assert_eq!(mapping.get("a.txt"), Some(&b"3"[..]));
        assert_eq!(mapping.len(), 1);
        assert!(mapping.get("missing").is_none());
    }

    #[test]
    fn test_paths_sorted() {
        let mapping: FlatContentMapping =
            [("src/main.rs", "fn"), ("README", "hi"), ("src/lib.rs", "mod")]
                .into_iter()
                .collect();
        let paths: Vec<&str> = mapping.paths().collect();
        assert_eq!(paths, vec!["README", "src/lib.rs", "src/main.rs"]);
        assert_eq!(mapping.total_bytes(), 7);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a: FlatContentMapping = [("x", "1"), ("y", "2")].into_iter().collect();
        let b: FlatContentMapping = [("y", "2"), ("x", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_as_list_string() {
        let mapping: FlatContentMapping = [("b.txt", "2"), ("a.txt", "3")].into_iter().collect();
        assert_eq!(mapping.as_list_string(), "a.txt : 3\nb.txt : 2\n");
    }
}
