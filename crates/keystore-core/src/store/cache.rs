//! Explicitly invalidated cache of site collections.
//!
//! The keystore tree computes its site mapping lazily and memoizes it
//! here. The cache never observes external filesystem changes; every
//! mutating operation on the tree must call [`SiteCache::insert`] or
//! [`SiteCache::invalidate`] itself.

use std::collections::BTreeMap;

use crate::store::site::SiteCollection;

/// Process-local cache of `site name -> SiteCollection`.
#[derive(Debug, Default)]
pub struct SiteCache {
    entries: BTreeMap<String, SiteCollection>,
    populated: bool,
}

impl SiteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a full scan has been memoized.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Replace the cache contents with a fresh scan result.
    pub fn populate(&mut self, entries: BTreeMap<String, SiteCollection>) {
        self.entries = entries;
        self.populated = true;
    }

    /// The memoized mapping. Empty until populated.
    pub fn entries(&self) -> &BTreeMap<String, SiteCollection> {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&SiteCollection> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SiteCollection> {
        self.entries.get_mut(name)
    }

    /// Record a newly created site without rescanning.
    ///
    /// A no-op before the first full scan; the scan will pick the site up.
    pub fn insert(&mut self, name: String, site: SiteCollection) {
        if self.populated {
            self.entries.insert(name, site);
        }
    }

    /// Drop a single entry after its directory is removed.
    pub fn invalidate(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Drop everything and force a rescan on next access.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.populated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn site(dir: &std::path::Path, name: &str) -> SiteCollection {
        let site_dir = dir.join(name);
        fs::create_dir(&site_dir).unwrap();
        SiteCollection::open(site_dir, "recipient").unwrap()
    }

    #[test]
    fn test_starts_unpopulated() {
        let cache = SiteCache::new();
        assert!(!cache.is_populated());
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_insert_before_populate_is_noop() {
        let dir = tempdir().unwrap();
        let mut cache = SiteCache::new();

        cache.insert("foo".to_string(), site(dir.path(), "foo"));
        assert!(!cache.is_populated());
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_populate_insert_invalidate() {
        let dir = tempdir().unwrap();
        let mut cache = SiteCache::new();

        cache.populate(BTreeMap::new());
        assert!(cache.is_populated());

        cache.insert("foo".to_string(), site(dir.path(), "foo"));
        assert!(cache.get("foo").is_some());

        cache.invalidate("foo");
        assert!(cache.get("foo").is_none());
        assert!(cache.is_populated());
    }

    #[test]
    fn test_invalidate_all_forces_rescan() {
        let dir = tempdir().unwrap();
        let mut cache = SiteCache::new();

        let mut entries = BTreeMap::new();
        entries.insert("foo".to_string(), site(dir.path(), "foo"));
        cache.populate(entries);

        cache.invalidate_all();
        assert!(!cache.is_populated());
        assert!(cache.entries().is_empty());
    }
}
