//! The top-level directory of site collections.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::crypto::CryptoBackend;
use crate::error::{KeystoreError, Result};
use crate::store::cache::SiteCache;
use crate::store::site::{validate_name, SiteCollection};

/// Version-control metadata directory skipped during enumeration.
const VCS_METADATA_DIR: &str = ".git";

/// A complete keystore: one sub-tree per site under a root directory.
///
/// Construction performs no I/O. The site mapping is computed lazily on
/// first access and memoized; `create_site` and `delete_site` keep the
/// cache consistent with the filesystem, and nothing else does.
pub struct KeyStore {
    root: PathBuf,
    recipient: String,
    cache: SiteCache,
}

impl KeyStore {
    /// Create a keystore over `root`, encrypting new credentials for
    /// `recipient`.
    pub fn new(root: impl Into<PathBuf>, recipient: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            recipient: recipient.into(),
            cache: SiteCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The site mapping, scanned once and memoized.
    ///
    /// Repeated calls return the cached snapshot; external filesystem
    /// changes after the first call are not observed.
    pub fn sites(&mut self) -> Result<&BTreeMap<String, SiteCollection>> {
        if !self.cache.is_populated() {
            let scanned = self.scan()?;
            debug!(root = %self.root.display(), sites = scanned.len(), "Populated site cache");
            self.cache.populate(scanned);
        }
        Ok(self.cache.entries())
    }

    /// Look up a single site by name.
    pub fn site(&mut self, name: &str) -> Result<&SiteCollection> {
        self.sites()?;
        self.cache
            .get(name)
            .ok_or_else(|| KeystoreError::SiteNotFound(name.to_string()))
    }

    /// Look up a single site by name, mutably.
    pub fn site_mut(&mut self, name: &str) -> Result<&mut SiteCollection> {
        self.sites()?;
        self.cache
            .get_mut(name)
            .ok_or_else(|| KeystoreError::SiteNotFound(name.to_string()))
    }

    /// Render a human-readable listing of sites and their usernames.
    pub fn list_sites(&mut self) -> Result<String> {
        let mut listing = String::new();
        for (name, site) in self.sites()? {
            let usernames: Vec<&str> = site.usernames().collect();
            let _ = writeln!(listing, "{}: {}", name, usernames.join(", "));
        }
        Ok(listing)
    }

    /// Create a new site directory holding one initial credential.
    ///
    /// Fails with `SiteAlreadyExists` if the directory is already present,
    /// leaving its contents untouched. On success the cache is extended so
    /// subsequent reads see the new site.
    pub fn create_site(
        &mut self,
        name: &str,
        username: &str,
        plaintext: &[u8],
        backend: &dyn CryptoBackend,
    ) -> Result<()> {
        validate_name(name, "site name")?;
        if name == VCS_METADATA_DIR {
            return Err(KeystoreError::InvalidInput(format!(
                "Site name is reserved: {}",
                name
            )));
        }

        let dir = self.root.join(name);
        if dir.exists() {
            return Err(KeystoreError::SiteAlreadyExists(name.to_string()));
        }

        fs::create_dir_all(&dir)?;
        let mut site = SiteCollection::open(&dir, self.recipient.clone())?;
        site.add_credential(username, plaintext, backend)?;

        self.cache.insert(name.to_string(), site);
        Ok(())
    }

    /// Recursively remove a site directory and all of its credentials.
    ///
    /// Destructive and irreversible at this layer. Invalidates the cache
    /// entry on success.
    pub fn delete_site(&mut self, name: &str) -> Result<()> {
        validate_name(name, "site name")?;

        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Err(KeystoreError::SiteNotFound(name.to_string()));
        }

        fs::remove_dir_all(&dir)?;
        self.cache.invalidate(name);
        debug!(site = name, "Deleted site");
        Ok(())
    }

    fn scan(&self) -> Result<BTreeMap<String, SiteCollection>> {
        let mut sites = BTreeMap::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name == VCS_METADATA_DIR {
                continue;
            }
            sites.insert(
                name.to_string(),
                SiteCollection::open(path.clone(), self.recipient.clone())?,
            );
        }
        Ok(sites)
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("root", &self.root)
            .field("recipient", &self.recipient)
            .field("cached", &self.cache.is_populated())
            .finish()
    }
}
