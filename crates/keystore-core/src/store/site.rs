//! A named group of credential files discovered from a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::automation::{AutomationKind, AutomationStrategy, BrowserSession};
use crate::crypto::{CryptoBackend, SecretProvider};
use crate::error::{KeystoreError, Result};
use crate::store::credential::{CredentialFile, CREDENTIAL_EXTENSION};
use crate::vcs::{GitBinding, VersionControl};

/// Optional per-site configuration file name.
pub const SITE_CONFIG_FILE: &str = "config.toml";

/// Per-site configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Automation strategy tag, if this site supports browser automation.
    pub automation: Option<AutomationKind>,
}

/// A site: one directory, one credential file per username.
///
/// The username mapping is a snapshot of the directory taken at
/// construction time; it is not live-synced with the filesystem.
pub struct SiteCollection {
    name: String,
    dir: PathBuf,
    recipient: String,
    keys: BTreeMap<String, CredentialFile>,
    automation: Option<AutomationKind>,
    vcs: Option<Rc<dyn VersionControl>>,
}

impl SiteCollection {
    /// Build a collection over a site directory.
    ///
    /// Scans for `*.asc` credential files, reads the optional `config.toml`
    /// for an automation tag, and looks for an enclosing git repository one
    /// level above the directory. A missing repository is not an error.
    pub fn open(dir: impl Into<PathBuf>, recipient: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        let recipient = recipient.into();

        let name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                KeystoreError::InvalidInput(format!("Not a site directory: {}", dir.display()))
            })?;

        let vcs: Option<Rc<dyn VersionControl>> =
            GitBinding::discover(&dir).map(|binding| Rc::new(binding) as Rc<dyn VersionControl>);

        let automation = read_site_config(&dir)?.automation;

        let mut keys = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CREDENTIAL_EXTENSION) {
                continue;
            }
            let Some(username) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            keys.insert(
                username.to_string(),
                CredentialFile::new(path.clone(), recipient.clone(), vcs.clone()),
            );
        }

        Ok(Self {
            name,
            dir,
            recipient,
            keys,
            automation,
            vcs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Usernames in this site, in sorted order.
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Credential handle for a username, if present in the snapshot.
    pub fn credential(&self, username: &str) -> Option<&CredentialFile> {
        self.keys.get(username)
    }

    /// Decrypt and return the secret for `username`.
    pub fn get(
        &self,
        username: &str,
        backend: &dyn CryptoBackend,
        secrets: &dyn SecretProvider,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let credential = self.keys.get(username).ok_or_else(|| {
            KeystoreError::UnknownCredential(format!("{}/{}", self.name, username))
        })?;
        credential.read(backend, secrets)
    }

    /// Encrypt and store a new credential for `username`.
    ///
    /// Rejects an existing username with `DuplicateCredential`; use
    /// [`update_credential`](Self::update_credential) to overwrite
    /// intentionally.
    pub fn add_credential(
        &mut self,
        username: &str,
        plaintext: &[u8],
        backend: &dyn CryptoBackend,
    ) -> Result<()> {
        validate_name(username, "username")?;
        if self.keys.contains_key(username) {
            return Err(KeystoreError::DuplicateCredential(format!(
                "{}/{}",
                self.name, username
            )));
        }

        let path = self
            .dir
            .join(format!("{}.{}", username, CREDENTIAL_EXTENSION));
        let credential = CredentialFile::new(path, self.recipient.clone(), self.vcs.clone());
        credential.write(plaintext, backend)?;
        self.keys.insert(username.to_string(), credential);
        Ok(())
    }

    /// Re-encrypt an existing credential with a new secret value.
    pub fn update_credential(
        &mut self,
        username: &str,
        plaintext: &[u8],
        backend: &dyn CryptoBackend,
    ) -> Result<()> {
        let credential = self.keys.get(username).ok_or_else(|| {
            KeystoreError::UnknownCredential(format!("{}/{}", self.name, username))
        })?;
        credential.write(plaintext, backend)
    }

    /// Automation strategy bound to `session`, if this site configures one.
    pub fn automation_handle(
        &self,
        session: Box<dyn BrowserSession>,
    ) -> Result<Box<dyn AutomationStrategy>> {
        match self.automation {
            Some(kind) => Ok(kind.strategy(session)),
            None => Err(KeystoreError::AutomationUnavailable(self.name.clone())),
        }
    }

    /// Decrypt the credential for `username` and log in through `session`.
    pub fn login(
        &self,
        username: &str,
        session: Box<dyn BrowserSession>,
        backend: &dyn CryptoBackend,
        secrets: &dyn SecretProvider,
    ) -> Result<()> {
        let secret = self.get(username, backend, secrets)?;
        let mut strategy = self.automation_handle(session)?;
        strategy.login(username, &secret)
    }

    /// Log out of the site through `session`.
    pub fn logout(&self, session: Box<dyn BrowserSession>) -> Result<()> {
        let mut strategy = self.automation_handle(session)?;
        strategy.logout()
    }

    /// Change the live password for `username` and re-encrypt the stored
    /// credential with the new value.
    pub fn change_password(
        &mut self,
        username: &str,
        new_secret: &[u8],
        session: Box<dyn BrowserSession>,
        backend: &dyn CryptoBackend,
        secrets: &dyn SecretProvider,
    ) -> Result<()> {
        let old_secret = self.get(username, backend, secrets)?;
        let mut strategy = self.automation_handle(session)?;
        strategy.change_password(username, &old_secret, new_secret)?;
        self.update_credential(username, new_secret, backend)
    }
}

impl std::fmt::Debug for SiteCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteCollection")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("usernames", &self.keys.keys().collect::<Vec<_>>())
            .field("automation", &self.automation)
            .finish()
    }
}

fn read_site_config(dir: &std::path::Path) -> Result<SiteConfig> {
    let path = dir.join(SITE_CONFIG_FILE);
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let contents = fs::read_to_string(&path)?;
    toml::from_str(&contents).map_err(|e| {
        KeystoreError::InvalidInput(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Reject empty names and names that would escape the site directory.
pub(crate) fn validate_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(KeystoreError::InvalidInput(format!(
            "{} cannot be empty",
            what
        )));
    }
    if name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(KeystoreError::InvalidInput(format!(
            "{} cannot contain path separators: {:?}",
            what, name
        )));
    }
    Ok(())
}
