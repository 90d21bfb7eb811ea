//! One encrypted secret on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::{CryptoBackend, SecretProvider};
use crate::error::Result;
use crate::vcs::{VersionControl, COMMIT_MESSAGE};

/// File extension marking a credential file. The basename without this
/// extension is the username.
pub const CREDENTIAL_EXTENSION: &str = "asc";

/// Handle to a single ciphertext file holding the encrypted secret for one
/// (site, username) pair.
///
/// Two handles are equal iff they reference the same path.
pub struct CredentialFile {
    path: PathBuf,
    recipient: String,
    vcs: Option<Rc<dyn VersionControl>>,
}

impl CredentialFile {
    /// Create a handle over `path`, encrypting for `recipient`.
    ///
    /// The file itself may not exist yet; it is created by [`write`](Self::write).
    pub fn new(
        path: impl Into<PathBuf>,
        recipient: impl Into<String>,
        vcs: Option<Rc<dyn VersionControl>>,
    ) -> Self {
        Self {
            path: path.into(),
            recipient: recipient.into(),
            vcs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Username this credential belongs to, recovered from the file stem.
    pub fn username(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Decrypt and return the stored secret.
    ///
    /// Obtains any unlock passphrase from `secrets`; this may block on
    /// interactive input depending on the provider.
    pub fn read(
        &self,
        backend: &dyn CryptoBackend,
        secrets: &dyn SecretProvider,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext = fs::read(&self.path)?;
        backend.decrypt(&ciphertext, secrets)
    }

    /// Encrypt `plaintext` for the configured recipient and store it.
    ///
    /// The ciphertext is written to a sibling temp path and renamed into
    /// place, so a crash never leaves torn ciphertext. If a version-control
    /// binding is attached, the file is staged and committed afterwards; a
    /// commit failure is logged as a warning, never escalated, since the
    /// secret is already durably stored.
    pub fn write(&self, plaintext: &[u8], backend: &dyn CryptoBackend) -> Result<()> {
        let ciphertext = backend.encrypt(plaintext, &self.recipient)?;

        let temp_path = self.path.with_extension(format!("{}.tmp", CREDENTIAL_EXTENSION));
        fs::write(&temp_path, &ciphertext)?;
        crate::fs::atomic_replace(&temp_path, &self.path)?;

        if let Some(vcs) = &self.vcs {
            match vcs.stage(&self.path).and_then(|_| vcs.commit(COMMIT_MESSAGE)) {
                Ok(()) => debug!(path = %self.path.display(), "Committed new key"),
                Err(err) => warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Credential stored but version-control commit failed"
                ),
            }
        }

        Ok(())
    }
}

impl PartialEq for CredentialFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for CredentialFile {}

impl std::fmt::Debug for CredentialFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialFile")
            .field("path", &self.path)
            .field("recipient", &self.recipient)
            .field("vcs", &self.vcs.is_some())
            .finish()
    }
}
