//! Pluggable passphrase delivery.
//!
//! Decryption may need a passphrase to unlock private key material. Rather
//! than embedding an interactive prompt in the decrypt path, the backend
//! asks a `SecretProvider`. The CLI supplies an interactive implementation;
//! tests and non-interactive callers use [`StaticSecret`].

use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::error::Result;

/// Source of the passphrase that unlocks private key material.
///
/// Providers may block on user input. They must never silently substitute
/// an empty or cached passphrase the caller did not configure.
pub trait SecretProvider {
    /// Obtain the unlock passphrase.
    fn passphrase(&self) -> Result<SecretString>;
}

/// Fixed passphrase provider for tests and non-interactive operation.
pub struct StaticSecret {
    passphrase: Zeroizing<String>,
}

impl StaticSecret {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl SecretProvider for StaticSecret {
    fn passphrase(&self) -> Result<SecretString> {
        Ok(SecretString::from(self.passphrase.as_str().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_static_secret_returns_configured_passphrase() {
        let provider = StaticSecret::new("fixed-passphrase");
        let passphrase = provider.passphrase().unwrap();
        assert_eq!(passphrase.expose_secret(), "fixed-passphrase");
    }
}
