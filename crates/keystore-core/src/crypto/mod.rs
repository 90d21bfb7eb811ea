//! Encryption oracle for the keystore.
//!
//! The store treats encryption as an opaque asymmetric oracle: encrypt
//! plaintext for a recipient identity, decrypt ciphertext with private key
//! material unlocked by a passphrase. The production implementation is
//! [`AgeBackend`]; tests may supply their own backend.
//!
//! Passphrase delivery is a separate pluggable capability
//! ([`SecretProvider`]) so that decryption never hard-codes an interactive
//! prompt.

pub mod age_backend;
pub mod secret;

pub use age_backend::AgeBackend;
pub use secret::{SecretProvider, StaticSecret};

use zeroize::Zeroizing;

use crate::error::Result;

/// Asymmetric encryption oracle.
///
/// Implementations must guarantee that `decrypt(encrypt(p, r))` yields `p`
/// when the caller holds the private key matching recipient `r`.
pub trait CryptoBackend {
    /// Encrypt plaintext for the given recipient identity.
    ///
    /// Fails with [`KeystoreError::Encryption`](crate::KeystoreError::Encryption)
    /// if the recipient is unknown or invalid.
    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>>;

    /// Decrypt ciphertext, obtaining any unlock passphrase from `secrets`.
    ///
    /// The returned plaintext buffer is zeroized on drop.
    fn decrypt(&self, ciphertext: &[u8], secrets: &dyn SecretProvider)
        -> Result<Zeroizing<Vec<u8>>>;
}
