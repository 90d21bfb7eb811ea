//! Age-based implementation of the encryption oracle.
//!
//! Credentials are encrypted to an age x25519 recipient (the `age1...`
//! public key string) and written ASCII-armored, matching the `.asc` file
//! convention. Decryption uses an identities file holding the matching
//! `AGE-SECRET-KEY-...` lines; the file may itself be age
//! passphrase-encrypted, in which case it is unlocked with a passphrase
//! obtained from the configured [`SecretProvider`].

use std::io::{Read, Write};
use std::iter;
use std::path::PathBuf;

use age::armor::{ArmoredReader, ArmoredWriter, Format};
use secrecy::SecretString;
use zeroize::Zeroizing;

use crate::crypto::{CryptoBackend, SecretProvider};
use crate::error::{KeystoreError, Result};

/// Binary age header, start of an encrypted identities file.
const AGE_BINARY_HEADER: &[u8] = b"age-encryption.org/v1";

/// Armored age header, start of an armored encrypted identities file.
const AGE_ARMOR_HEADER: &[u8] = b"-----BEGIN AGE ENCRYPTED FILE-----";

/// Encryption oracle backed by the age crate.
pub struct AgeBackend {
    /// Path to the identities file used for decryption.
    identity_path: PathBuf,
}

impl AgeBackend {
    /// Create a backend reading private key material from `identity_path`.
    ///
    /// The file is not touched until the first decryption.
    pub fn new(identity_path: impl Into<PathBuf>) -> Self {
        Self {
            identity_path: identity_path.into(),
        }
    }

    /// Load the x25519 identities, unlocking the file if it is encrypted.
    fn identities(&self, secrets: &dyn SecretProvider) -> Result<Vec<age::x25519::Identity>> {
        let raw = std::fs::read(&self.identity_path).map_err(|e| {
            KeystoreError::Decryption(format!(
                "Cannot read identity file {}: {}",
                self.identity_path.display(),
                e
            ))
        })?;

        let contents = if is_age_encrypted(&raw) {
            let passphrase = secrets.passphrase()?;
            decrypt_with_passphrase(&raw, passphrase)?
        } else {
            Zeroizing::new(raw)
        };

        parse_identities(&contents)
    }
}

impl CryptoBackend for AgeBackend {
    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>> {
        let recipient: age::x25519::Recipient = recipient.trim().parse().map_err(|e| {
            KeystoreError::Encryption(format!("Invalid recipient {:?}: {}", recipient, e))
        })?;

        let encryptor =
            age::Encryptor::with_recipients(iter::once(&recipient as &dyn age::Recipient))
                .map_err(|e| KeystoreError::Encryption(format!("Failed to create encryptor: {}", e)))?;

        let mut ciphertext = Vec::new();
        let armor = ArmoredWriter::wrap_output(&mut ciphertext, Format::AsciiArmor)
            .map_err(|e| KeystoreError::Encryption(format!("Failed to start armor: {}", e)))?;

        let mut writer = encryptor
            .wrap_output(armor)
            .map_err(|e| KeystoreError::Encryption(format!("Encryption failed: {}", e)))?;

        writer
            .write_all(plaintext)
            .map_err(|e| KeystoreError::Encryption(format!("Encryption write failed: {}", e)))?;

        writer
            .finish()
            .and_then(|armor| armor.finish())
            .map_err(|e| KeystoreError::Encryption(format!("Encryption finish failed: {}", e)))?;

        Ok(ciphertext)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        secrets: &dyn SecretProvider,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let identities = self.identities(secrets)?;

        let decryptor = age::Decryptor::new(ArmoredReader::new(ciphertext))
            .map_err(|e| KeystoreError::Decryption(format!("Corrupt ciphertext: {}", e)))?;

        let mut reader = decryptor
            .decrypt(identities.iter().map(|id| id as &dyn age::Identity))
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys => {
                    KeystoreError::Decryption("No matching private key".to_string())
                }
                age::DecryptError::DecryptionFailed | age::DecryptError::KeyDecryptionFailed => {
                    KeystoreError::Decryption("Decryption failed".to_string())
                }
                _ => KeystoreError::Decryption(format!("Decryption failed: {}", e)),
            })?;

        let mut plaintext = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| KeystoreError::Decryption(format!("Failed to read plaintext: {}", e)))?;

        Ok(plaintext)
    }
}

/// Check whether a file looks like an age-encrypted blob.
fn is_age_encrypted(data: &[u8]) -> bool {
    data.starts_with(AGE_BINARY_HEADER) || data.starts_with(AGE_ARMOR_HEADER)
}

/// Decrypt an age passphrase-encrypted identities file.
fn decrypt_with_passphrase(data: &[u8], passphrase: SecretString) -> Result<Zeroizing<Vec<u8>>> {
    let decryptor = age::Decryptor::new(ArmoredReader::new(data)).map_err(|e| {
        KeystoreError::Decryption(format!("Corrupt encrypted identity file: {}", e))
    })?;

    let identity = age::scrypt::Identity::new(passphrase);
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys
            | age::DecryptError::DecryptionFailed
            | age::DecryptError::KeyDecryptionFailed => KeystoreError::IncorrectPassphrase,
            _ => KeystoreError::Decryption(format!("Identity decryption failed: {}", e)),
        })?;

    let mut contents = Zeroizing::new(Vec::new());
    reader.read_to_end(&mut contents).map_err(|e| {
        KeystoreError::Decryption(format!("Failed to read identity file: {}", e))
    })?;

    Ok(contents)
}

/// Parse `AGE-SECRET-KEY-...` lines, skipping comments and blank lines.
fn parse_identities(contents: &[u8]) -> Result<Vec<age::x25519::Identity>> {
    let text = std::str::from_utf8(contents)
        .map_err(|_| KeystoreError::Decryption("Identity file is not valid UTF-8".to_string()))?;

    let mut identities = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let identity: age::x25519::Identity = line
            .parse()
            .map_err(|e| KeystoreError::Decryption(format!("Invalid identity line: {}", e)))?;
        identities.push(identity);
    }

    if identities.is_empty() {
        return Err(KeystoreError::Decryption(
            "Identity file contains no identities".to_string(),
        ));
    }

    Ok(identities)
}
