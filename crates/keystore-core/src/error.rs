//! Error types for Keystore core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer will map these
//! to user-friendly messages. No operation in this crate swallows an error
//! and substitutes a default value.

use thiserror::Error;

/// Result type alias for Keystore operations.
pub type Result<T> = std::result::Result<T, KeystoreError>;

/// Core error type for Keystore operations.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Incorrect passphrase while unlocking decryption keys
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Decryption failure: missing key or corrupt ciphertext
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Encryption failure: unknown or invalid recipient identity
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Filesystem write or read failure
    #[error("Persist error: {source}")]
    Persist {
        #[from]
        source: std::io::Error,
    },

    /// Username lookup miss within a site
    #[error("Unknown credential: {0}")]
    UnknownCredential(String),

    /// Site lookup miss within the keystore tree
    #[error("Site not found: {0}")]
    SiteNotFound(String),

    /// Attempted site creation over an existing directory
    #[error("Site already exists: {0}")]
    SiteAlreadyExists(String),

    /// Attempted credential creation over an existing username
    #[error("Credential already exists: {0}")]
    DuplicateCredential(String),

    /// Automation requested on a site with no configured strategy
    #[error("No automation strategy configured for site: {0}")]
    AutomationUnavailable(String),

    /// Browser automation step failure
    #[error("Automation error: {0}")]
    Automation(String),

    /// Version-control operation failure
    #[error("Version control error: {0}")]
    Vcs(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<git2::Error> for KeystoreError {
    fn from(err: git2::Error) -> Self {
        KeystoreError::Vcs(err.message().to_string())
    }
}
