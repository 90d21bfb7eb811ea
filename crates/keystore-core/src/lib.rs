//! # Keystore Core
//!
//! Core library for Keystore - a directory-tree of encrypted secrets, one
//! sub-tree per site, one ciphertext file per username, optionally backed
//! by a git repository.
//!
//! This crate provides the storage data model and its lifecycle operations
//! independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **crypto**: The encryption oracle (age recipients/identities) and the
//!   pluggable secret-provider capability for passphrase delivery
//! - **store**: Credential files, site collections, the keystore tree and
//!   its explicitly invalidated site cache
//! - **vcs**: Version-control binding that records each change as a commit
//! - **automation**: Browser automation strategies for supported sites
//!
//! ## Layout on disk
//!
//! ```text
//! <root>/
//!   .git/                  (optional)
//!   <site-name>/
//!     config.toml          (optional, selects an automation strategy)
//!     <username>.asc       (one ciphertext file per username)
//! ```

pub mod automation;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod store;
pub mod vcs;

pub use automation::{AutomationKind, AutomationStrategy, BrowserSession};
pub use crypto::{AgeBackend, CryptoBackend, SecretProvider, StaticSecret};
pub use error::{KeystoreError, Result};
pub use store::{CredentialFile, KeyStore, SiteCollection};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
