//! The keystore data model.
//!
//! Leaves first: a [`CredentialFile`] is one ciphertext file on disk; a
//! [`SiteCollection`] is a directory of credential files discovered as a
//! snapshot; the [`KeyStore`] is the tree of sites with a lazily populated,
//! explicitly invalidated cache.
//!
//! ## Security
//!
//! On-disk content is always ciphertext. Plaintext exists only transiently
//! in memory during read and write, in buffers zeroized on drop.

pub mod cache;
pub mod credential;
pub mod site;
pub mod tree;

pub use cache::SiteCache;
pub use credential::{CredentialFile, CREDENTIAL_EXTENSION};
pub use site::{SiteCollection, SiteConfig, SITE_CONFIG_FILE};
pub use tree::KeyStore;
