//! End-to-end tests over a real keystore tree: age encryption, site
//! discovery, cache lifecycle, and git commits.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use tempfile::TempDir;

use keystore_core::crypto::StaticSecret;
use keystore_core::vcs::COMMIT_MESSAGE;
use keystore_core::{AgeBackend, CryptoBackend, KeyStore, KeystoreError};

struct TestStore {
    _dir: TempDir,
    root: PathBuf,
    backend: AgeBackend,
    recipient: String,
}

impl TestStore {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be available");
        let root = dir.path().join("store");
        fs::create_dir(&root).unwrap();

        let identity = age::x25519::Identity::generate();
        let recipient = identity.to_public().to_string();
        let identity_path = dir.path().join("identities.txt");
        fs::write(
            &identity_path,
            format!("{}\n", identity.to_string().expose_secret()),
        )
        .unwrap();

        Self {
            _dir: dir,
            root,
            backend: AgeBackend::new(identity_path),
            recipient,
        }
    }

    fn keystore(&self) -> KeyStore {
        KeyStore::new(&self.root, &self.recipient)
    }

    fn seed_credential(&self, site: &str, username: &str, secret: &[u8]) {
        let dir = self.root.join(site);
        if !dir.exists() {
            fs::create_dir(&dir).unwrap();
        }
        let ciphertext = self.backend.encrypt(secret, &self.recipient).unwrap();
        fs::write(dir.join(format!("{}.asc", username)), ciphertext).unwrap();
    }
}

fn secrets() -> StaticSecret {
    StaticSecret::new("unused")
}

#[test]
fn test_get_returns_stored_secret() {
    let store = TestStore::new();
    store.seed_credential("example.com", "alice", b"alice-secret");

    let mut keystore = store.keystore();
    let secret = keystore
        .site("example.com")
        .unwrap()
        .get("alice", &store.backend, &secrets())
        .unwrap();
    assert_eq!(secret.as_slice(), b"alice-secret");
}

#[test]
fn test_get_unknown_user_fails_without_mutation() {
    let store = TestStore::new();
    store.seed_credential("example.com", "alice", b"alice-secret");

    let mut keystore = store.keystore();
    let result = keystore
        .site("example.com")
        .unwrap()
        .get("bob", &store.backend, &secrets());
    assert!(matches!(result, Err(KeystoreError::UnknownCredential(_))));

    let names: Vec<_> = fs::read_dir(store.root.join("example.com"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["alice.asc"]);
}

#[test]
fn test_create_site_then_get() {
    let store = TestStore::new();
    let mut keystore = store.keystore();

    keystore
        .create_site("newsite", "carol", b"s3cr3t", &store.backend)
        .unwrap();

    let secret = keystore
        .site("newsite")
        .unwrap()
        .get("carol", &store.backend, &secrets())
        .unwrap();
    assert_eq!(secret.as_slice(), b"s3cr3t");

    // The on-disk file is ciphertext, not the secret.
    let on_disk = fs::read(store.root.join("newsite/carol.asc")).unwrap();
    assert!(!String::from_utf8_lossy(&on_disk).contains("s3cr3t"));
}

#[test]
fn test_sites_listing_is_idempotent() {
    let store = TestStore::new();
    store.seed_credential("example.com", "alice", b"x");
    store.seed_credential("other.org", "bob", b"y");

    let mut keystore = store.keystore();
    let first: Vec<String> = keystore.sites().unwrap().keys().cloned().collect();
    let second: Vec<String> = keystore.sites().unwrap().keys().cloned().collect();
    assert_eq!(first, second);
    assert_eq!(first, vec!["example.com", "other.org"]);
}

#[test]
fn test_delete_site_leaves_other_sites_intact() {
    let store = TestStore::new();
    store.seed_credential("foo", "alice", b"foo-secret");
    store.seed_credential("bar", "bob", b"bar-secret");

    let mut keystore = store.keystore();
    keystore.delete_site("foo").unwrap();

    assert!(!store.root.join("foo").exists());
    let secret = keystore
        .site("bar")
        .unwrap()
        .get("bob", &store.backend, &secrets())
        .unwrap();
    assert_eq!(secret.as_slice(), b"bar-secret");
}

#[test]
fn test_write_commits_to_enclosing_repository() {
    let store = TestStore::new();
    let repo = git2::Repository::init(&store.root).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "tester").unwrap();
        config.set_str("user.email", "tester@example.com").unwrap();
    }

    let mut keystore = store.keystore();
    keystore
        .create_site("example.com", "alice", b"hunter2", &store.backend)
        .unwrap();

    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message().unwrap(), COMMIT_MESSAGE);

    let tree = head.tree().unwrap();
    assert!(tree
        .get_path(Path::new("example.com/alice.asc"))
        .is_ok());
}

#[test]
fn test_encrypted_identity_file_round_trip() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("store");
    fs::create_dir(&root).unwrap();

    let identity = age::x25519::Identity::generate();
    let recipient = identity.to_public().to_string();

    // Lock the identities file behind a passphrase.
    let passphrase = "identity-passphrase-123";
    let plain = format!("{}\n", identity.to_string().expose_secret());
    let encryptor = age::Encryptor::with_user_passphrase(age::secrecy::SecretString::from(
        passphrase.to_string(),
    ));
    let mut encrypted = Vec::new();
    let mut writer = encryptor.wrap_output(&mut encrypted).unwrap();
    writer.write_all(plain.as_bytes()).unwrap();
    writer.finish().unwrap();
    let identity_path = dir.path().join("identities.txt");
    fs::write(&identity_path, encrypted).unwrap();

    let backend = AgeBackend::new(&identity_path);
    let mut keystore = KeyStore::new(&root, &recipient);
    keystore
        .create_site("example.com", "alice", b"hunter2", &backend)
        .unwrap();

    let secret = keystore
        .site("example.com")
        .unwrap()
        .get("alice", &backend, &StaticSecret::new(passphrase))
        .unwrap();
    assert_eq!(secret.as_slice(), b"hunter2");

    let wrong = keystore
        .site("example.com")
        .unwrap()
        .get("alice", &backend, &StaticSecret::new("wrong-passphrase"));
    assert!(matches!(wrong, Err(KeystoreError::IncorrectPassphrase)));
}
