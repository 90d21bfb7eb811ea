//! Keystore CLI - a directory-tree of encrypted credentials
//!
//! This is the command-line interface for Keystore. Each subcommand maps
//! directly onto a core operation: list sites, get a credential, add a
//! credential, delete a site.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Password;
use secrecy::SecretString;
use zeroize::Zeroizing;

use keystore_core::{AgeBackend, KeyStore, KeystoreError, SecretProvider, VERSION};

/// Keystore - a directory-tree of encrypted credentials, one site per
/// directory, one ciphertext file per username
#[derive(Parser)]
#[command(name = "keystore")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the keystore root directory
    #[arg(short, long, env = "KEYSTORE_PATH")]
    path: PathBuf,

    /// Recipient the store encrypts against (age public key)
    #[arg(short, long, env = "KEYSTORE_RECIPIENT")]
    recipient: String,

    /// Path to the age identities file used for decryption
    #[arg(long, env = "KEYSTORE_IDENTITY")]
    identity: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sites and their usernames
    List,

    /// Decrypt a credential and print it to stdout
    Get {
        /// Site name
        #[arg(value_name = "SITE")]
        site: String,

        /// Username within the site
        #[arg(value_name = "USERNAME")]
        username: String,
    },

    /// Add a credential, creating the site if it does not exist
    Add {
        /// Site name
        #[arg(value_name = "SITE")]
        site: String,

        /// Username within the site
        #[arg(value_name = "USERNAME")]
        username: String,
    },

    /// Delete a site and all of its credentials
    Delete {
        /// Site name
        #[arg(value_name = "SITE")]
        site: String,
    },
}

/// Interactive passphrase delivery for unlocking the identities file.
struct PromptSecret;

impl SecretProvider for PromptSecret {
    fn passphrase(&self) -> keystore_core::Result<SecretString> {
        let passphrase = Password::new()
            .with_prompt("Identity passphrase")
            .interact()
            .map_err(|e| KeystoreError::InvalidInput(format!("Passphrase prompt failed: {}", e)))?;
        Ok(SecretString::from(passphrase))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let identity_path = match cli.identity {
        Some(path) => path,
        None => default_identity_path()?,
    };
    let backend = AgeBackend::new(identity_path);
    let mut store = KeyStore::new(&cli.path, &cli.recipient);

    match cli.command {
        Commands::List => {
            print!("{}", store.list_sites()?);
        }
        Commands::Get { site, username } => {
            let secret = store
                .site(&site)?
                .get(&username, &backend, &PromptSecret)?;
            io::stdout().write_all(&secret)?;
            io::stdout().write_all(b"\n")?;
        }
        Commands::Add { site, username } => {
            let secret = prompt_new_secret(&site, &username)?;
            if store.sites()?.contains_key(&site) {
                store
                    .site_mut(&site)?
                    .add_credential(&username, &secret, &backend)?;
            } else {
                store.create_site(&site, &username, &secret, &backend)?;
            }
            eprintln!("Stored credential for {}/{}", site, username);
        }
        Commands::Delete { site } => {
            store.delete_site(&site)?;
            eprintln!("Deleted site {}", site);
        }
    }

    Ok(())
}

/// Prompt (with confirmation) for the secret to store.
fn prompt_new_secret(site: &str, username: &str) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let secret = Password::new()
        .with_prompt(format!("Secret for {}/{}", site, username))
        .with_confirmation("Confirm secret", "Secrets do not match")
        .interact()
        .context("Secret prompt failed")?;
    Ok(Zeroizing::new(secret.into_bytes()))
}

/// Default identities file location under the XDG config directory.
fn default_identity_path() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir).join("keystore").join("identities.txt"));
        }
    }
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; pass --identity explicitly"))?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("keystore")
        .join("identities.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_get_parses_site_and_username() {
        let cli = Cli::parse_from([
            "keystore",
            "--path",
            ".passwords",
            "--recipient",
            "age1example",
            "get",
            "example.com",
            "alice",
        ]);
        match cli.command {
            Commands::Get { site, username } => {
                assert_eq!(site, "example.com");
                assert_eq!(username, "alice");
            }
            _ => panic!("expected get subcommand"),
        }
    }
}
