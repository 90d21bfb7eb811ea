//! Filesystem utilities for atomic credential writes.

use std::fs;
use std::io;
use std::path::Path;

/// Atomically replace `destination` with `temp_path`.
///
/// Credential files are written to a sibling temp path first so that a
/// crash mid-write never leaves torn ciphertext at the destination. On some
/// platforms (notably Windows), `fs::rename` fails if the destination
/// already exists; this function removes the destination and retries.
///
/// If the rename ultimately fails, the temp file is cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn atomic_replace(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_replace_new_file() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("alice.asc.tmp");
        let dest = dir.path().join("alice.asc");

        File::create(&temp).unwrap().write_all(b"ciphertext").unwrap();

        atomic_replace(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert!(dest.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"ciphertext");
    }

    #[test]
    fn test_replace_overwrites_existing() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("alice.asc.tmp");
        let dest = dir.path().join("alice.asc");

        File::create(&dest).unwrap().write_all(b"old").unwrap();
        File::create(&temp).unwrap().write_all(b"new").unwrap();

        atomic_replace(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }
}
