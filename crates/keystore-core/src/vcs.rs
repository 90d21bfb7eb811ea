//! Version-control binding for the keystore.
//!
//! An optional capability that durably records each change to the store's
//! files as a commit. The store never owns the repository lifecycle; it
//! only stages and commits through this narrow interface.

use std::path::{Path, PathBuf};

use crate::error::{KeystoreError, Result};

/// Commit message used for every credential update.
pub const COMMIT_MESSAGE: &str = "Updated key";

/// Records new or changed encrypted files.
pub trait VersionControl {
    /// Stage a file for the next commit.
    fn stage(&self, path: &Path) -> Result<()>;

    /// Commit everything staged with the given message.
    fn commit(&self, message: &str) -> Result<()>;
}

/// Git-backed version control using libgit2.
pub struct GitBinding {
    repo: git2::Repository,
}

impl GitBinding {
    /// Open the repository enclosing a site directory.
    ///
    /// The repository is expected one level above the site directory, i.e.
    /// at the keystore root. Returns `None` when no repository is present;
    /// absence of version control is not an error.
    pub fn discover(site_dir: &Path) -> Option<Self> {
        let parent = site_dir.parent()?;
        match git2::Repository::open(parent) {
            Ok(repo) => Some(Self { repo }),
            Err(_) => None,
        }
    }

    /// Open the repository at `workdir` directly.
    pub fn open(workdir: &Path) -> Result<Self> {
        let repo = git2::Repository::open(workdir)?;
        Ok(Self { repo })
    }

    fn workdir(&self) -> Result<PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| KeystoreError::Vcs("Repository has no working directory".to_string()))?;
        Ok(workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf()))
    }
}

impl VersionControl for GitBinding {
    fn stage(&self, path: &Path) -> Result<()> {
        let workdir = self.workdir()?;
        let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let relative = absolute.strip_prefix(&workdir).map_err(|_| {
            KeystoreError::Vcs(format!(
                "{} is outside the repository working directory",
                path.display()
            ))
        })?;

        let mut index = self.repo.index()?;
        index.add_path(relative)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;

        // HEAD is unborn in a fresh repository; the first commit has no parent.
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(())
    }
}
