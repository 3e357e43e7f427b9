//! Loading secret values from mounted secret directories.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Source of the plain-text secret values fed into the registry.
pub trait SecretLoader: Send + Sync {
    /// Load every secret found under `directories`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or secret file cannot be read.
    fn load(&self, directories: &[PathBuf]) -> Result<Vec<Vec<u8>>>;
}

/// Loads one secret per regular file beneath each directory.
///
/// Names starting with `..` are skipped; Kubernetes uses them for the
/// timestamped payload directories behind projected volumes, and the real
/// files are reachable through the top-level symlinks.
#[derive(Debug, Clone, Default)]
pub struct DirectorySecretLoader {
    include_base64: bool,
}

impl DirectorySecretLoader {
    /// Create a loader that returns secrets exactly as found.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also emit the standard base64 encoding of every secret.
    #[must_use]
    pub fn with_base64(mut self, include: bool) -> Self {
        self.include_base64 = include;
        self
    }

    fn load_dir(&self, dir: &Path, secrets: &mut Vec<Vec<u8>>) -> Result<()> {
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_volume_internal(e.file_name()));

        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(dir).to_path_buf();
                Error::SecretSource {
                    path,
                    source: err.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let raw = std::fs::read(entry.path()).map_err(|source| Error::SecretSource {
                path: entry.path().to_path_buf(),
                source,
            })?;
            let value = raw.trim_ascii();
            if value.is_empty() {
                trace!(path = %entry.path().display(), "Skipping empty secret file");
                continue;
            }

            secrets.push(value.to_vec());
            if self.include_base64 {
                secrets.push(STANDARD.encode(value).into_bytes());
            }
        }
        Ok(())
    }
}

impl SecretLoader for DirectorySecretLoader {
    fn load(&self, directories: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
        let mut secrets = Vec::new();
        for dir in directories {
            if !dir.is_dir() {
                return Err(Error::SecretSource {
                    path: dir.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "not a readable directory",
                    ),
                });
            }
            let before = secrets.len();
            self.load_dir(dir, &mut secrets)?;
            debug!(
                dir = %dir.display(),
                loaded = secrets.len() - before,
                "Loaded secrets"
            );
        }
        Ok(secrets)
    }
}

/// A fixed list of secrets, ignoring the directories it is given.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets(pub Vec<Vec<u8>>);

impl SecretLoader for StaticSecrets {
    fn load(&self, _directories: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
        Ok(self.0.clone())
    }
}

fn is_volume_internal(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with(".."))
}
