//! Censoring files in place.
//!
//! A [`Redactor`] loads secrets into its own [`SecretRegistry`], resolves the
//! configured targets into a flat list of regular files and censors each one
//! through a temporary file that is renamed over the original only after the
//! engine succeeds.
//!
//! Failure policy: configuration problems (missing target, unreadable secret
//! directory) abort before any file is opened. Per-file failures do not stop
//! the run; every file is attempted and the failures are reported together,
//! in resolution order, as [`Error::PartialRun`].

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

use crate::censor::{censor, effective_buffer_size, CensorStats, DEFAULT_BUFFER_SIZE};
use crate::error::{Error, FileFailure, Result};
use crate::secrets::{DirectorySecretLoader, SecretLoader, SecretRegistry};

/// Default number of files censored at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// What to censor and with which secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensoringConfig {
    /// Files and directories to censor, in order.
    pub targets: Vec<PathBuf>,
    /// Directories holding one secret per file.
    pub secret_directories: Vec<PathBuf>,
    /// Also censor the base64 encoding of every secret.
    pub include_base64: bool,
    /// Read buffer floor. `None` uses [`DEFAULT_BUFFER_SIZE`].
    pub buffer_size: Option<usize>,
    /// Maximum files censored at once.
    pub concurrency: usize,
}

impl Default for CensoringConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            secret_directories: Vec::new(),
            include_base64: true,
            buffer_size: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl CensoringConfig {
    /// The configured buffer size, or the default.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE)
    }
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Distinct secrets loaded into the registry.
    pub secrets: usize,
    /// Files censored.
    pub files: usize,
    /// Bytes processed across all files.
    pub bytes: u64,
    /// Secret occurrences replaced across all files.
    pub redactions: u64,
}

/// Censors every file under a set of targets for one run.
#[derive(Debug)]
pub struct Redactor<L = DirectorySecretLoader> {
    config: CensoringConfig,
    loader: L,
    registry: Arc<SecretRegistry>,
}

impl Redactor<DirectorySecretLoader> {
    /// Create a redactor that reads secrets from the configured directories.
    #[must_use]
    pub fn new(config: CensoringConfig) -> Self {
        let loader = DirectorySecretLoader::new().with_base64(config.include_base64);
        Self::with_loader(config, loader)
    }
}

impl<L: SecretLoader> Redactor<L> {
    /// Create a redactor with a custom secret loader.
    #[must_use]
    pub fn with_loader(config: CensoringConfig, loader: L) -> Self {
        Self {
            config,
            loader,
            registry: Arc::new(SecretRegistry::new()),
        }
    }

    /// The registry this redactor censors with.
    #[must_use]
    pub fn registry(&self) -> &SecretRegistry {
        &self.registry
    }

    /// Load all secrets and replace the registry contents with them.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if any secret directory cannot be read, or
    /// [`Error::SecretMatcher`] if the secrets cannot be compiled.
    pub fn load_secrets(&self) -> Result<usize> {
        let secrets = self.loader.load(&self.config.secret_directories)?;
        self.registry.refresh(&secrets)?;
        Ok(self.registry.len())
    }

    /// Resolve the configured targets into a deduplicated list of files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetNotFound`] for a missing target and
    /// [`Error::Walk`] if a directory cannot be traversed.
    pub fn resolve_targets(&self) -> Result<Vec<PathBuf>> {
        resolve_targets(&self.config.targets)
    }

    /// Load secrets, then censor every target file in place.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before touching any file, or
    /// [`Error::PartialRun`] listing every file that could not be censored.
    pub async fn censor_all(&self) -> Result<RunSummary> {
        let secrets = self.load_secrets()?;
        let files = self.resolve_targets()?;
        let buffer_size = self.config.buffer_size();
        info!(
            secrets,
            files = files.len(),
            buffer_size = effective_buffer_size(buffer_size, self.registry.longest_len()),
            "Censoring targets"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, path) in files.iter().cloned().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::internal(e.to_string()))?;
            let registry = Arc::clone(&self.registry);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = censor_file(&path, &registry, buffer_size);
                (index, result)
            });
        }

        let mut outcomes = Vec::with_capacity(files.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| Error::internal(format!("censor task failed: {e}")))?);
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let mut summary = RunSummary {
            secrets,
            ..RunSummary::default()
        };
        let mut totals = CensorStats::default();
        let mut failures = Vec::new();
        for (index, result) in outcomes {
            match result {
                Ok(stats) => {
                    summary.files += 1;
                    totals += stats;
                }
                Err(error) => {
                    let path = files[index].clone();
                    warn!(path = %path.display(), error = %error, "Failed to censor file");
                    failures.push(FileFailure { path, error });
                }
            }
        }
        summary.bytes = totals.bytes;
        summary.redactions = totals.redactions;

        if failures.is_empty() {
            info!(
                files = summary.files,
                redactions = summary.redactions,
                "Censoring complete"
            );
            Ok(summary)
        } else {
            Err(Error::PartialRun {
                failures,
                total: files.len(),
            })
        }
    }
}

/// Flatten targets into regular files, walking directories recursively.
///
/// Files keep first-seen order; a file reached twice is listed once. Symlinks
/// found while walking are not followed and not censored.
///
/// # Errors
///
/// Returns [`Error::TargetNotFound`] for a missing target and [`Error::Walk`]
/// if a directory cannot be traversed.
pub fn resolve_targets(targets: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    let mut push = |path: PathBuf| {
        let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            files.push(path);
        }
    };

    for target in targets {
        let metadata = std::fs::metadata(target).map_err(|_| Error::TargetNotFound {
            path: target.clone(),
        })?;
        if !metadata.is_dir() {
            push(target.clone());
            continue;
        }

        for entry in WalkDir::new(target).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                path: target.clone(),
                source,
            })?;
            let file_type = entry.file_type();
            if file_type.is_file() {
                push(entry.into_path());
            } else if !file_type.is_dir() {
                trace!(path = %entry.path().display(), "Skipping non-regular file");
            }
        }
    }

    debug!(files = files.len(), "Resolved censoring targets");
    Ok(files)
}

/// Censor one file in place.
///
/// Output goes to a temporary file next to the original, which replaces the
/// original only after censoring succeeds. On any earlier error the temporary
/// file is removed and the original is left as it was.
///
/// # Errors
///
/// Returns the failure wrapped in [`Error::File`] naming `path`.
pub fn censor_file(
    path: &Path,
    registry: &SecretRegistry,
    buffer_size: usize,
) -> Result<CensorStats> {
    replace_censored(path, registry, buffer_size).map_err(|e| e.in_file(path))
}

fn replace_censored(
    path: &Path,
    registry: &SecretRegistry,
    buffer_size: usize,
) -> Result<CensorStats> {
    let source = File::open(path).map_err(Error::read)?;
    let permissions = source.metadata().map_err(Error::read)?.permissions();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|source| Error::Replace {
        path: path.to_path_buf(),
        source,
    })?;

    let stats = censor(
        BufReader::new(source),
        BufWriter::new(temp.as_file_mut()),
        registry,
        buffer_size,
    )?;
    temp.as_file().sync_all().map_err(Error::write)?;

    temp.as_file()
        .set_permissions(permissions)
        .map_err(|source| Error::Replace {
            path: path.to_path_buf(),
            source,
        })?;
    temp.persist(path).map_err(|e| Error::Replace {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!(
        path = %path.display(),
        bytes = stats.bytes,
        redactions = stats.redactions,
        "Censored file"
    );
    Ok(stats)
}
