//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::Config;

/// Secret source flags shared by commands that censor.
#[derive(Debug, Clone, Default, Args)]
pub struct SecretArgs {
    /// Directory of secret files, one secret per file (repeatable)
    #[arg(short = 's', long = "secret-dir", value_name = "DIR")]
    pub secret_dirs: Vec<PathBuf>,

    /// Do not censor base64-encoded forms of the secrets
    #[arg(long)]
    pub no_base64: bool,

    /// Read buffer size in bytes
    #[arg(short, long, value_name = "BYTES")]
    pub buffer_size: Option<NonZeroUsize>,
}

impl SecretArgs {
    /// Merge these flags over a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        config
            .secrets
            .directories
            .extend(self.secret_dirs.iter().cloned());
        if self.no_base64 {
            config.secrets.include_base64 = false;
        }
        if let Some(size) = self.buffer_size {
            config.censor.buffer_size = Some(size.get());
        }
    }
}

/// Run command arguments.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// File or directory to censor in place (repeatable)
    #[arg(short, long = "target", value_name = "PATH")]
    pub targets: Vec<PathBuf>,

    /// Secret source options
    #[command(flatten)]
    pub secrets: SecretArgs,

    /// Number of files to censor at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Print the run summary as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl RunCommand {
    /// Merge these flags over a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        config.targets.artifacts.extend(self.targets.iter().cloned());
        self.secrets.apply(config);
        if let Some(n) = self.concurrency {
            config.censor.concurrency = n.get();
        }
    }
}

/// Stream command arguments.
#[derive(Debug, Args)]
pub struct StreamCommand {
    /// Secret source options
    #[command(flatten)]
    pub secrets: SecretArgs,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
