//! `logcensor` - Scrub known secret values from CI logs and artifacts
//!
//! This library provides a streaming censor that replaces every occurrence of
//! a known secret with a same-length run of `*`, using bounded memory and
//! without missing secrets that straddle read boundaries, plus the machinery
//! to censor whole directory trees in place.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod censor;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod redact;
pub mod secrets;

pub use censor::{censor, censor_bytes, CensorStats, DEFAULT_BUFFER_SIZE, REDACTION_BYTE};
pub use config::Config;
pub use error::{Error, Result, StreamSide};
pub use logging::init_logging;
pub use redact::{CensoringConfig, Redactor, RunSummary};
pub use secrets::{DirectorySecretLoader, SecretLoader, SecretRegistry};
