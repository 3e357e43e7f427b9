//! Secret values and where they come from.
//!
//! - **Registry**: [`SecretRegistry`] holds the current [`SecretSet`] and swaps
//!   it atomically on refresh, so censoring threads never see a half-updated set.
//!
//! - **Loading**: [`SecretLoader`] produces raw secret values;
//!   [`DirectorySecretLoader`] reads them from mounted secret volumes.
//!
//! # Example
//!
//! ```
//! use logcensor::secrets::SecretRegistry;
//!
//! # fn main() -> logcensor::Result<()> {
//! let registry = SecretRegistry::new();
//! registry.refresh(["younger", "my"])?;
//!
//! assert_eq!(registry.longest_len(), 7);
//! assert_eq!(registry.match_at(b"In my youth", 3), Some(2));
//!
//! let set = registry.snapshot();
//! let found: Vec<_> = set.find_iter(b"my younger self").collect();
//! assert_eq!(found, vec![0..2, 3..10]);
//! # Ok(())
//! # }
//! ```

mod loader;
mod registry;

pub use loader::{DirectorySecretLoader, SecretLoader, StaticSecrets};
pub use registry::{SecretRegistry, SecretSet};
