//! The set of secret values the censor redacts.
//!
//! A [`SecretRegistry`] holds an immutable [`SecretSet`] behind a lock and
//! swaps it wholesale on every refresh. Readers take an `Arc` snapshot, so an
//! in-flight scan always sees one complete set.

use std::fmt;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock};

use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use tracing::debug;

use crate::error::{Error, Result};

/// An immutable, deduplicated set of secrets with a compiled matcher.
///
/// Matching is leftmost-longest: scanning left to right, the earliest secret
/// occurrence wins, and among secrets starting at the same byte the longest
/// one wins. Matches never overlap.
#[derive(Default)]
pub struct SecretSet {
    /// Longest first; ties keep first-seen order.
    secrets: Vec<Vec<u8>>,
    /// `None` exactly when `secrets` is empty.
    automaton: Option<AhoCorasick>,
}

impl fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSet")
            .field("secrets", &self.secrets.len())
            .field("longest", &self.longest_len())
            .finish_non_exhaustive()
    }
}

impl SecretSet {
    /// Build a set from raw secret values. Empty values are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SecretMatcher`] if the secrets cannot be compiled
    /// into a matcher.
    pub fn new<I, S>(secrets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut unique: Vec<Vec<u8>> = Vec::new();
        for secret in secrets {
            let secret = secret.as_ref();
            if secret.is_empty() || unique.iter().any(|s| s == secret) {
                continue;
            }
            unique.push(secret.to_vec());
        }
        // Stable, so equal lengths keep insertion order.
        unique.sort_by(|a, b| b.len().cmp(&a.len()));

        if unique.is_empty() {
            return Ok(Self::default());
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .start_kind(StartKind::Both)
            .build(&unique)
            .map_err(|source| Error::SecretMatcher { source })?;

        Ok(Self {
            secrets: unique,
            automaton: Some(automaton),
        })
    }

    /// Number of distinct secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the set holds no secrets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Byte length of the longest secret, or 0 when empty.
    #[must_use]
    pub fn longest_len(&self) -> usize {
        self.secrets.first().map_or(0, Vec::len)
    }

    /// Iterate the secrets, longest first.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.secrets.iter().map(Vec::as_slice)
    }

    /// Length of the longest secret starting at `offset` in `buffer`, if any.
    ///
    /// Only bytes inside `buffer` are considered; a secret that would run past
    /// its end does not match.
    #[must_use]
    pub fn match_at(&self, buffer: &[u8], offset: usize) -> Option<usize> {
        let automaton = self.automaton.as_ref()?;
        if offset >= buffer.len() {
            return None;
        }
        let input = Input::new(buffer).range(offset..).anchored(Anchored::Yes);
        automaton.find(input).map(|m| m.len())
    }

    /// Non-overlapping leftmost-longest secret occurrences in `haystack`.
    pub fn find_iter<'a>(
        &'a self,
        haystack: &'a [u8],
    ) -> impl Iterator<Item = Range<usize>> + 'a {
        self.automaton
            .iter()
            .flat_map(move |automaton| automaton.find_iter(haystack))
            .map(|m| m.range())
    }
}

/// A concurrency-safe, refreshable registry of secrets.
#[derive(Debug, Default)]
pub struct SecretRegistry {
    current: RwLock<Arc<SecretSet>>,
}

impl SecretRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry already holding `secrets`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SecretMatcher`] if the secrets cannot be compiled.
    pub fn with_secrets<I, S>(secrets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        Ok(Self {
            current: RwLock::new(Arc::new(SecretSet::new(secrets)?)),
        })
    }

    /// Replace the held secrets with exactly `secrets`.
    ///
    /// This is not a merge. Snapshots taken before the call keep the old set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SecretMatcher`] if the secrets cannot be compiled, in
    /// which case the held set is left unchanged.
    pub fn refresh<I, S>(&self, secrets: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let set = Arc::new(SecretSet::new(secrets)?);
        debug!(
            secrets = set.len(),
            longest = set.longest_len(),
            "Refreshed secret registry"
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = set;
        Ok(())
    }

    /// The current set. Stays valid and unchanged across later refreshes.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SecretSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Byte length of the longest current secret, or 0 when empty.
    #[must_use]
    pub fn longest_len(&self) -> usize {
        self.snapshot().longest_len()
    }

    /// Number of distinct current secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the registry currently holds no secrets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Length of the longest current secret starting at `offset`, if any.
    #[must_use]
    pub fn match_at(&self, buffer: &[u8], offset: usize) -> Option<usize> {
        self.snapshot().match_at(buffer, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(secrets: &[&str]) -> SecretSet {
        SecretSet::new(secrets).unwrap()
    }

    fn ranges(set: &SecretSet, haystack: &str) -> Vec<Range<usize>> {
        set.find_iter(haystack.as_bytes()).collect()
    }

    #[test]
    fn test_empty_set() {
        let set = SecretSet::default();
        assert!(set.is_empty());
        assert_eq!(set.longest_len(), 0);
        assert_eq!(set.match_at(b"anything", 0), None);
        assert!(ranges(&set, "anything").is_empty());
    }

    #[test]
    fn test_new_from_nothing_is_empty() {
        let set = set(&[]);
        assert!(set.is_empty());
        assert!(ranges(&set, "abc").is_empty());
    }

    #[test]
    fn test_empty_secrets_are_dropped() {
        let set = set(&["", "abc", ""]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.longest_len(), 3);
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let set = set(&["abc", "abc", "de"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ordered_longest_first() {
        let set = set(&["my", "younger", "you"]);
        let ordered: Vec<&[u8]> = set.iter().collect();
        assert_eq!(ordered, vec![&b"younger"[..], &b"you"[..], &b"my"[..]]);
    }

    #[test]
    fn test_debug_hides_secret_values() {
        let set = set(&["hunter2"]);
        let debug = format!("{set:?}");
        assert!(debug.contains("SecretSet"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_match_at_longest_wins() {
        let set = set(&["pass", "password"]);
        assert_eq!(set.match_at(b"my password!", 3), Some(8));
        assert_eq!(set.match_at(b"my pass!", 3), Some(4));
        assert_eq!(set.match_at(b"my pass!", 2), None);
    }

    #[test]
    fn test_match_at_is_anchored() {
        let set = set(&["pass"]);
        assert_eq!(set.match_at(b"xxpass", 0), None);
        assert_eq!(set.match_at(b"xxpass", 2), Some(4));
    }

    #[test]
    fn test_match_at_inside_word() {
        let set = set(&["my"]);
        assert_eq!(set.match_at(b"dummy", 3), Some(2));
    }

    #[test]
    fn test_match_at_is_case_sensitive() {
        let set = set(&["Token"]);
        assert_eq!(set.match_at(b"token", 0), None);
    }

    #[test]
    fn test_match_at_out_of_range() {
        let set = set(&["a"]);
        assert_eq!(set.match_at(b"a", 1), None);
        assert_eq!(set.match_at(b"a", 5), None);
    }

    #[test]
    fn test_match_at_does_not_run_past_buffer() {
        let set = set(&["secret"]);
        assert_eq!(set.match_at(b"xxsecr", 2), None);
    }

    #[test]
    fn test_find_iter_leftmost_longest() {
        let set = set(&["pass", "password", "word"]);
        assert_eq!(ranges(&set, "a password"), vec![2..10]);
        assert_eq!(ranges(&set, "passwort"), vec![0..4]);
    }

    #[test]
    fn test_find_iter_earlier_start_beats_longer() {
        let set = set(&["abc", "bcdef"]);
        assert_eq!(ranges(&set, "abcdef"), vec![0..3]);
    }

    #[test]
    fn test_find_iter_adjacent_matches() {
        let set = set(&["ab"]);
        assert_eq!(ranges(&set, "ababxab"), vec![0..2, 2..4, 5..7]);
    }

    #[test]
    fn test_many_secrets() {
        let secrets: Vec<String> = (0..300).map(|i| format!("token-{i:04}")).collect();
        let set = SecretSet::new(&secrets).unwrap();
        assert_eq!(set.len(), 300);
        assert_eq!(ranges(&set, "a token-0299 b token-0007"), vec![2..12, 15..25]);
    }

    #[test]
    fn test_registry_default_is_empty() {
        let registry = SecretRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.match_at(b"abc", 0), None);
    }

    #[test]
    fn test_registry_refresh_replaces() {
        let registry = SecretRegistry::with_secrets(["alpha", "beta"]).unwrap();
        assert_eq!(registry.len(), 2);

        registry.refresh(["gamma"]).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.match_at(b"alpha", 0), None);
        assert_eq!(registry.match_at(b"gamma", 0), Some(5));
    }

    #[test]
    fn test_registry_snapshot_survives_refresh() {
        let registry = SecretRegistry::with_secrets(["old-secret"]).unwrap();
        let before = registry.snapshot();

        registry.refresh(["new"]).unwrap();
        assert_eq!(before.longest_len(), 10);
        assert_eq!(registry.longest_len(), 3);
    }

    #[test]
    fn test_registry_empty() {
        let registry = SecretRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.longest_len(), 0);
    }

    #[test]
    fn test_registry_refresh_concurrent_with_reads() {
        let registry = Arc::new(SecretRegistry::with_secrets(["aaaa", "bbbb"]).unwrap());
        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    registry.refresh(["cc", "dd"]).unwrap();
                    registry.refresh(["aaaa", "bbbb"]).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let set = registry.snapshot();
            let lens: Vec<usize> = set.iter().map(<[u8]>::len).collect();
            assert!(lens == vec![4, 4] || lens == vec![2, 2]);
            assert_eq!(set.find_iter(b"aaaacc").count(), 1);
        }
        writer.join().unwrap();
    }
}
