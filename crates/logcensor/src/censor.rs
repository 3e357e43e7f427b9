//! Streaming censor engine.
//!
//! Copies a byte source to a byte sink, replacing every occurrence of a known
//! secret with a same-length run of [`REDACTION_BYTE`]. Input is processed in
//! bounded chunks. A match is only committed once enough bytes follow its
//! start that no earlier or longer secret could still appear there; the
//! undecided tail (shorter than the longest secret) is held back and rescanned
//! with the next read, so chunk alignment never changes the output.

use std::io::{ErrorKind, Read, Write};

use serde::Serialize;
use tracing::trace;

use crate::error::{Error, Result};
use crate::secrets::{SecretRegistry, SecretSet};

/// The byte written in place of every byte of a matched secret.
pub const REDACTION_BYTE: u8 = b'*';

/// Buffer size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 500;

const MASK: [u8; 64] = [REDACTION_BYTE; 64];

/// Counters for a single censoring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CensorStats {
    /// Bytes read from the source (and written to the sink).
    pub bytes: u64,
    /// Secret occurrences replaced.
    pub redactions: u64,
}

impl std::ops::AddAssign for CensorStats {
    fn add_assign(&mut self, rhs: Self) {
        self.bytes += rhs.bytes;
        self.redactions += rhs.redactions;
    }
}

/// The window actually used for a configured buffer size.
///
/// Always at least one byte longer than the longest secret, so a carried
/// partial match plus one fresh byte always fits.
#[must_use]
pub fn effective_buffer_size(buffer_size: usize, longest_secret: usize) -> usize {
    buffer_size.max(longest_secret + 1)
}

/// Censor `source` into `sink` using the secrets in `registry`.
///
/// `buffer_size` is a floor on the read window; see [`effective_buffer_size`].
/// The registry is re-read before every chunk, so a concurrent refresh applies
/// to everything not yet scanned. Both ends are dropped (closed) when this
/// returns, whatever the outcome.
///
/// # Errors
///
/// Returns [`Error::Stream`] tagged with the failing side as soon as a read or
/// write fails. Output already written is not rolled back.
pub fn censor<R, W>(
    mut source: R,
    mut sink: W,
    registry: &SecretRegistry,
    buffer_size: usize,
) -> Result<CensorStats>
where
    R: Read,
    W: Write,
{
    let mut stats = CensorStats::default();
    let mut buf: Vec<u8> = Vec::new();
    // Bytes at the front of `buf` that are carried over or freshly read.
    let mut filled = 0;

    loop {
        let secrets = registry.snapshot();
        let window = effective_buffer_size(buffer_size, secrets.longest_len());
        // A refresh can shrink the window below what is already carried.
        let end = window.max(filled + 1);
        if buf.len() < end {
            buf.resize(end, 0);
        }

        let read = read_some(&mut source, &mut buf[filled..end])?;
        filled += read;
        stats.bytes += read as u64;
        let more_input = read > 0;

        let consumed = scan(&secrets, &buf[..filled], more_input, &mut sink, &mut stats)?;
        if consumed < filled {
            trace!(carried = filled - consumed, "Carrying undecided tail");
            buf.copy_within(consumed..filled, 0);
        }
        filled -= consumed;

        if !more_input {
            break;
        }
    }

    sink.flush().map_err(Error::write)?;
    Ok(stats)
}

/// Censor an in-memory buffer in one pass.
#[must_use]
pub fn censor_bytes(input: &[u8], secrets: &SecretSet) -> Vec<u8> {
    let mut output = input.to_vec();
    for range in secrets.find_iter(input) {
        output[range].fill(REDACTION_BYTE);
    }
    output
}

/// First offset in a `len`-byte window at which a match cannot be decided yet.
///
/// A secret starting before it fits entirely inside the window, so neither a
/// longer secret from the same start nor an earlier one can still appear.
fn decision_horizon(len: usize, longest_secret: usize, more_input: bool) -> usize {
    if more_input {
        (len + 1).saturating_sub(longest_secret).min(len)
    } else {
        len
    }
}

/// Scan `data`, writing everything that can be decided to `sink`.
///
/// Returns how many leading bytes were consumed; the rest must be rescanned
/// together with more input.
fn scan<W: Write>(
    secrets: &SecretSet,
    data: &[u8],
    more_input: bool,
    sink: &mut W,
    stats: &mut CensorStats,
) -> Result<usize> {
    let horizon = decision_horizon(data.len(), secrets.longest_len(), more_input);
    let mut plain_from = 0;

    for range in secrets.find_iter(data) {
        if range.start >= horizon {
            break;
        }
        sink.write_all(&data[plain_from..range.start]).map_err(Error::write)?;
        write_mask(sink, range.len())?;
        stats.redactions += 1;
        plain_from = range.end;
    }

    let consumed = plain_from.max(horizon);
    sink.write_all(&data[plain_from..consumed]).map_err(Error::write)?;
    Ok(consumed)
}

fn write_mask<W: Write>(sink: &mut W, mut len: usize) -> Result<()> {
    while len > 0 {
        let n = len.min(MASK.len());
        sink.write_all(&MASK[..n]).map_err(Error::write)?;
        len -= n;
    }
    Ok(())
}

fn read_some<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match source.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::read(e)),
        }
    }
}
