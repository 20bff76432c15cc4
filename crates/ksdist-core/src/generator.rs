//! Keyed keystream generator abstraction.
//!
//! Every generator under test implements [`KeystreamGenerator`]: construction
//! from a key, sequential emission, and an `advance` that performs the same
//! state transition as emission without producing output. Implementations
//! also carry a self-test against published vectors which must pass before
//! any trial runs.

use crate::error::{Error, Result};

/// Longest key a trial may request. Trial keys live in a fixed buffer of
/// this size so the trial loop never allocates.
pub const MAX_KEY_LEN: usize = 256;

pub trait KeystreamGenerator: Sized + 'static {
    /// Short name used in logs and errors.
    const NAME: &'static str;

    /// Key length the self-test validates.
    const KEY_LEN: usize;

    /// Run the key schedule. `key` must be non-empty.
    fn from_key(key: &[u8]) -> Self;

    /// Write the next `out.len()` keystream bytes.
    fn fill(&mut self, out: &mut [u8]);

    /// Step the state `n` times, discarding output.
    fn advance(&mut self, n: usize);

    /// Compare output against reference vectors.
    fn self_test() -> Result<()>;

    /// Emit `N` bytes into a fresh array.
    fn emit<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        self.fill(&mut out);
        out
    }
}

/// What to do with a trial key length the generator was never validated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyLengthPolicy {
    /// Log a warning once and proceed.
    #[default]
    Warn,
    /// Refuse to run.
    Reject,
}

/// Validate a trial key length for generator `G` under `policy`.
///
/// Empty keys and keys longer than [`MAX_KEY_LEN`] are always usage errors.
pub fn check_key_len<G: KeystreamGenerator>(len: usize, policy: KeyLengthPolicy) -> Result<()> {
    if len == 0 || len > MAX_KEY_LEN {
        return Err(Error::Usage(format!(
            "key length must be between 1 and {MAX_KEY_LEN} bytes, got {len}"
        )));
    }
    if len == G::KEY_LEN {
        return Ok(());
    }
    match policy {
        KeyLengthPolicy::Warn => {
            log::warn!(
                "{} not yet tested with key length {len} (self-test covers {} bytes)",
                G::NAME,
                G::KEY_LEN
            );
            Ok(())
        }
        KeyLengthPolicy::Reject => Err(Error::KeyLength {
            generator: G::NAME,
            len,
            expected: G::KEY_LEN,
        }),
    }
}
