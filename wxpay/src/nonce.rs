//! Nonce generation for request records.
//!
//! Every request carries a fresh `nonce_str`. The value only has to be
//! collision resistant at the expected call rate, not unpredictable.

use rand::distr::Alphanumeric;
use rand::{RngExt, rng};

/// Length of generated nonces. The gateway accepts at most 32 characters.
pub const NONCE_LEN: usize = 32;

/// Supplies `nonce_str` values.
pub trait NonceSource: Send + Sync {
    /// Returns a nonce that has not been handed out before.
    fn nonce(&self) -> String;
}

/// [`NonceSource`] drawing alphanumeric characters from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn nonce(&self) -> String {
        random_nonce()
    }
}

/// Generates a [`NONCE_LEN`]-character alphanumeric nonce.
#[must_use]
pub fn random_nonce() -> String {
    rng()
        .sample_iter(Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}
