//! OS-entropy implementation of NetsimContext.

use crate::NetsimContext;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;

/// Context backed by OS entropy.
///
/// Every draw is independent, so runs cannot be replayed.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsContext;

impl OsContext {
    /// Creates a new OsContext.
    pub fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped context for sharing across threads.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl NetsimContext for OsContext {
    fn random_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(OsRng.gen_range(0..len))
    }

    fn derive_signing_key(&self, _seed_extension: u64) -> SigningKey {
        SigningKey::generate(&mut OsRng)
    }

    fn seed(&self) -> u64 {
        0
    }
}
