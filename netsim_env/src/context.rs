//! Randomness context trait for the node registry.

use ed25519_dalek::SigningKey;

/// The source of every random decision made by the registry and network.
///
/// # Implementations
///
/// - **Exploration**: `OsContext` - OS entropy, never reproducible
/// - **Simulation**: `SimContext` - `ChaCha8Rng(seed)`, replayable by seed
///
/// # Determinism
///
/// Implementations must be safe to share between threads; concurrent
/// draws are serialized but their interleaving is up to the caller.
pub trait NetsimContext: Send + Sync + 'static {
    /// Draws a uniformly distributed index in `0..len`.
    ///
    /// Returns `None` when `len` is zero instead of sampling an empty range.
    fn random_index(&self, len: usize) -> Option<usize>;

    /// Generates a node identity key from a seed extension.
    ///
    /// The implementation combines its seed with `seed_extension`
    /// to derive unique but reproducible keys.
    ///
    /// # Arguments
    /// * `seed_extension` - A value to combine with the global seed
    fn derive_signing_key(&self, seed_extension: u64) -> SigningKey;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// Unseeded contexts return 0.
    fn seed(&self) -> u64;
}
