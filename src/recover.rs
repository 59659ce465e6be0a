//! The key-recovery pipeline.
//!
//! Splits the key source into modulus-sized blocks, raw-transforms each
//! block with the public exponent, and concatenates the results into the
//! 56-byte Blowfish key. The decoded public key and its reduction context
//! are built once per process and shared read-only afterwards.

use once_cell::sync::OnceCell;
use tracing::trace;
use zeroize::Zeroize;

use crate::bignum::{self, NUM_WORDS};
use crate::error::{KeyDecodeError, KeyRecoveryError};
use crate::pubkey::{PublicKey, EMBEDDED_KEY};
use crate::reduce::{mod_pow, ReductionContext};

/// Length of the recovered Blowfish key in bytes.
pub const BLOWFISH_KEY_LEN: usize = 56;

// Concatenated block output never exceeds this for any modulus that fits
// the working width.
const OUT_CAP: usize = 256;

/// A decoded public key paired with its reduction context.
///
/// Construct one explicitly for test isolation, or use [`KeyProvider::shared`]
/// for the process-wide instance backing [`recover_blowfish_key`].
pub struct KeyProvider {
    key: PublicKey,
    ctx: ReductionContext,
}

impl KeyProvider {
    /// Build a provider from the compiled-in key.
    pub fn new() -> Result<Self, KeyDecodeError> {
        Self::from_encoded(EMBEDDED_KEY)
    }

    /// Build a provider from a key string over the key alphabet.
    pub fn from_encoded(encoded: &str) -> Result<Self, KeyDecodeError> {
        let key = PublicKey::decode(encoded)?;
        let ctx = ReductionContext::new(key.modulus());
        Ok(Self { key, ctx })
    }

    /// The process-wide provider, decoded on first use and reused for the
    /// program's lifetime. Subsequent calls are a no-op returning the same
    /// instance.
    pub fn shared() -> Result<&'static KeyProvider, KeyDecodeError> {
        static SHARED: OnceCell<KeyProvider> = OnceCell::new();
        SHARED.get_or_try_init(KeyProvider::new)
    }

    /// The decoded public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// Content bytes produced per block.
    pub fn block_len(&self) -> usize {
        (self.key.bits() - 1) / 8
    }

    /// Exact number of input bytes the block loop consumes: enough strides
    /// of `block_len + 1` bytes to decode at least 56 output bytes.
    pub fn source_len(&self) -> usize {
        let block = self.block_len();
        (55 / block + 1) * (block + 1)
    }

    /// Recover the 56-byte Blowfish key from a key source buffer.
    ///
    /// Inputs shorter than [`source_len`](Self::source_len) fail with
    /// [`KeyRecoveryError::ShortInput`] rather than producing a partially
    /// undefined key. Extra trailing bytes are ignored.
    pub fn recover(&self, src: &[u8]) -> Result<[u8; BLOWFISH_KEY_LEN], KeyRecoveryError> {
        let block = self.block_len();
        let stride = block + 1;
        let need = self.source_len();
        if src.len() < need {
            return Err(KeyRecoveryError::ShortInput {
                got: src.len(),
                need,
            });
        }

        let mut out = [0u8; OUT_CAP];
        let mut remaining = need;
        let mut src_at = 0;
        let mut out_at = 0;
        while stride <= remaining {
            let mut block_words = [0u32; NUM_WORDS];
            bignum::load_le_bytes(&mut block_words, &src[src_at..src_at + stride]);
            let mut transformed = mod_pow(&block_words, self.key.exponent(), &self.ctx);
            bignum::store_le_bytes(&mut out[out_at..out_at + block], &transformed);
            block_words.zeroize();
            transformed.zeroize();
            trace!(offset = src_at, "transformed key block");

            remaining -= stride;
            src_at += stride;
            out_at += block;
        }

        let mut key = [0u8; BLOWFISH_KEY_LEN];
        key.copy_from_slice(&out[..BLOWFISH_KEY_LEN]);
        out.zeroize();
        Ok(key)
    }
}

/// Recover the 56-byte Blowfish key from a MIX archive's key source using
/// the process-wide provider.
pub fn recover_blowfish_key(src: &[u8]) -> Result<[u8; BLOWFISH_KEY_LEN], KeyRecoveryError> {
    KeyProvider::shared()?.recover(src)
}
