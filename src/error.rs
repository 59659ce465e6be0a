//! Error taxonomy for the decoder and pipeline boundary.
//!
//! The arithmetic primitives are total and never fail; everything that can
//! go wrong lives at the edges — malformed embedded key material, or too
//! little ciphertext to fill the key buffer.

use thiserror::Error;

/// Failure to decode the embedded public-key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    /// A character outside the key alphabet.
    #[error("character {0:?} is not in the key alphabet")]
    InvalidCharacter(char),

    /// The key material ended before the DER structure was complete.
    #[error("key material is truncated or empty")]
    TruncatedKeyData,

    /// The decoded bytes do not start with a DER INTEGER.
    #[error("expected DER INTEGER tag 0x02, found {0:#04x}")]
    UnexpectedTag(u8),

    /// The integer does not fit the fixed 2048-bit working width.
    #[error("modulus does not fit the fixed 256-byte working width")]
    OversizedModulus,

    /// The modulus is too small to seed the reduction machinery.
    #[error("modulus spans fewer than two words and cannot drive reduction")]
    UnusableModulus,
}

/// Failure of the key-recovery pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyRecoveryError {
    /// The embedded key material could not be decoded.
    #[error(transparent)]
    Decode(#[from] KeyDecodeError),

    /// Not enough input bytes to produce all 56 key bytes.
    #[error("key source is {got} bytes, {need} are required")]
    ShortInput {
        /// Bytes supplied by the caller.
        got: usize,
        /// Bytes the block loop must consume.
        need: usize,
    },
}
