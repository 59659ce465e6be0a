//! # mixkey
//!
//! Recovery of the Blowfish archive key embedded in Westwood MIX containers.
//!
//! ## Overview
//!
//! Encrypted MIX archives carry an 80-byte key source in their header; the
//! 56-byte Blowfish key that decrypts the rest of the header is obtained by
//! raw RSA-transforming that source with a public key compiled into the
//! reader. This crate implements the whole derivation: a fixed-width
//! (2048-bit working size) big-integer engine, Barrett-style reduction
//! against the fixed modulus, square-and-multiply exponentiation, and the
//! decoder for the embedded key material.
//!
//! The archive container format itself, and whatever consumes the recovered
//! key, are out of scope — the input is an opaque byte buffer and the output
//! is a key buffer.
//!
//! ## Security model
//!
//! This is a file-format codec, not a security boundary: the transform runs
//! over public constants and locally stored archives, so no constant-time
//! hardening is attempted. Scratch buffers holding key material are zeroized
//! after use.
//!
//! ## Example
//!
//! ```
//! # fn main() -> Result<(), mixkey::KeyRecoveryError> {
//! // The 80-byte key source read from a MIX archive header.
//! let source = [0u8; 80];
//! let key = mixkey::recover_blowfish_key(&source)?;
//! assert_eq!(key.len(), mixkey::BLOWFISH_KEY_LEN);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod bignum;
mod error;
mod pubkey;
mod recover;
mod reduce;

pub use error::{KeyDecodeError, KeyRecoveryError};
pub use pubkey::{PublicKey, PUBLIC_EXPONENT};
pub use recover::{recover_blowfish_key, KeyProvider, BLOWFISH_KEY_LEN};
pub use reduce::{mod_pow, mul_mod, ReductionContext};
