//! Embedded public-key decoding.
//!
//! The key ships as a compile-time constant string over a private 6-bit
//! alphabet (structurally base64: four characters pack into three bytes, but
//! the mapping is a fixed 256-entry table, not a general decoder). The
//! decoded bytes are a DER INTEGER holding the RSA modulus; the public
//! exponent is fixed.

use tracing::debug;

use crate::bignum::{self, Bignum, NUM_WORDS};
use crate::error::KeyDecodeError;

/// The compiled-in public key over the private alphabet.
pub(crate) const EMBEDDED_KEY: &str = "AihRvNoIbTn85FZRYNZRcT+i6KpU+maCsEqr3Q5q+LDB5tH7Tz2qQ38V";

/// The fixed public exponent used by the raw transform.
pub const PUBLIC_EXPONENT: u32 = 0x10001;

/// Character-to-value table for the key alphabet; -1 marks invalid bytes.
const CHAR_VALUES: [i8; 256] = [
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 62, -1, -1, -1, 63,
    52, 53, 54, 55, 56, 57, 58, 59, 60, 61, -1, -1, -1, -1, -1, -1,
    -1,  0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14,
    15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, -1, -1, -1, -1, -1,
    -1, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40,
    41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
    -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1,
];

/// Decode a string over the key alphabet into raw bytes, four characters to
/// three bytes.
pub(crate) fn decode_alphabet(encoded: &str) -> Result<Vec<u8>, KeyDecodeError> {
    let raw = encoded.as_bytes();
    if raw.is_empty() || raw.len() % 4 != 0 {
        return Err(KeyDecodeError::TruncatedKeyData);
    }
    let mut out = Vec::with_capacity(raw.len() / 4 * 3);
    for group in raw.chunks_exact(4) {
        let mut acc = 0u32;
        for &c in group {
            let v = CHAR_VALUES[c as usize];
            if v < 0 {
                return Err(KeyDecodeError::InvalidCharacter(c as char));
            }
            acc = (acc << 6) | v as u32;
        }
        out.push((acc >> 16) as u8);
        out.push((acc >> 8) as u8);
        out.push(acc as u8);
    }
    Ok(out)
}

/// Parse a DER INTEGER into the fixed word width.
///
/// Content bytes are big-endian; they land byte-reversed in the word array,
/// with the bytes above filled from the DER sign convention (the top bit of
/// the first content byte).
pub(crate) fn parse_der_integer(data: &[u8]) -> Result<Bignum, KeyDecodeError> {
    let (&tag, rest) = data.split_first().ok_or(KeyDecodeError::TruncatedKeyData)?;
    if tag != 0x02 {
        return Err(KeyDecodeError::UnexpectedTag(tag));
    }
    let (&first, rest) = rest.split_first().ok_or(KeyDecodeError::TruncatedKeyData)?;

    let (content_len, content) = if first & 0x80 != 0 {
        let len_bytes = (first & 0x7F) as usize;
        if len_bytes > 4 {
            return Err(KeyDecodeError::OversizedModulus);
        }
        if rest.len() < len_bytes {
            return Err(KeyDecodeError::TruncatedKeyData);
        }
        let mut l = 0usize;
        for &b in &rest[..len_bytes] {
            l = (l << 8) | b as usize;
        }
        (l, &rest[len_bytes..])
    } else {
        (first as usize, rest)
    };

    if content_len == 0 {
        return Err(KeyDecodeError::TruncatedKeyData);
    }
    if content_len > NUM_WORDS * 4 {
        return Err(KeyDecodeError::OversizedModulus);
    }
    if content.len() < content_len {
        return Err(KeyDecodeError::TruncatedKeyData);
    }
    let content = &content[..content_len];

    let mut words = [0u32; NUM_WORDS];
    for (i, &b) in content.iter().rev().enumerate() {
        words[i / 4] |= u32::from(b) << (8 * (i % 4));
    }
    if content[0] & 0x80 != 0 {
        for i in content_len..NUM_WORDS * 4 {
            words[i / 4] |= 0xFF << (8 * (i % 4));
        }
    }
    Ok(words)
}

/// The decoded public key: modulus, fixed exponent, and the block-sizing
/// bit index.
#[derive(Clone, Debug)]
pub struct PublicKey {
    modulus: Bignum,
    exponent: Bignum,
    bits: usize,
}

impl PublicKey {
    /// Decode a public key from a string over the key alphabet.
    pub fn decode(encoded: &str) -> Result<Self, KeyDecodeError> {
        let raw = decode_alphabet(encoded)?;
        let modulus = parse_der_integer(&raw)?;
        if bignum::word_len(&modulus, NUM_WORDS) < 2 {
            return Err(KeyDecodeError::UnusableModulus);
        }

        let mut exponent = [0u32; NUM_WORDS];
        exponent[0] = PUBLIC_EXPONENT;
        // Index of the highest set bit, not the bit count: this quantity
        // drives block sizing in the recovery pipeline.
        let bits = bignum::bit_len(&modulus, NUM_WORDS) - 1;
        debug!(bits, "decoded public key");

        Ok(Self {
            modulus,
            exponent,
            bits,
        })
    }

    /// Decode the compiled-in key.
    pub fn embedded() -> Result<Self, KeyDecodeError> {
        Self::decode(EMBEDDED_KEY)
    }

    /// The RSA modulus.
    pub fn modulus(&self) -> &Bignum {
        &self.modulus
    }

    /// The public exponent as a full-width value.
    pub fn exponent(&self) -> &Bignum {
        &self.exponent
    }

    /// Index of the modulus's highest set bit (bit length minus one).
    pub fn bits(&self) -> usize {
        self.bits
    }
}
