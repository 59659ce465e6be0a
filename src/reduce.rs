//! Modular reduction against a fixed modulus.
//!
//! Instead of long division, reduction uses a precomputed two-halfword
//! reciprocal of the modulus's leading bits to estimate one quotient digit at
//! a time, Barrett-style: multiply the estimate back in, then apply a single
//! bounded correction. The estimate may be off by a small amount; the walk
//! is structured so any residual error is absorbed by the correction step.
//!
//! The product being reduced is held in two's-complement negated form during
//! the walk, so quotient-digit inputs are complemented (`^ 0xFFFF`) on read.

use core::cmp::Ordering;

use crate::bignum::{self, Bignum, NUM_WORDS, SCRATCH_WORDS};

/// Precomputed reduction state for one modulus.
///
/// Derived once per modulus and reused for every modular multiply; must be
/// rebuilt if the modulus ever changed (it never does after key decoding).
#[derive(Clone)]
pub struct ReductionContext {
    modulus: Bignum,
    words: usize,
    bits: usize,
    digits: usize,
    recip_lo: u32,
    recip_hi: u32,
    shift: u32,
}

impl ReductionContext {
    /// Build the reduction state for `modulus`.
    ///
    /// Takes the top two significant words, normalizes them to a 32-bit
    /// leading window, computes a bit-by-bit binary reciprocal of that
    /// window, and folds in the adjustments that make the reciprocal usable
    /// for direct 16-bit-digit quotient estimation.
    ///
    /// # Panics
    ///
    /// Panics if the modulus spans fewer than two words; key decoding
    /// rejects such moduli before they can reach this constructor.
    pub fn new(modulus: &Bignum) -> Self {
        let words = bignum::word_len(modulus, NUM_WORDS);
        assert!(words >= 2, "modulus must span at least two words");

        let bits = bignum::bit_len(modulus, words);
        let digits = (bits + 15) / 16;

        let mut window = [0u32; 4];
        window[0] = modulus[words - 2];
        window[1] = modulus[words - 1];
        let norm = bignum::bit_len(&window, 2) - 32;
        bignum::shr(&mut window, norm, 2);

        let mut recip = reciprocal(&window);
        bignum::shr(&mut recip, 1, 2);
        let mut shift = (norm + 15) % 16 + 1;
        bignum::inc(&mut recip, 2);
        if bignum::bit_len(&recip, 2) > 32 {
            bignum::shr(&mut recip, 1, 2);
            shift -= 1;
        }

        Self {
            modulus: *modulus,
            words,
            bits,
            digits,
            recip_lo: recip[0] & 0xFFFF,
            recip_hi: recip[0] >> 16,
            shift: shift as u32,
        }
    }

    /// Significant word count of the modulus.
    pub fn words(&self) -> usize {
        self.words
    }

    /// Bit length of the modulus.
    pub fn bits(&self) -> usize {
        self.bits
    }
}

/// Bit-by-bit binary reciprocal of `value` with respect to a power of two:
/// long division by repeated shift-and-subtract, one output bit per step.
fn reciprocal(value: &[u32; 4]) -> [u32; 4] {
    let mut out = [0u32; 4];
    let mut rem = [0u32; 4];
    let mut vbits = bignum::bit_len(value, 2);
    let mut bit = 1u32 << (vbits % 32);
    let mut j = (vbits + 32) / 32 - 1;
    rem[(vbits - 1) / 32] |= 1 << ((vbits - 1) & 31);

    while vbits > 0 {
        vbits -= 1;
        bignum::shl(&mut rem, 1, 2);
        if bignum::cmp(&rem, value, 2) != Ordering::Less {
            bignum::sub_digits(&mut rem, 0, value, 0, 2);
            out[j] |= bit;
        }
        bit >>= 1;
        if bit == 0 {
            j -= 1;
            bit = 0x8000_0000;
        }
    }
    out
}

/// Estimate the next quotient digit from the three digits around the walk
/// cursor and the precomputed reciprocal. Wrapping 32-bit arithmetic
/// throughout; the result is clamped to a single digit.
fn estimate_digit(buf: &[u32], at: usize, ctx: &ReductionContext) -> u32 {
    let d0 = bignum::digit(buf, at) ^ 0xFFFF;
    let d1 = bignum::digit(buf, at - 1) ^ 0xFFFF;
    let d2 = bignum::digit(buf, at - 2) ^ 0xFFFF;

    let t = (d1 * ctx.recip_lo + 0x10000) >> 1;
    let t = (t + ((d2 * ctx.recip_hi + ctx.recip_hi) >> 1) + 1) >> 16;
    let t = (t + ((d1 * ctx.recip_hi) >> 1) + ((d0 * ctx.recip_lo) >> 1) + 1) >> 14;
    let t = t.wrapping_add(ctx.recip_hi.wrapping_mul(d0).wrapping_mul(2));
    let q = t >> ctx.shift;
    if q > 0xFFFF {
        0xFFFF
    } else {
        q
    }
}

/// Compute `(a * b) mod m` for the context's modulus `m`.
///
/// Exact for operands below `2^(32 * ctx.words())`; only the low
/// `ctx.words()` words of either operand participate.
pub fn mul_mod(a: &Bignum, b: &Bignum, ctx: &ReductionContext) -> Bignum {
    let len = ctx.words;
    let mut scratch = [0u32; SCRATCH_WORDS];
    bignum::mul(&mut scratch, a, b, len);

    let prod_digits = bignum::word_len(&scratch, len * 2 + 1) * 2;
    if prod_digits >= ctx.digits {
        // Hold the product negated; quotient-digit multiplies then pull the
        // running remainder back toward zero.
        bignum::inc(&mut scratch, len * 2 + 1);
        bignum::negate(&mut scratch, len * 2 + 1);

        let steps = prod_digits + 1 - ctx.digits;
        let mut window = 1 + prod_digits - ctx.digits;
        let mut cursor = prod_digits + 1;
        for _ in 0..steps {
            cursor -= 1;
            let q = estimate_digit(&scratch, cursor, ctx);
            window -= 1;
            if q > 0 {
                bignum::mul_add_digit(&mut scratch, window, &ctx.modulus, q, 2 * len);
                if bignum::digit(&scratch, cursor) & 0x8000 == 0
                    && bignum::sub_digits(&mut scratch, window, &ctx.modulus, 0, len) != 0
                {
                    let fixup = bignum::digit(&scratch, cursor).wrapping_sub(1);
                    bignum::set_digit(&mut scratch, cursor, fixup);
                }
            }
        }

        bignum::negate(&mut scratch, len);
        bignum::dec(&mut scratch, len);
    }

    let mut out = [0u32; NUM_WORDS];
    out[..len].copy_from_slice(&scratch[..len]);
    out
}

/// Compute `base ^ exp mod m` by square-and-multiply, scanning the exponent
/// from its highest set bit down.
///
/// Only the low `ctx.words()` words of `base` participate; exponent bits are
/// scanned within the same width. A zero exponent yields one.
pub fn mod_pow(base: &Bignum, exp: &Bignum, ctx: &ReductionContext) -> Bignum {
    let len = ctx.words;
    let mut result = [0u32; NUM_WORDS];

    let ebits = bignum::bit_len(exp, len);
    if ebits == 0 {
        result[0] = 1;
        return result;
    }

    result[..len].copy_from_slice(&base[..len]);
    for bit in (0..ebits - 1).rev() {
        let squared = mul_mod(&result, &result, ctx);
        if exp[bit / 32] >> (bit % 32) & 1 != 0 {
            result = mul_mod(&squared, base, ctx);
        } else {
            result = squared;
        }
    }
    result
}
