//! Cross-checks of the fixed-width engine against an arbitrary-precision
//! reference implementation, plus round-trip coverage of the key encoding.

use num_bigint::BigUint;
use proptest::prelude::*;

use mixkey::bignum::{self, Bignum, NUM_WORDS};
use mixkey::{mod_pow, mul_mod, recover_blowfish_key, KeyProvider, PublicKey, ReductionContext};

fn to_words(v: &BigUint) -> Bignum {
    let mut words = [0u32; NUM_WORDS];
    bignum::load_le_bytes(&mut words, &v.to_bytes_le());
    words
}

fn to_big(words: &Bignum) -> BigUint {
    let mut bytes = Vec::with_capacity(NUM_WORDS * 4);
    for w in words {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    BigUint::from_bytes_le(&bytes)
}

/// A modulus of exactly `bits` bits (top bit forced), odd, from seed bytes.
fn modulus_from(bits: usize, seed: &[u8]) -> BigUint {
    let nbytes = (bits + 7) / 8;
    let mut m = BigUint::from_bytes_le(&seed[..nbytes]);
    m &= (BigUint::from(1u32) << bits) - 1u32;
    m |= BigUint::from(1u32) << (bits - 1);
    m |= BigUint::from(1u32);
    m
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn mul_mod_agrees_with_reference(
        bits in 40usize..400,
        mseed in any::<[u8; 50]>(),
        aseed in any::<[u8; 50]>(),
        bseed in any::<[u8; 50]>(),
    ) {
        let m = modulus_from(bits, &mseed);
        let a = BigUint::from_bytes_le(&aseed) % &m;
        let b = BigUint::from_bytes_le(&bseed) % &m;

        let ctx = ReductionContext::new(&to_words(&m));
        let got = mul_mod(&to_words(&a), &to_words(&b), &ctx);
        prop_assert_eq!(to_big(&got), (&a * &b) % &m);
    }

    #[test]
    fn mod_pow_agrees_with_reference(
        bits in 40usize..400,
        mseed in any::<[u8; 50]>(),
        aseed in any::<[u8; 50]>(),
        e in prop_oneof![Just(3u32), Just(17), Just(0x10001), 1u32..0x0100_0000],
    ) {
        let m = modulus_from(bits, &mseed);
        let a = BigUint::from_bytes_le(&aseed) % &m;
        let e = BigUint::from(e | 1);

        let ctx = ReductionContext::new(&to_words(&m));
        let got = mod_pow(&to_words(&a), &to_words(&e), &ctx);
        prop_assert_eq!(to_big(&got), a.modpow(&e, &m));
    }

    #[test]
    fn pipeline_agrees_with_reference(src in any::<[u8; 80]>()) {
        let key = recover_blowfish_key(&src).unwrap();

        let public = PublicKey::embedded().unwrap();
        let m = to_big(public.modulus());
        let e = BigUint::from(0x10001u32);
        let mut expect = Vec::new();
        for block in src.chunks_exact(40) {
            let v = BigUint::from_bytes_le(block);
            let r = v.modpow(&e, &m);
            let mut bytes = r.to_bytes_le();
            bytes.resize(40, 0);
            expect.extend_from_slice(&bytes[..39]);
        }
        prop_assert_eq!(&key[..], &expect[..56]);
    }
}

#[test]
fn shared_provider_matches_fresh_provider() {
    let src: Vec<u8> = (0u32..80).map(|i| (i.wrapping_mul(31) >> 2) as u8).collect();
    let fresh = KeyProvider::new().unwrap().recover(&src).unwrap();
    let shared = recover_blowfish_key(&src).unwrap();
    assert_eq!(fresh, shared);
}

// ————————————————————————
// Key-encoding round trip
// ————————————————————————

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode bytes over the key alphabet, zero-padding to whole 3-byte groups.
fn encode_alphabet(data: &[u8]) -> String {
    let mut padded = data.to_vec();
    while padded.len() % 3 != 0 {
        padded.push(0);
    }
    let mut out = String::new();
    for group in padded.chunks_exact(3) {
        let acc = u32::from(group[0]) << 16 | u32::from(group[1]) << 8 | u32::from(group[2]);
        for k in (0..4).rev() {
            out.push(ALPHABET[(acc >> (6 * k)) as usize & 0x3F] as char);
        }
    }
    out
}

/// Wrap big-endian magnitude bytes in a DER INTEGER, padding per the sign
/// convention.
fn der_integer(magnitude: &[u8]) -> Vec<u8> {
    let mut content = Vec::new();
    if magnitude[0] & 0x80 != 0 {
        content.push(0);
    }
    content.extend_from_slice(magnitude);
    let mut out = vec![0x02];
    if content.len() < 0x80 {
        out.push(content.len() as u8);
    } else {
        out.push(0x82);
        out.push((content.len() >> 8) as u8);
        out.push(content.len() as u8);
    }
    out.extend_from_slice(&content);
    out
}

#[test]
fn known_modulus_round_trips_through_encoding() {
    let m = BigUint::parse_bytes(
        b"c7f1d2a98b3e46052f91e8c0d7a65b341298f0e6cd5a7b83941d2c6ae8f90b57",
        16,
    )
    .unwrap();
    let encoded = encode_alphabet(&der_integer(&m.to_bytes_be()));
    let decoded = PublicKey::decode(&encoded).unwrap();
    assert_eq!(to_big(decoded.modulus()), m);
    assert_eq!(decoded.bits(), 255);
}

#[test]
fn embedded_key_round_trips_through_encoding() {
    let public = PublicKey::embedded().unwrap();
    let m = to_big(public.modulus());
    let encoded = encode_alphabet(&der_integer(&m.to_bytes_be()));
    // Re-encoding the decoded modulus reproduces the compiled-in string.
    assert_eq!(
        encoded,
        "AihRvNoIbTn85FZRYNZRcT+i6KpU+maCsEqr3Q5q+LDB5tH7Tz2qQ38V"
    );
    let decoded = PublicKey::decode(&encoded).unwrap();
    assert_eq!(to_big(decoded.modulus()), m);
}
