//! Key, key-agreement and scalar multiplication tests over the big-integer
//! interface.

#![cfg(feature = "std")]

use hex_literal::hex;
use proptest::prelude::*;
use rand_core::{CryptoRng, OsRng, RngCore};
use sm2_core::{
    AffinePoint, CACHE_ENTRIES, Error, MODULUS, MulStrategy, ORDER, PointCache, ProjectivePoint,
    Scalar, StripeTable, U256,
    ecc::{Ecc, EccPoint},
    elliptic_curve::bigint::ArrayEncoding,
    mul_base, mul_windowed,
};

const GX: [u8; 32] = hex!("32C4AE2C1F1981195F9904466A39C9948FE30BBFF2660BE1715A4589334C74C7");
const GY: [u8; 32] = hex!("BC3736A2F4F6779C59BDCEE36B692153D0A9877CC62A474002DF32E52139F0A0");

fn generator() -> EccPoint {
    EccPoint::new(U256::from_be_slice(&GX), U256::from_be_slice(&GY))
}

fn random_uint() -> U256 {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    U256::from_be_slice(&bytes)
}

/// Left-to-right double-and-add.
fn naive_mul(p: &ProjectivePoint, k: &U256) -> ProjectivePoint {
    let mut acc = ProjectivePoint::IDENTITY;
    for i in (0..256).rev() {
        acc = acc.double();
        if k.bit_vartime(i) {
            acc += p;
        }
    }
    acc
}

struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0)
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
        Err(rand_core::Error::new("entropy source offline"))
    }
}

impl CryptoRng for FailingRng {}

#[test]
fn windowed_and_stripe_agree() {
    let p = ProjectivePoint::GENERATOR * Scalar::from_u64(0x5eed);
    let table = StripeTable::new(&p);
    for _ in 0..10_000 {
        let k = random_uint();
        assert_eq!(mul_windowed(&p, &k), table.mul(&k));
    }
}

#[test]
fn matches_double_and_add() {
    let p = ProjectivePoint::GENERATOR * Scalar::from_u64(3);
    let table = StripeTable::new(&p);
    for _ in 0..100 {
        let k = random_uint();
        let expected = naive_mul(&p, &k);
        assert_eq!(mul_windowed(&p, &k), expected);
        assert_eq!(table.mul(&k), expected);
        assert_eq!(mul_base(&k), naive_mul(&ProjectivePoint::GENERATOR, &k));
    }
}

#[test]
fn scalar_edge_cases() {
    let g = ProjectivePoint::GENERATOR;
    let n_minus_one = ORDER.wrapping_sub(&U256::ONE);
    for k in [U256::ZERO, ORDER] {
        assert!(bool::from(mul_windowed(&g, &k).is_identity()));
        assert!(bool::from(mul_base(&k).is_identity()));
    }
    assert_eq!(mul_windowed(&g, &U256::ONE), g);
    assert_eq!(mul_windowed(&g, &n_minus_one), -g);
    assert_eq!(mul_base(&n_minus_one), -g);
    // scalars at or above n are accepted
    assert_eq!(mul_base(&U256::MAX), naive_mul(&g, &U256::MAX));
}

#[test]
fn strategies_agree_through_boundary() {
    let cache = PointCache::new();
    let stripe = Ecc::with_cache(&cache);
    let windowed = Ecc::with_cache(&cache).with_strategy(MulStrategy::Windowed);
    let p = stripe.scalar_mul_base(&U256::from_u64(99), true);

    for _ in 0..4 {
        let k = random_uint();
        assert_eq!(
            stripe.scalar_mul(&k, &p, true),
            windowed.scalar_mul(&k, &p, true)
        );
        assert_eq!(
            stripe.scalar_mul_base(&k, true),
            windowed.scalar_mul_base(&k, true)
        );
    }
    assert_eq!(stripe.strategy(), MulStrategy::Stripe);
    let (x, y) = (p.x.to_be_byte_array(), p.y.to_be_byte_array());
    let affine = AffinePoint::from_bytes(&x, &y).unwrap();
    assert!(cache.has_table(&affine));
}

#[test]
fn boundary_point_arithmetic() {
    let ecc = Ecc::new();
    let g = generator();
    let two_g = ecc.scalar_mul_base(&U256::from_u64(2), true);
    let three_g = ecc.scalar_mul_base(&U256::from_u64(3), true);

    assert_eq!(ecc.map(&ecc.proj_dbl_point(&g)), two_g);
    assert_eq!(ecc.map(&ecc.proj_add_point(&two_g, &g)), three_g);
    assert_eq!(ecc.scalar_mul_add(&U256::from_u64(2), &g, &g, true), three_g);
    assert_eq!(ecc.scalar_mul_base_add(&U256::ONE, &two_g, true), three_g);
    assert_eq!(ecc.scalar_mul(&U256::ONE, &g, true), g);

    // P + (-P) is the point at infinity in both encodings
    let neg_g = EccPoint::new(g.x, MODULUS.wrapping_sub(&g.y));
    assert!(ecc.proj_add_point(&g, &neg_g).is_identity());
    assert!(ecc.scalar_mul(&ORDER, &g, true).is_identity());
    assert!(ecc.map(&EccPoint::IDENTITY).is_identity());

    // unmapped results are valid Jacobian triples
    let jacobian = ecc.scalar_mul_base(&U256::from_u64(7), false);
    let mapped = ecc.map(&jacobian);
    assert_eq!(mapped, ecc.scalar_mul_base(&U256::from_u64(7), true));
    assert_eq!(mapped.z, U256::ONE);
}

#[test]
fn validate_and_check_key() {
    let ecc = Ecc::new();
    let g = generator();
    assert_eq!(ecc.validate_point(&g.x, &g.y), Ok(()));
    assert_eq!(
        ecc.validate_point(&g.x, &g.y.wrapping_add(&U256::ONE)),
        Err(Error::NotOnCurve)
    );
    assert_eq!(ecc.validate_point(&MODULUS, &g.y), Err(Error::OutOfRange));

    let (d, q) = ecc.make_key(&mut OsRng, true).unwrap();
    assert_eq!(ecc.check_key(&q.x, &q.y, Some(&d)), Ok(()));
    assert_eq!(ecc.check_key(&q.x, &q.y, None), Ok(()));
    assert_eq!(
        ecc.check_key(&q.x, &q.y, Some(&d.wrapping_add(&U256::ONE))),
        Err(Error::PrivateKeyMismatch)
    );
    assert_eq!(
        ecc.check_key(&q.x, &q.y, Some(&ORDER)),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        ecc.check_key(&U256::ZERO, &U256::ZERO, None),
        Err(Error::PointAtInfinity)
    );
    assert_eq!(
        ecc.check_key(&q.x, &q.x, None),
        Err(Error::NotOnCurve)
    );
    assert_eq!(
        ecc.check_key(&q.x, &MODULUS, None),
        Err(Error::OutOfRange)
    );
}

#[test]
fn uncompress_round_trip() {
    let ecc = Ecc::new();
    for _ in 0..8 {
        let (_, q) = ecc.make_key(&mut OsRng, false).unwrap();
        let odd = q.y.bit_vartime(0);
        assert_eq!(ecc.uncompress(&q.x, odd), Ok(q.y));
        assert_eq!(
            ecc.uncompress(&q.x, !odd),
            Ok(MODULUS.wrapping_sub(&q.y))
        );
    }
    assert_eq!(
        ecc.uncompress(&U256::from_u64(2), false),
        Err(Error::NotOnCurve)
    );
    assert_eq!(ecc.uncompress(&MODULUS, false), Err(Error::OutOfRange));
}

#[test]
fn shared_secret_symmetry() {
    let ecc = Ecc::new();
    let (da, qa) = ecc.make_key(&mut OsRng, true).unwrap();
    let (db, qb) = ecc.make_key(&mut OsRng, true).unwrap();

    let mut ab = [0u8; 32];
    let mut ba = [0u8; 40];
    assert_eq!(ecc.secret_gen(&da, &qb, &mut ab), Ok(32));
    assert_eq!(ecc.secret_gen(&db, &qa, &mut ba), Ok(32));
    assert_eq!(ab, ba[..32]);

    let mut short = [0u8; 31];
    assert_eq!(
        ecc.secret_gen(&da, &qb, &mut short),
        Err(Error::BufferTooSmall)
    );
    assert_eq!(
        ecc.secret_gen(&da, &EccPoint::IDENTITY, &mut ab),
        Err(Error::PointAtInfinity)
    );
    let off_curve = EccPoint::new(qb.x, qb.x);
    assert_eq!(
        ecc.secret_gen(&da, &off_curve, &mut ab),
        Err(Error::NotOnCurve)
    );
}

#[test]
fn sign_and_verify_digests() {
    let ecc = Ecc::new();
    let (d, q) = ecc.make_key(&mut OsRng, false).unwrap();
    let hash = [0xa5u8; 32];
    let (r, s) = ecc.sign(&hash, &mut OsRng, &d, None).unwrap();
    assert_eq!(ecc.verify(&hash, &q, &r, &s), Ok(true));

    // digests longer than 32 bytes are truncated
    let mut long = [0u8; 64];
    long[..32].copy_from_slice(&hash);
    long[32..].fill(0x11);
    assert_eq!(ecc.verify(&long, &q, &r, &s), Ok(true));

    assert_eq!(ecc.verify(&[0x5au8; 32], &q, &r, &s), Ok(false));
    assert_eq!(ecc.verify(&hash, &EccPoint::IDENTITY, &r, &s), Ok(false));
    assert_eq!(ecc.verify(&[], &q, &r, &s), Err(Error::BadArgument));
}

#[test]
fn verify_rejects_out_of_range_components() {
    let ecc = Ecc::new();
    let (d, q) = ecc.make_key(&mut OsRng, false).unwrap();
    let hash = [0x3cu8; 32];
    let (r, s) = ecc.sign(&hash, &mut OsRng, &d, None).unwrap();
    assert_eq!(ecc.verify(&hash, &q, &r, &s), Ok(true));

    // zero components
    assert_eq!(ecc.verify(&hash, &q, &U256::ZERO, &s), Ok(false));
    assert_eq!(ecc.verify(&hash, &q, &r, &U256::ZERO), Ok(false));

    // components at or above n, including values congruent to the real ones
    for big in [ORDER, ORDER.wrapping_add(&U256::ONE), U256::MAX] {
        assert_eq!(ecc.verify(&hash, &q, &big, &s), Ok(false));
        assert_eq!(ecc.verify(&hash, &q, &r, &big), Ok(false));
    }
    assert_eq!(ecc.verify(&hash, &q, &r.wrapping_add(&ORDER), &s), Ok(false));
    assert_eq!(ecc.verify(&hash, &q, &r, &s.wrapping_add(&ORDER)), Ok(false));

    // t = r + s = n
    assert_eq!(
        ecc.verify(&hash, &q, &r, &ORDER.wrapping_sub(&r)),
        Ok(false)
    );
}

#[test]
fn sign_rejects_bad_inputs() {
    let ecc = Ecc::new();
    let hash = [1u8; 32];
    let d = U256::from_u64(12345);
    assert_eq!(
        ecc.sign(&hash, &mut OsRng, &ORDER, None),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        ecc.sign(&hash, &mut OsRng, &U256::ZERO, None),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        ecc.sign(&hash, &mut OsRng, &d, Some(&U256::ZERO)),
        Err(Error::OutOfRange)
    );
    assert_eq!(
        ecc.sign(&hash, &mut FailingRng, &d, None),
        Err(Error::Rng)
    );
    assert_eq!(ecc.make_key(&mut FailingRng, false), Err(Error::Rng));
}

#[test]
fn cache_holds_bounded_points() {
    let cache = PointCache::new();
    let ecc = Ecc::with_cache(&cache);
    for i in 1..=(2 * CACHE_ENTRIES as u64) {
        let p = ecc.scalar_mul_base(&U256::from_u64(i + 1), true);
        ecc.scalar_mul(&U256::from_u64(17), &p, true);
    }
    assert_eq!(cache.len(), CACHE_ENTRIES);
    cache.clear();
    assert!(cache.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn scalar_mul_is_linear(a in any::<u64>(), b in any::<u64>()) {
        let ecc = Ecc::new();
        let g = generator();
        let a_g = ecc.scalar_mul(&U256::from_u64(a), &g, true);
        let ab_g = ecc.scalar_mul(&U256::from_u64(b), &a_g, true);
        let expected = Scalar::from_u64(a) * Scalar::from_u64(b);
        prop_assert_eq!(ab_g, ecc.scalar_mul_base(&expected.to_uint(), true));
    }
}
