//! SM2DSA tests.

#![cfg(feature = "dsa")]

use hex_literal::hex;
use proptest::prelude::*;
use rand_core::OsRng;
use sm2_core::{
    FieldBytes, Scalar, U256,
    dsa::{
        Signature, SigningKey, VerifyingKey,
        signature::{Signer, Verifier, hazmat::PrehashVerifier},
    },
    ecc::{Ecc, EccPoint},
};

const PUBLIC_KEY: [u8; 65] = hex!(
    "0408D77AE04C01CC4C1104360DD8AF6B6F7DF334283D7C1A6AFD5652407B87BEE5014E2A57C36C150D16324DC664E31E6432359609C4E79847A5B161C8C7364C8A"
);
const IDENTITY: &str = "example@rustcrypto.org";
const MSG: &[u8] = b"testing";

// Created using:
// $ openssl pkeyutl -sign -in - -inkey pkcs8-private-key.pem -out sig -digest sm3 -pkeyopt distid:example@rustcrypto.org
const SIG: [u8; 64] = hex!(
    "d1dcccedd9fb785e0f67c16b7c52901625c0b69de9bca2144acc7be713cad2fc" // r
    "f7d1eae6e3a157b36c65f672f738ca8b46298bf149a6510072c431b49cd88b1c" // s
);

#[test]
fn verify_test_vector() {
    let vk = VerifyingKey::from_sec1_bytes(IDENTITY, &PUBLIC_KEY).unwrap();
    let sig = Signature::from_bytes(&SIG).expect("decoded Signature failed");
    assert!(vk.verify(MSG, &sig).is_ok());
    assert!(vk.verify(b"testinG", &sig).is_err());
}

/// GB/T 32918.2 example with the recommended curve parameters.
mod gbt32918 {
    use hex_literal::hex;

    pub const ID: &str = "1234567812345678";
    pub const MSG: &[u8] = b"message digest";
    pub const D: [u8; 32] =
        hex!("3945208F7B2144B13F36E38AC6D39F95889393692860B51A42FB81EF4DF7C5B8");
    pub const K: [u8; 32] =
        hex!("59276E27D506861A16680F3AD9C02DCCEF3CC1FA3CDBE4CE6D54B80DEAC1BC21");
    pub const QX: [u8; 32] =
        hex!("09F9DF311E5421A150DD7D161E4BC5C672179FAD1833FC076BB08FF356F35020");
    pub const QY: [u8; 32] =
        hex!("CCEA490CE26775A52DC6EA718CC1AA600AED05FBF35E084A6632F6072DA9AD13");
    pub const ZA: [u8; 32] =
        hex!("b2e14c5c79c6df5b85f4fe7ed8db7a262b9da7e07ccb0ea9f4747b8ccda8a4f3");
    pub const E: [u8; 32] =
        hex!("f0b43e94ba45accaace692ed534382eb17e6ab5a19ce7b31f4486fdfc0d28640");
    pub const R: [u8; 32] =
        hex!("F5A03B0648D2C4630EEAC513E1BB81A15944DA3827D5B74143AC7EACEEE720B3");
    pub const S: [u8; 32] =
        hex!("B1B6AA29DF212FD8763182BC0D421CA1BB9038FD1F7F42D4840B69C485BBC1AA");
}

#[test]
fn gbt32918_key_and_digest() {
    let sk = SigningKey::from_slice(gbt32918::ID, &gbt32918::D).unwrap();
    let vk = sk.verifying_key();
    assert_eq!(vk.as_affine().x(), FieldBytes::from(gbt32918::QX));
    assert_eq!(vk.as_affine().y(), FieldBytes::from(gbt32918::QY));
    assert_eq!(*vk.identity_hash(), FieldBytes::from(gbt32918::ZA));
    assert_eq!(vk.hash_msg(gbt32918::MSG), FieldBytes::from(gbt32918::E));
}

#[test]
fn gbt32918_sign_with_fixed_nonce() {
    let ecc = Ecc::new();
    let d = U256::from_be_slice(&gbt32918::D);
    let k = U256::from_be_slice(&gbt32918::K);
    let (r, s) = ecc.sign(&gbt32918::E, &mut OsRng, &d, Some(&k)).unwrap();
    assert_eq!(r, U256::from_be_slice(&gbt32918::R));
    assert_eq!(s, U256::from_be_slice(&gbt32918::S));

    let q = EccPoint::new(
        U256::from_be_slice(&gbt32918::QX),
        U256::from_be_slice(&gbt32918::QY),
    );
    assert!(ecc.verify(&gbt32918::E, &q, &r, &s).unwrap());

    let mut sig = [0u8; 64];
    sig[..32].copy_from_slice(&gbt32918::R);
    sig[32..].copy_from_slice(&gbt32918::S);
    let sig = Signature::from_bytes(&sig).unwrap();
    let sk = SigningKey::from_slice(gbt32918::ID, &gbt32918::D).unwrap();
    let vk = VerifyingKey::from_affine(gbt32918::ID, *sk.verifying_key().as_affine()).unwrap();
    assert!(vk.verify(gbt32918::MSG, &sig).is_ok());
    assert!(vk.verify_prehash(&gbt32918::E, &sig).is_ok());
}

#[test]
fn signing_key_rejects_unusable_scalars() {
    assert!(SigningKey::from_slice(IDENTITY, &[0u8; 32]).is_err());
    let n_minus_one = hex!("FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFF7203DF6B21C6052B53BBF40939D54122");
    assert!(SigningKey::from_slice(IDENTITY, &n_minus_one).is_err());
    let n = hex!("FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFF7203DF6B21C6052B53BBF40939D54123");
    assert!(SigningKey::from_slice(IDENTITY, &n).is_err());
    assert!(SigningKey::from_slice(IDENTITY, &[1u8; 31]).is_err());
}

#[test]
fn verifying_key_rejects_bad_points() {
    assert!(VerifyingKey::from_sec1_bytes(IDENTITY, &[0]).is_err());
    let mut off_curve = PUBLIC_KEY;
    off_curve[64] ^= 1;
    assert!(VerifyingKey::from_sec1_bytes(IDENTITY, &off_curve).is_err());
}

#[test]
fn wrong_prehash_length_rejected() {
    let vk = VerifyingKey::from_sec1_bytes(IDENTITY, &PUBLIC_KEY).unwrap();
    let sig = Signature::from_bytes(&SIG).unwrap();
    assert!(vk.verify_prehash(&[0u8; 31], &sig).is_err());
}

prop_compose! {
    fn signing_key()(bytes in any::<[u8; 32]>()) -> SigningKey {
        let scalar = Scalar::reduce_bytes(&FieldBytes::from(bytes));
        SigningKey::from_scalar(IDENTITY, scalar)
            .unwrap_or_else(|_| SigningKey::from_scalar(IDENTITY, Scalar::ONE).unwrap())
    }
}

proptest! {
    #[test]
    fn sign_and_verify(sk in signing_key()) {
        let signature = sk.sign(MSG);
        prop_assert!(sk.verifying_key().verify(MSG, &signature).is_ok());
    }

    #[test]
    fn sign_and_verify_with_rng(sk in signing_key()) {
        use sm2_core::dsa::signature::RandomizedSigner;
        let signature = sk.sign_with_rng(&mut OsRng, MSG);
        prop_assert!(sk.verifying_key().verify(MSG, &signature).is_ok());
    }

    #[test]
    fn reject_invalid_signature(sk in signing_key(), byte in 0usize..64, bit in 0usize..8) {
        let mut signature_bytes = sk.sign(MSG).to_bytes();

        // tweak signature to make it invalid
        signature_bytes[byte] ^= 1 << bit;

        // flips that leave [1, n-1] fail to parse
        if let Ok(signature) = Signature::from_bytes(&signature_bytes) {
            prop_assert!(sk.verifying_key().verify(MSG, &signature).is_err());
        }
    }
}

#[cfg(feature = "der")]
mod der_encoding {
    use super::{IDENTITY, MSG, PUBLIC_KEY, SIG, signing_key};
    use hex_literal::hex;
    use proptest::prelude::*;
    use sm2_core::dsa::{
        Signature, VerifyingKey,
        der::Signature as DerSignature,
        signature::{Signer, Verifier, hazmat::PrehashVerifier},
    };

    // `SIG` as an ASN.1 SEQUENCE of two INTEGERs; both components have the top bit set
    const SIG_DER: [u8; 72] = hex!(
        "3046"
        "022100d1dcccedd9fb785e0f67c16b7c52901625c0b69de9bca2144acc7be713cad2fc"
        "022100f7d1eae6e3a157b36c65f672f738ca8b46298bf149a6510072c431b49cd88b1c"
    );

    #[test]
    fn verify_der_test_vector() {
        let vk = VerifyingKey::from_sec1_bytes(IDENTITY, &PUBLIC_KEY).unwrap();
        let der = DerSignature::from_bytes(&SIG_DER).unwrap();
        assert!(vk.verify(MSG, &der).is_ok());
        assert!(vk.verify(b"testinG", &der).is_err());

        let prehash = vk.hash_msg(MSG);
        assert!(vk.verify_prehash(&prehash, &der).is_ok());

        let sig = Signature::from_der(&SIG_DER).unwrap();
        assert_eq!(sig.to_bytes(), SIG);
        assert_eq!(sig.to_der().as_bytes(), &SIG_DER[..]);
    }

    #[test]
    fn non_minimal_der_is_rejected() {
        // r padded with a redundant leading zero
        let padded = hex!(
            "3047"
            "02220000d1dcccedd9fb785e0f67c16b7c52901625c0b69de9bca2144acc7be713cad2fc"
            "022100f7d1eae6e3a157b36c65f672f738ca8b46298bf149a6510072c431b49cd88b1c"
        );
        assert!(DerSignature::from_bytes(&padded).is_err());
        assert!(Signature::from_der(&padded).is_err());

        // s without the sign byte reads as negative
        let mut negative = SIG_DER;
        negative[38] = 0x20;
        negative.copy_within(40.., 39);
        negative[1] = 0x45;
        assert!(Signature::from_der(&negative[..71]).is_err());
    }

    proptest! {
        #[test]
        fn sign_and_verify_der(sk in signing_key()) {
            let signature = sk.sign(MSG);
            let der = signature.to_der();
            let decoded = Signature::from_der(&der.to_bytes()).unwrap();
            prop_assert_eq!(decoded, signature);
            prop_assert!(sk.verifying_key().verify(MSG, &der).is_ok());
        }
    }
}
