//! SM2 keys in PKCS#8 (RFC 5958) and SubjectPublicKeyInfo (RFC 5280) form.
//!
//! Both containers name the key as `id-ecPublicKey` with the `sm2p256v1`
//! curve as parameter. The PKCS#8 payload is an RFC 5915 ECPrivateKey that
//! carries the public point in its `[1]` field:
//!
//! ```text
//! PrivateKeyInfo ::= SEQUENCE {
//!     version              INTEGER (0),
//!     privateKeyAlgorithm  AlgorithmIdentifier,
//!     privateKey           OCTET STRING  -- ECPrivateKey
//! }
//!
//! ECPrivateKey ::= SEQUENCE {
//!     version        INTEGER (1),
//!     privateKey     OCTET STRING,      -- 32 bytes
//!     parameters [0] ECParameters OPTIONAL,
//!     publicKey  [1] BIT STRING OPTIONAL -- 04 || x || y
//! }
//! ```
//!
//! Password-protected export lives in the [`encrypted`] submodule.

pub mod encrypted;

use gmssl_crypto::sm2::Sm2KeyPair;
use gmssl_types::{CryptoError, EccCurveId, PkeyAlgId};
use gmssl_utils::asn1::{Decoder, Encoder};
use gmssl_utils::oid::{known, Oid};
use zeroize::{Zeroize, Zeroizing};

use crate::encoding::{enc_algorithm_identifier, enc_oid, enc_seq, read_algorithm_identifier};
use crate::oid_mapping::{curve_id_to_oid, oid_to_curve_id, pkey_alg};

/// PEM label of an unencrypted SubjectPublicKeyInfo.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

const EC_PRIVATE_KEY_VERSION: u8 = 1;
const UNCOMPRESSED_POINT: u8 = 0x04;

/// The AlgorithmIdentifier shared by both containers.
fn sm2_algorithm_identifier() -> Vec<u8> {
    let curve = enc_oid(&curve_id_to_oid(EccCurveId::Sm2Prime256));
    enc_algorithm_identifier(&known::ec_public_key(), Some(&curve))
}

/// Check an AlgorithmIdentifier names an SM2 key.
fn expect_sm2_algorithm(dec: &mut Decoder<'_>) -> Result<(), CryptoError> {
    let (alg, mut params) = read_algorithm_identifier(dec)?;
    let curve = Oid::from_der_value(params.read_oid()?)?;
    params.finish()?;
    match pkey_alg(&alg, &curve) {
        Some(PkeyAlgId::Sm2) => Ok(()),
        None => Err(CryptoError::DecodeUnknownOid),
    }
}

fn uncompressed_point(key: &Sm2KeyPair) -> Vec<u8> {
    let mut point = Vec::with_capacity(65);
    point.push(UNCOMPRESSED_POINT);
    point.extend_from_slice(&key.public_key_bytes());
    point
}

// ===== PrivateKeyInfo =====

/// Encode a key pair as a DER PrivateKeyInfo.
pub fn encode_sm2_private_key_info(key: &Sm2KeyPair) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut d = key.private_key_bytes().ok_or(CryptoError::Sm2NoPrivateKey)?;

    let mut ec = Encoder::new();
    ec.write_integer(&[EC_PRIVATE_KEY_VERSION]);
    ec.write_octet_string(&d);
    d.zeroize();
    let mut public = Encoder::new();
    public.write_bit_string(0, &uncompressed_point(key));
    ec.write_context_specific(1, true, &public.finish());
    let ec_body = Zeroizing::new(ec.finish());
    let ec_private_key = Zeroizing::new(enc_seq(&ec_body));

    let mut pki = Encoder::new();
    pki.write_integer(&[0]);
    pki.write_raw(&sm2_algorithm_identifier());
    pki.write_octet_string(&ec_private_key);
    let body = Zeroizing::new(pki.finish());
    Ok(Zeroizing::new(enc_seq(&body)))
}

/// Parse a DER PrivateKeyInfo holding an SM2 key.
///
/// When the ECPrivateKey carries a public key it must match the one
/// derived from the private scalar.
pub fn parse_sm2_private_key_info(der: &[u8]) -> Result<Sm2KeyPair, CryptoError> {
    let mut outer = Decoder::new(der);
    let mut seq = outer.read_sequence()?;
    outer.finish()?;

    if seq.read_unsigned_integer()? != [0] {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    expect_sm2_algorithm(&mut seq)?;
    let private_key = seq.read_octet_string()?;
    // attributes [0] are allowed and ignored
    seq.try_read_context_specific(0, true)?;
    seq.finish()?;

    parse_ec_private_key(private_key)
}

fn parse_ec_private_key(data: &[u8]) -> Result<Sm2KeyPair, CryptoError> {
    let mut outer = Decoder::new(data);
    let mut seq = outer.read_sequence()?;
    outer.finish()?;

    if seq.read_unsigned_integer()? != [EC_PRIVATE_KEY_VERSION] {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    let d = seq.read_octet_string()?;
    if d.is_empty() {
        return Err(CryptoError::EccInvalidPrivateKey);
    }
    let key = Sm2KeyPair::from_private_key(d)?;

    if let Some(params) = seq.try_read_context_specific(0, true)? {
        let mut p = Decoder::new(params.value);
        let curve = Oid::from_der_value(p.read_oid()?)?;
        p.finish()?;
        if oid_to_curve_id(&curve) != Some(EccCurveId::Sm2Prime256) {
            return Err(CryptoError::DecodeUnknownOid);
        }
    }
    if let Some(public) = seq.try_read_context_specific(1, true)? {
        let mut p = Decoder::new(public.value);
        let (unused, point) = p.read_bit_string()?;
        p.finish()?;
        if unused != 0 || point != uncompressed_point(&key).as_slice() {
            return Err(CryptoError::EccInvalidPublicKey);
        }
    }
    seq.finish()?;
    Ok(key)
}

// ===== SubjectPublicKeyInfo =====

/// Encode the public half of a key as a DER SubjectPublicKeyInfo.
pub fn encode_sm2_spki(key: &Sm2KeyPair) -> Vec<u8> {
    let mut e = Encoder::new();
    e.write_raw(&sm2_algorithm_identifier());
    e.write_bit_string(0, &uncompressed_point(key));
    enc_seq(&e.finish())
}

/// Parse a DER SubjectPublicKeyInfo into a public-only key.
pub fn parse_sm2_spki(der: &[u8]) -> Result<Sm2KeyPair, CryptoError> {
    let mut outer = Decoder::new(der);
    let mut seq = outer.read_sequence()?;
    outer.finish()?;

    expect_sm2_algorithm(&mut seq)?;
    let (unused, point) = seq.read_bit_string()?;
    seq.finish()?;
    if unused != 0 || point.first() != Some(&UNCOMPRESSED_POINT) {
        return Err(CryptoError::EccInvalidPublicKey);
    }
    Sm2KeyPair::from_public_key(point)
}

/// Encode the public key as a `PUBLIC KEY` PEM block.
pub fn public_key_info_to_pem(key: &Sm2KeyPair) -> String {
    gmssl_utils::pem::encode(PUBLIC_KEY_LABEL, &encode_sm2_spki(key))
}

/// Read the first `PUBLIC KEY` block of a PEM document.
pub fn public_key_info_from_pem(pem: &str) -> Result<Sm2KeyPair, CryptoError> {
    parse_sm2_spki(&gmssl_utils::pem::find(pem, PUBLIC_KEY_LABEL)?)
}
