//! Shared DER helpers for the key containers.

use gmssl_types::CryptoError;
use gmssl_utils::asn1::{Decoder, Encoder};
use gmssl_utils::oid::Oid;

/// Encode a SEQUENCE containing `content`.
pub(crate) fn enc_seq(content: &[u8]) -> Vec<u8> {
    let mut e = Encoder::new();
    e.write_sequence(content);
    e.finish()
}

/// Encode `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`.
/// `params` must already be DER.
pub(crate) fn enc_algorithm_identifier(oid: &Oid, params: Option<&[u8]>) -> Vec<u8> {
    let mut e = Encoder::new();
    e.write_oid(&oid.to_der_value());
    if let Some(p) = params {
        e.write_raw(p);
    }
    enc_seq(&e.finish())
}

/// Encode an OID as a standalone TLV, e.g. for use as algorithm parameters.
pub(crate) fn enc_oid(oid: &Oid) -> Vec<u8> {
    let mut e = Encoder::new();
    e.write_oid(&oid.to_der_value());
    e.finish()
}

/// Read an AlgorithmIdentifier, returning the OID and a decoder over
/// whatever parameters follow it.
pub(crate) fn read_algorithm_identifier<'a>(
    dec: &mut Decoder<'a>,
) -> Result<(Oid, Decoder<'a>), CryptoError> {
    let mut alg = dec.read_sequence()?;
    let oid = Oid::from_der_value(alg.read_oid()?)?;
    Ok((oid, alg))
}

/// Decode a non-negative INTEGER magnitude into a `u32`.
pub(crate) fn bytes_to_u32(bytes: &[u8]) -> Result<u32, CryptoError> {
    if bytes.len() > 4 {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    Ok(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmssl_utils::oid::known;

    #[test]
    fn test_algorithm_identifier_with_curve() {
        let der = enc_algorithm_identifier(&known::ec_public_key(), Some(&enc_oid(&known::sm2p256v1())));
        let mut dec = Decoder::new(&der);
        let (oid, mut params) = read_algorithm_identifier(&mut dec).unwrap();
        assert_eq!(oid, known::ec_public_key());
        let curve = Oid::from_der_value(params.read_oid().unwrap()).unwrap();
        assert_eq!(curve, known::sm2p256v1());
        assert!(params.is_empty());
        assert!(dec.is_empty());
    }

    #[test]
    fn test_bytes_to_u32() {
        assert_eq!(bytes_to_u32(&[0x01, 0x00, 0x00]).unwrap(), 65536);
        assert_eq!(bytes_to_u32(&[0xff, 0xff, 0xff, 0xff]).unwrap(), u32::MAX);
        assert!(bytes_to_u32(&[1, 0, 0, 0, 0]).is_err());
    }
}
