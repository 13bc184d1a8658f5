//! OID-to-algorithm mapping for the key containers.
//!
//! Lookups return `None` for unrecognised OIDs; callers turn that into
//! `DecodeUnknownOid`.

use gmssl_types::{CipherAlgId, EccCurveId, MacAlgId, PkeyAlgId};
use gmssl_utils::oid::{known, Oid};

pub(crate) fn oid_to_curve_id(oid: &Oid) -> Option<EccCurveId> {
    (*oid == known::sm2p256v1()).then_some(EccCurveId::Sm2Prime256)
}

pub(crate) fn curve_id_to_oid(curve: EccCurveId) -> Oid {
    match curve {
        EccCurveId::Sm2Prime256 => known::sm2p256v1(),
    }
}

/// Resolve an `id-ecPublicKey` algorithm plus its named-curve parameter.
pub(crate) fn pkey_alg(alg: &Oid, curve: &Oid) -> Option<PkeyAlgId> {
    if *alg != known::ec_public_key() {
        return None;
    }
    match oid_to_curve_id(curve)? {
        EccCurveId::Sm2Prime256 => Some(PkeyAlgId::Sm2),
    }
}

/// The PBKDF2 pseudorandom function.
pub(crate) fn oid_to_prf(oid: &Oid) -> Option<MacAlgId> {
    (*oid == known::hmac_sm3()).then_some(MacAlgId::HmacSm3)
}

pub(crate) fn prf_to_oid(prf: MacAlgId) -> Oid {
    match prf {
        MacAlgId::HmacSm3 => known::hmac_sm3(),
    }
}

/// The PBES2 encryption scheme.
pub(crate) fn oid_to_cipher(oid: &Oid) -> Option<CipherAlgId> {
    (*oid == known::sm4_cbc()).then_some(CipherAlgId::Sm4Cbc)
}

pub(crate) fn cipher_to_oid(cipher: CipherAlgId) -> Option<Oid> {
    match cipher {
        CipherAlgId::Sm4Cbc => Some(known::sm4_cbc()),
        _ => None,
    }
}
