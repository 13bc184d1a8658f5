//! Curve parameter definitions.
//!
//! Only the SM2 recommended curve (GB/T 32918.5, `sm2p256v1`) is defined.

use gmssl_bignum::BigNum;
use gmssl_types::EccCurveId;
use hex_literal::hex;

pub(crate) const SM2_P: [u8; 32] =
    hex!("FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00000000FFFFFFFFFFFFFFFF");
pub(crate) const SM2_A: [u8; 32] =
    hex!("FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF00000000FFFFFFFFFFFFFFFC");
pub(crate) const SM2_B: [u8; 32] =
    hex!("28E9FA9E9D9F5E344D5A9E4BCF6509A7F39789F515AB8F92DDBCBD414D940E93");
pub(crate) const SM2_GX: [u8; 32] =
    hex!("32C4AE2C1F1981195F9904466A39C9948FE30BBFF2660BE1715A4589334C74C7");
pub(crate) const SM2_GY: [u8; 32] =
    hex!("BC3736A2F4F6779C59BDCEE36B692153D0A9877CC62A474002DF32E52139F0A0");
pub(crate) const SM2_N: [u8; 32] =
    hex!("FFFFFFFEFFFFFFFFFFFFFFFFFFFFFFFF7203DF6B21C6052B53BBF40939D54123");

/// Parameters for a short Weierstrass curve y² = x³ + ax + b (mod p)
/// with a = p - 3 and cofactor 1.
#[derive(Clone)]
pub(crate) struct CurveParams {
    pub p: BigNum,
    pub a: BigNum,
    pub b: BigNum,
    pub gx: BigNum,
    pub gy: BigNum,
    /// Order of G.
    pub n: BigNum,
    pub field_size: usize,
}

pub(crate) fn get_curve_params(curve_id: EccCurveId) -> CurveParams {
    match curve_id {
        EccCurveId::Sm2Prime256 => CurveParams {
            p: BigNum::from_bytes_be(&SM2_P),
            a: BigNum::from_bytes_be(&SM2_A),
            b: BigNum::from_bytes_be(&SM2_B),
            gx: BigNum::from_bytes_be(&SM2_GX),
            gy: BigNum::from_bytes_be(&SM2_GY),
            n: BigNum::from_bytes_be(&SM2_N),
            field_size: curve_id.field_size(),
        },
    }
}
