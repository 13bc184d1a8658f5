//! Modular arithmetic helpers for operands already reduced into `[0, m)`.

use crate::bignum::BigNum;
use gmssl_types::CryptoError;

impl BigNum {
    /// (self + other) mod m. Both operands must lie in `[0, m)`.
    pub fn mod_add(&self, other: &BigNum, m: &BigNum) -> Result<BigNum, CryptoError> {
        check_modulus(m)?;
        Ok(self.add(other).ct_sub_if_gte(m))
    }

    /// (self - other) mod m. Both operands must lie in `[0, m)`.
    pub fn mod_sub(&self, other: &BigNum, m: &BigNum) -> Result<BigNum, CryptoError> {
        check_modulus(m)?;
        Ok(self.add(m).sub(other).ct_sub_if_gte(m))
    }

    /// (self * other) mod m.
    pub fn mod_mul(&self, other: &BigNum, m: &BigNum) -> Result<BigNum, CryptoError> {
        check_modulus(m)?;
        self.mul(other).mod_reduce(m)
    }
}

fn check_modulus(m: &BigNum) -> Result<(), CryptoError> {
    if m.is_zero() || m.is_negative() {
        return Err(CryptoError::BnInvalidModulus);
    }
    Ok(())
}
