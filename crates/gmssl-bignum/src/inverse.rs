//! Modular inverse by the extended Euclidean algorithm.

use crate::bignum::BigNum;
use gmssl_types::CryptoError;

impl BigNum {
    /// self^-1 mod `m`, for `m > 1`.
    ///
    /// The Bézout coefficient is carried as a residue in `[0, m)`, so no
    /// intermediate value goes negative. Runs in variable time.
    pub fn mod_inv(&self, m: &BigNum) -> Result<BigNum, CryptoError> {
        if m.is_zero() || m.is_one() || m.is_negative() {
            return Err(CryptoError::BnInvalidModulus);
        }

        // r0 ≡ s0·self and r1 ≡ s1·self (mod m) hold on every step.
        let (mut r0, mut s0) = (m.clone(), BigNum::zero());
        let (mut r1, mut s1) = (self.mod_reduce(m)?, BigNum::from_u64(1));

        while !r1.is_zero() {
            let (q, r2) = r0.div_rem(&r1)?;
            let s2 = s0.mod_sub(&q.mod_mul(&s1, m)?, m)?;
            r0 = std::mem::replace(&mut r1, r2);
            s0 = std::mem::replace(&mut s1, s2);
        }

        if !r0.is_one() {
            return Err(CryptoError::BnNoInverse);
        }
        Ok(s0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_inverse() {
        // 3 * 5 = 15 = 2 * 7 + 1
        let inv = BigNum::from_u64(3).mod_inv(&BigNum::from_u64(7)).unwrap();
        assert_eq!(inv, BigNum::from_u64(5));
    }

    #[test]
    fn test_inverse_modulo_sm2_order() {
        let n = BigNum::from_bytes_be(&[
            0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0x72, 0x03, 0xdf, 0x6b, 0x21, 0xc6, 0x05, 0x2b, 0x53, 0xbb, 0xf4, 0x09,
            0x39, 0xd5, 0x41, 0x23,
        ]);
        for a in [
            BigNum::from_u64(2),
            BigNum::from_bytes_be(&[0x5a; 32]).mod_reduce(&n).unwrap(),
            n.sub(&BigNum::from_u64(1)),
        ] {
            let inv = a.mod_inv(&n).unwrap();
            assert!(inv < n);
            assert!(a.mod_mul(&inv, &n).unwrap().is_one());
        }
    }

    #[test]
    fn test_operand_above_modulus_is_reduced() {
        // 100 = 2 (mod 7), 2 * 4 = 8 = 1 (mod 7)
        let inv = BigNum::from_u64(100).mod_inv(&BigNum::from_u64(7)).unwrap();
        assert_eq!(inv, BigNum::from_u64(4));
    }

    #[test]
    fn test_no_inverse() {
        let m = BigNum::from_u64(9);
        assert!(matches!(
            BigNum::from_u64(6).mod_inv(&m),
            Err(CryptoError::BnNoInverse)
        ));
        assert!(matches!(
            BigNum::zero().mod_inv(&m),
            Err(CryptoError::BnNoInverse)
        ));
        assert!(matches!(
            BigNum::from_u64(3).mod_inv(&BigNum::from_u64(1)),
            Err(CryptoError::BnInvalidModulus)
        ));
    }
}
