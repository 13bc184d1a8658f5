//! Montgomery multiplication context.
//!
//! The field representation for elliptic curve arithmetic.

use crate::bignum::{BigNum, DoubleLimb, Limb, LIMB_BITS};
use gmssl_types::CryptoError;

/// Montgomery multiplication context.
///
/// Precomputes values needed for efficient modular multiplication
/// using the Montgomery form: R = 2^(m_size * LIMB_BITS).
#[derive(Clone)]
pub struct MontgomeryCtx {
    /// The modulus N (must be odd).
    modulus: BigNum,
    /// Number of limbs in the modulus.
    m_size: usize,
    /// N' such that N[0] * N' ≡ -1 (mod 2^64).
    n_prime: u64,
    /// R² mod N, used for encoding into Montgomery form.
    r_squared: BigNum,
}

impl MontgomeryCtx {
    /// Create a new Montgomery context for the given odd modulus.
    pub fn new(modulus: &BigNum) -> Result<Self, CryptoError> {
        if modulus.is_zero() {
            return Err(CryptoError::BnDivisionByZero);
        }
        if modulus.is_even() || modulus.is_negative() {
            return Err(CryptoError::BnInvalidModulus);
        }

        let m_size = modulus.num_limbs();
        let n_prime = compute_n_prime(modulus.limbs()[0]);

        // Compute R² mod N where R = 2^(m_size * 64)
        // R² = 2^(2 * m_size * 64)
        let r_squared = compute_r_squared(modulus, m_size)?;

        Ok(MontgomeryCtx {
            modulus: modulus.clone(),
            m_size,
            n_prime,
            r_squared,
        })
    }

    /// Montgomery form of 1, i.e. R mod N.
    pub fn one(&self) -> BigNum {
        self.mont_reduce(&self.r_squared)
    }

    /// Convert a value into Montgomery form: aR mod N.
    pub fn to_mont(&self, a: &BigNum) -> Result<BigNum, CryptoError> {
        let a_reduced = a.mod_reduce(&self.modulus)?;
        let product = a_reduced.mul(&self.r_squared);
        Ok(self.mont_reduce(&product))
    }

    /// Convert from Montgomery form back to normal: a * R^(-1) mod N.
    pub fn from_mont(&self, a_mont: &BigNum) -> BigNum {
        self.mont_reduce(a_mont)
    }

    /// Montgomery multiplication: (a * b * R^(-1)) mod N.
    /// Both a and b must be in Montgomery form.
    pub fn mont_mul(&self, a: &BigNum, b: &BigNum) -> BigNum {
        let product = a.mul(b);
        self.mont_reduce(&product)
    }

    /// Montgomery squaring: (a² * R^(-1)) mod N.
    pub fn mont_sqr(&self, a: &BigNum) -> BigNum {
        let sq = a.sqr();
        self.mont_reduce(&sq)
    }

    /// Montgomery REDC: given T, compute T * R^(-1) mod N.
    ///
    /// Algorithm (from HAC 14.32):
    /// ```text
    /// for i = 0 to m_size-1:
    ///   q_i = t[i] * n_prime mod 2^64
    ///   T = T + q_i * N * 2^(i*64)
    /// T = T >> (m_size * 64)
    /// if T >= N: T = T - N
    /// return T
    /// ```
    fn mont_reduce(&self, t: &BigNum) -> BigNum {
        let m = self.m_size;
        let mod_limbs = self.modulus.limbs();

        // Work buffer: need at least 2*m + 1 limbs
        let mut work = vec![0u64; 2 * m + 2];
        let t_limbs = t.limbs();
        let copy_len = t_limbs.len().min(work.len());
        work[..copy_len].copy_from_slice(&t_limbs[..copy_len]);

        for i in 0..m {
            let q = work[i].wrapping_mul(self.n_prime);

            // Add q * N shifted by i positions
            let mut carry: u64 = 0;
            for j in 0..m {
                let prod = q as DoubleLimb * mod_limbs[j] as DoubleLimb
                    + work[i + j] as DoubleLimb
                    + carry as DoubleLimb;
                work[i + j] = prod as Limb;
                carry = (prod >> LIMB_BITS) as u64;
            }
            // Propagate carry
            let mut k = i + m;
            while carry != 0 && k < work.len() {
                let sum = work[k] as DoubleLimb + carry as DoubleLimb;
                work[k] = sum as Limb;
                carry = (sum >> LIMB_BITS) as u64;
                k += 1;
            }
        }

        // Result is in work[m..=2m]; the top limb holds the carry when
        // N is close to R.
        let result = BigNum::from_limbs(work[m..=2 * m].to_vec());
        work.iter_mut().for_each(|l| *l = 0);
        result.ct_sub_if_gte(&self.modulus)
    }
}

/// Compute R² mod N where R = 2^(m_size * 64).
fn compute_r_squared(modulus: &BigNum, m_size: usize) -> Result<BigNum, CryptoError> {
    BigNum::from_u64(1)
        .shl(2 * m_size * LIMB_BITS)
        .mod_reduce(modulus)
}

/// Compute N' such that N[0] * N' ≡ -1 (mod 2^64).
///
/// Uses Newton's method: x = x * (2 - n0 * x), iterated to converge mod 2^64.
fn compute_n_prime(n0: u64) -> u64 {
    let mut x: u64 = 1;
    for _ in 0..63 {
        x = x.wrapping_mul(2u64.wrapping_sub(n0.wrapping_mul(x)));
    }
    x.wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_n_prime() {
        // For an odd number n, n * n_prime ≡ -1 (mod 2^64)
        let n: u64 = 0xFFFF_FFFF_FFFF_FFEF;
        let np = compute_n_prime(n);
        assert_eq!(n.wrapping_mul(np), u64::MAX);
    }

    #[test]
    fn test_montgomery_ctx_creation() {
        let modulus = BigNum::from_u64(0xFFFFFFFFFFFFFFC5);
        let ctx = MontgomeryCtx::new(&modulus).unwrap();
        let check = modulus.limbs()[0].wrapping_mul(ctx.n_prime);
        assert_eq!(check, u64::MAX);
    }

    #[test]
    fn test_montgomery_roundtrip() {
        // to_mont then from_mont should give back the original value
        let modulus = BigNum::from_u64(0xFFFFFFFFFFFFFFC5); // large odd number
        let ctx = MontgomeryCtx::new(&modulus).unwrap();

        let a = BigNum::from_u64(42);
        let a_mont = ctx.to_mont(&a).unwrap();
        let a_back = ctx.from_mont(&a_mont);
        assert_eq!(a, a_back);
    }

    #[test]
    fn test_montgomery_mul() {
        let modulus = BigNum::from_u64(97); // small odd prime
        let ctx = MontgomeryCtx::new(&modulus).unwrap();

        let a = BigNum::from_u64(45);
        let b = BigNum::from_u64(67);

        let a_mont = ctx.to_mont(&a).unwrap();
        let b_mont = ctx.to_mont(&b).unwrap();
        let c_mont = ctx.mont_mul(&a_mont, &b_mont);
        let c = ctx.from_mont(&c_mont);

        // 45 * 67 = 3015, 3015 mod 97 = 3015 - 31*97 = 3015 - 3007 = 8
        assert_eq!(c, BigNum::from_u64(8));
    }

    #[test]
    fn test_modulus_near_r() {
        // SM2 field prime: Montgomery reduction produces a carry limb.
        let p = BigNum::from_bytes_be(&[
            0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xff, 0xff, 0xff,
        ]);
        let ctx = MontgomeryCtx::new(&p).unwrap();
        let a = p.sub(&BigNum::from_u64(1));
        let a_mont = ctx.to_mont(&a).unwrap();
        // (p-1)^2 = 1 mod p
        let sq = ctx.from_mont(&ctx.mont_sqr(&a_mont));
        assert_eq!(sq, BigNum::from_u64(1));
        assert_eq!(ctx.from_mont(&ctx.one()), BigNum::from_u64(1));
    }

    #[test]
    fn test_even_modulus_rejected() {
        let modulus = BigNum::from_u64(100);
        assert!(MontgomeryCtx::new(&modulus).is_err());
    }
}
