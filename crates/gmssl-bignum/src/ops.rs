//! Basic arithmetic operations for BigNum.

use crate::bignum::{BigNum, DoubleLimb, Limb, LIMB_BITS};
use gmssl_types::CryptoError;
use std::cmp::Ordering;

impl BigNum {
    /// Add two BigNums: self + other.
    pub fn add(&self, other: &BigNum) -> BigNum {
        if self.is_negative() == other.is_negative() {
            let mut result = add_unsigned(self.limbs(), other.limbs());
            result.set_negative(self.is_negative());
            result
        } else if self.is_negative() {
            // (-a) + b = b - a
            sub_unsigned(other.limbs(), self.limbs())
        } else {
            // a + (-b) = a - b
            sub_unsigned(self.limbs(), other.limbs())
        }
    }

    /// Subtract: self - other.
    pub fn sub(&self, other: &BigNum) -> BigNum {
        if self.is_negative() != other.is_negative() {
            let mut result = add_unsigned(self.limbs(), other.limbs());
            result.set_negative(self.is_negative());
            result
        } else if self.is_negative() {
            // (-a) - (-b) = b - a
            sub_unsigned(other.limbs(), self.limbs())
        } else {
            sub_unsigned(self.limbs(), other.limbs())
        }
    }

    /// Multiply: self * other.
    pub fn mul(&self, other: &BigNum) -> BigNum {
        let mut result = BigNum::from_limbs(mul_limbs(self.limbs(), other.limbs()));
        result.set_negative(self.is_negative() != other.is_negative());
        result
    }

    /// Square: self * self.
    pub fn sqr(&self) -> BigNum {
        BigNum::from_limbs(mul_limbs(self.limbs(), self.limbs()))
    }

    /// Shift the magnitude left by `bits`.
    pub fn shl(&self, bits: usize) -> BigNum {
        let limb_shift = bits / LIMB_BITS;
        let bit_shift = bits % LIMB_BITS;
        let src = self.limbs();
        let mut limbs = vec![0u64; src.len() + limb_shift + 1];
        for (i, &l) in src.iter().enumerate() {
            limbs[i + limb_shift] |= l << bit_shift;
            if bit_shift != 0 {
                limbs[i + limb_shift + 1] = l >> (LIMB_BITS - bit_shift);
            }
        }
        let mut bn = BigNum::from_limbs(limbs);
        bn.set_negative(self.is_negative());
        bn
    }

    /// Division with remainder on magnitudes: returns (quotient, remainder).
    ///
    /// Knuth, TAOCP vol. 2, 4.3.1 Algorithm D.
    pub fn div_rem(&self, divisor: &BigNum) -> Result<(BigNum, BigNum), CryptoError> {
        if divisor.is_zero() {
            return Err(CryptoError::BnDivisionByZero);
        }
        let u = trim(self.limbs());
        let v = trim(divisor.limbs());
        if cmp_limbs(u, v) == Ordering::Less {
            return Ok((BigNum::zero(), BigNum::from_limbs(u.to_vec())));
        }
        let (q, r) = div_rem_knuth(u, v);
        Ok((BigNum::from_limbs(q), BigNum::from_limbs(r)))
    }

    /// Modular reduction: self mod modulus, result in `[0, modulus)`.
    ///
    /// Negative inputs are mapped to their non-negative residue.
    pub fn mod_reduce(&self, modulus: &BigNum) -> Result<BigNum, CryptoError> {
        let (_, r) = self.div_rem(modulus)?;
        if self.is_negative() && !r.is_zero() {
            let mut m = modulus.clone();
            m.set_negative(false);
            return Ok(m.sub(&r));
        }
        Ok(r)
    }
}

/// Strip most-significant zero limbs, keeping at least one limb.
fn trim(a: &[Limb]) -> &[Limb] {
    let mut len = a.len();
    while len > 1 && a[len - 1] == 0 {
        len -= 1;
    }
    &a[..len.max(1).min(a.len())]
}

fn cmp_limbs(a: &[Limb], b: &[Limb]) -> Ordering {
    let max_len = a.len().max(b.len());
    for i in (0..max_len).rev() {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        if av != bv {
            return av.cmp(&bv);
        }
    }
    Ordering::Equal
}

/// Add two unsigned limb arrays.
fn add_unsigned(a: &[Limb], b: &[Limb]) -> BigNum {
    let max_len = a.len().max(b.len());
    let mut limbs = vec![0u64; max_len + 1];
    let mut carry: u64 = 0;

    for (i, out) in limbs.iter_mut().take(max_len).enumerate() {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        let sum = av as DoubleLimb + bv as DoubleLimb + carry as DoubleLimb;
        *out = sum as Limb;
        carry = (sum >> LIMB_BITS) as u64;
    }
    limbs[max_len] = carry;
    BigNum::from_limbs(limbs)
}

/// Subtract unsigned magnitudes: |a| - |b|, signed result.
fn sub_unsigned(a: &[Limb], b: &[Limb]) -> BigNum {
    let (larger, smaller, negative) = match cmp_limbs(a, b) {
        Ordering::Less => (b, a, true),
        Ordering::Equal => return BigNum::zero(),
        Ordering::Greater => (a, b, false),
    };

    let mut limbs = vec![0u64; larger.len()];
    let mut borrow: u64 = 0;
    for (i, out) in limbs.iter_mut().enumerate() {
        let sv = smaller.get(i).copied().unwrap_or(0);
        let (d1, b1) = larger[i].overflowing_sub(sv);
        let (d2, b2) = d1.overflowing_sub(borrow);
        *out = d2;
        borrow = (b1 | b2) as u64;
    }

    let mut bn = BigNum::from_limbs(limbs);
    bn.set_negative(negative);
    bn
}

/// Schoolbook product of two limb arrays.
fn mul_limbs(a: &[Limb], b: &[Limb]) -> Vec<Limb> {
    let mut limbs = vec![0u64; a.len() + b.len()];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        let mut carry: u64 = 0;
        for (j, &bj) in b.iter().enumerate() {
            let prod = ai as DoubleLimb * bj as DoubleLimb
                + limbs[i + j] as DoubleLimb
                + carry as DoubleLimb;
            limbs[i + j] = prod as Limb;
            carry = (prod >> LIMB_BITS) as u64;
        }
        limbs[i + b.len()] = carry;
    }
    limbs
}

/// Algorithm D on trimmed magnitudes with `u >= v`, `v != 0`.
fn div_rem_knuth(u: &[Limb], v: &[Limb]) -> (Vec<Limb>, Vec<Limb>) {
    const BASE: DoubleLimb = 1 << LIMB_BITS;
    let n = v.len();
    let m = u.len();

    if n == 1 {
        let d = v[0] as DoubleLimb;
        let mut q = vec![0u64; m];
        let mut rem: DoubleLimb = 0;
        for j in (0..m).rev() {
            let cur = (rem << LIMB_BITS) | u[j] as DoubleLimb;
            q[j] = (cur / d) as Limb;
            rem = cur % d;
        }
        return (q, vec![rem as Limb]);
    }

    // D1: normalize so the top limb of v has its high bit set.
    let s = v[n - 1].leading_zeros() as usize;
    let vn: Vec<Limb> = (0..n)
        .map(|i| {
            let lo = if s != 0 && i > 0 {
                v[i - 1] >> (LIMB_BITS - s)
            } else {
                0
            };
            (v[i] << s) | lo
        })
        .collect();
    let mut un = vec![0u64; m + 1];
    un[m] = if s != 0 { u[m - 1] >> (LIMB_BITS - s) } else { 0 };
    for i in 0..m {
        let lo = if s != 0 && i > 0 {
            u[i - 1] >> (LIMB_BITS - s)
        } else {
            0
        };
        un[i] = (u[i] << s) | lo;
    }

    let mut q = vec![0u64; m - n + 1];
    let v_top = vn[n - 1] as DoubleLimb;
    let v_next = vn[n - 2] as DoubleLimb;

    for j in (0..=m - n).rev() {
        // D3: estimate qhat from the top two limbs.
        let num = ((un[j + n] as DoubleLimb) << LIMB_BITS) | un[j + n - 1] as DoubleLimb;
        let mut qhat = num / v_top;
        let mut rhat = num % v_top;
        while qhat >= BASE || qhat * v_next > ((rhat << LIMB_BITS) | un[j + n - 2] as DoubleLimb)
        {
            qhat -= 1;
            rhat += v_top;
            if rhat >= BASE {
                break;
            }
        }

        // D4: multiply and subtract.
        let mut borrow: u64 = 0;
        let mut carry: DoubleLimb = 0;
        for i in 0..n {
            let p = qhat * vn[i] as DoubleLimb + carry;
            carry = p >> LIMB_BITS;
            let (d1, b1) = un[i + j].overflowing_sub(p as Limb);
            let (d2, b2) = d1.overflowing_sub(borrow);
            un[i + j] = d2;
            borrow = (b1 | b2) as u64;
        }
        let (d1, b1) = un[j + n].overflowing_sub(carry as Limb);
        let (d2, b2) = d1.overflowing_sub(borrow);
        un[j + n] = d2;

        q[j] = qhat as Limb;

        // D6: add back if the estimate was one too large.
        if b1 | b2 {
            q[j] = q[j].wrapping_sub(1);
            let mut c: DoubleLimb = 0;
            for i in 0..n {
                let t = un[i + j] as DoubleLimb + vn[i] as DoubleLimb + c;
                un[i + j] = t as Limb;
                c = t >> LIMB_BITS;
            }
            un[j + n] = un[j + n].wrapping_add(c as Limb);
        }
    }

    // D8: unnormalize the remainder.
    let r = (0..n)
        .map(|i| {
            let hi = if s != 0 {
                un[i + 1] << (LIMB_BITS - s)
            } else {
                0
            };
            (un[i] >> s) | hi
        })
        .collect();
    (q, r)
}
