//! Constant-time operations for big numbers.
//!
//! Limb loops run over the wider operand's full width and never branch on
//! limb values.

use crate::bignum::BigNum;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

impl BigNum {
    /// Constant-time equality comparison.
    pub fn ct_eq(&self, other: &BigNum) -> Choice {
        let max_len = self.limbs().len().max(other.limbs().len());
        let mut result = (self.is_negative() as u8).ct_eq(&(other.is_negative() as u8));
        for i in 0..max_len {
            result &= limb(self, i).ct_eq(&limb(other, i));
        }
        result
    }

    /// Constant-time conditional select: returns `a` if choice == 0, `b` if choice == 1.
    pub fn ct_select(a: &BigNum, b: &BigNum, choice: Choice) -> BigNum {
        let max_len = a.limbs().len().max(b.limbs().len());
        let limbs = (0..max_len)
            .map(|i| u64::conditional_select(&limb(a, i), &limb(b, i), choice))
            .collect();
        let neg = u8::conditional_select(&(a.is_negative() as u8), &(b.is_negative() as u8), choice);
        let mut result = BigNum::from_limbs(limbs);
        result.set_negative(neg != 0);
        result
    }

    /// Swap `a` and `b` when `choice == 1`, without branching on `choice`.
    pub fn ct_swap(a: &mut BigNum, b: &mut BigNum, choice: Choice) {
        let new_a = BigNum::ct_select(a, b, choice);
        let new_b = BigNum::ct_select(b, a, choice);
        *a = new_a;
        *b = new_b;
    }

    /// Constant-time conditional subtraction: if self >= modulus, return self - modulus,
    /// otherwise return self.
    pub fn ct_sub_if_gte(&self, modulus: &BigNum) -> BigNum {
        let max_len = self.limbs().len().max(modulus.limbs().len());
        let mut diff = vec![0u64; max_len];
        let mut borrow: u64 = 0;
        for (i, d) in diff.iter_mut().enumerate() {
            let (d1, b1) = limb(self, i).overflowing_sub(limb(modulus, i));
            let (d2, b2) = d1.overflowing_sub(borrow);
            *d = d2;
            borrow = (b1 | b2) as u64;
        }
        let use_diff = Choice::from((borrow ^ 1) as u8);
        BigNum::ct_select(self, &BigNum::from_limbs(diff), use_diff)
    }
}

#[inline]
fn limb(a: &BigNum, i: usize) -> u64 {
    a.limbs().get(i).copied().unwrap_or(0)
}

impl ConstantTimeEq for BigNum {
    fn ct_eq(&self, other: &Self) -> Choice {
        BigNum::ct_eq(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ct_eq() {
        let a = BigNum::from_u64(42);
        let b = BigNum::from_u64(42);
        let c = BigNum::from_u64(43);
        assert_eq!(a.ct_eq(&b).unwrap_u8(), 1);
        assert_eq!(a.ct_eq(&c).unwrap_u8(), 0);
    }

    #[test]
    fn test_ct_select_and_swap() {
        let a = BigNum::from_u64(10);
        let b = BigNum::from_u64(20);
        assert_eq!(BigNum::ct_select(&a, &b, Choice::from(0)), a);
        assert_eq!(BigNum::ct_select(&a, &b, Choice::from(1)), b);

        let mut x = a.clone();
        let mut y = b.clone();
        BigNum::ct_swap(&mut x, &mut y, Choice::from(0));
        assert_eq!((x.clone(), y.clone()), (a.clone(), b.clone()));
        BigNum::ct_swap(&mut x, &mut y, Choice::from(1));
        assert_eq!((x, y), (b, a));
    }

    #[test]
    fn test_ct_sub_if_gte() {
        let modulus = BigNum::from_u64(97);
        assert_eq!(BigNum::from_u64(100).ct_sub_if_gte(&modulus), BigNum::from_u64(3));
        assert_eq!(BigNum::from_u64(50).ct_sub_if_gte(&modulus), BigNum::from_u64(50));
        assert!(BigNum::from_u64(97).ct_sub_if_gte(&modulus).is_zero());
    }
}
