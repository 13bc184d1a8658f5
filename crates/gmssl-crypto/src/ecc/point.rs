//! Jacobian coordinate point arithmetic over the curve's prime field.
//!
//! Coordinates (X, Y, Z) represent the affine point (X/Z², Y/Z³) and are
//! held in Montgomery form. The point at infinity has Z = 0.

use gmssl_bignum::{BigNum, MontgomeryCtx};
use gmssl_types::CryptoError;
use subtle::Choice;

/// Prime field arithmetic on Montgomery-form elements in `[0, p)`.
#[derive(Clone)]
pub(crate) struct Field {
    mont: MontgomeryCtx,
    p: BigNum,
    p_minus_2: BigNum,
}

impl Field {
    pub fn new(p: &BigNum) -> Result<Self, CryptoError> {
        Ok(Field {
            mont: MontgomeryCtx::new(p)?,
            p: p.clone(),
            p_minus_2: p.sub(&BigNum::from_u64(2)),
        })
    }

    pub fn to_mont(&self, a: &BigNum) -> Result<BigNum, CryptoError> {
        self.mont.to_mont(a)
    }

    pub fn from_mont(&self, a: &BigNum) -> BigNum {
        self.mont.from_mont(a)
    }

    pub fn one(&self) -> BigNum {
        self.mont.one()
    }

    pub fn add(&self, a: &BigNum, b: &BigNum) -> BigNum {
        a.add(b).ct_sub_if_gte(&self.p)
    }

    pub fn sub(&self, a: &BigNum, b: &BigNum) -> BigNum {
        a.add(&self.p).sub(b).ct_sub_if_gte(&self.p)
    }

    pub fn dbl(&self, a: &BigNum) -> BigNum {
        self.add(a, a)
    }

    pub fn mul(&self, a: &BigNum, b: &BigNum) -> BigNum {
        self.mont.mont_mul(a, b)
    }

    pub fn sqr(&self, a: &BigNum) -> BigNum {
        self.mont.mont_sqr(a)
    }

    /// a^(p-2). The exponent is public, so the sequence of operations does
    /// not depend on `a`.
    pub fn inv(&self, a: &BigNum) -> BigNum {
        let mut r = self.one();
        for i in (0..self.p_minus_2.bit_len()).rev() {
            r = self.sqr(&r);
            if self.p_minus_2.get_bit(i) == 1 {
                r = self.mul(&r, a);
            }
        }
        r
    }
}

#[derive(Clone)]
pub(crate) struct JacobianPoint {
    pub x: BigNum,
    pub y: BigNum,
    pub z: BigNum,
}

impl JacobianPoint {
    pub fn infinity(field: &Field) -> Self {
        JacobianPoint {
            x: field.one(),
            y: field.one(),
            z: BigNum::zero(),
        }
    }

    /// Lift affine coordinates (plain integers below p).
    pub fn from_affine(x: &BigNum, y: &BigNum, field: &Field) -> Result<Self, CryptoError> {
        Ok(JacobianPoint {
            x: field.to_mont(x)?,
            y: field.to_mont(y)?,
            z: field.one(),
        })
    }

    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// Affine coordinates as plain integers, or `None` at infinity.
    pub fn to_affine(&self, field: &Field) -> Option<(BigNum, BigNum)> {
        if self.is_infinity() {
            return None;
        }
        let z_inv = field.inv(&self.z);
        let z_inv2 = field.sqr(&z_inv);
        let z_inv3 = field.mul(&z_inv2, &z_inv);
        let x = field.from_mont(&field.mul(&self.x, &z_inv2));
        let y = field.from_mont(&field.mul(&self.y, &z_inv3));
        Some((x, y))
    }

    fn ct_swap(a: &mut Self, b: &mut Self, choice: Choice) {
        BigNum::ct_swap(&mut a.x, &mut b.x, choice);
        BigNum::ct_swap(&mut a.y, &mut b.y, choice);
        BigNum::ct_swap(&mut a.z, &mut b.z, choice);
    }
}

/// R = A + B.
pub(crate) fn point_add(a: &JacobianPoint, b: &JacobianPoint, f: &Field) -> JacobianPoint {
    if a.is_infinity() {
        return b.clone();
    }
    if b.is_infinity() {
        return a.clone();
    }

    let z1_sq = f.sqr(&a.z);
    let z2_sq = f.sqr(&b.z);
    let u1 = f.mul(&a.x, &z2_sq);
    let u2 = f.mul(&b.x, &z1_sq);
    let s1 = f.mul(&a.y, &f.mul(&z2_sq, &b.z));
    let s2 = f.mul(&b.y, &f.mul(&z1_sq, &a.z));

    let h = f.sub(&u2, &u1);
    let r = f.sub(&s2, &s1);
    if h.is_zero() {
        if r.is_zero() {
            return point_double(a, f);
        }
        return JacobianPoint::infinity(f);
    }

    let h_sq = f.sqr(&h);
    let h_cu = f.mul(&h_sq, &h);
    let u1_h_sq = f.mul(&u1, &h_sq);

    // X3 = R² - H³ - 2·U1·H²
    let x3 = f.sub(&f.sub(&f.sqr(&r), &h_cu), &f.dbl(&u1_h_sq));
    // Y3 = R·(U1·H² - X3) - S1·H³
    let y3 = f.sub(&f.mul(&r, &f.sub(&u1_h_sq, &x3)), &f.mul(&s1, &h_cu));
    // Z3 = H·Z1·Z2
    let z3 = f.mul(&f.mul(&h, &a.z), &b.z);

    JacobianPoint {
        x: x3,
        y: y3,
        z: z3,
    }
}

/// R = 2A, using M = 3·(X + Z²)·(X - Z²) since a = -3.
pub(crate) fn point_double(a: &JacobianPoint, f: &Field) -> JacobianPoint {
    if a.is_infinity() || a.y.is_zero() {
        return JacobianPoint::infinity(f);
    }

    let y_sq = f.sqr(&a.y);
    // S = 4·X·Y²
    let s = f.dbl(&f.dbl(&f.mul(&a.x, &y_sq)));

    let z_sq = f.sqr(&a.z);
    let t = f.mul(&f.add(&a.x, &z_sq), &f.sub(&a.x, &z_sq));
    let m = f.add(&f.dbl(&t), &t);

    // X3 = M² - 2·S
    let x3 = f.sub(&f.sqr(&m), &f.dbl(&s));
    // Y3 = M·(S - X3) - 8·Y⁴
    let eight_y4 = f.dbl(&f.dbl(&f.dbl(&f.sqr(&y_sq))));
    let y3 = f.sub(&f.mul(&m, &f.sub(&s, &x3)), &eight_y4);
    // Z3 = 2·Y·Z
    let z3 = f.dbl(&f.mul(&a.y, &a.z));

    JacobianPoint {
        x: x3,
        y: y3,
        z: z3,
    }
}

/// R = k·P with a Montgomery ladder of fixed length.
///
/// The scalar is reduced mod n and then offset to k + n or k + 2n, whichever
/// has bit `bits(n)` set, so the ladder always runs over `bits(n)` steps
/// below a known top bit and the swaps are driven by `ct_swap`.
pub(crate) fn scalar_mul_ct(
    k: &BigNum,
    point: &JacobianPoint,
    n: &BigNum,
    f: &Field,
) -> Result<JacobianPoint, CryptoError> {
    let bits = n.bit_len();
    let k = k.mod_reduce(n)?;
    let k1 = k.add(n);
    let k2 = k1.add(n);
    let has_top = Choice::from(k1.get_bit(bits) as u8);
    let scalar = BigNum::ct_select(&k2, &k1, has_top);

    let mut r0 = point.clone();
    let mut r1 = point_double(point, f);
    for i in (0..bits).rev() {
        let bit = Choice::from(scalar.get_bit(i) as u8);
        JacobianPoint::ct_swap(&mut r0, &mut r1, bit);
        r1 = point_add(&r0, &r1, f);
        r0 = point_double(&r0, f);
        JacobianPoint::ct_swap(&mut r0, &mut r1, bit);
    }
    Ok(r0)
}

/// R = k1·G + k2·Q by Shamir's trick. Variable time; only for public scalars.
pub(crate) fn scalar_mul_add(
    k1: &BigNum,
    g: &JacobianPoint,
    k2: &BigNum,
    q: &JacobianPoint,
    f: &Field,
) -> JacobianPoint {
    let g_plus_q = point_add(g, q, f);
    let max_bits = k1.bit_len().max(k2.bit_len());

    let mut result = JacobianPoint::infinity(f);
    for i in (0..max_bits).rev() {
        result = point_double(&result, f);
        match (k1.get_bit(i), k2.get_bit(i)) {
            (1, 1) => result = point_add(&result, &g_plus_q, f),
            (1, 0) => result = point_add(&result, g, f),
            (0, 1) => result = point_add(&result, q, f),
            _ => {}
        }
    }
    result
}
