//! Elliptic curve group operations.
//!
//! [`EcGroup`] wraps a named curve and exposes the scalar multiplications
//! the SM2 protocols need. Points handed out by the group are affine and
//! never the point at infinity; any operation that would produce it
//! returns [`CryptoError::EccPointAtInfinity`].

pub(crate) mod curves;
mod point;

use gmssl_bignum::BigNum;
use gmssl_types::{CryptoError, EccCurveId};

use curves::{get_curve_params, CurveParams};
use point::{point_add, scalar_mul_add, scalar_mul_ct, Field, JacobianPoint};

/// An affine point on a curve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcPoint {
    x: BigNum,
    y: BigNum,
}

impl EcPoint {
    pub fn x(&self) -> &BigNum {
        &self.x
    }

    pub fn y(&self) -> &BigNum {
        &self.y
    }
}

/// A named curve with precomputed field context.
#[derive(Clone)]
pub struct EcGroup {
    curve_id: EccCurveId,
    params: CurveParams,
    field: Field,
}

impl EcGroup {
    pub fn new(curve_id: EccCurveId) -> Result<Self, CryptoError> {
        let params = get_curve_params(curve_id);
        let field = Field::new(&params.p)?;
        Ok(EcGroup {
            curve_id,
            params,
            field,
        })
    }

    pub fn curve_id(&self) -> EccCurveId {
        self.curve_id
    }

    /// Order of the base point.
    pub fn order(&self) -> &BigNum {
        &self.params.n
    }

    /// Size of one coordinate in bytes.
    pub fn field_size(&self) -> usize {
        self.params.field_size
    }

    pub fn generator(&self) -> EcPoint {
        EcPoint {
            x: self.params.gx.clone(),
            y: self.params.gy.clone(),
        }
    }

    /// Check y² = x³ + ax + b with both coordinates reduced.
    pub fn is_on_curve(&self, point: &EcPoint) -> Result<bool, CryptoError> {
        let p = &self.params.p;
        if point.x >= *p || point.y >= *p || point.x.is_negative() || point.y.is_negative() {
            return Ok(false);
        }
        let lhs = point.y.mod_mul(&point.y, p)?;
        let x3 = point.x.mod_mul(&point.x, p)?.mod_mul(&point.x, p)?;
        let ax = self.params.a.mod_mul(&point.x, p)?;
        let rhs = x3.mod_add(&ax, p)?.mod_add(&self.params.b, p)?;
        Ok(lhs == rhs)
    }

    /// Build a point from coordinates, rejecting anything off the curve.
    pub fn point(&self, x: BigNum, y: BigNum) -> Result<EcPoint, CryptoError> {
        let pt = EcPoint { x, y };
        if !self.is_on_curve(&pt)? {
            return Err(CryptoError::EccPointNotOnCurve);
        }
        Ok(pt)
    }

    /// Decode `x ‖ y` or `04 ‖ x ‖ y`.
    pub fn decode_point(&self, bytes: &[u8]) -> Result<EcPoint, CryptoError> {
        let fs = self.field_size();
        let coords = match bytes.len() {
            n if n == 2 * fs => bytes,
            n if n == 2 * fs + 1 && bytes[0] == 0x04 => &bytes[1..],
            _ => return Err(CryptoError::EccInvalidPublicKey),
        };
        self.point(
            BigNum::from_bytes_be(&coords[..fs]),
            BigNum::from_bytes_be(&coords[fs..]),
        )
    }

    /// Encode as fixed-width `x ‖ y`.
    pub fn encode_point(&self, point: &EcPoint) -> Result<Vec<u8>, CryptoError> {
        let fs = self.field_size();
        let mut out = point.x.to_bytes_be_padded(fs)?;
        out.extend(point.y.to_bytes_be_padded(fs)?);
        Ok(out)
    }

    /// k·G in constant time.
    pub fn scalar_mul_base(&self, k: &BigNum) -> Result<EcPoint, CryptoError> {
        self.scalar_mul(k, &self.generator())
    }

    /// k·P in constant time.
    pub fn scalar_mul(&self, k: &BigNum, point: &EcPoint) -> Result<EcPoint, CryptoError> {
        let p = self.to_jacobian(point)?;
        let r = scalar_mul_ct(k, &p, &self.params.n, &self.field)?;
        self.to_point(&r)
    }

    /// k1·G + k2·Q. Variable time: the scalars must be public.
    pub fn mul_add(&self, k1: &BigNum, k2: &BigNum, q: &EcPoint) -> Result<EcPoint, CryptoError> {
        let g = self.to_jacobian(&self.generator())?;
        let q = self.to_jacobian(q)?;
        let r = scalar_mul_add(k1, &g, k2, &q, &self.field);
        self.to_point(&r)
    }

    /// P + Q.
    pub fn add(&self, a: &EcPoint, b: &EcPoint) -> Result<EcPoint, CryptoError> {
        let r = point_add(&self.to_jacobian(a)?, &self.to_jacobian(b)?, &self.field);
        self.to_point(&r)
    }

    fn to_jacobian(&self, point: &EcPoint) -> Result<JacobianPoint, CryptoError> {
        JacobianPoint::from_affine(&point.x, &point.y, &self.field)
    }

    fn to_point(&self, p: &JacobianPoint) -> Result<EcPoint, CryptoError> {
        let (x, y) = p.to_affine(&self.field).ok_or(CryptoError::EccPointAtInfinity)?;
        Ok(EcPoint { x, y })
    }
}
