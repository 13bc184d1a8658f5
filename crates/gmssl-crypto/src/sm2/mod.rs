//! SM2 elliptic curve public-key cryptography (GB/T 32918).
//!
//! Signatures bind the signer's identity and public key through the Z
//! value: the signed digest is `SM3(Z ‖ M)`. [`Sm2SignContext`] and
//! [`Sm2VerifyContext`] compute it while streaming the message; the raw
//! [`Sm2KeyPair::sign`] / [`Sm2KeyPair::verify`] take the finished digest.
//!
//! Signatures are DER `SEQUENCE { INTEGER r, INTEGER s }`. Public-key
//! encryption lives in the `encrypt` submodule.

mod encrypt;

pub use encrypt::{
    SM2_MAX_CIPHERTEXT_LEN, SM2_MAX_PLAINTEXT_LEN, SM2_MIN_CIPHERTEXT_LEN, SM2_MIN_PLAINTEXT_LEN,
};

use gmssl_bignum::BigNum;
use gmssl_types::{CryptoError, EccCurveId};
use gmssl_utils::asn1::{Decoder, Encoder};

use crate::ecc::curves::{SM2_A, SM2_B, SM2_GX, SM2_GY};
use crate::ecc::{EcGroup, EcPoint};
use crate::provider::{Signer, Verifier};
use crate::rand::random_scalar;
use crate::sm3::{Sm3, SM3_OUTPUT_SIZE};

/// Signer identity used when the caller supplies none.
pub const SM2_DEFAULT_ID: &[u8] = b"1234567812345678";

/// Upper bound on a DER signature: two 33-byte INTEGERs plus headers.
pub const SM2_MAX_SIGNATURE_LEN: usize = 72;

const SM2_SCALAR_LEN: usize = 32;
const SM2_PUBLIC_KEY_LEN: usize = 64;

/// Fresh nonces tried before signing or encryption gives up.
const MAX_RETRIES: usize = 100;

/// An SM2 key pair, or a public key alone for verification and encryption.
#[derive(Clone)]
pub struct Sm2KeyPair {
    group: EcGroup,
    /// d in [1, n-2], absent for public-only keys.
    private_key: Option<BigNum>,
    public_key: EcPoint,
    public_key_bytes: [u8; SM2_PUBLIC_KEY_LEN],
}

impl std::fmt::Debug for Sm2KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sm2KeyPair")
            .field("public_key", &self.public_key)
            .field("has_private_key", &self.private_key.is_some())
            .finish()
    }
}

impl Sm2KeyPair {
    /// Generate a new key pair from the process random source.
    pub fn generate() -> Result<Self, CryptoError> {
        let group = EcGroup::new(EccCurveId::Sm2Prime256)?;
        // 1 + d must stay invertible mod n, so d < n - 1.
        let bound = group.order().sub(&BigNum::from_u64(1));
        let d = random_scalar(&bound)?;
        Self::with_private(group, d)
    }

    /// Import a big-endian private scalar of at most 32 bytes.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        if private_key.len() > SM2_SCALAR_LEN {
            return Err(CryptoError::EccInvalidPrivateKey);
        }
        let group = EcGroup::new(EccCurveId::Sm2Prime256)?;
        let d = BigNum::from_bytes_be(private_key);
        let bound = group.order().sub(&BigNum::from_u64(1));
        if d.is_zero() || d >= bound {
            return Err(CryptoError::EccInvalidPrivateKey);
        }
        Self::with_private(group, d)
    }

    /// Import a public key as `x ‖ y` (64 bytes) or `04 ‖ x ‖ y` (65 bytes).
    pub fn from_public_key(public_key: &[u8]) -> Result<Self, CryptoError> {
        let group = EcGroup::new(EccCurveId::Sm2Prime256)?;
        let point = group.decode_point(public_key)?;
        Self::assemble(group, None, point)
    }

    fn with_private(group: EcGroup, d: BigNum) -> Result<Self, CryptoError> {
        let point = group.scalar_mul_base(&d)?;
        Self::assemble(group, Some(d), point)
    }

    fn assemble(
        group: EcGroup,
        private_key: Option<BigNum>,
        public_key: EcPoint,
    ) -> Result<Self, CryptoError> {
        let encoded = group.encode_point(&public_key)?;
        let public_key_bytes = encoded
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::EccInvalidPublicKey)?;
        Ok(Sm2KeyPair {
            group,
            private_key,
            public_key,
            public_key_bytes,
        })
    }

    /// The public point as `x ‖ y`.
    pub fn public_key_bytes(&self) -> [u8; SM2_PUBLIC_KEY_LEN] {
        self.public_key_bytes
    }

    pub fn public_key(&self) -> &EcPoint {
        &self.public_key
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// The private scalar as 32 big-endian bytes.
    pub fn private_key_bytes(&self) -> Option<[u8; SM2_SCALAR_LEN]> {
        let d = self.private_key.as_ref()?;
        let mut out = [0u8; SM2_SCALAR_LEN];
        let bytes = d.to_bytes_be();
        out.get_mut(SM2_SCALAR_LEN.checked_sub(bytes.len())?..)?
            .copy_from_slice(&bytes);
        Some(out)
    }

    fn private_scalar(&self) -> Result<&BigNum, CryptoError> {
        self.private_key.as_ref().ok_or(CryptoError::Sm2NoPrivateKey)
    }

    /// Z = SM3(ENTL ‖ ID ‖ a ‖ b ‖ Gx ‖ Gy ‖ xA ‖ yA), where ENTL is the
    /// bit length of `id` as a 16-bit big-endian integer.
    pub fn compute_z(&self, id: &[u8]) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let entl = id
            .len()
            .checked_mul(8)
            .and_then(|bits| u16::try_from(bits).ok())
            .ok_or(CryptoError::InvalidIdLength(id.len()))?;

        let mut h = Sm3::new();
        h.update(&entl.to_be_bytes())?;
        h.update(id)?;
        for part in [&SM2_A, &SM2_B, &SM2_GX, &SM2_GY] {
            h.update(part)?;
        }
        h.update(&self.public_key_bytes)?;
        h.finish()
    }

    /// Sign a 32-byte digest `e = SM3(Z ‖ M)`.
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let e = digest_to_scalar(digest)?;
        let n = self.group.order();
        self.private_scalar()?;

        for _ in 0..MAX_RETRIES {
            let k = random_scalar(n)?;
            if let Some((r, s)) = self.sign_with_k(&e, &k)? {
                return encode_signature(&r, &s);
            }
        }
        tracing::warn!(retries = MAX_RETRIES, "sm2 signing exhausted nonce retries");
        Err(CryptoError::Sm2RetryExhausted)
    }

    /// One signing attempt with nonce `k`; `None` when the nonce yields a
    /// degenerate `r` or `s`.
    pub(crate) fn sign_with_k(
        &self,
        e: &BigNum,
        k: &BigNum,
    ) -> Result<Option<(BigNum, BigNum)>, CryptoError> {
        let d = self.private_scalar()?;
        let n = self.group.order();

        let kg = self.group.scalar_mul_base(k)?;
        // r = (e + x1) mod n
        let r = e.mod_reduce(n)?.mod_add(&kg.x().mod_reduce(n)?, n)?;
        if r.is_zero() || r.add(k) == *n {
            return Ok(None);
        }

        // s = (1 + d)^-1 · (k - r·d) mod n
        let inv = d.add(&BigNum::from_u64(1)).mod_inv(n)?;
        let rd = r.mod_mul(d, n)?;
        let s = inv.mod_mul(&k.mod_sub(&rd, n)?, n)?;
        if s.is_zero() {
            return Ok(None);
        }
        Ok(Some((r, s)))
    }

    /// Verify a DER signature over a 32-byte digest.
    ///
    /// Malformed or out-of-range signatures verify as `false`.
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        let e = digest_to_scalar(digest)?;
        let n = self.group.order();

        let Some((r, s)) = decode_signature(signature) else {
            return Ok(false);
        };
        if r.is_zero() || r >= *n || s.is_zero() || s >= *n {
            return Ok(false);
        }

        let t = r.mod_add(&s, n)?;
        if t.is_zero() {
            return Ok(false);
        }

        // (x1, y1) = s·G + t·P
        let point = match self.group.mul_add(&s, &t, &self.public_key) {
            Ok(p) => p,
            Err(CryptoError::EccPointAtInfinity) => return Ok(false),
            Err(e) => return Err(e),
        };
        let v = e.mod_reduce(n)?.mod_add(&point.x().mod_reduce(n)?, n)?;
        Ok(v == r)
    }

    /// Sign `message` under identity `id`, computing Z internally.
    pub fn sign_message(&self, id: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut ctx = Sm2SignContext::new(self, id)?;
        ctx.update(message)?;
        ctx.sign()
    }

    /// Verify a signature over `message` under identity `id`.
    pub fn verify_message(
        &self,
        id: &[u8],
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        let mut ctx = Sm2VerifyContext::new(self, id)?;
        ctx.update(message)?;
        ctx.verify(signature)
    }
}

impl Signer for Sm2KeyPair {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Sm2KeyPair::sign(self, digest)
    }
}

impl Verifier for Sm2KeyPair {
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        Sm2KeyPair::verify(self, digest, signature)
    }
}

/// Streaming signer: hashes `Z ‖ M` and signs the result.
pub struct Sm2SignContext<'a> {
    key: &'a Sm2KeyPair,
    hash: Sm3,
}

impl<'a> Sm2SignContext<'a> {
    /// Fails up front if `key` has no private scalar.
    pub fn new(key: &'a Sm2KeyPair, id: &[u8]) -> Result<Self, CryptoError> {
        key.private_scalar()?;
        Ok(Sm2SignContext {
            key,
            hash: seeded_hash(key, id)?,
        })
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.hash.update(data)
    }

    pub fn sign(mut self) -> Result<Vec<u8>, CryptoError> {
        let digest = self.hash.finish()?;
        self.key.sign(&digest)
    }
}

/// Streaming verifier: hashes `Z ‖ M` and checks a signature against it.
pub struct Sm2VerifyContext<'a> {
    key: &'a Sm2KeyPair,
    hash: Sm3,
}

impl<'a> Sm2VerifyContext<'a> {
    pub fn new(key: &'a Sm2KeyPair, id: &[u8]) -> Result<Self, CryptoError> {
        Ok(Sm2VerifyContext {
            key,
            hash: seeded_hash(key, id)?,
        })
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.hash.update(data)
    }

    pub fn verify(mut self, signature: &[u8]) -> Result<bool, CryptoError> {
        let digest = self.hash.finish()?;
        self.key.verify(&digest, signature)
    }
}

fn seeded_hash(key: &Sm2KeyPair, id: &[u8]) -> Result<Sm3, CryptoError> {
    let z = key.compute_z(id)?;
    let mut hash = Sm3::new();
    hash.update(&z)?;
    Ok(hash)
}

fn digest_to_scalar(digest: &[u8]) -> Result<BigNum, CryptoError> {
    if digest.len() != SM3_OUTPUT_SIZE {
        return Err(CryptoError::InvalidDigestSize {
            expected: SM3_OUTPUT_SIZE,
            got: digest.len(),
        });
    }
    Ok(BigNum::from_bytes_be(digest))
}

fn encode_signature(r: &BigNum, s: &BigNum) -> Result<Vec<u8>, CryptoError> {
    let mut inner = Encoder::new();
    inner
        .write_integer(&r.to_bytes_be())
        .write_integer(&s.to_bytes_be());
    let mut outer = Encoder::new();
    outer.write_sequence(&inner.finish());
    let sig = outer.finish();
    if sig.len() > SM2_MAX_SIGNATURE_LEN {
        return Err(CryptoError::InvalidArg("signature exceeds maximum length"));
    }
    Ok(sig)
}

/// Parse `SEQUENCE { INTEGER r, INTEGER s }`; `None` on any malformation.
fn decode_signature(sig: &[u8]) -> Option<(BigNum, BigNum)> {
    if sig.len() > SM2_MAX_SIGNATURE_LEN {
        return None;
    }
    let mut outer = Decoder::new(sig);
    let mut seq = outer.read_sequence().ok()?;
    outer.finish().ok()?;
    let r = seq.read_unsigned_integer().ok()?;
    let s = seq.read_unsigned_integer().ok()?;
    seq.finish().ok()?;
    if r.len() > SM2_SCALAR_LEN || s.len() > SM2_SCALAR_LEN {
        return None;
    }
    Some((BigNum::from_bytes_be(r), BigNum::from_bytes_be(s)))
}
