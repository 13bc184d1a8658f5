//! SM2 public-key encryption (GB/T 32918.4).
//!
//! Ciphertext layout is DER
//! `SEQUENCE { INTEGER x1, INTEGER y1, OCTET STRING C3, OCTET STRING C2 }`
//! where `(x1, y1) = k·G`, `C2 = M ⊕ KDF(x2 ‖ y2)` and
//! `C3 = SM3(x2 ‖ M ‖ y2)` for the shared point `(x2, y2) = k·P`.

use gmssl_bignum::BigNum;
use gmssl_types::CryptoError;
use gmssl_utils::asn1::{Decoder, Encoder};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{Sm2KeyPair, MAX_RETRIES, SM2_SCALAR_LEN};
use crate::ecc::EcPoint;
use crate::rand::random_scalar;
use crate::sm3::{Sm3, SM3_OUTPUT_SIZE};

pub const SM2_MIN_PLAINTEXT_LEN: usize = 1;
pub const SM2_MAX_PLAINTEXT_LEN: usize = 255;
pub const SM2_MIN_CIPHERTEXT_LEN: usize = 45;
pub const SM2_MAX_CIPHERTEXT_LEN: usize = 366;

impl Sm2KeyPair {
    /// Encrypt 1 to 255 bytes to this public key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if !(SM2_MIN_PLAINTEXT_LEN..=SM2_MAX_PLAINTEXT_LEN).contains(&plaintext.len()) {
            return Err(CryptoError::InvalidPlaintextLength(plaintext.len()));
        }
        let n = self.group.order();
        for _ in 0..MAX_RETRIES {
            let k = random_scalar(n)?;
            if let Some(ct) = self.encrypt_with_k(plaintext, &k)? {
                return Ok(ct);
            }
        }
        tracing::warn!(retries = MAX_RETRIES, "sm2 encryption exhausted nonce retries");
        Err(CryptoError::Sm2RetryExhausted)
    }

    /// One encryption attempt with ephemeral scalar `k`; `None` when the
    /// derived mask is all zero.
    pub(crate) fn encrypt_with_k(
        &self,
        plaintext: &[u8],
        k: &BigNum,
    ) -> Result<Option<Vec<u8>>, CryptoError> {
        let c1 = self.group.scalar_mul_base(k)?;
        let shared = self.group.scalar_mul(k, &self.public_key)?;
        let (mut x2, mut y2) = self.coordinates(&shared)?;

        let mut c2 = kdf(&x2, &y2, plaintext.len())?;
        if c2.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        c2.iter_mut().zip(plaintext).for_each(|(m, p)| *m ^= p);
        let c3 = tag(&x2, plaintext, &y2)?;
        x2.zeroize();
        y2.zeroize();

        let mut inner = Encoder::new();
        inner
            .write_integer(&c1.x().to_bytes_be())
            .write_integer(&c1.y().to_bytes_be())
            .write_octet_string(&c3)
            .write_octet_string(&c2);
        let mut outer = Encoder::new();
        outer.write_sequence(&inner.finish());
        Ok(Some(outer.finish()))
    }

    /// Decrypt a DER ciphertext with the private key.
    ///
    /// Every malformed or unauthenticated ciphertext fails the same way,
    /// with [`CryptoError::Sm2DecryptFail`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let d = self.private_scalar()?;
        if !(SM2_MIN_CIPHERTEXT_LEN..=SM2_MAX_CIPHERTEXT_LEN).contains(&ciphertext.len()) {
            return Err(CryptoError::InvalidCiphertextLength(ciphertext.len()));
        }

        let parts = parse_ciphertext(ciphertext).map_err(|e| reject("malformed encoding", e))?;
        let c1 = self
            .group
            .point(parts.x1, parts.y1)
            .map_err(|e| reject("ephemeral point", e))?;
        let shared = self
            .group
            .scalar_mul(d, &c1)
            .map_err(|e| reject("shared point", e))?;
        let (mut x2, mut y2) = self.coordinates(&shared)?;

        let mut plaintext = kdf(&x2, &y2, parts.c2.len())?;
        if plaintext.iter().all(|&b| b == 0) {
            return Err(reject("zero key stream", CryptoError::Sm2DecryptFail));
        }
        plaintext
            .iter_mut()
            .zip(parts.c2)
            .for_each(|(m, c)| *m ^= c);

        let expected = tag(&x2, &plaintext, &y2)?;
        x2.zeroize();
        y2.zeroize();
        if !bool::from(expected[..].ct_eq(parts.c3)) {
            plaintext.zeroize();
            return Err(reject("hash mismatch", CryptoError::Sm2DecryptFail));
        }
        Ok(plaintext)
    }

    fn coordinates(&self, point: &EcPoint) -> Result<([u8; 32], [u8; 32]), CryptoError> {
        let mut x = [0u8; SM2_SCALAR_LEN];
        let mut y = [0u8; SM2_SCALAR_LEN];
        let mut xb = point.x().to_bytes_be_padded(SM2_SCALAR_LEN)?;
        let mut yb = point.y().to_bytes_be_padded(SM2_SCALAR_LEN)?;
        x.copy_from_slice(&xb);
        y.copy_from_slice(&yb);
        xb.zeroize();
        yb.zeroize();
        Ok((x, y))
    }
}

fn reject(reason: &'static str, cause: CryptoError) -> CryptoError {
    tracing::debug!(reason, %cause, "sm2 ciphertext rejected");
    CryptoError::Sm2DecryptFail
}

struct CiphertextParts<'a> {
    x1: BigNum,
    y1: BigNum,
    c3: &'a [u8],
    c2: &'a [u8],
}

fn parse_ciphertext(ciphertext: &[u8]) -> Result<CiphertextParts<'_>, CryptoError> {
    let mut outer = Decoder::new(ciphertext);
    let mut seq = outer.read_sequence()?;
    outer.finish()?;
    let x1 = seq.read_unsigned_integer()?;
    let y1 = seq.read_unsigned_integer()?;
    let c3 = seq.read_octet_string()?;
    let c2 = seq.read_octet_string()?;
    seq.finish()?;

    if x1.len() > SM2_SCALAR_LEN
        || y1.len() > SM2_SCALAR_LEN
        || c3.len() != SM3_OUTPUT_SIZE
        || !(SM2_MIN_PLAINTEXT_LEN..=SM2_MAX_PLAINTEXT_LEN).contains(&c2.len())
    {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    Ok(CiphertextParts {
        x1: BigNum::from_bytes_be(x1),
        y1: BigNum::from_bytes_be(y1),
        c3,
        c2,
    })
}

/// SM3 counter-mode KDF: `SM3(x ‖ y ‖ ct)` for ct = 1, 2, ... truncated
/// to `len` bytes.
fn kdf(x: &[u8], y: &[u8], len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut out = Vec::with_capacity(len + SM3_OUTPUT_SIZE);
    let mut counter: u32 = 1;
    while out.len() < len {
        let mut h = Sm3::new();
        h.update(x)?;
        h.update(y)?;
        h.update(&counter.to_be_bytes())?;
        out.extend_from_slice(&h.finish()?);
        counter += 1;
    }
    out.truncate(len);
    Ok(out)
}

fn tag(x: &[u8], m: &[u8], y: &[u8]) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
    let mut h = Sm3::new();
    h.update(x)?;
    h.update(m)?;
    h.update(y)?;
    h.finish()
}
