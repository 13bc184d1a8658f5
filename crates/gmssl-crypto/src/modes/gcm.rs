//! GCM (Galois/Counter Mode) authenticated encryption over SM4.
//!
//! Implements GCM as defined in NIST SP 800-38D with SM4 as the block
//! cipher (the SM4-GCM of RFC 8998). IVs of 1 to 64 bytes and tags of 1 to
//! 16 bytes are accepted; a 12-byte IV and 16-byte tag are recommended.
//!
//! The decryptor cannot tell where the ciphertext ends and the tag begins
//! until the stream is finished, so it always holds back the last
//! `tag_len` bytes it has seen. Plaintext returned from
//! [`Sm4GcmDecryptor::update`] is unauthenticated until `finish` succeeds.

use super::xor_in_place;
use crate::provider::{Aead, StreamingCipher};
use crate::sm4::{Sm4Key, SM4_BLOCK_SIZE};
use gmssl_types::{CipherAlgId, CryptoError};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Full GCM tag length in bytes.
pub const GCM_TAG_SIZE: usize = 16;

/// Longest accepted IV in bytes.
pub const GCM_MAX_IV_LEN: usize = 64;

/// SP 800-38D limit on the plaintext length: 2^39 - 256 bits.
const GCM_MAX_TEXT_LEN: u64 = (1 << 36) - 32;

// Reduction table for 4-bit GHASH: TABLE_P4[i] = i * R >> 120, where R = 0xE1 << 120.
const TABLE_P4: [u64; 16] = [
    0x0000000000000000,
    0x1c20000000000000,
    0x3840000000000000,
    0x2460000000000000,
    0x7080000000000000,
    0x6ca0000000000000,
    0x48c0000000000000,
    0x54e0000000000000,
    0xe100000000000000,
    0xfd20000000000000,
    0xd940000000000000,
    0xc560000000000000,
    0x9180000000000000,
    0x8da0000000000000,
    0xa9c0000000000000,
    0xb5e0000000000000,
];

/// GF(2^128) element as (high, low) u64 pair, GCM bit order.
#[derive(Clone, Copy, Default)]
struct Gf128 {
    h: u64,
    l: u64,
}

impl Gf128 {
    fn from_bytes(b: &[u8; 16]) -> Self {
        let v = u128::from_be_bytes(*b);
        Self {
            h: (v >> 64) as u64,
            l: v as u64,
        }
    }

    fn to_bytes(self) -> [u8; 16] {
        (((self.h as u128) << 64) | self.l as u128).to_be_bytes()
    }

    fn xor(self, other: Self) -> Self {
        Self {
            h: self.h ^ other.h,
            l: self.l ^ other.l,
        }
    }

    /// Multiply by x^4 in GCM's reflected representation, with reduction.
    fn shr4_reduce(self) -> Self {
        let rem = (self.l & 0x0f) as usize;
        Self {
            h: (self.h >> 4) ^ TABLE_P4[rem],
            l: (self.l >> 4) | (self.h << 60),
        }
    }
}

/// Multiples of H by every 4-bit polynomial.
struct GhashTable {
    table: [Gf128; 16],
}

impl GhashTable {
    fn new(h: &[u8; 16]) -> Self {
        let mut table = [Gf128::default(); 16];
        table[8] = Gf128::from_bytes(h);

        // table[4] = H·x, table[2] = H·x^2, table[1] = H·x^3.
        let mut cur = table[8];
        for idx in [4usize, 2, 1] {
            let carry = cur.l & 1;
            cur = Gf128 {
                h: (cur.h >> 1) ^ (0xe100000000000000 & carry.wrapping_neg()),
                l: (cur.l >> 1) | (cur.h << 63),
            };
            table[idx] = cur;
        }

        for i in 2..16usize {
            if !i.is_power_of_two() {
                let msb = 1usize << (usize::BITS - 1 - i.leading_zeros());
                table[i] = table[msb].xor(table[i ^ msb]);
            }
        }

        Self { table }
    }

    /// `state = (state XOR block) · H`.
    fn mul_h(&self, state: &mut Gf128, block: &[u8; 16]) {
        let x = state.xor(Gf128::from_bytes(block)).to_bytes();
        let mut z = Gf128::default();
        for &byte in x.iter().rev() {
            z = z.shr4_reduce().xor(self.table[(byte & 0x0f) as usize]);
            z = z.shr4_reduce().xor(self.table[(byte >> 4) as usize]);
        }
        *state = z;
    }
}

impl Drop for GhashTable {
    fn drop(&mut self) {
        for entry in self.table.iter_mut() {
            entry.h.zeroize();
            entry.l.zeroize();
        }
    }
}

/// Incremental GHASH with a partial-block buffer.
struct Ghash {
    table: GhashTable,
    state: Gf128,
    buf: [u8; 16],
    buf_len: usize,
}

impl Ghash {
    fn new(h: &[u8; 16]) -> Self {
        Self {
            table: GhashTable::new(h),
            state: Gf128::default(),
            buf: [0u8; 16],
            buf_len: 0,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (16 - self.buf_len).min(data.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
            self.buf_len += take;
            data = &data[take..];
            if self.buf_len == 16 {
                self.table.mul_h(&mut self.state, &self.buf);
                self.buf_len = 0;
            }
        }
    }

    /// Zero-pad and absorb any partial block, ending the current field.
    fn pad(&mut self) {
        if self.buf_len > 0 {
            self.buf[self.buf_len..].fill(0);
            self.table.mul_h(&mut self.state, &self.buf);
            self.buf_len = 0;
        }
    }

    /// Absorb the final length block and return the GHASH value.
    fn finalize(&mut self, aad_bits: u64, text_bits: u64) -> [u8; 16] {
        self.pad();
        let mut len_block = [0u8; 16];
        len_block[..8].copy_from_slice(&aad_bits.to_be_bytes());
        len_block[8..].copy_from_slice(&text_bits.to_be_bytes());
        self.table.mul_h(&mut self.state, &len_block);
        self.state.to_bytes()
    }
}

/// Increment the last 4 bytes of a 16-byte counter (big-endian INC32).
fn inc32(counter: &mut [u8; 16]) {
    let ctr =
        u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]).wrapping_add(1);
    counter[12..16].copy_from_slice(&ctr.to_be_bytes());
}

/// Direction-independent GCM state shared by the encryptor and decryptor.
struct GcmCore {
    cipher: Sm4Key,
    ghash: Ghash,
    counter: [u8; 16],
    /// E(K, J0), masks the GHASH output.
    ek0: [u8; 16],
    keystream: [u8; 16],
    ks_pos: usize,
    aad_len: u64,
    text_len: u64,
    tag_len: usize,
}

impl GcmCore {
    fn new(cipher: Sm4Key, iv: &[u8], aad: &[u8], tag_len: usize) -> Result<Self, CryptoError> {
        if iv.is_empty() || iv.len() > GCM_MAX_IV_LEN {
            return Err(CryptoError::InvalidIvLength(iv.len()));
        }
        if tag_len == 0 || tag_len > GCM_TAG_SIZE {
            return Err(CryptoError::InvalidTagLength(tag_len));
        }

        let mut h = [0u8; 16];
        cipher.encrypt_block(&mut h)?;
        let mut ghash = Ghash::new(&h);
        h.zeroize();

        let j0 = if iv.len() == CipherAlgId::Sm4Gcm.iv_len() {
            let mut j0 = [0u8; 16];
            j0[..12].copy_from_slice(iv);
            j0[15] = 1;
            j0
        } else {
            ghash.update(iv);
            let j0 = ghash.finalize(0, iv.len() as u64 * 8);
            ghash.state = Gf128::default();
            j0
        };

        let mut ek0 = j0;
        cipher.encrypt_block(&mut ek0)?;
        let mut counter = j0;
        inc32(&mut counter);

        ghash.update(aad);
        ghash.pad();

        Ok(Self {
            cipher,
            ghash,
            counter,
            ek0,
            keystream: [0u8; 16],
            ks_pos: SM4_BLOCK_SIZE,
            aad_len: aad.len() as u64,
            text_len: 0,
            tag_len,
        })
    }

    fn count_text(&mut self, len: usize) -> Result<(), CryptoError> {
        let total = self
            .text_len
            .checked_add(len as u64)
            .filter(|&t| t <= GCM_MAX_TEXT_LEN)
            .ok_or(CryptoError::InvalidArg("gcm message too long"))?;
        self.text_len = total;
        Ok(())
    }

    fn apply_keystream(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let mut off = 0;
        while off < data.len() {
            if self.ks_pos == SM4_BLOCK_SIZE {
                self.keystream = self.counter;
                self.cipher.encrypt_block(&mut self.keystream)?;
                inc32(&mut self.counter);
                self.ks_pos = 0;
            }
            let take = (SM4_BLOCK_SIZE - self.ks_pos).min(data.len() - off);
            xor_in_place(
                &mut data[off..off + take],
                &self.keystream[self.ks_pos..self.ks_pos + take],
            );
            self.ks_pos += take;
            off += take;
        }
        Ok(())
    }

    /// Full 16-byte tag; callers truncate to `tag_len`.
    fn tag(&mut self) -> [u8; 16] {
        let mut tag = self.ghash.finalize(self.aad_len * 8, self.text_len * 8);
        xor_in_place(&mut tag, &self.ek0);
        tag
    }
}

impl Drop for GcmCore {
    fn drop(&mut self) {
        self.keystream.zeroize();
        self.ek0.zeroize();
    }
}

/// Streaming SM4-GCM encryptor. `finish` returns the tag.
pub struct Sm4GcmEncryptor {
    core: GcmCore,
}

impl Sm4GcmEncryptor {
    /// Start an encryption with the whole AAD known up front.
    pub fn new(key: &[u8], iv: &[u8], aad: &[u8], tag_len: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            core: GcmCore::new(Sm4Key::new(key)?, iv, aad, tag_len)?,
        })
    }
}

impl StreamingCipher for Sm4GcmEncryptor {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.core.count_text(data.len())?;
        let mut out = data.to_vec();
        self.core.apply_keystream(&mut out)?;
        self.core.ghash.update(&out);
        Ok(out)
    }

    fn finish(mut self) -> Result<Vec<u8>, CryptoError> {
        let tag = self.core.tag();
        Ok(tag[..self.core.tag_len].to_vec())
    }
}

/// Streaming SM4-GCM decryptor. The input stream is ciphertext followed by
/// the tag; `finish` verifies the tag and returns nothing on success.
pub struct Sm4GcmDecryptor {
    core: GcmCore,
    /// The trailing bytes seen so far, at most `tag_len` of them.
    held: Vec<u8>,
}

impl Sm4GcmDecryptor {
    pub fn new(key: &[u8], iv: &[u8], aad: &[u8], tag_len: usize) -> Result<Self, CryptoError> {
        Ok(Self {
            core: GcmCore::new(Sm4Key::new(key)?, iv, aad, tag_len)?,
            held: Vec::with_capacity(2 * tag_len),
        })
    }
}

impl StreamingCipher for Sm4GcmDecryptor {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.held.extend_from_slice(data);
        if self.held.len() <= self.core.tag_len {
            return Ok(Vec::new());
        }
        let release = self.held.len() - self.core.tag_len;
        self.core.count_text(release)?;
        let mut out: Vec<u8> = self.held.drain(..release).collect();
        self.core.ghash.update(&out);
        self.core.apply_keystream(&mut out)?;
        Ok(out)
    }

    fn finish(mut self) -> Result<Vec<u8>, CryptoError> {
        // Fewer than tag_len bytes in total: a truncated stream is treated
        // like a forged one.
        if self.held.len() != self.core.tag_len {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let mut expected = self.core.tag();
        let ok = expected[..self.core.tag_len].ct_eq(&self.held[..]);
        expected.zeroize();
        if !bool::from(ok) {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        Ok(Vec::new())
    }
}

/// Encrypt and authenticate with SM4-GCM and a 16-byte tag.
/// Returns ciphertext || tag.
pub fn sm4_gcm_encrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut enc = Sm4GcmEncryptor::new(key, iv, aad, GCM_TAG_SIZE)?;
    let mut out = enc.update(plaintext)?;
    out.extend(enc.finish()?);
    Ok(out)
}

/// Verify and decrypt SM4-GCM `ciphertext || tag` with a 16-byte tag.
/// No plaintext is returned unless the tag verifies.
pub fn sm4_gcm_decrypt(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut dec = Sm4GcmDecryptor::new(key, iv, aad, GCM_TAG_SIZE)?;
    let mut out = dec.update(ciphertext)?;
    if let Err(e) = dec.finish() {
        out.zeroize();
        return Err(e);
    }
    Ok(out)
}

/// SM4-GCM as an [`Aead`] with a fixed key, 16-byte tags and 12-byte nonces
/// recommended.
pub struct Sm4Gcm {
    cipher: Sm4Key,
}

impl Sm4Gcm {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            cipher: Sm4Key::new(key)?,
        })
    }
}

impl Aead for Sm4Gcm {
    fn tag_size(&self) -> usize {
        GCM_TAG_SIZE
    }

    fn nonce_size(&self) -> usize {
        CipherAlgId::Sm4Gcm.iv_len()
    }

    fn key_size(&self) -> usize {
        CipherAlgId::Sm4Gcm.key_len()
    }

    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut enc = Sm4GcmEncryptor {
            core: GcmCore::new(self.cipher.clone(), nonce, aad, GCM_TAG_SIZE)?,
        };
        let mut out = enc.update(plaintext)?;
        out.extend(enc.finish()?);
        Ok(out)
    }

    fn decrypt(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut dec = Sm4GcmDecryptor {
            core: GcmCore::new(self.cipher.clone(), nonce, aad, GCM_TAG_SIZE)?,
            held: Vec::with_capacity(GCM_TAG_SIZE),
        };
        let mut out = dec.update(ciphertext)?;
        if let Err(e) = dec.finish() {
            out.zeroize();
            return Err(e);
        }
        Ok(out)
    }
}
