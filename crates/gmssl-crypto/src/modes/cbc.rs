//! CBC (Cipher Block Chaining) mode of operation with PKCS#7 padding.

use super::{check_iv, xor_in_place};
use crate::provider::StreamingCipher;
use crate::sm4::{Sm4Key, SM4_BLOCK_SIZE};
use gmssl_types::{CipherAlgId, CryptoError};
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater};
use zeroize::Zeroize;

/// Streaming SM4-CBC encryptor.
///
/// `update` emits every block completed so far; `finish` pads the trailing
/// 0..=15 bytes to a full block (a whole padding block when aligned).
pub struct Sm4CbcEncryptor {
    cipher: Sm4Key,
    prev: [u8; SM4_BLOCK_SIZE],
    buf: [u8; SM4_BLOCK_SIZE],
    buf_len: usize,
}

impl Sm4CbcEncryptor {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let prev = check_iv(CipherAlgId::Sm4Cbc, iv)?;
        Ok(Self {
            cipher: Sm4Key::new(key)?,
            prev,
            buf: [0u8; SM4_BLOCK_SIZE],
            buf_len: 0,
        })
    }

    fn encrypt_buffered(&mut self, out: &mut Vec<u8>) -> Result<(), CryptoError> {
        xor_in_place(&mut self.buf, &self.prev);
        self.cipher.encrypt_block(&mut self.buf)?;
        self.prev = self.buf;
        out.extend_from_slice(&self.buf);
        self.buf_len = 0;
        Ok(())
    }
}

impl StreamingCipher for Sm4CbcEncryptor {
    fn update(&mut self, mut data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let blocks = (self.buf_len + data.len()) / SM4_BLOCK_SIZE;
        let mut out = Vec::with_capacity(blocks * SM4_BLOCK_SIZE);
        while !data.is_empty() {
            let take = (SM4_BLOCK_SIZE - self.buf_len).min(data.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
            self.buf_len += take;
            data = &data[take..];
            if self.buf_len == SM4_BLOCK_SIZE {
                self.encrypt_buffered(&mut out)?;
            }
        }
        Ok(out)
    }

    fn finish(mut self) -> Result<Vec<u8>, CryptoError> {
        let pad = (SM4_BLOCK_SIZE - self.buf_len) as u8;
        self.buf[self.buf_len..].fill(pad);
        let mut out = Vec::with_capacity(SM4_BLOCK_SIZE);
        self.encrypt_buffered(&mut out)?;
        Ok(out)
    }
}

impl Drop for Sm4CbcEncryptor {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Streaming SM4-CBC decryptor.
///
/// The last complete ciphertext block is always held back, since it may
/// carry the padding; `finish` decrypts it and strips the padding.
pub struct Sm4CbcDecryptor {
    cipher: Sm4Key,
    prev: [u8; SM4_BLOCK_SIZE],
    buf: [u8; SM4_BLOCK_SIZE],
    buf_len: usize,
}

impl Sm4CbcDecryptor {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let prev = check_iv(CipherAlgId::Sm4Cbc, iv)?;
        Ok(Self {
            cipher: Sm4Key::new(key)?,
            prev,
            buf: [0u8; SM4_BLOCK_SIZE],
            buf_len: 0,
        })
    }

    fn decrypt_buffered(&mut self) -> Result<[u8; SM4_BLOCK_SIZE], CryptoError> {
        let ct = self.buf;
        let mut block = self.buf;
        self.cipher.decrypt_block(&mut block)?;
        xor_in_place(&mut block, &self.prev);
        self.prev = ct;
        self.buf_len = 0;
        Ok(block)
    }
}

impl StreamingCipher for Sm4CbcDecryptor {
    fn update(&mut self, mut data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let blocks = (self.buf_len + data.len()) / SM4_BLOCK_SIZE;
        let mut out = Vec::with_capacity(blocks * SM4_BLOCK_SIZE);
        while !data.is_empty() {
            // A full buffer is only released once more ciphertext follows it.
            if self.buf_len == SM4_BLOCK_SIZE {
                let mut block = self.decrypt_buffered()?;
                out.extend_from_slice(&block);
                block.zeroize();
            }
            let take = (SM4_BLOCK_SIZE - self.buf_len).min(data.len());
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(&data[..take]);
            self.buf_len += take;
            data = &data[take..];
        }
        Ok(out)
    }

    fn finish(mut self) -> Result<Vec<u8>, CryptoError> {
        // Empty or unaligned ciphertext cannot carry valid padding.
        if self.buf_len != SM4_BLOCK_SIZE {
            return Err(CryptoError::InvalidPadding);
        }
        let mut block = self.decrypt_buffered()?;
        let pad = block[SM4_BLOCK_SIZE - 1];
        let valid = pkcs7_check(&block);
        if !bool::from(valid) {
            block.zeroize();
            return Err(CryptoError::InvalidPadding);
        }
        let out = block[..SM4_BLOCK_SIZE - pad as usize].to_vec();
        block.zeroize();
        Ok(out)
    }
}

impl Drop for Sm4CbcDecryptor {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Validate PKCS#7 padding of the final block without branching on its
/// contents: every byte is inspected regardless of the pad value.
fn pkcs7_check(block: &[u8; SM4_BLOCK_SIZE]) -> Choice {
    let pad = block[SM4_BLOCK_SIZE - 1];
    let mut valid = !pad.ct_eq(&0) & !pad.ct_gt(&(SM4_BLOCK_SIZE as u8));
    for (i, b) in block.iter().enumerate() {
        // Byte i lies in the padding iff i + pad >= 16.
        let in_pad = (i as u16 + pad as u16).ct_gt(&(SM4_BLOCK_SIZE as u16 - 1));
        valid &= !in_pad | b.ct_eq(&pad);
    }
    valid
}

/// Encrypt `plaintext` with SM4-CBC and PKCS#7 padding.
pub fn sm4_cbc_encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut enc = Sm4CbcEncryptor::new(key, iv)?;
    let mut out = enc.update(plaintext)?;
    out.extend(enc.finish()?);
    Ok(out)
}

/// Decrypt SM4-CBC `ciphertext` and strip the PKCS#7 padding.
pub fn sm4_cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut dec = Sm4CbcDecryptor::new(key, iv)?;
    let mut out = dec.update(ciphertext)?;
    out.extend(dec.finish()?);
    Ok(out)
}
