//! CTR (Counter) mode of operation.
//!
//! The 16-byte IV is the initial counter block; the whole block is
//! incremented as a 128-bit big-endian integer, wrapping at 2^128.

use super::{check_iv, xor_in_place};
use crate::provider::StreamingCipher;
use crate::sm4::{Sm4Key, SM4_BLOCK_SIZE};
use gmssl_types::{CipherAlgId, CryptoError};
use zeroize::Zeroize;

/// Increment a 128-bit big-endian counter by 1.
fn increment_counter(counter: &mut [u8; SM4_BLOCK_SIZE]) {
    let next = u128::from_be_bytes(*counter).wrapping_add(1);
    *counter = next.to_be_bytes();
}

/// Streaming SM4-CTR context. Encryption and decryption are the same
/// operation; output length always equals input length.
pub struct Sm4Ctr {
    cipher: Sm4Key,
    counter: [u8; SM4_BLOCK_SIZE],
    keystream: [u8; SM4_BLOCK_SIZE],
    /// Next unused keystream byte; `SM4_BLOCK_SIZE` when exhausted.
    ks_pos: usize,
}

impl Sm4Ctr {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let counter = check_iv(CipherAlgId::Sm4Ctr, iv)?;
        Ok(Self {
            cipher: Sm4Key::new(key)?,
            counter,
            keystream: [0u8; SM4_BLOCK_SIZE],
            ks_pos: SM4_BLOCK_SIZE,
        })
    }

    /// XOR the next `data.len()` keystream bytes into `data`.
    pub fn apply_keystream(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let mut off = 0;
        while off < data.len() {
            if self.ks_pos == SM4_BLOCK_SIZE {
                self.keystream = self.counter;
                self.cipher.encrypt_block(&mut self.keystream)?;
                increment_counter(&mut self.counter);
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
}

impl StreamingCipher for Sm4Ctr {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out)?;
        Ok(out)
    }

    /// Every byte is emitted by `update`, so nothing remains.
    fn finish(self) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }
}

impl Drop for Sm4Ctr {
    fn drop(&mut self) {
        self.keystream.zeroize();
    }
}

/// Encrypt or decrypt `data` with SM4-CTR.
pub fn sm4_ctr_crypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut ctr = Sm4Ctr::new(key, iv)?;
    let mut out = ctr.update(data)?;
    out.extend(ctr.finish()?);
    Ok(out)
}
