//! SM4-CTR-DRBG (Counter-mode DRBG using SM4 as the block cipher).
//!
//! Implements NIST SP 800-90A Section 10.2 using SM4 instead of AES, with
//! no derivation function: seed material and additional input are used
//! directly and must not exceed `SEED_LEN` bytes.
//! SM4: 128-bit key, 128-bit block → seed_len = 32 bytes.

use crate::sm4::{Sm4Key, SM4_BLOCK_SIZE, SM4_KEY_SIZE};
use gmssl_types::CryptoError;
use zeroize::Zeroize;

/// Seed length = key length + block length (32 bytes for SM4).
pub const SEED_LEN: usize = SM4_KEY_SIZE + SM4_BLOCK_SIZE;

/// Maximum number of generate requests before reseed is required.
const RESEED_LIMIT: u64 = 1 << 48;

/// Largest single generate request in bytes (2^19 bits).
pub const MAX_REQUEST_LEN: usize = 1 << 16;

/// CTR-DRBG context using SM4 (NIST SP 800-90A Section 10.2).
pub struct Sm4CtrDrbg {
    /// Key schedule for the current working key.
    cipher: Sm4Key,
    /// Counter block V.
    v: [u8; SM4_BLOCK_SIZE],
    /// Number of generate requests since last (re)seed.
    reseed_counter: u64,
}

impl Drop for Sm4CtrDrbg {
    fn drop(&mut self) {
        self.v.zeroize();
    }
}

/// Increment a 128-bit counter (big-endian).
fn increment_counter(v: &mut [u8; SM4_BLOCK_SIZE]) {
    *v = u128::from_be_bytes(*v).wrapping_add(1).to_be_bytes();
}

/// Zero-pad `data` to a full seed block, rejecting anything longer.
fn pad_to_seed(data: &[u8]) -> Result<[u8; SEED_LEN], CryptoError> {
    if data.len() > SEED_LEN {
        return Err(CryptoError::InvalidArg("drbg input longer than seed length"));
    }
    let mut block = [0u8; SEED_LEN];
    block[..data.len()].copy_from_slice(data);
    Ok(block)
}

impl Sm4CtrDrbg {
    /// Instantiate without derivation function (SP 800-90A §10.2.1.3.1).
    ///
    /// `seed_material` must be exactly `SEED_LEN` (32) bytes of entropy,
    /// optionally already XORed with a personalization string.
    pub fn new(seed_material: &[u8]) -> Result<Self, CryptoError> {
        if seed_material.len() != SEED_LEN {
            return Err(CryptoError::InvalidArg("drbg seed must be 32 bytes"));
        }

        let mut drbg = Sm4CtrDrbg {
            cipher: Sm4Key::new(&[0u8; SM4_KEY_SIZE])?,
            v: [0u8; SM4_BLOCK_SIZE],
            reseed_counter: 0,
        };

        drbg.update(seed_material)?;
        drbg.reseed_counter = 1;

        Ok(drbg)
    }

    /// CTR-DRBG Update function (SP 800-90A §10.2.1.2).
    fn update(&mut self, provided_data: &[u8]) -> Result<(), CryptoError> {
        let mut temp = pad_to_seed(provided_data)?;
        for chunk in temp.chunks_exact_mut(SM4_BLOCK_SIZE) {
            increment_counter(&mut self.v);
            let mut block = self.v;
            self.cipher.encrypt_block(&mut block)?;
            for (t, b) in chunk.iter_mut().zip(block.iter()) {
                *t ^= b;
            }
            block.zeroize();
        }

        self.cipher = Sm4Key::new(&temp[..SM4_KEY_SIZE])?;
        self.v.copy_from_slice(&temp[SM4_KEY_SIZE..]);
        temp.zeroize();
        Ok(())
    }

    /// Generate pseudorandom bytes (SP 800-90A §10.2.1.5.1).
    ///
    /// Fails with `DrbgInvalidState` once the reseed limit is reached; the
    /// caller must [`reseed`](Self::reseed) before generating again.
    pub fn generate(
        &mut self,
        output: &mut [u8],
        additional_input: Option<&[u8]>,
    ) -> Result<(), CryptoError> {
        if self.reseed_counter > RESEED_LIMIT {
            return Err(CryptoError::DrbgInvalidState);
        }
        if output.len() > MAX_REQUEST_LEN {
            return Err(CryptoError::InvalidArg("drbg request too large"));
        }

        let adin = match additional_input {
            Some(data) if !data.is_empty() => {
                let adin = pad_to_seed(data)?;
                self.update(&adin)?;
                adin
            }
            _ => [0u8; SEED_LEN],
        };

        for chunk in output.chunks_mut(SM4_BLOCK_SIZE) {
            increment_counter(&mut self.v);
            let mut block = self.v;
            self.cipher.encrypt_block(&mut block)?;
            chunk.copy_from_slice(&block[..chunk.len()]);
            block.zeroize();
        }

        self.update(&adin)?;
        self.reseed_counter += 1;

        Ok(())
    }

    /// Generate `len` pseudorandom bytes (convenience method).
    pub fn generate_bytes(&mut self, len: usize) -> Result<Vec<u8>, CryptoError> {
        let mut output = vec![0u8; len];
        self.generate(&mut output, None)?;
        Ok(output)
    }

    /// Reseed the DRBG with fresh entropy (SP 800-90A §10.2.1.4.1).
    pub fn reseed(
        &mut self,
        entropy: &[u8],
        additional_input: Option<&[u8]>,
    ) -> Result<(), CryptoError> {
        if entropy.len() != SEED_LEN {
            return Err(CryptoError::InvalidArg("drbg entropy must be 32 bytes"));
        }

        let mut seed_material = pad_to_seed(additional_input.unwrap_or_default())?;
        for (s, e) in seed_material.iter_mut().zip(entropy) {
            *s ^= e;
        }

        let res = self.update(&seed_material);
        seed_material.zeroize();
        res?;
        self.reseed_counter = 1;

        Ok(())
    }

    /// Generate requests served since the last (re)seed.
    pub fn generate_count(&self) -> u64 {
        self.reseed_counter - 1
    }
}
