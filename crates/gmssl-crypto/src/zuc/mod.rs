//! ZUC-128 stream cipher.
//!
//! Implements the ZUC keystream generator of GB/T 33133.1-2016 (also the
//! core of 3GPP 128-EEA3/128-EIA3): a 16-cell LFSR over GF(2^31 - 1), a
//! bit-reorganisation layer and a nonlinear function F with two 32-bit
//! memory cells. Keystream words are emitted big-endian.

use crate::provider::StreamingCipher;
use gmssl_types::{CipherAlgId, CryptoError};
use zeroize::Zeroize;

/// ZUC key size in bytes.
pub const ZUC_KEY_SIZE: usize = 16;

/// ZUC IV size in bytes.
pub const ZUC_IV_SIZE: usize = 16;

const M31: u32 = 0x7fff_ffff;

// ---------------------------------------------------------------------------
// S-boxes and key-loading constants
// ---------------------------------------------------------------------------

const S0: [u8; 256] = [
    0x3e, 0x72, 0x5b, 0x47, 0xca, 0xe0, 0x00, 0x33, 0x04, 0xd1, 0x54, 0x98, 0x09, 0xb9, 0x6d, 0xcb,
    0x7b, 0x1b, 0xf9, 0x32, 0xaf, 0x9d, 0x6a, 0xa5, 0xb8, 0x2d, 0xfc, 0x1d, 0x08, 0x53, 0x03, 0x90,
    0x4d, 0x4e, 0x84, 0x99, 0xe4, 0xce, 0xd9, 0x91, 0xdd, 0xb6, 0x85, 0x48, 0x8b, 0x29, 0x6e, 0xac,
    0xcd, 0xc1, 0xf8, 0x1e, 0x73, 0x43, 0x69, 0xc6, 0xb5, 0xbd, 0xfd, 0x39, 0x63, 0x20, 0xd4, 0x38,
    0x76, 0x7d, 0xb2, 0xa7, 0xcf, 0xed, 0x57, 0xc5, 0xf3, 0x2c, 0xbb, 0x14, 0x21, 0x06, 0x55, 0x9b,
    0xe3, 0xef, 0x5e, 0x31, 0x4f, 0x7f, 0x5a, 0xa4, 0x0d, 0x82, 0x51, 0x49, 0x5f, 0xba, 0x58, 0x1c,
    0x4a, 0x16, 0xd5, 0x17, 0xa8, 0x92, 0x24, 0x1f, 0x8c, 0xff, 0xd8, 0xae, 0x2e, 0x01, 0xd3, 0xad,
    0x3b, 0x4b, 0xda, 0x46, 0xeb, 0xc9, 0xde, 0x9a, 0x8f, 0x87, 0xd7, 0x3a, 0x80, 0x6f, 0x2f, 0xc8,
    0xb1, 0xb4, 0x37, 0xf7, 0x0a, 0x22, 0x13, 0x28, 0x7c, 0xcc, 0x3c, 0x89, 0xc7, 0xc3, 0x96, 0x56,
    0x07, 0xbf, 0x7e, 0xf0, 0x0b, 0x2b, 0x97, 0x52, 0x35, 0x41, 0x79, 0x61, 0xa6, 0x4c, 0x10, 0xfe,
    0xbc, 0x26, 0x95, 0x88, 0x8a, 0xb0, 0xa3, 0xfb, 0xc0, 0x18, 0x94, 0xf2, 0xe1, 0xe5, 0xe9, 0x5d,
    0xd0, 0xdc, 0x11, 0x66, 0x64, 0x5c, 0xec, 0x59, 0x42, 0x75, 0x12, 0xf5, 0x74, 0x9c, 0xaa, 0x23,
    0x0e, 0x86, 0xab, 0xbe, 0x2a, 0x02, 0xe7, 0x67, 0xe6, 0x44, 0xa2, 0x6c, 0xc2, 0x93, 0x9f, 0xf1,
    0xf6, 0xfa, 0x36, 0xd2, 0x50, 0x68, 0x9e, 0x62, 0x71, 0x15, 0x3d, 0xd6, 0x40, 0xc4, 0xe2, 0x0f,
    0x8e, 0x83, 0x77, 0x6b, 0x25, 0x05, 0x3f, 0x0c, 0x30, 0xea, 0x70, 0xb7, 0xa1, 0xe8, 0xa9, 0x65,
    0x8d, 0x27, 0x1a, 0xdb, 0x81, 0xb3, 0xa0, 0xf4, 0x45, 0x7a, 0x19, 0xdf, 0xee, 0x78, 0x34, 0x60,
];

const S1: [u8; 256] = [
    0x55, 0xc2, 0x63, 0x71, 0x3b, 0xc8, 0x47, 0x86, 0x9f, 0x3c, 0xda, 0x5b, 0x29, 0xaa, 0xfd, 0x77,
    0x8c, 0xc5, 0x94, 0x0c, 0xa6, 0x1a, 0x13, 0x00, 0xe3, 0xa8, 0x16, 0x72, 0x40, 0xf9, 0xf8, 0x42,
    0x44, 0x26, 0x68, 0x96, 0x81, 0xd9, 0x45, 0x3e, 0x10, 0x76, 0xc6, 0xa7, 0x8b, 0x39, 0x43, 0xe1,
    0x3a, 0xb5, 0x56, 0x2a, 0xc0, 0x6d, 0xb3, 0x05, 0x22, 0x66, 0xbf, 0xdc, 0x0b, 0xfa, 0x62, 0x48,
    0xdd, 0x20, 0x11, 0x06, 0x36, 0xc9, 0xc1, 0xcf, 0xf6, 0x27, 0x52, 0xbb, 0x69, 0xf5, 0xd4, 0x87,
    0x7f, 0x84, 0x4c, 0xd2, 0x9c, 0x57, 0xa4, 0xbc, 0x4f, 0x9a, 0xdf, 0xfe, 0xd6, 0x8d, 0x7a, 0xeb,
    0x2b, 0x53, 0xd8, 0x5c, 0xa1, 0x14, 0x17, 0xfb, 0x23, 0xd5, 0x7d, 0x30, 0x67, 0x73, 0x08, 0x09,
    0xee, 0xb7, 0x70, 0x3f, 0x61, 0xb2, 0x19, 0x8e, 0x4e, 0xe5, 0x4b, 0x93, 0x8f, 0x5d, 0xdb, 0xa9,
    0xad, 0xf1, 0xae, 0x2e, 0xcb, 0x0d, 0xfc, 0xf4, 0x2d, 0x46, 0x6e, 0x1d, 0x97, 0xe8, 0xd1, 0xe9,
    0x4d, 0x37, 0xa5, 0x75, 0x5e, 0x83, 0x9e, 0xab, 0x82, 0x9d, 0xb9, 0x1c, 0xe0, 0xcd, 0x49, 0x89,
    0x01, 0xb6, 0xbd, 0x58, 0x24, 0xa2, 0x5f, 0x38, 0x78, 0x99, 0x15, 0x90, 0x50, 0xb8, 0x95, 0xe4,
    0xd0, 0x91, 0xc7, 0xce, 0xed, 0x0f, 0xb4, 0x6f, 0xa0, 0xcc, 0xf0, 0x02, 0x4a, 0x79, 0xc3, 0xde,
    0xa3, 0xef, 0xea, 0x51, 0xe6, 0x6b, 0x18, 0xec, 0x1b, 0x2c, 0x80, 0xf7, 0x74, 0xe7, 0xff, 0x21,
    0x5a, 0x6a, 0x54, 0x1e, 0x41, 0x31, 0x92, 0x35, 0xc4, 0x33, 0x07, 0x0a, 0xba, 0x7e, 0x0e, 0x34,
    0x88, 0xb1, 0x98, 0x7c, 0xf3, 0x3d, 0x60, 0x6c, 0x7b, 0xca, 0xd3, 0x1f, 0x32, 0x65, 0x04, 0x28,
    0x64, 0xbe, 0x85, 0x9b, 0x2f, 0x59, 0x8a, 0xd7, 0xb0, 0x25, 0xac, 0xaf, 0x12, 0x03, 0xe2, 0xf2,
];

const EK_D: [u32; 16] = [
    0x44d7, 0x26bc, 0x626b, 0x135e, 0x5789, 0x35e2, 0x7135, 0x09af,
    0x4d78, 0x2f13, 0x6bc4, 0x1af1, 0x5e26, 0x3c4d, 0x789a, 0x47ac,
];

// ---------------------------------------------------------------------------
// Arithmetic modulo 2^31 - 1
// ---------------------------------------------------------------------------

#[inline(always)]
fn add_m31(a: u32, b: u32) -> u32 {
    let c = a + b;
    (c & M31) + (c >> 31)
}

#[inline(always)]
fn mul_pow2_m31(x: u32, k: u32) -> u32 {
    ((x << k) | (x >> (31 - k))) & M31
}

#[inline(always)]
fn l1(x: u32) -> u32 {
    x ^ x.rotate_left(2) ^ x.rotate_left(10) ^ x.rotate_left(18) ^ x.rotate_left(24)
}

#[inline(always)]
fn l2(x: u32) -> u32 {
    x ^ x.rotate_left(8) ^ x.rotate_left(14) ^ x.rotate_left(22) ^ x.rotate_left(30)
}

#[inline(always)]
fn sbox(x: u32) -> u32 {
    let b = x.to_be_bytes();
    u32::from_be_bytes([
        S0[b[0] as usize],
        S1[b[1] as usize],
        S0[b[2] as usize],
        S1[b[3] as usize],
    ])
}

/// Keystream generator state.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
struct ZucCore {
    lfsr: [u32; 16],
    r1: u32,
    r2: u32,
    x: [u32; 4],
}

impl ZucCore {
    fn new(key: &[u8; ZUC_KEY_SIZE], iv: &[u8; ZUC_IV_SIZE]) -> Self {
        let mut lfsr = [0u32; 16];
        for (i, cell) in lfsr.iter_mut().enumerate() {
            *cell = ((key[i] as u32) << 23) | (EK_D[i] << 8) | iv[i] as u32;
        }
        let mut core = ZucCore {
            lfsr,
            r1: 0,
            r2: 0,
            x: [0; 4],
        };
        for _ in 0..32 {
            core.bit_reorganization();
            let w = core.f();
            core.lfsr_step(Some(w >> 1));
        }
        // Working mode starts by discarding one output of F.
        core.bit_reorganization();
        core.f();
        core.lfsr_step(None);
        core
    }

    fn bit_reorganization(&mut self) {
        let s = &self.lfsr;
        self.x[0] = ((s[15] & 0x7fff_8000) << 1) | (s[14] & 0xffff);
        self.x[1] = ((s[11] & 0xffff) << 16) | (s[9] >> 15);
        self.x[2] = ((s[7] & 0xffff) << 16) | (s[5] >> 15);
        self.x[3] = ((s[2] & 0xffff) << 16) | (s[0] >> 15);
    }

    fn f(&mut self) -> u32 {
        let w = (self.x[0] ^ self.r1).wrapping_add(self.r2);
        let w1 = self.r1.wrapping_add(self.x[1]);
        let w2 = self.r2 ^ self.x[2];
        self.r1 = sbox(l1((w1 << 16) | (w2 >> 16)));
        self.r2 = sbox(l2((w2 << 16) | (w1 >> 16)));
        w
    }

    /// Advance the LFSR; `u` is the F feedback during initialisation.
    fn lfsr_step(&mut self, u: Option<u32>) {
        let s = &self.lfsr;
        let mut v = s[0];
        for (cell, k) in [(s[15], 15), (s[13], 17), (s[10], 21), (s[4], 20), (s[0], 8)] {
            v = add_m31(v, mul_pow2_m31(cell, k));
        }
        if let Some(u) = u {
            v = add_m31(v, u);
        }
        if v == 0 {
            v = M31;
        }
        self.lfsr.copy_within(1.., 0);
        self.lfsr[15] = v;
    }

    fn next_word(&mut self) -> u32 {
        self.bit_reorganization();
        let z = self.f() ^ self.x[3];
        self.lfsr_step(None);
        z
    }
}

/// Streaming ZUC cipher. Encryption and decryption are the same XOR.
///
/// Up to three bytes of an already generated keystream word are carried
/// between `update` calls, so byte-wise feeding yields the same output as
/// one call over the whole message.
pub struct ZucCipher {
    core: ZucCore,
    keystream: [u8; 4],
    /// Next unused byte of `keystream`; 4 when exhausted.
    ks_pos: usize,
}

impl ZucCipher {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let key: &[u8; ZUC_KEY_SIZE] = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: CipherAlgId::Zuc.key_len(),
            got: key.len(),
        })?;
        let iv: &[u8; ZUC_IV_SIZE] = iv
            .try_into()
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?;
        Ok(Self {
            core: ZucCore::new(key, iv),
            keystream: [0u8; 4],
            ks_pos: 4,
        })
    }

    /// Next 32-bit keystream word. Discards any partially used word.
    pub fn next_keystream_word(&mut self) -> u32 {
        self.ks_pos = 4;
        self.core.next_word()
    }

    /// XOR the next `data.len()` keystream bytes into `data`.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            if self.ks_pos == 4 {
                self.keystream = self.core.next_word().to_be_bytes();
                self.ks_pos = 0;
            }
            *byte ^= self.keystream[self.ks_pos];
            self.ks_pos += 1;
        }
    }
}

impl StreamingCipher for ZucCipher {
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out);
        Ok(out)
    }

    fn finish(self) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }
}

impl Drop for ZucCipher {
    fn drop(&mut self) {
        self.keystream.zeroize();
    }
}

/// Encrypt or decrypt `data` with ZUC.
pub fn zuc_crypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut cipher = ZucCipher::new(key, iv)?;
    let mut out = cipher.update(data)?;
    out.extend(cipher.finish()?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn first_words(key: &[u8], iv: &[u8]) -> (u32, u32) {
        let mut zuc = ZucCipher::new(key, iv).unwrap();
        (zuc.next_keystream_word(), zuc.next_keystream_word())
    }

    // GB/T 33133.1-2016 Appendix A, test vectors 1-3
    #[test]
    fn test_zuc_all_zero() {
        assert_eq!(first_words(&[0u8; 16], &[0u8; 16]), (0x27bede74, 0x018082da));
    }

    #[test]
    fn test_zuc_all_ones() {
        assert_eq!(first_words(&[0xff; 16], &[0xff; 16]), (0x0657cfa0, 0x7096398b));
    }

    #[test]
    fn test_zuc_random_key() {
        let key = hex_to_bytes("3d4c4be96a82fdaeb58f641db17b455b");
        let iv = hex_to_bytes("84319aa8de6915ca1f6bda6bfbd8c766");
        assert_eq!(first_words(&key, &iv), (0x14f1c272, 0x3279c419));
    }

    #[test]
    fn test_zuc_crypt_message() {
        let key = hex_to_bytes("3d4c4be96a82fdaeb58f641db17b455b");
        let iv = hex_to_bytes("84319aa8de6915ca1f6bda6bfbd8c766");
        let msg = b"The quick brown fox jumps over the lazy dog";
        let ct = zuc_crypt(&key, &iv, msg).unwrap();
        assert_eq!(
            hex(&ct),
            "4099a752430cad7a20aec66f63bf6643b4ef1ac18d6850aa90e4be2ec28247d8fcf6703aef9fbf1d91cfa9"
        );
        assert_eq!(zuc_crypt(&key, &iv, &ct).unwrap(), msg);
    }

    #[test]
    fn test_zuc_partial_words_carried() {
        let key = [0x11u8; 16];
        let iv = [0x22u8; 16];
        let msg: Vec<u8> = (0u8..37).collect();
        let expected = zuc_crypt(&key, &iv, &msg).unwrap();

        let mut zuc = ZucCipher::new(&key, &iv).unwrap();
        let mut out = Vec::new();
        for piece in msg.chunks(3) {
            out.extend(zuc.update(piece).unwrap());
        }
        out.extend(zuc.finish().unwrap());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_zuc_rejects_bad_lengths() {
        assert!(matches!(
            ZucCipher::new(&[0u8; 15], &[0u8; 16]),
            Err(CryptoError::InvalidKeyLength { got: 15, .. })
        ));
        assert!(matches!(
            ZucCipher::new(&[0u8; 16], &[0u8; 17]),
            Err(CryptoError::InvalidIvLength(17))
        ));
    }

    #[test]
    fn test_add_m31_wraps() {
        assert_eq!(add_m31(M31 - 1, 2), 1);
        assert_eq!(add_m31(M31, 0), M31);
        assert_eq!(mul_pow2_m31(1 << 30, 1), 1);
    }
}
