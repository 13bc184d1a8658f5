//! SM3 cryptographic hash algorithm.
//!
//! SM3 is a 256-bit cryptographic hash function standardized by the Chinese
//! government (GB/T 32905-2016). It is a Merkle–Damgård construction over
//! 512-bit blocks, structurally similar to SHA-256, and is the digest used
//! by SM2 signatures, SM2 encryption and HMAC-SM3.

use crate::provider::Digest;
use gmssl_types::CryptoError;
use zeroize::Zeroize;

/// SM3 output size in bytes.
pub const SM3_OUTPUT_SIZE: usize = 32;

/// SM3 block size in bytes.
pub const SM3_BLOCK_SIZE: usize = 64;

const IV: [u32; 8] = [
    0x7380_166F,
    0x4914_B2B9,
    0x1724_42D7,
    0xDA8A_0600,
    0xA96F_30BC,
    0x1631_38AA,
    0xE38D_EE4D,
    0xB0FB_0E4E,
];

const T_LOW: u32 = 0x79CC_4519;
const T_HIGH: u32 = 0x7A87_9D8A;

#[inline(always)]
fn p0(x: u32) -> u32 {
    x ^ x.rotate_left(9) ^ x.rotate_left(17)
}

#[inline(always)]
fn p1(x: u32) -> u32 {
    x ^ x.rotate_left(15) ^ x.rotate_left(23)
}

/// Compression function CF(V, B).
fn compress(state: &mut [u32; 8], block: &[u8]) {
    let mut w = [0u32; 68];
    for (i, chunk) in block.chunks_exact(4).enumerate() {
        w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    for j in 16..68 {
        w[j] = p1(w[j - 16] ^ w[j - 9] ^ w[j - 3].rotate_left(15))
            ^ w[j - 13].rotate_left(7)
            ^ w[j - 6];
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for j in 0..64 {
        let t = if j < 16 { T_LOW } else { T_HIGH };
        let a12 = a.rotate_left(12);
        let ss1 = a12
            .wrapping_add(e)
            .wrapping_add(t.rotate_left(j as u32 % 32))
            .rotate_left(7);
        let ss2 = ss1 ^ a12;
        let (ff, gg) = if j < 16 {
            (a ^ b ^ c, e ^ f ^ g)
        } else {
            ((a & b) | (a & c) | (b & c), (e & f) | (!e & g))
        };
        let tt1 = ff
            .wrapping_add(d)
            .wrapping_add(ss2)
            .wrapping_add(w[j] ^ w[j + 4]);
        let tt2 = gg.wrapping_add(h).wrapping_add(ss1).wrapping_add(w[j]);
        d = c;
        c = b.rotate_left(9);
        b = a;
        a = tt1;
        h = g;
        g = f.rotate_left(19);
        f = e;
        e = p0(tt2);
    }

    for (s, v) in state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *s ^= v;
    }
    w.zeroize();
}

/// SM3 hash context.
///
/// After [`finish`](Sm3::finish) the context refuses further input until
/// [`reset`](Sm3::reset) is called.
#[derive(Clone)]
pub struct Sm3 {
    /// Internal state (eight 32-bit words).
    state: [u32; 8],
    /// Number of full blocks compressed so far.
    blocks: u64,
    /// Partial block buffer.
    buffer: [u8; SM3_BLOCK_SIZE],
    /// Number of bytes in the buffer, always below the block size.
    buffer_len: usize,
    finished: bool,
}

impl Default for Sm3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sm3 {
    /// Create a new SM3 hash context.
    pub fn new() -> Self {
        Sm3 {
            state: IV,
            blocks: 0,
            buffer: [0u8; SM3_BLOCK_SIZE],
            buffer_len: 0,
            finished: false,
        }
    }

    /// Feed data into the hash computation.
    pub fn update(&mut self, mut data: &[u8]) -> Result<(), CryptoError> {
        if self.finished {
            return Err(CryptoError::InvalidState("sm3 context already finished"));
        }

        if self.buffer_len > 0 {
            let take = (SM3_BLOCK_SIZE - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];
            if self.buffer_len < SM3_BLOCK_SIZE {
                return Ok(());
            }
            let block = self.buffer;
            compress(&mut self.state, &block);
            self.blocks += 1;
            self.buffer_len = 0;
        }

        let mut chunks = data.chunks_exact(SM3_BLOCK_SIZE);
        for block in &mut chunks {
            compress(&mut self.state, block);
            self.blocks += 1;
        }
        let rest = chunks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffer_len = rest.len();
        Ok(())
    }

    /// Finalize the hash and return the 32-byte digest.
    pub fn finish(&mut self) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        if self.finished {
            return Err(CryptoError::InvalidState("sm3 context already finished"));
        }
        let bit_len = (self.blocks * SM3_BLOCK_SIZE as u64 + self.buffer_len as u64) * 8;

        let mut tail = [0u8; 2 * SM3_BLOCK_SIZE];
        tail[..self.buffer_len].copy_from_slice(&self.buffer[..self.buffer_len]);
        tail[self.buffer_len] = 0x80;
        let tail_len = if self.buffer_len < SM3_BLOCK_SIZE - 8 {
            SM3_BLOCK_SIZE
        } else {
            2 * SM3_BLOCK_SIZE
        };
        tail[tail_len - 8..tail_len].copy_from_slice(&bit_len.to_be_bytes());

        let mut state = self.state;
        for block in tail[..tail_len].chunks_exact(SM3_BLOCK_SIZE) {
            compress(&mut state, block);
        }
        tail.zeroize();

        let mut out = [0u8; SM3_OUTPUT_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        self.finished = true;
        Ok(out)
    }

    /// Reset the hash context for a new computation.
    pub fn reset(&mut self) {
        self.buffer.zeroize();
        *self = Self::new();
    }

    /// One-shot: compute the SM3 digest of `data`.
    pub fn digest(data: &[u8]) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let mut ctx = Self::new();
        ctx.update(data)?;
        ctx.finish()
    }
}

impl Digest for Sm3 {
    fn output_size(&self) -> usize {
        SM3_OUTPUT_SIZE
    }

    fn block_size(&self) -> usize {
        SM3_BLOCK_SIZE
    }

    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        Sm3::update(self, data)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() < SM3_OUTPUT_SIZE {
            return Err(CryptoError::InvalidDigestSize {
                expected: SM3_OUTPUT_SIZE,
                got: out.len(),
            });
        }
        let digest = Sm3::finish(self)?;
        out[..SM3_OUTPUT_SIZE].copy_from_slice(&digest);
        Ok(())
    }

    fn reset(&mut self) {
        Sm3::reset(self)
    }
}
