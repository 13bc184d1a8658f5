//! Process-wide random source.
//!
//! A single SM4-CTR-DRBG, seeded from the operating system on first use and
//! reseeded from it every [`RESEED_INTERVAL`] requests, shared behind a
//! mutex. All functions here are safe to call from any number of threads.

use crate::drbg::{Sm4CtrDrbg, MAX_REQUEST_LEN, SEED_LEN};
use gmssl_bignum::BigNum;
use gmssl_types::CryptoError;
use std::sync::{Mutex, OnceLock};
use zeroize::Zeroize;

/// Generate requests served between automatic reseeds.
pub const RESEED_INTERVAL: u64 = 1 << 12;

/// Draws allowed before [`random_scalar`] gives up.
const MAX_SCALAR_DRAWS: usize = 64;

static GLOBAL_DRBG: OnceLock<Mutex<Option<Sm4CtrDrbg>>> = OnceLock::new();

fn os_entropy() -> Result<[u8; SEED_LEN], CryptoError> {
    let mut seed = [0u8; SEED_LEN];
    getrandom::getrandom(&mut seed).map_err(|e| {
        tracing::error!(error = %e, "operating system entropy source failed");
        CryptoError::DrbgEntropyFail
    })?;
    Ok(seed)
}

fn with_drbg<T>(
    f: impl FnOnce(&mut Sm4CtrDrbg) -> Result<T, CryptoError>,
) -> Result<T, CryptoError> {
    let cell = GLOBAL_DRBG.get_or_init(|| Mutex::new(None));
    let mut guard = cell.lock().map_err(|_| CryptoError::DrbgInvalidState)?;

    if guard.is_none() {
        let mut seed = os_entropy()?;
        let drbg = Sm4CtrDrbg::new(&seed);
        seed.zeroize();
        *guard = Some(drbg?);
    }
    let drbg = guard.as_mut().ok_or(CryptoError::DrbgInvalidState)?;

    if drbg.generate_count() >= RESEED_INTERVAL {
        let mut entropy = os_entropy()?;
        let res = drbg.reseed(&entropy, None);
        entropy.zeroize();
        res?;
        tracing::trace!("process random generator reseeded");
    }

    f(drbg)
}

/// Fill `buf` with random bytes.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    for chunk in buf.chunks_mut(MAX_REQUEST_LEN) {
        with_drbg(|drbg| drbg.generate(chunk, None))?;
    }
    Ok(())
}

/// Return `len` random bytes.
pub fn rand_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; len];
    fill_random(&mut out)?;
    Ok(out)
}

/// Draw a uniformly random integer in `[1, n - 1]` by rejection sampling.
pub fn random_scalar(n: &BigNum) -> Result<BigNum, CryptoError> {
    if n.is_negative() || n.bit_len() < 2 {
        return Err(CryptoError::InvalidArg("scalar bound must exceed 1"));
    }
    let bits = n.bit_len();
    let mut buf = vec![0u8; bits.div_ceil(8)];
    let excess = buf.len() * 8 - bits;

    for _ in 0..MAX_SCALAR_DRAWS {
        fill_random(&mut buf)?;
        buf[0] &= 0xff >> excess;
        let k = BigNum::from_bytes_be(&buf);
        if !k.is_zero() && k < *n {
            buf.zeroize();
            return Ok(k);
        }
    }
    buf.zeroize();
    Err(CryptoError::DrbgInvalidState)
}
