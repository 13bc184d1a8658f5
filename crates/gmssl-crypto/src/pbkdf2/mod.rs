//! PBKDF2 (RFC 8018 §5.2) with HMAC-SM3 as the pseudorandom function.
//!
//! Used by the key I/O layer to derive the SM4-CBC key that protects an
//! encrypted PKCS#8 private key. Unlike [`Sm3Hmac`](crate::hmac::Sm3Hmac),
//! the PRF here accepts passwords of any length.

use crate::hmac::{sm3_factory, Hmac};
use crate::provider::Kdf;
use crate::sm3::SM3_OUTPUT_SIZE;
use gmssl_types::CryptoError;
use zeroize::Zeroize;

/// Derive `dk_len` bytes from `password` and `salt`.
pub fn pbkdf2_hmac_sm3(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    dk_len: usize,
) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; dk_len];
    derive_into(password, salt, iterations, &mut out)?;
    Ok(out)
}

fn derive_into(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> Result<(), CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::InvalidArg("pbkdf2 iteration count must be positive"));
    }
    if out.is_empty() {
        return Err(CryptoError::InvalidArg("pbkdf2 output length must be positive"));
    }
    let blocks = out.len().div_ceil(SM3_OUTPUT_SIZE);
    if blocks > u32::MAX as usize {
        return Err(CryptoError::KdfDkLenOverflow);
    }

    let mut prf = Hmac::new(sm3_factory, password)?;
    let mut u = [0u8; SM3_OUTPUT_SIZE];
    let mut t = [0u8; SM3_OUTPUT_SIZE];

    for (i, chunk) in out.chunks_mut(SM3_OUTPUT_SIZE).enumerate() {
        // U_1 = PRF(P, S ‖ INT(i))
        prf.reset()?;
        prf.update(salt)?;
        prf.update(&(i as u32 + 1).to_be_bytes())?;
        prf.finish(&mut u)?;
        t = u;

        for _ in 1..iterations {
            prf.reset()?;
            prf.update(&u)?;
            prf.finish(&mut u)?;
            t.iter_mut().zip(u.iter()).for_each(|(a, b)| *a ^= b);
        }
        chunk.copy_from_slice(&t[..chunk.len()]);
    }

    u.zeroize();
    t.zeroize();
    Ok(())
}

/// PBKDF2-HMAC-SM3 as a [`Kdf`] with a fixed iteration count.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2HmacSm3 {
    pub iterations: u32,
}

impl Kdf for Pbkdf2HmacSm3 {
    /// PBKDF2 has no context input, so `info` must be empty.
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        info: &[u8],
        output: &mut [u8],
    ) -> Result<(), CryptoError> {
        if !info.is_empty() {
            return Err(CryptoError::InvalidArg("pbkdf2 takes no info input"));
        }
        derive_into(password, salt, self.iterations, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_pbkdf2_sm3_vectors() {
        let cases: [(&[u8], &[u8], u32, usize, &str); 4] = [
            (
                b"password",
                b"salt",
                1,
                32,
                "4612f922a1fdcefaf4312fc6f8f3322b489cbf24f2ea361b44c2bd8fa2c6dcb0",
            ),
            (
                b"password",
                b"salt",
                2,
                32,
                "fee723a2bc966e11dffb66133f4e8df577383c78ade30e3298edbd3e54ed85b7",
            ),
            (
                b"password",
                b"salt",
                4096,
                32,
                "b6e8f2074c87432b78f62e5ced980fdff89e86af2f693dab1638e2b3683045dd",
            ),
            (
                b"passwordPASSWORDpassword",
                b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
                4096,
                40,
                "3b6282ac8519f059e465abff0ea37b0dbfe6c672a76e6b805312d53900db6307\
                 32ccc1a88fa5512a",
            ),
        ];
        for (pw, salt, iter, len, expected) in cases {
            assert_eq!(hex(&pbkdf2_hmac_sm3(pw, salt, iter, len).unwrap()), expected);
        }
    }

    #[test]
    fn test_pbkdf2_embedded_nul() {
        let dk = pbkdf2_hmac_sm3(b"pass\0word", b"sa\0lt", 1000, 16).unwrap();
        assert_eq!(hex(&dk), "b4b9cc977c305509348f77aadb6d5a0e");
    }

    #[test]
    fn test_pbkdf2_invalid_parameters() {
        let err = pbkdf2_hmac_sm3(b"pw", b"salt", 0, 32).unwrap_err();
        assert!(err.is_input_error());
        let err = pbkdf2_hmac_sm3(b"pw", b"salt", 1, 0).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_kdf_trait() {
        let kdf = Pbkdf2HmacSm3 { iterations: 2 };
        let mut out = [0u8; 32];
        kdf.derive(b"password", b"salt", &[], &mut out).unwrap();
        assert_eq!(out.to_vec(), pbkdf2_hmac_sm3(b"password", b"salt", 2, 32).unwrap());
        assert!(kdf.derive(b"password", b"salt", b"info", &mut out).is_err());
    }
}
