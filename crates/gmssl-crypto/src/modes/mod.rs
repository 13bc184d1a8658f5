//! SM4 modes of operation.
//!
//! Each mode is a streaming type implementing
//! [`StreamingCipher`](crate::provider::StreamingCipher): input may arrive
//! in pieces of any size, partial blocks are carried between calls, and
//! `finish` consumes the context. Direction is encoded in the type
//! (`Sm4CbcEncryptor` vs `Sm4CbcDecryptor`), never in a runtime flag.
//!
//! The one-shot helpers (`sm4_cbc_encrypt`, `sm4_gcm_decrypt`, ...) are thin
//! wrappers that feed the whole input through the streaming types.

pub mod cbc;
pub mod ctr;
pub mod gcm;

pub use cbc::{sm4_cbc_decrypt, sm4_cbc_encrypt, Sm4CbcDecryptor, Sm4CbcEncryptor};
pub use ctr::{sm4_ctr_crypt, Sm4Ctr};
pub use gcm::{sm4_gcm_decrypt, sm4_gcm_encrypt, Sm4Gcm, Sm4GcmDecryptor, Sm4GcmEncryptor};

use crate::sm4::SM4_BLOCK_SIZE;
use gmssl_types::{CipherAlgId, CryptoError};

/// Check an IV against the fixed length a mode expects.
pub(crate) fn check_iv(alg: CipherAlgId, iv: &[u8]) -> Result<[u8; SM4_BLOCK_SIZE], CryptoError> {
    if iv.len() != alg.iv_len() {
        return Err(CryptoError::InvalidIvLength(iv.len()));
    }
    let mut out = [0u8; SM4_BLOCK_SIZE];
    out.copy_from_slice(iv);
    Ok(out)
}

#[inline]
pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}
