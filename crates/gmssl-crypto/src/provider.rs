//! Trait-based provider mechanism for cryptographic algorithms.
//!
//! These traits define the abstract interfaces that the algorithm
//! implementations satisfy, so generic constructions (HMAC over any digest,
//! modes over any block cipher) can be written once.
//!
//! None of the stateful contexts lock internally. Sharing one context
//! between threads requires external synchronisation; separate contexts
//! are fully independent.

use gmssl_types::CryptoError;

/// A hash / message digest algorithm.
pub trait Digest: Send + Sync {
    /// The output size in bytes.
    fn output_size(&self) -> usize;

    /// The internal block size in bytes.
    fn block_size(&self) -> usize;

    /// Feed data into the hash state.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Finalize the hash and write the digest to `out`.
    /// The length of `out` must be at least `output_size()`.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the hash state to process a new message.
    fn reset(&mut self);
}

/// A block cipher with a fixed key schedule.
pub trait BlockCipher: Send + Sync {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Key size in bytes.
    fn key_size(&self) -> usize;

    /// Encrypt a single block in-place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;

    /// Decrypt a single block in-place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;
}

/// An Authenticated Encryption with Associated Data (AEAD) algorithm.
pub trait Aead: Send + Sync {
    /// The length of the authentication tag in bytes.
    fn tag_size(&self) -> usize;

    /// The recommended nonce size in bytes.
    fn nonce_size(&self) -> usize;

    /// The key size in bytes.
    fn key_size(&self) -> usize;

    /// Encrypt plaintext with AEAD.
    ///
    /// Returns ciphertext || tag.
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt ciphertext with AEAD.
    ///
    /// `ciphertext` should include the appended tag.
    fn decrypt(&self, nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A streaming cipher context: feed input in arbitrary pieces, then finish.
///
/// `update` returns only the output bytes that are final at this point, so
/// a call may return fewer (or, once buffered input completes a block, more)
/// bytes than it consumed. `finish` consumes the context; a finished stream
/// cannot be fed again.
pub trait StreamingCipher {
    /// Process the next piece of input.
    fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Flush buffered state and return the remaining output.
    fn finish(self) -> Result<Vec<u8>, CryptoError>;
}

/// A Message Authentication Code (MAC) algorithm.
pub trait Mac: Send + Sync {
    /// The output size of the MAC in bytes.
    fn output_size(&self) -> usize;

    /// Re-key the MAC, discarding any buffered input.
    fn init(&mut self, key: &[u8]) -> Result<(), CryptoError>;

    /// Feed data into the MAC computation.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Finalize and write the MAC value to `out`.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the MAC state for reuse with the same key.
    fn reset(&mut self) -> Result<(), CryptoError>;
}

/// A Key Derivation Function (KDF).
pub trait Kdf: Send + Sync {
    /// Derive key material.
    fn derive(
        &self,
        password: &[u8],
        salt: &[u8],
        info: &[u8],
        output: &mut [u8],
    ) -> Result<(), CryptoError>;
}

/// A digital signature algorithm.
pub trait Signer: Send + Sync {
    /// Sign a message digest, returning the encoded signature.
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A signature verifier.
pub trait Verifier: Send + Sync {
    /// Verify a signature against a message digest.
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError>;
}
