#![forbid(unsafe_code)]
#![doc = "ShangMi algorithm engine for gmssl-rs: SM2, SM3, SM4 (CBC/CTR/GCM) and ZUC."]

// Core traits
pub mod provider;

// Hash algorithms
#[cfg(feature = "sm3")]
pub mod sm3;

// Symmetric ciphers
#[cfg(feature = "sm4")]
pub mod sm4;
#[cfg(feature = "zuc")]
pub mod zuc;

// Modes of operation
#[cfg(feature = "modes")]
pub mod modes;

pub mod cipher {
    //! Unified symmetric cipher interface.
    pub use super::provider::{Aead, BlockCipher, StreamingCipher};
}

// MAC algorithms
#[cfg(feature = "hmac")]
pub mod hmac;

pub mod mac {
    //! Unified MAC interface.
    pub use super::provider::Mac;
}

// Asymmetric algorithms
#[cfg(feature = "ecc")]
pub mod ecc;
#[cfg(feature = "sm2")]
pub mod sm2;

// KDF and random generation
#[cfg(feature = "drbg")]
pub mod drbg;
#[cfg(feature = "pbkdf2")]
pub mod pbkdf2;
#[cfg(feature = "drbg")]
pub mod rand;

pub mod kdf {
    //! Unified KDF interface.
    pub use super::provider::Kdf;
}
