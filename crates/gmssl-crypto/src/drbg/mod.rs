//! Deterministic Random Bit Generators (NIST SP 800-90A).
//!
//! Only the CTR_DRBG construction is provided, instantiated with SM4 and
//! without a derivation function. The process-wide generator in
//! [`crate::rand`] is built on it.

pub mod sm4_ctr_drbg;
pub use sm4_ctr_drbg::{Sm4CtrDrbg, MAX_REQUEST_LEN, SEED_LEN};
