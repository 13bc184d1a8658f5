#![forbid(unsafe_code)]
#![doc = "Big number arithmetic for gmssl-rs: the SM2 field and scalar engine."]

mod bignum;
mod ct;
mod inverse;
mod modular;
mod montgomery;
mod ops;

pub use bignum::BigNum;
pub use montgomery::MontgomeryCtx;
