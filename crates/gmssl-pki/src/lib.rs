#![forbid(unsafe_code)]
#![doc = "SM2 key containers for gmssl-rs: PKCS#8, SubjectPublicKeyInfo, PBES2 and PEM files."]

#[cfg(feature = "pkcs8")]
mod encoding;
#[cfg(feature = "pkcs8")]
mod oid_mapping;

#[cfg(feature = "pkcs8")]
pub mod pkcs8;

#[cfg(feature = "pkcs8")]
pub mod pem_file;

#[cfg(feature = "pkcs8")]
pub use pem_file::{
    export_encrypted_private_key_info_pem, export_encrypted_private_key_info_pem_with,
    export_public_key_info_pem, import_encrypted_private_key_info_pem, import_public_key_info_pem,
};
#[cfg(feature = "pkcs8")]
pub use pkcs8::encrypted::Pbes2Params;
