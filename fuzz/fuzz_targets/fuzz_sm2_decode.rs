#![no_main]
use std::sync::OnceLock;

use gmssl_crypto::sm2::Sm2KeyPair;
use libfuzzer_sys::fuzz_target;

fn key() -> &'static Sm2KeyPair {
    static KEY: OnceLock<Sm2KeyPair> = OnceLock::new();
    KEY.get_or_init(|| Sm2KeyPair::from_private_key(&[0x5a; 32]).unwrap())
}

fuzz_target!(|data: &[u8]| {
    // Malformed signatures are a verdict, never an error.
    assert!(matches!(key().verify(&[0u8; 32], data), Ok(false)));

    if let Err(e) = key().decrypt(data) {
        assert!(!e.is_auth_failure());
    }
    let _ = Sm2KeyPair::from_public_key(data);
});
