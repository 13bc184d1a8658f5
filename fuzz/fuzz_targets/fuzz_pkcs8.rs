#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = gmssl_pki::pkcs8::parse_sm2_private_key_info(data);
    let _ = gmssl_pki::pkcs8::parse_sm2_spki(data);
});
