#![no_main]
use gmssl_crypto::modes::Sm4GcmDecryptor;
use gmssl_crypto::provider::StreamingCipher;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&ctl, rest)) = data.split_first() else {
        return;
    };
    let tag_len = usize::from(ctl % 16) + 1;
    let split = usize::from(ctl >> 4).min(rest.len());

    let Ok(mut dec) = Sm4GcmDecryptor::new(&[0x11; 16], &[0x22; 12], b"fuzz", tag_len) else {
        return;
    };
    let _ = dec.update(&rest[..split]);
    let _ = dec.update(&rest[split..]);
    // Forged input must fail authentication, never with any other kind.
    if let Err(e) = dec.finish() {
        assert!(e.is_auth_failure());
    }
});
