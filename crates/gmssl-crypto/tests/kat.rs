//! Known-answer tests driven by JSON vector files.
//!
//! Vector files live in `tests/vectors/`. Each holds one algorithm's cases;
//! cases marked `"invalid"` must be rejected with the documented error kind.

use gmssl_crypto::hmac::Sm3Hmac;
use gmssl_crypto::modes::{
    sm4_cbc_decrypt, sm4_cbc_encrypt, sm4_ctr_crypt, Sm4GcmDecryptor, Sm4GcmEncryptor,
};
use gmssl_crypto::provider::StreamingCipher;
use gmssl_crypto::sm3::Sm3;
use gmssl_crypto::zuc::zuc_crypt;
use gmssl_types::CryptoError;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize)]
struct VectorFile<T> {
    algorithm: String,
    #[serde(rename = "numberOfTests")]
    number_of_tests: usize,
    tests: Vec<T>,
}

#[derive(Deserialize)]
struct DigestTest {
    #[serde(rename = "tcId")]
    tc_id: usize,
    msg: String,
    digest: String,
}

#[derive(Deserialize)]
struct MacTest {
    #[serde(rename = "tcId")]
    tc_id: usize,
    key: String,
    msg: String,
    tag: String,
    result: String,
}

#[derive(Deserialize)]
struct CipherTest {
    #[serde(rename = "tcId")]
    tc_id: usize,
    key: String,
    iv: String,
    msg: String,
    ct: String,
    #[serde(default = "valid")]
    result: String,
}

#[derive(Deserialize)]
struct AeadTest {
    #[serde(rename = "tcId")]
    tc_id: usize,
    key: String,
    iv: String,
    aad: String,
    msg: String,
    ct: String,
    tag: String,
    result: String,
}

fn valid() -> String {
    "valid".into()
}

fn load<T: serde::de::DeserializeOwned>(filename: &str) -> VectorFile<T> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/vectors")
        .join(filename);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    let file: VectorFile<T> = serde_json::from_str(&data).unwrap();
    assert_eq!(file.tests.len(), file.number_of_tests, "{}", file.algorithm);
    file
}

fn hex_decode(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn kat_sm3() {
    let file: VectorFile<DigestTest> = load("sm3.json");
    for t in &file.tests {
        let msg = hex_decode(&t.msg);
        let digest = Sm3::digest(&msg).unwrap();
        assert_eq!(hex_encode(&digest), t.digest, "tcId {}", t.tc_id);

        // Same digest when fed in uneven pieces.
        let mut ctx = Sm3::new();
        for piece in msg.chunks(7) {
            ctx.update(piece).unwrap();
        }
        assert_eq!(ctx.finish().unwrap(), digest, "tcId {}", t.tc_id);
    }
}

#[test]
fn kat_hmac_sm3() {
    let file: VectorFile<MacTest> = load("hmac_sm3.json");
    for t in &file.tests {
        let key = hex_decode(&t.key);
        let msg = hex_decode(&t.msg);
        match t.result.as_str() {
            "valid" => {
                let tag = Sm3Hmac::mac(&key, &msg).unwrap();
                assert_eq!(hex_encode(&tag), t.tag, "tcId {}", t.tc_id);
            }
            _ => {
                let err = Sm3Hmac::new(&key).err().expect("short or long key accepted");
                assert!(err.is_input_error(), "tcId {}", t.tc_id);
            }
        }
    }
}

#[test]
fn kat_sm4_cbc() {
    let file: VectorFile<CipherTest> = load("sm4_cbc.json");
    for t in &file.tests {
        let key = hex_decode(&t.key);
        let iv = hex_decode(&t.iv);
        let ct = hex_decode(&t.ct);
        if t.result == "valid" {
            let msg = hex_decode(&t.msg);
            assert_eq!(hex_encode(&sm4_cbc_encrypt(&key, &iv, &msg).unwrap()), t.ct);
            assert_eq!(sm4_cbc_decrypt(&key, &iv, &ct).unwrap(), msg, "tcId {}", t.tc_id);
        } else {
            let err = sm4_cbc_decrypt(&key, &iv, &ct).unwrap_err();
            assert!(matches!(err, CryptoError::InvalidPadding), "tcId {}", t.tc_id);
            assert!(err.is_inner());
        }
    }
}

#[test]
fn kat_sm4_ctr() {
    let file: VectorFile<CipherTest> = load("sm4_ctr.json");
    for t in &file.tests {
        let key = hex_decode(&t.key);
        let iv = hex_decode(&t.iv);
        let msg = hex_decode(&t.msg);
        let ct = sm4_ctr_crypt(&key, &iv, &msg).unwrap();
        assert_eq!(hex_encode(&ct), t.ct, "tcId {}", t.tc_id);
        assert_eq!(sm4_ctr_crypt(&key, &iv, &ct).unwrap(), msg);
    }
}

#[test]
fn kat_sm4_gcm() {
    let file: VectorFile<AeadTest> = load("sm4_gcm.json");
    for t in &file.tests {
        let key = hex_decode(&t.key);
        let iv = hex_decode(&t.iv);
        let aad = hex_decode(&t.aad);
        let tag = hex_decode(&t.tag);
        let mut sealed = hex_decode(&t.ct);
        sealed.extend_from_slice(&tag);

        if t.result == "valid" {
            let msg = hex_decode(&t.msg);
            let mut enc = Sm4GcmEncryptor::new(&key, &iv, &aad, tag.len()).unwrap();
            let mut out = enc.update(&msg).unwrap();
            out.extend(enc.finish().unwrap());
            assert_eq!(hex_encode(&out), hex_encode(&sealed), "tcId {}", t.tc_id);
        }

        let mut dec = Sm4GcmDecryptor::new(&key, &iv, &aad, tag.len()).unwrap();
        let mut plain = dec.update(&sealed).unwrap();
        match dec.finish() {
            Ok(rest) => {
                plain.extend(rest);
                assert_eq!(t.result, "valid", "tcId {} accepted", t.tc_id);
                assert_eq!(hex_encode(&plain), t.msg, "tcId {}", t.tc_id);
            }
            Err(e) => {
                assert_eq!(t.result, "invalid", "tcId {} rejected", t.tc_id);
                assert!(e.is_auth_failure(), "tcId {}", t.tc_id);
            }
        }
    }
}

#[test]
fn kat_zuc() {
    let file: VectorFile<CipherTest> = load("zuc.json");
    for t in &file.tests {
        let key = hex_decode(&t.key);
        let iv = hex_decode(&t.iv);
        let msg = hex_decode(&t.msg);
        let ct = zuc_crypt(&key, &iv, &msg).unwrap();
        assert_eq!(hex_encode(&ct), t.ct, "tcId {}", t.tc_id);
    }
}
