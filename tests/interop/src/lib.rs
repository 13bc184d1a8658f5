//! Integration tests for gmssl-rs.
//! Cross-crate flows: key generation, PEM persistence, signing and encryption.

#[cfg(test)]
mod tests {
    use gmssl_crypto::hmac::Sm3Hmac;
    use gmssl_crypto::modes::{sm4_ctr_crypt, sm4_gcm_decrypt, sm4_gcm_encrypt};
    use gmssl_crypto::rand::rand_bytes;
    use gmssl_crypto::sm2::{Sm2KeyPair, Sm2SignContext, Sm2VerifyContext, SM2_DEFAULT_ID};
    use gmssl_crypto::sm3::Sm3;
    use gmssl_pki::pkcs8::{encode_sm2_spki, parse_sm2_spki};
    use gmssl_pki::Pbes2Params;
    use gmssl_types::CryptoError;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gmssl-interop-{}-{name}", std::process::id()))
    }

    fn fast_params() -> Pbes2Params {
        Pbes2Params {
            iterations: 128,
            salt_len: 16,
        }
    }

    // -------------------------------------------------------
    // 1. Keygen -> PEM files -> sign / verify across the boundary
    // -------------------------------------------------------
    #[test]
    fn test_pem_export_import_sign_verify() {
        let priv_path = temp_path("alice.key.pem");
        let pub_path = temp_path("alice.pub.pem");

        let alice = Sm2KeyPair::generate().unwrap();
        gmssl_pki::export_encrypted_private_key_info_pem_with(
            &alice,
            &priv_path,
            "P@ssw0rd",
            &fast_params(),
        )
        .unwrap();
        gmssl_pki::export_public_key_info_pem(&alice, &pub_path).unwrap();

        let signer = gmssl_pki::import_encrypted_private_key_info_pem(&priv_path, "P@ssw0rd").unwrap();
        let verifier = gmssl_pki::import_public_key_info_pem(&pub_path).unwrap();
        assert!(!verifier.has_private_key());

        let sig = signer.sign_message(SM2_DEFAULT_ID, b"hello world").unwrap();
        assert!(verifier.verify_message(SM2_DEFAULT_ID, b"hello world", &sig).unwrap());
        assert!(!verifier.verify_message(SM2_DEFAULT_ID, b"hello World", &sig).unwrap());
        assert!(!verifier.verify_message(b"bob", b"hello world", &sig).unwrap());

        std::fs::remove_file(&priv_path).unwrap();
        std::fs::remove_file(&pub_path).unwrap();
    }

    // -------------------------------------------------------
    // 2. Encrypt to an imported public key, decrypt with the file key
    // -------------------------------------------------------
    #[test]
    fn test_pem_public_key_encrypt_private_key_decrypt() {
        let priv_path = temp_path("bob.key.pem");
        let pub_path = temp_path("bob.pub.pem");

        let bob = Sm2KeyPair::generate().unwrap();
        gmssl_pki::export_encrypted_private_key_info_pem_with(&bob, &priv_path, "pw", &fast_params())
            .unwrap();
        gmssl_pki::export_public_key_info_pem(&bob, &pub_path).unwrap();

        let recipient = gmssl_pki::import_public_key_info_pem(&pub_path).unwrap();
        let ciphertext = recipient.encrypt(b"attack at dawn").unwrap();

        // a public-only key cannot decrypt
        assert!(matches!(
            recipient.decrypt(&ciphertext),
            Err(CryptoError::Sm2NoPrivateKey)
        ));

        let owner = gmssl_pki::import_encrypted_private_key_info_pem(&priv_path, "pw").unwrap();
        assert_eq!(owner.decrypt(&ciphertext).unwrap(), b"attack at dawn");

        std::fs::remove_file(&priv_path).unwrap();
        std::fs::remove_file(&pub_path).unwrap();
    }

    // -------------------------------------------------------
    // 3. Streaming signature context vs manual Z || M digest
    // -------------------------------------------------------
    #[test]
    fn test_streaming_sign_matches_manual_digest() {
        let id = b"alice@example.com";
        let key = Sm2KeyPair::generate().unwrap();
        let public = parse_sm2_spki(&encode_sm2_spki(&key)).unwrap();

        let mut ctx = Sm2SignContext::new(&key, id).unwrap();
        ctx.update(b"mess").unwrap();
        ctx.update(b"age").unwrap();
        let streamed = ctx.sign().unwrap();

        let mut h = Sm3::new();
        h.update(&key.compute_z(id).unwrap()).unwrap();
        h.update(b"message").unwrap();
        let digest = h.finish().unwrap();
        let raw = key.sign(&digest).unwrap();

        for sig in [&streamed, &raw] {
            assert!(public.verify(&digest, sig).unwrap());
            let mut v = Sm2VerifyContext::new(&public, id).unwrap();
            v.update(b"message").unwrap();
            assert!(v.verify(sig).unwrap());
        }
    }

    // -------------------------------------------------------
    // 4. Hybrid envelope: SM2-wrapped SM4 key + SM4-GCM payload
    // -------------------------------------------------------
    #[test]
    fn test_sm2_wrapped_gcm_envelope() {
        let recipient = Sm2KeyPair::generate().unwrap();
        let payload = rand_bytes(4096).unwrap();

        let cek = rand_bytes(16).unwrap();
        let nonce = rand_bytes(12).unwrap();
        let wrapped = recipient.encrypt(&cek).unwrap();
        let sealed = sm4_gcm_encrypt(&cek, &nonce, b"envelope-v1", &payload).unwrap();

        let unwrapped = recipient.decrypt(&wrapped).unwrap();
        assert_eq!(unwrapped, cek);
        let opened = sm4_gcm_decrypt(&unwrapped, &nonce, b"envelope-v1", &sealed).unwrap();
        assert_eq!(opened, payload);

        let err = sm4_gcm_decrypt(&unwrapped, &nonce, b"envelope-v2", &sealed).unwrap_err();
        assert!(err.is_auth_failure());
    }

    // -------------------------------------------------------
    // 5. SM4-CTR encrypt-then-MAC with HMAC-SM3
    // -------------------------------------------------------
    #[test]
    fn test_ctr_encrypt_then_hmac() {
        let enc_key = rand_bytes(16).unwrap();
        let mac_key = rand_bytes(32).unwrap();
        let iv = rand_bytes(16).unwrap();
        let msg = b"counter mode with a separate integrity key";

        let ct = sm4_ctr_crypt(&enc_key, &iv, msg).unwrap();
        let mut mac = Sm3Hmac::new(&mac_key).unwrap();
        mac.update(&iv).unwrap();
        mac.update(&ct).unwrap();
        let tag = mac.finish().unwrap();

        let mut input = iv.clone();
        input.extend_from_slice(&ct);
        assert_eq!(Sm3Hmac::mac(&mac_key, &input).unwrap(), tag);
        assert_eq!(sm4_ctr_crypt(&enc_key, &iv, &ct).unwrap(), msg);
    }

    // -------------------------------------------------------
    // 6. The process random source under concurrent use
    // -------------------------------------------------------
    #[test]
    fn test_concurrent_keygen_and_signing() {
        let keys: Vec<[u8; 64]> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    s.spawn(move || {
                        let key = Sm2KeyPair::generate().unwrap();
                        let msg = format!("thread {i}");
                        let sig = key.sign_message(SM2_DEFAULT_ID, msg.as_bytes()).unwrap();
                        assert!(key.verify_message(SM2_DEFAULT_ID, msg.as_bytes(), &sig).unwrap());
                        key.public_key_bytes()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for i in 0..keys.len() {
            for j in i + 1..keys.len() {
                assert_ne!(keys[i], keys[j]);
            }
        }
    }

    // -------------------------------------------------------
    // 7. The three error kinds stay distinct
    // -------------------------------------------------------
    #[test]
    fn test_error_kinds_are_distinct() {
        let input = Sm3Hmac::new(&[0u8; 15]).err().unwrap();
        assert!(input.is_input_error() && !input.is_inner() && !input.is_auth_failure());

        let key = Sm2KeyPair::generate().unwrap();
        let mut ct = key.encrypt(b"x").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x80;
        let inner = key.decrypt(&ct).unwrap_err();
        assert!(inner.is_inner() && !inner.is_input_error() && !inner.is_auth_failure());

        let sealed = sm4_gcm_encrypt(&[0u8; 16], &[0u8; 12], &[], b"x").unwrap();
        let auth = sm4_gcm_decrypt(&[1u8; 16], &[0u8; 12], &[], &sealed).unwrap_err();
        assert!(auth.is_auth_failure() && !auth.is_inner() && !auth.is_input_error());

        // a bad signature is a verdict, not an error
        assert!(!key.verify(&[0u8; 32], &[0x30, 0x00]).unwrap());
    }
}
