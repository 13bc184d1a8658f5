//! Encrypted PKCS#8 (EncryptedPrivateKeyInfo) with PBES2, PBKDF2-HMAC-SM3
//! and SM4-CBC.
//!
//! ```text
//! EncryptedPrivateKeyInfo ::= SEQUENCE {
//!     encryptionAlgorithm  AlgorithmIdentifier,  -- id-PBES2
//!     encryptedData        OCTET STRING
//! }
//!
//! PBES2-params ::= SEQUENCE {
//!     keyDerivationFunc  AlgorithmIdentifier,    -- id-PBKDF2
//!     encryptionScheme   AlgorithmIdentifier     -- sm4-cbc, IV as parameter
//! }
//!
//! PBKDF2-params ::= SEQUENCE {
//!     salt            OCTET STRING,
//!     iterationCount  INTEGER,
//!     keyLength       INTEGER OPTIONAL,          -- 16 if present
//!     prf             AlgorithmIdentifier        -- hmacWithSM3
//! }
//! ```
//!
//! The PRF is written out explicitly; its RFC 8018 default (hmacWithSHA1)
//! is not supported.

use gmssl_crypto::modes::{sm4_cbc_decrypt, sm4_cbc_encrypt};
use gmssl_crypto::pbkdf2::pbkdf2_hmac_sm3;
use gmssl_crypto::rand::{fill_random, rand_bytes};
use gmssl_crypto::sm2::Sm2KeyPair;
use gmssl_types::{CipherAlgId, CryptoError, MacAlgId};
use gmssl_utils::asn1::{tags, Decoder, Encoder, TagClass};
use gmssl_utils::oid::{known, Oid};
use zeroize::Zeroizing;

use super::{encode_sm2_private_key_info, parse_sm2_private_key_info};
use crate::encoding::{bytes_to_u32, enc_algorithm_identifier, enc_seq, read_algorithm_identifier};
use crate::oid_mapping::{cipher_to_oid, oid_to_cipher, oid_to_prf, prf_to_oid};

/// PEM label of an EncryptedPrivateKeyInfo.
pub const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

const CIPHER: CipherAlgId = CipherAlgId::Sm4Cbc;
const PRF: MacAlgId = MacAlgId::HmacSm3;

const MIN_SALT_LEN: usize = 8;
/// Iteration counts above this are refused when decrypting.
const MAX_ITERATIONS: u32 = 1 << 24;

/// PBES2 settings used when exporting a private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbes2Params {
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Random salt length in bytes, at least 8.
    pub salt_len: usize,
}

impl Default for Pbes2Params {
    fn default() -> Self {
        Self {
            iterations: 65536,
            salt_len: 16,
        }
    }
}

/// Encrypt a DER PrivateKeyInfo under `password`, returning a DER
/// EncryptedPrivateKeyInfo. Salt and IV come from the process random source.
pub fn encrypt_private_key_info(
    private_key_info: &[u8],
    password: &str,
    params: &Pbes2Params,
) -> Result<Vec<u8>, CryptoError> {
    if params.iterations == 0 || params.iterations > MAX_ITERATIONS {
        return Err(CryptoError::InvalidArg("pbes2 iteration count out of range"));
    }
    if params.salt_len < MIN_SALT_LEN {
        return Err(CryptoError::InvalidArg("pbes2 salt shorter than 8 bytes"));
    }
    let salt = rand_bytes(params.salt_len)?;
    let mut iv = [0u8; 16];
    fill_random(&mut iv)?;
    encrypt_with(private_key_info, password, params.iterations, &salt, &iv)
}

fn encrypt_with(
    private_key_info: &[u8],
    password: &str,
    iterations: u32,
    salt: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let key = Zeroizing::new(pbkdf2_hmac_sm3(
        password.as_bytes(),
        salt,
        iterations,
        CIPHER.key_len(),
    )?);
    let encrypted = sm4_cbc_encrypt(&key, iv, private_key_info)?;

    let mut body = Encoder::new();
    body.write_raw(&pbes2_algorithm_identifier(salt, iterations, iv)?);
    body.write_octet_string(&encrypted);
    Ok(enc_seq(&body.finish()))
}

fn pbes2_algorithm_identifier(
    salt: &[u8],
    iterations: u32,
    iv: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut null = Encoder::new();
    null.write_null();
    let prf = enc_algorithm_identifier(&prf_to_oid(PRF), Some(&null.finish()));

    let mut kdf_params = Encoder::new();
    kdf_params
        .write_octet_string(salt)
        .write_integer(&iterations.to_be_bytes())
        .write_raw(&prf);
    let kdf = enc_algorithm_identifier(&known::pbkdf2(), Some(&enc_seq(&kdf_params.finish())));

    let cipher_oid = cipher_to_oid(CIPHER).ok_or(CryptoError::DecodeUnknownOid)?;
    let mut iv_param = Encoder::new();
    iv_param.write_octet_string(iv);
    let scheme = enc_algorithm_identifier(&cipher_oid, Some(&iv_param.finish()));

    let mut pbes2 = Encoder::new();
    pbes2.write_raw(&kdf).write_raw(&scheme);
    Ok(enc_algorithm_identifier(
        &known::pbes2(),
        Some(&enc_seq(&pbes2.finish())),
    ))
}

/// Decrypted-key parameters read from a PBES2 AlgorithmIdentifier.
struct Pbes2Decoded<'a> {
    salt: &'a [u8],
    iterations: u32,
    iv: &'a [u8],
}

fn parse_pbes2_params<'a>(params: &mut Decoder<'a>) -> Result<Pbes2Decoded<'a>, CryptoError> {
    let mut pbes2 = params.read_sequence()?;
    params.finish()?;

    // keyDerivationFunc
    let (kdf_oid, mut kdf) = read_algorithm_identifier(&mut pbes2)?;
    if kdf_oid != known::pbkdf2() {
        return Err(CryptoError::DecodeUnknownOid);
    }
    let mut kdf_params = kdf.read_sequence()?;
    kdf.finish()?;
    let salt = kdf_params.read_octet_string()?;
    let iterations = bytes_to_u32(kdf_params.read_unsigned_integer()?)?;
    if iterations == 0 || iterations > MAX_ITERATIONS {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    if !kdf_params.is_empty() {
        let tag = kdf_params.peek_tag()?;
        if tag.class == TagClass::Universal && tag.number == u32::from(tags::INTEGER) {
            let key_len = bytes_to_u32(kdf_params.read_unsigned_integer()?)?;
            if key_len as usize != CIPHER.key_len() {
                return Err(CryptoError::DecodeAsn1Fail);
            }
        }
    }
    if kdf_params.is_empty() {
        // hmacWithSHA1 by default
        return Err(CryptoError::DecodeUnknownOid);
    }
    let (prf_oid, mut prf_params) = read_algorithm_identifier(&mut kdf_params)?;
    if oid_to_prf(&prf_oid) != Some(PRF) {
        return Err(CryptoError::DecodeUnknownOid);
    }
    if !prf_params.is_empty() {
        prf_params.read_null()?;
    }
    prf_params.finish()?;
    kdf_params.finish()?;

    // encryptionScheme
    let (cipher_oid, mut scheme) = read_algorithm_identifier(&mut pbes2)?;
    if oid_to_cipher(&cipher_oid) != Some(CIPHER) {
        return Err(CryptoError::DecodeUnknownOid);
    }
    let iv = scheme.read_octet_string()?;
    scheme.finish()?;
    if iv.len() != CIPHER.iv_len() {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    pbes2.finish()?;

    Ok(Pbes2Decoded {
        salt,
        iterations,
        iv,
    })
}

/// Decrypt a DER EncryptedPrivateKeyInfo, returning the PrivateKeyInfo DER.
///
/// A wrong password almost always shows up as `InvalidPadding`; the rare
/// case where garbage happens to unpad cleanly is caught by requiring the
/// result to be a single DER SEQUENCE and reported the same way.
pub fn decrypt_private_key_info(
    der: &[u8],
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut outer = Decoder::new(der);
    let mut seq = outer.read_sequence()?;
    outer.finish()?;

    let (alg_oid, mut alg_params): (Oid, _) = read_algorithm_identifier(&mut seq)?;
    if alg_oid != known::pbes2() {
        return Err(CryptoError::DecodeUnknownOid);
    }
    let pbes2 = parse_pbes2_params(&mut alg_params)?;
    let encrypted = seq.read_octet_string()?;
    seq.finish()?;

    let key = Zeroizing::new(pbkdf2_hmac_sm3(
        password.as_bytes(),
        pbes2.salt,
        pbes2.iterations,
        CIPHER.key_len(),
    )?);
    let decrypted = Zeroizing::new(sm4_cbc_decrypt(&key, pbes2.iv, encrypted)?);

    let mut check = Decoder::new(&decrypted);
    let well_formed = check.read_sequence().is_ok() && check.is_empty();
    if !well_formed {
        return Err(CryptoError::InvalidPadding);
    }
    Ok(decrypted)
}

/// Export a key pair as an `ENCRYPTED PRIVATE KEY` PEM block.
pub fn encrypted_private_key_info_to_pem(
    key: &Sm2KeyPair,
    password: &str,
    params: &Pbes2Params,
) -> Result<String, CryptoError> {
    let pki = encode_sm2_private_key_info(key)?;
    let der = encrypt_private_key_info(&pki, password, params)?;
    Ok(gmssl_utils::pem::encode(ENCRYPTED_PRIVATE_KEY_LABEL, &der))
}

/// Import a key pair from the first `ENCRYPTED PRIVATE KEY` PEM block.
pub fn encrypted_private_key_info_from_pem(
    pem: &str,
    password: &str,
) -> Result<Sm2KeyPair, CryptoError> {
    let der = gmssl_utils::pem::find(pem, ENCRYPTED_PRIVATE_KEY_LABEL)?;
    let pki = decrypt_private_key_info(&der, password)?;
    parse_sm2_private_key_info(&pki)
}
