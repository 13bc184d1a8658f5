/// The three disjoint failure classes every [`CryptoError`] falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied a parameter of the wrong size or range, or called an
    /// operation that is illegal in the current state. Always recoverable.
    InvalidInput,
    /// The engine could not complete the operation. Opaque; callers are not
    /// expected to branch on the variant.
    Inner,
    /// An authenticity check failed on adversarial or corrupted input.
    Authentication,
}

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    // Input validation
    #[error("invalid argument: {0}")]
    InvalidArg(&'static str),
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length: {0}")]
    InvalidIvLength(usize),
    #[error("invalid tag length: {0}")]
    InvalidTagLength(usize),
    #[error("invalid digest size: expected {expected}, got {got}")]
    InvalidDigestSize { expected: usize, got: usize },
    #[error("invalid block size: expected {expected}, got {got}")]
    InvalidBlockSize { expected: usize, got: usize },
    #[error("invalid plaintext length: {0}")]
    InvalidPlaintextLength(usize),
    #[error("invalid ciphertext length: {0}")]
    InvalidCiphertextLength(usize),
    #[error("invalid signer id length: {0} bytes")]
    InvalidIdLength(usize),

    // BigNum errors
    #[error("big number: division by zero")]
    BnDivisionByZero,
    #[error("big number: no modular inverse")]
    BnNoInverse,
    #[error("big number: invalid modulus")]
    BnInvalidModulus,

    // ECC errors
    #[error("ecc: point at infinity")]
    EccPointAtInfinity,
    #[error("ecc: point not on curve")]
    EccPointNotOnCurve,
    #[error("ecc: invalid private key")]
    EccInvalidPrivateKey,
    #[error("ecc: invalid public key")]
    EccInvalidPublicKey,

    // SM2 errors
    #[error("sm2: missing private key")]
    Sm2NoPrivateKey,
    #[error("sm2: decryption failed")]
    Sm2DecryptFail,
    #[error("sm2: nonce retry budget exhausted")]
    Sm2RetryExhausted,

    // Symmetric cipher errors
    #[error("invalid padding")]
    InvalidPadding,
    #[error("aead: tag verification failed")]
    AeadTagVerifyFail,

    // Random source errors
    #[error("drbg: invalid state")]
    DrbgInvalidState,
    #[error("drbg: failed to obtain entropy")]
    DrbgEntropyFail,

    // KDF errors
    #[error("kdf: derived key length overflow")]
    KdfDkLenOverflow,

    // Encoding/Decoding errors
    #[error("decode: asn1 buffer failed")]
    DecodeAsn1Fail,
    #[error("decode: unknown oid")]
    DecodeUnknownOid,
    #[error("decode: malformed pem")]
    DecodePemFail,
    #[error("decode: malformed base64")]
    DecodeBase64Fail,

    // Key persistence
    #[error("key i/o failed")]
    KeyIoFail,
}

impl CryptoError {
    /// Classify this error into one of the three failure kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::InvalidArg(_)
            | CryptoError::InvalidState(_)
            | CryptoError::InvalidKeyLength { .. }
            | CryptoError::InvalidIvLength(_)
            | CryptoError::InvalidTagLength(_)
            | CryptoError::InvalidDigestSize { .. }
            | CryptoError::InvalidBlockSize { .. }
            | CryptoError::InvalidPlaintextLength(_)
            | CryptoError::InvalidCiphertextLength(_)
            | CryptoError::InvalidIdLength(_) => ErrorKind::InvalidInput,
            CryptoError::AeadTagVerifyFail => ErrorKind::Authentication,
            _ => ErrorKind::Inner,
        }
    }

    pub fn is_input_error(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }

    pub fn is_inner(&self) -> bool {
        self.kind() == ErrorKind::Inner
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let input = CryptoError::InvalidKeyLength {
            expected: 16,
            got: 15,
        };
        assert_eq!(input.kind(), ErrorKind::InvalidInput);
        assert!(input.is_input_error());
        assert!(CryptoError::InvalidTagLength(17).is_input_error());
        assert!(CryptoError::InvalidState("finished").is_input_error());

        assert!(CryptoError::InvalidPadding.is_inner());
        assert!(CryptoError::Sm2DecryptFail.is_inner());
        assert!(CryptoError::Sm2RetryExhausted.is_inner());
        assert!(CryptoError::KeyIoFail.is_inner());
        assert!(CryptoError::EccPointNotOnCurve.is_inner());

        assert!(CryptoError::AeadTagVerifyFail.is_auth_failure());
        assert!(!CryptoError::AeadTagVerifyFail.is_inner());
    }

    #[test]
    fn test_display_names_parameter() {
        let e = CryptoError::InvalidKeyLength {
            expected: 16,
            got: 17,
        };
        assert_eq!(e.to_string(), "invalid key length: expected 16, got 17");
        assert_eq!(
            CryptoError::Sm2RetryExhausted.to_string(),
            "sm2: nonce retry budget exhausted"
        );
        assert_eq!(
            CryptoError::InvalidIvLength(0).to_string(),
            "invalid iv length: 0"
        );
    }
}
