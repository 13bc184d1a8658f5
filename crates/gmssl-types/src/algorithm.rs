/// MAC algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgId {
    HmacSm3,
}

/// Symmetric cipher algorithm identifiers (algorithm + mode combination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgId {
    Sm4Cbc,
    Sm4Ctr,
    Sm4Gcm,
    Zuc,
}

impl CipherAlgId {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        16
    }

    /// IV length in bytes. For GCM this is the recommended nonce length;
    /// other lengths in `1..=64` are accepted.
    pub fn iv_len(self) -> usize {
        match self {
            CipherAlgId::Sm4Gcm => 12,
            _ => 16,
        }
    }
}

/// Asymmetric (public key) algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkeyAlgId {
    Sm2,
}

/// Elliptic curve parameter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EccCurveId {
    Sm2Prime256,
}

impl EccCurveId {
    /// Field element size in bytes.
    pub fn field_size(self) -> usize {
        match self {
            EccCurveId::Sm2Prime256 => 32,
        }
    }
}
