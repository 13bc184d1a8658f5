//! OID (Object Identifier) management.

use gmssl_types::CryptoError;

/// A parsed OID represented as a sequence of arc values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// Create an OID from a slice of arc values.
    pub fn new(arcs: &[u32]) -> Self {
        Self {
            arcs: arcs.to_vec(),
        }
    }

    /// Return the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Encode this OID to DER content octets (no tag/length).
    pub fn to_der_value(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if let [first, second, rest @ ..] = self.arcs.as_slice() {
            encode_arc(&mut buf, first * 40 + second);
            for &arc in rest {
                encode_arc(&mut buf, arc);
            }
        }
        buf
    }

    /// Parse an OID from DER value bytes.
    pub fn from_der_value(data: &[u8]) -> Result<Self, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        let (first, mut i) = decode_arc(data)?;
        let mut arcs = match first {
            0..=39 => vec![0, first],
            40..=79 => vec![1, first - 40],
            _ => vec![2, first - 80],
        };

        while i < data.len() {
            let (arc, consumed) = decode_arc(&data[i..])?;
            arcs.push(arc);
            i += consumed;
        }

        Ok(Self { arcs })
    }

    /// Return the dotted-string representation (e.g., "1.2.840.113549.1.1.1").
    pub fn to_dot_string(&self) -> String {
        self.arcs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dot_string())
    }
}

fn encode_arc(buf: &mut Vec<u8>, mut value: u32) {
    if value < 0x80 {
        buf.push(value as u8);
        return;
    }
    let mut bytes = Vec::new();
    while value > 0 {
        bytes.push((value & 0x7F) as u8);
        value >>= 7;
    }
    bytes.reverse();
    for (i, b) in bytes.iter().enumerate() {
        if i < bytes.len() - 1 {
            buf.push(b | 0x80);
        } else {
            buf.push(*b);
        }
    }
}

fn decode_arc(data: &[u8]) -> Result<(u32, usize), CryptoError> {
    // Minimal base-128: a leading 0x80 octet is padding.
    if data.first() == Some(&0x80) {
        return Err(CryptoError::DecodeAsn1Fail);
    }
    let mut value: u32 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if (byte & 0x80) == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(CryptoError::DecodeAsn1Fail)
}

/// Well-known OIDs for the ShangMi suite and its key containers.
pub mod known {
    use super::Oid;

    /// id-ecPublicKey (RFC 5480).
    pub fn ec_public_key() -> Oid {
        Oid::new(&[1, 2, 840, 10045, 2, 1])
    }

    /// sm2p256v1 named curve (GM/T 0006).
    pub fn sm2p256v1() -> Oid {
        Oid::new(&[1, 2, 156, 10197, 1, 301])
    }

    /// hmacWithSM3, the PBKDF2 PRF.
    pub fn hmac_sm3() -> Oid {
        Oid::new(&[1, 2, 156, 10197, 1, 401, 2])
    }

    pub fn sm4_cbc() -> Oid {
        Oid::new(&[1, 2, 156, 10197, 1, 104, 2])
    }

    /// PKCS#5 PBES2.
    pub fn pbes2() -> Oid {
        Oid::new(&[1, 2, 840, 113549, 1, 5, 13])
    }

    /// PKCS#5 PBKDF2.
    pub fn pbkdf2() -> Oid {
        Oid::new(&[1, 2, 840, 113549, 1, 5, 12])
    }
}
