//! Base64 encoding and decoding (RFC 4648, standard alphabet, padded).

use gmssl_types::CryptoError;

const ENCODE_TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode bytes to a Base64 string.
pub fn encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len().div_ceil(3) * 4);

    for chunk in input.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        for (i, shift) in [18u32, 12, 6, 0].into_iter().enumerate() {
            if i <= chunk.len() {
                output.push(ENCODE_TABLE[((triple >> shift) & 0x3F) as usize] as char);
            } else {
                output.push('=');
            }
        }
    }

    output
}

/// Decode a Base64 string to bytes. ASCII whitespace is ignored; padding
/// may only appear in the final quantum.
pub fn decode(input: &str) -> Result<Vec<u8>, CryptoError> {
    let filtered: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if filtered.len() % 4 != 0 {
        return Err(CryptoError::DecodeBase64Fail);
    }

    let mut output = Vec::with_capacity((filtered.len() / 4) * 3);
    let quanta = filtered.len() / 4;

    for (idx, chunk) in filtered.chunks(4).enumerate() {
        let pad = chunk.iter().rev().take_while(|&&c| c == b'=').count();
        if pad > 2 || (pad > 0 && idx + 1 != quanta) {
            return Err(CryptoError::DecodeBase64Fail);
        }
        let mut triple = 0u32;
        for &c in &chunk[..4 - pad] {
            triple = (triple << 6) | decode_char(c)?;
        }
        triple <<= 6 * pad as u32;

        output.push((triple >> 16) as u8);
        if pad < 2 {
            output.push((triple >> 8) as u8);
        }
        if pad < 1 {
            output.push(triple as u8);
        }
    }

    Ok(output)
}

fn decode_char(c: u8) -> Result<u32, CryptoError> {
    match c {
        b'A'..=b'Z' => Ok((c - b'A') as u32),
        b'a'..=b'z' => Ok((c - b'a' + 26) as u32),
        b'0'..=b'9' => Ok((c - b'0' + 52) as u32),
        b'+' => Ok(62),
        b'/' => Ok(63),
        _ => Err(CryptoError::DecodeBase64Fail),
    }
}
