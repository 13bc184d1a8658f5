//! PEM armor parsing and generation (RFC 7468).

use gmssl_types::CryptoError;

/// A parsed PEM block.
#[derive(Debug, Clone)]
pub struct PemBlock {
    /// The label (e.g., "PUBLIC KEY", "ENCRYPTED PRIVATE KEY").
    pub label: String,
    /// The decoded binary data.
    pub data: Vec<u8>,
}

const BEGIN_PREFIX: &str = "-----BEGIN ";
const END_PREFIX: &str = "-----END ";
const DASHES_SUFFIX: &str = "-----";

/// Parse a PEM-encoded string into one or more PEM blocks.
///
/// Text outside BEGIN/END markers is ignored.
pub fn parse(input: &str) -> Result<Vec<PemBlock>, CryptoError> {
    let mut blocks = Vec::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next() {
        let Some(label) = line
            .trim()
            .strip_prefix(BEGIN_PREFIX)
            .and_then(|s| s.strip_suffix(DASHES_SUFFIX))
        else {
            continue;
        };
        let label = label.to_string();
        let end_marker = format!("{END_PREFIX}{label}{DASHES_SUFFIX}");

        let mut body = String::new();
        let mut found_end = false;
        for inner in lines.by_ref() {
            let inner = inner.trim();
            if inner == end_marker {
                found_end = true;
                break;
            }
            body.push_str(inner);
        }
        if !found_end {
            return Err(CryptoError::DecodePemFail);
        }

        let data = crate::base64::decode(&body).map_err(|_| CryptoError::DecodePemFail)?;
        blocks.push(PemBlock { label, data });
    }

    Ok(blocks)
}

/// Return the data of the first block carrying `label`.
pub fn find(input: &str, label: &str) -> Result<Vec<u8>, CryptoError> {
    parse(input)?
        .into_iter()
        .find(|b| b.label == label)
        .map(|b| b.data)
        .ok_or(CryptoError::DecodePemFail)
}

/// Encode binary data as a PEM string with the given label.
pub fn encode(label: &str, data: &[u8]) -> String {
    let body = crate::base64::encode(data);
    let mut output = format!("{BEGIN_PREFIX}{label}{DASHES_SUFFIX}\n");

    // Base64 output is ASCII, so splitting on byte offsets is safe.
    let mut rest = body.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        output.push_str(line);
        output.push('\n');
        rest = tail;
    }

    output.push_str(&format!("{END_PREFIX}{label}{DASHES_SUFFIX}\n"));
    output
}
