//! ASN.1 DER encoder.

use super::tags;

/// A builder for constructing DER-encoded ASN.1 data.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Consume the encoder and return the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Write a raw TLV with the given tag byte and value.
    pub fn write_tlv(&mut self, tag: u8, value: &[u8]) -> &mut Self {
        self.buf.push(tag);
        self.write_length(value.len());
        self.buf.extend_from_slice(value);
        self
    }

    /// Write a definite-form DER length.
    fn write_length(&mut self, length: usize) {
        if length < 0x80 {
            self.buf.push(length as u8);
            return;
        }
        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        self.buf.push(0x80 | (bytes.len() - skip) as u8);
        self.buf.extend_from_slice(&bytes[skip..]);
    }

    /// Write a non-negative INTEGER from big-endian magnitude bytes.
    ///
    /// Redundant leading zeros are stripped and a single zero is prepended
    /// when the high bit is set, giving the minimal DER form.
    pub fn write_integer(&mut self, value: &[u8]) -> &mut Self {
        let skip = value.iter().take_while(|&&b| b == 0).count();
        let trimmed = &value[skip..];
        if trimmed.is_empty() {
            return self.write_tlv(tags::INTEGER, &[0]);
        }
        if trimmed[0] & 0x80 != 0 {
            let mut padded = Vec::with_capacity(trimmed.len() + 1);
            padded.push(0x00);
            padded.extend_from_slice(trimmed);
            self.write_tlv(tags::INTEGER, &padded)
        } else {
            self.write_tlv(tags::INTEGER, trimmed)
        }
    }

    /// Write an OCTET STRING.
    pub fn write_octet_string(&mut self, value: &[u8]) -> &mut Self {
        self.write_tlv(tags::OCTET_STRING, value)
    }

    /// Write a BIT STRING with the given unused_bits count.
    pub fn write_bit_string(&mut self, unused_bits: u8, value: &[u8]) -> &mut Self {
        let mut content = Vec::with_capacity(value.len() + 1);
        content.push(unused_bits);
        content.extend_from_slice(value);
        self.write_tlv(tags::BIT_STRING, &content)
    }

    /// Write an OID from its encoded content octets.
    pub fn write_oid(&mut self, oid_bytes: &[u8]) -> &mut Self {
        self.write_tlv(tags::OID, oid_bytes)
    }

    /// Write a NULL.
    pub fn write_null(&mut self) -> &mut Self {
        self.write_tlv(tags::NULL, &[])
    }

    /// Write a SEQUENCE wrapping the given contents.
    pub fn write_sequence(&mut self, contents: &[u8]) -> &mut Self {
        self.write_tlv(tags::SEQUENCE, contents)
    }

    /// Write raw bytes directly (already DER-encoded).
    pub fn write_raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Write a context-specific tagged value.
    pub fn write_context_specific(
        &mut self,
        tag_num: u8,
        constructed: bool,
        content: &[u8],
    ) -> &mut Self {
        let tag = tags::CONTEXT_SPECIFIC
            | (if constructed { tags::CONSTRUCTED } else { 0 })
            | (tag_num & 0x1F);
        self.write_tlv(tag, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_integer_minimal() {
        let mut enc = Encoder::new();
        enc.write_integer(&[0x00, 0x00, 0x7F]);
        assert_eq!(enc.finish(), vec![0x02, 0x01, 0x7F]);

        let mut enc = Encoder::new();
        enc.write_integer(&[0x80]);
        assert_eq!(enc.finish(), vec![0x02, 0x02, 0x00, 0x80]);

        let mut enc = Encoder::new();
        enc.write_integer(&[0x00, 0x00]);
        assert_eq!(enc.finish(), vec![0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_long_form_lengths() {
        let mut enc = Encoder::new();
        enc.write_octet_string(&[0xAB; 200]);
        let out = enc.finish();
        assert_eq!(&out[..3], &[0x04, 0x81, 200]);
        assert_eq!(out.len(), 203);

        let mut enc = Encoder::new();
        enc.write_octet_string(&vec![0u8; 0x1234]);
        let out = enc.finish();
        assert_eq!(&out[..4], &[0x04, 0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_write_context_specific() {
        let mut enc = Encoder::new();
        enc.write_context_specific(1, true, &[0x03, 0x01, 0x00]);
        assert_eq!(enc.finish(), vec![0xA1, 0x03, 0x03, 0x01, 0x00]);
    }

    #[test]
    fn test_nested_sequence() {
        let mut inner = Encoder::new();
        inner.write_integer(&[1]).write_null();
        let inner = inner.finish();
        let mut outer = Encoder::new();
        outer.write_sequence(&inner);
        assert_eq!(outer.finish(), vec![0x30, 0x05, 0x02, 0x01, 0x01, 0x05, 0x00]);
    }
}
