//! ASN.1 DER decoder.

use super::{Tag, TagClass, Tlv};
use gmssl_types::CryptoError;

const INTEGER: Tag = Tag::universal(0x02, false);
const BIT_STRING: Tag = Tag::universal(0x03, false);
const OCTET_STRING: Tag = Tag::universal(0x04, false);
const NULL: Tag = Tag::universal(0x05, false);
const OID: Tag = Tag::universal(0x06, false);
const SEQUENCE: Tag = Tag::universal(0x10, true);

/// A streaming ASN.1 DER decoder.
///
/// Lengths must be definite and minimally encoded.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the remaining undecoded bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self) -> Result<(), CryptoError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CryptoError::DecodeAsn1Fail)
        }
    }

    /// Parse the next TLV element.
    pub fn read_tlv(&mut self) -> Result<Tlv<'a>, CryptoError> {
        let (tag, tag_len) = Tag::from_bytes(self.remaining())?;
        self.pos += tag_len;

        let length = self.read_length()?;
        let end = self
            .pos
            .checked_add(length)
            .filter(|&end| end <= self.data.len())
            .ok_or(CryptoError::DecodeAsn1Fail)?;

        let value = &self.data[self.pos..end];
        self.pos = end;
        Ok(Tlv { tag, value })
    }

    fn read_length(&mut self) -> Result<usize, CryptoError> {
        let first = *self
            .data
            .get(self.pos)
            .ok_or(CryptoError::DecodeAsn1Fail)?;
        self.pos += 1;

        if first < 0x80 {
            return Ok(first as usize);
        }
        // 0x80 is the BER indefinite form.
        let num_bytes = (first & 0x7F) as usize;
        if num_bytes == 0 || num_bytes > 4 {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        let bytes = self
            .data
            .get(self.pos..self.pos + num_bytes)
            .ok_or(CryptoError::DecodeAsn1Fail)?;
        if bytes[0] == 0 {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        let length = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
        if length < 0x80 {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        self.pos += num_bytes;
        Ok(length)
    }

    fn read_expected(&mut self, expected: Tag) -> Result<&'a [u8], CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag != expected {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(tlv.value)
    }

    /// Read an INTEGER and return its content octets as encoded.
    pub fn read_integer(&mut self) -> Result<&'a [u8], CryptoError> {
        let value = self.read_expected(INTEGER)?;
        if value.is_empty() {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(value)
    }

    /// Read a non-negative, minimally encoded INTEGER and return its
    /// magnitude without the sign octet.
    pub fn read_unsigned_integer(&mut self) -> Result<&'a [u8], CryptoError> {
        let value = self.read_integer()?;
        if value[0] & 0x80 != 0 {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        if value.len() > 1 && value[0] == 0 {
            if value[1] & 0x80 == 0 {
                return Err(CryptoError::DecodeAsn1Fail);
            }
            return Ok(&value[1..]);
        }
        Ok(value)
    }

    /// Read an OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<&'a [u8], CryptoError> {
        self.read_expected(OCTET_STRING)
    }

    /// Read a BIT STRING and return (unused_bits, data).
    pub fn read_bit_string(&mut self) -> Result<(u8, &'a [u8]), CryptoError> {
        let value = self.read_expected(BIT_STRING)?;
        match value.split_first() {
            Some((&unused, rest)) if unused < 8 => Ok((unused, rest)),
            _ => Err(CryptoError::DecodeAsn1Fail),
        }
    }

    /// Read an OID and return its content octets.
    pub fn read_oid(&mut self) -> Result<&'a [u8], CryptoError> {
        self.read_expected(OID)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<(), CryptoError> {
        if !self.read_expected(NULL)?.is_empty() {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(())
    }

    /// Read a SEQUENCE, returning a sub-decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder<'a>, CryptoError> {
        Ok(Decoder::new(self.read_expected(SEQUENCE)?))
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<Tag, CryptoError> {
        let (tag, _) = Tag::from_bytes(self.remaining())?;
        Ok(tag)
    }

    /// Read a context-specific tagged value with the expected tag number.
    pub fn read_context_specific(
        &mut self,
        tag_num: u32,
        constructed: bool,
    ) -> Result<Tlv<'a>, CryptoError> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::ContextSpecific
            || tlv.tag.number != tag_num
            || tlv.tag.constructed != constructed
        {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        Ok(tlv)
    }

    /// Try to read a context-specific tagged value. Returns `None` if
    /// the next tag does not match, without consuming any bytes.
    pub fn try_read_context_specific(
        &mut self,
        tag_num: u32,
        constructed: bool,
    ) -> Result<Option<Tlv<'a>>, CryptoError> {
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.peek_tag()?;
        if tag.class == TagClass::ContextSpecific
            && tag.number == tag_num
            && tag.constructed == constructed
        {
            Ok(Some(self.read_tlv()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::Encoder;

    #[test]
    fn test_read_sequence_of_integers() {
        let data = [0x30, 0x07, 0x02, 0x02, 0x00, 0x80, 0x02, 0x01, 0x05];
        let mut dec = Decoder::new(&data);
        let mut seq = dec.read_sequence().unwrap();
        assert!(dec.is_empty());
        assert_eq!(seq.read_unsigned_integer().unwrap(), &[0x80]);
        assert_eq!(seq.read_unsigned_integer().unwrap(), &[0x05]);
        seq.finish().unwrap();
    }

    #[test]
    fn test_unsigned_integer_rejects_non_minimal_and_negative() {
        let mut dec = Decoder::new(&[0x02, 0x02, 0x00, 0x05]);
        assert!(dec.read_unsigned_integer().is_err());
        let mut dec = Decoder::new(&[0x02, 0x01, 0x85]);
        assert!(dec.read_unsigned_integer().is_err());
        let mut dec = Decoder::new(&[0x02, 0x00]);
        assert!(dec.read_unsigned_integer().is_err());
    }

    #[test]
    fn test_non_minimal_length_rejected() {
        // 5 encoded in long form
        let mut dec = Decoder::new(&[0x04, 0x81, 0x05, 1, 2, 3, 4, 5]);
        assert!(dec.read_octet_string().is_err());
        // indefinite length
        let mut dec = Decoder::new(&[0x30, 0x80, 0x00, 0x00]);
        assert!(dec.read_sequence().is_err());
    }

    #[test]
    fn test_truncated_value_rejected() {
        let mut dec = Decoder::new(&[0x04, 0x05, 1, 2]);
        assert!(dec.read_octet_string().is_err());
        let mut dec = Decoder::new(&[0x04, 0x84, 0xff, 0xff, 0xff, 0xff]);
        assert!(dec.read_octet_string().is_err());
    }

    #[test]
    fn test_wrong_tag_rejected() {
        let mut dec = Decoder::new(&[0x04, 0x01, 0x00]);
        assert!(dec.read_integer().is_err());
        // context-specific [2] is not INTEGER even though the number matches
        let mut dec = Decoder::new(&[0x82, 0x01, 0x00]);
        assert!(dec.read_integer().is_err());
    }

    #[test]
    fn test_try_read_context_specific() {
        let mut enc = Encoder::new();
        enc.write_context_specific(1, true, &[0x05, 0x00]);
        enc.write_null();
        let data = enc.finish();
        let mut dec = Decoder::new(&data);
        assert!(dec.try_read_context_specific(0, true).unwrap().is_none());
        let tlv = dec.try_read_context_specific(1, true).unwrap().unwrap();
        assert_eq!(tlv.value, &[0x05, 0x00]);
        dec.read_null().unwrap();
        assert!(dec.try_read_context_specific(1, true).unwrap().is_none());
    }

    #[test]
    fn test_bit_string() {
        let mut dec = Decoder::new(&[0x03, 0x03, 0x00, 0x04, 0x01]);
        assert_eq!(dec.read_bit_string().unwrap(), (0, &[0x04u8, 0x01][..]));
        let mut dec = Decoder::new(&[0x03, 0x00]);
        assert!(dec.read_bit_string().is_err());
    }
}
