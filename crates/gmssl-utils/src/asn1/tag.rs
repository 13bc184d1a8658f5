//! ASN.1 tag parsing and encoding.

use super::{Tag, TagClass};
use gmssl_types::CryptoError;

impl Tag {
    /// Universal-class tag with the given number.
    pub const fn universal(number: u32, constructed: bool) -> Self {
        Tag {
            class: TagClass::Universal,
            constructed,
            number,
        }
    }

    /// Parse a tag from the first bytes of `input`.
    /// Returns the tag and number of bytes consumed.
    pub fn from_bytes(input: &[u8]) -> Result<(Self, usize), CryptoError> {
        let first = *input.first().ok_or(CryptoError::DecodeAsn1Fail)?;
        let class = match first >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        };
        let constructed = (first & 0x20) != 0;

        let low_bits = first & 0x1F;
        if low_bits < 0x1F {
            return Ok((
                Tag {
                    class,
                    constructed,
                    number: low_bits as u32,
                },
                1,
            ));
        }

        // High tag number form. DER forbids a leading 0x80 octet.
        if input.get(1) == Some(&0x80) {
            return Err(CryptoError::DecodeAsn1Fail);
        }
        let mut number: u32 = 0;
        let mut i = 1;
        loop {
            let byte = *input.get(i).ok_or(CryptoError::DecodeAsn1Fail)?;
            if number > (u32::MAX >> 7) {
                return Err(CryptoError::DecodeAsn1Fail);
            }
            number = (number << 7) | (byte & 0x7F) as u32;
            i += 1;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        Ok((
            Tag {
                class,
                constructed,
                number,
            },
            i,
        ))
    }

    /// Encode this tag to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let class_bits = match self.class {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::ContextSpecific => 0x80,
            TagClass::Private => 0xC0,
        };
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number < 0x1F {
            return vec![class_bits | constructed_bit | (self.number as u8)];
        }
        let mut groups = Vec::new();
        let mut num = self.number;
        while num > 0 {
            groups.push((num & 0x7F) as u8);
            num >>= 7;
        }
        let mut result = vec![class_bits | constructed_bit | 0x1F];
        let last = groups.len() - 1;
        result.extend(
            groups
                .iter()
                .rev()
                .enumerate()
                .map(|(i, b)| if i < last { b | 0x80 } else { *b }),
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence_tag() {
        let (tag, len) = Tag::from_bytes(&[0x30]).unwrap();
        assert_eq!(tag, Tag::universal(0x10, true));
        assert_eq!(len, 1);
    }

    #[test]
    fn test_parse_context_tag() {
        let (tag, _) = Tag::from_bytes(&[0xA1]).unwrap();
        assert_eq!(tag.class, TagClass::ContextSpecific);
        assert!(tag.constructed);
        assert_eq!(tag.number, 1);
    }

    #[test]
    fn test_high_tag_number_roundtrip() {
        let tag = Tag {
            class: TagClass::ContextSpecific,
            constructed: false,
            number: 300,
        };
        let bytes = tag.to_bytes();
        assert_eq!(bytes, vec![0x9F, 0x82, 0x2C]);
        let (parsed, len) = Tag::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, tag);
        assert_eq!(len, 3);
    }

    #[test]
    fn test_truncated_and_padded_tags_rejected() {
        assert!(Tag::from_bytes(&[]).is_err());
        assert!(Tag::from_bytes(&[0x1F, 0x81]).is_err());
        assert!(Tag::from_bytes(&[0x1F, 0x80, 0x01]).is_err());
    }
}
