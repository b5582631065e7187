use crate::errors::{ASN1Error, ErrorCode};
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ASN1Length {
    Indefinite,
    Definite(u64),
}

fn minimal_octet_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let significant_bits = 64 - value.leading_zeros();
    ((significant_bits + 7) / 8) as usize
}

/// Reads a length header at the front of `data`, consuming it. When
/// `minimal_encoding` is set, a long-form length that could have been
/// represented in short form, or with fewer length octets, is rejected
/// with `MalformedLength`.
pub(crate) fn read_length(data: &mut Bytes, minimal_encoding: bool) -> Result<ASN1Length, ASN1Error> {
    if data.is_empty() {
        return Err(ASN1Error::new(
            ErrorCode::TruncatedASN1Field,
            "".to_string(),
            file!().to_string(),
            line!(),
        ));
    }
    let first_byte = data.split_to(1)[0];

    if first_byte == 0x80 {
        return Ok(ASN1Length::Indefinite);
    }

    if (first_byte & 0x80) == 0x80 {
        let field_length = (first_byte & 0x7F) as usize;
        if field_length == 127 {
            return Err(ASN1Error::new(
                ErrorCode::MalformedLength,
                "Length octet count of 127 is reserved by X.690 and must not be used".to_string(),
                file!().to_string(),
                line!(),
            ));
        }
        if data.len() < field_length {
            return Err(ASN1Error::new(
                ErrorCode::TruncatedASN1Field,
                "".to_string(),
                file!().to_string(),
                line!(),
            ));
        }
        let length_bytes = data.split_to(field_length);
        let mut length: u64 = 0;
        for &b in length_bytes.iter() {
            length = length.checked_mul(256).ok_or_else(|| {
                ASN1Error::new(
                    ErrorCode::MalformedLength,
                    "Field length exceeds supported range".to_string(),
                    file!().to_string(),
                    line!(),
                )
            })?;
            length += b as u64;
        }

        if minimal_encoding {
            if length < 128 {
                return Err(ASN1Error::new(
                    ErrorCode::MalformedLength,
                    "Field length encoded in long form, but DER/DL requires short form".to_string(),
                    file!().to_string(),
                    line!(),
                ));
            }
            let required_bytes = minimal_octet_len(length);
            if field_length > required_bytes {
                return Err(ASN1Error::new(
                    ErrorCode::MalformedLength,
                    "Field length encoded in excessive number of bytes".to_string(),
                    file!().to_string(),
                    line!(),
                ));
            }
        }

        Ok(ASN1Length::Definite(length))
    } else {
        Ok(ASN1Length::Definite(first_byte as u64))
    }
}

/// Writes the minimal-form length header for `len` octets of content.
pub(crate) fn write_length(len: usize) -> Vec<u8> {
    if len <= 0x7F {
        vec![len as u8]
    } else {
        let mut bytes = Vec::new();
        let mut l = len;
        while l != 0 {
            bytes.push((l & 0xFF) as u8);
            l >>= 8;
        }
        let len_len = bytes.len() as u8;
        let indicator = 0x80u8 + len_len;
        let mut result = Vec::with_capacity(1 + bytes.len());
        result.push(indicator);
        for b in bytes.iter().rev() {
            result.push(*b);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_read_length_long_form_with_exact_bytes() {
        let mut data = Bytes::from(vec![0x82, 0x01, 0x02]);
        let result = read_length(&mut data, false).unwrap();
        assert_eq!(result, ASN1Length::Definite(0x0102));
        assert!(data.is_empty());
    }

    #[test]
    fn test_read_length_indefinite() {
        let mut data = Bytes::from(vec![0x80, 0xAA]);
        let result = read_length(&mut data, false).unwrap();
        assert_eq!(result, ASN1Length::Indefinite);
        assert_eq!(data.as_ref(), [0xAA]);
    }

    #[test]
    fn test_read_length_rejects_reserved_127_octet_count() {
        let mut data = Bytes::from(vec![0xFF]);
        let err = read_length(&mut data, false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedLength);
    }

    #[test]
    fn test_read_length_rejects_excessive_length_bytes() {
        let mut data = Bytes::from(vec![0x83, 0x00, 0x01, 0x02]);
        let err = read_length(&mut data, true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedLength);
    }

    #[test]
    fn test_read_length_rejects_overlong_encoding() {
        let mut data = Bytes::from(vec![0x83, 0x00, 0x00, 0x80]);
        let err = read_length(&mut data, true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MalformedLength);
    }

    #[test]
    fn test_read_length_allows_long_form_for_length_128() {
        let mut payload = BytesMut::from(&[0x81, 0x80][..]);
        payload.extend_from_slice(&vec![0u8; 128]);
        let mut data = payload.freeze();
        let result = read_length(&mut data, true).unwrap();
        assert_eq!(result, ASN1Length::Definite(128));
    }

    #[test]
    fn test_write_length_round_trip() {
        for len in [0usize, 1, 127, 128, 255, 256, 0x012345] {
            let encoded = write_length(len);
            let mut data = Bytes::from(encoded);
            let parsed = read_length(&mut data, false).unwrap();
            assert_eq!(parsed, ASN1Length::Definite(len as u64));
        }
    }

    #[test]
    fn test_write_length_long_form_indicator_bit() {
        let encoded = write_length(0x012345);
        assert_eq!(encoded, vec![0x83, 0x01, 0x23, 0x45]);
        assert_eq!(encoded[0] & 0x80, 0x80);
    }

    #[test]
    fn test_minimal_octet_len_values() {
        assert_eq!(minimal_octet_len(0), 1);
        assert_eq!(minimal_octet_len(1), 1);
        assert_eq!(minimal_octet_len(0x80), 1);
        assert_eq!(minimal_octet_len(u64::MAX), 8);
    }
}
