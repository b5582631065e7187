use crate::asn1_types::{ASN1BitString, ASN1ObjectIdentifier};
use crate::errors::{ASN1Error, ErrorCode};
use crate::tag::{ASN1Identifier, TagClass};
use crate::value::ASN1Value;
use bytes::Bytes;

/// The three forms X.690 §8.18 allows for EXTERNAL's final `encoding`
/// CHOICE, keyed by the context tag number that identifies which one is
/// present on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalEncoding {
    /// `[0] single-ASN1-type` — an arbitrary, unparsed inner value.
    SingleAsn1Type(Box<ASN1Value>),
    /// `[1] IMPLICIT OCTET STRING`.
    OctetAligned(Bytes),
    /// `[2] IMPLICIT BIT STRING`.
    Arbitrary(ASN1BitString),
}

impl ExternalEncoding {
    fn tag_number(&self) -> u64 {
        match self {
            ExternalEncoding::SingleAsn1Type(_) => 0,
            ExternalEncoding::OctetAligned(_) => 1,
            ExternalEncoding::Arbitrary(_) => 2,
        }
    }
}

/// The EXTERNAL type (X.690 §8.18 / X.208): a reference to a data value
/// whose type is identified out of band, optionally preceded by a
/// direct/indirect reference and a textual descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ASN1External {
    pub direct_reference: Option<ASN1ObjectIdentifier>,
    pub indirect_reference: Option<i64>,
    pub data_value_descriptor: Option<String>,
    pub encoding: ExternalEncoding,
}

impl ASN1External {
    pub fn new(encoding: ExternalEncoding) -> Self {
        ASN1External {
            direct_reference: None,
            indirect_reference: None,
            data_value_descriptor: None,
            encoding,
        }
    }

    /// Builds the SEQUENCE-shaped `ASN1Value` for this EXTERNAL, in the
    /// mandated field order: direct-reference, indirect-reference,
    /// data-value-descriptor, then the tagged `encoding` choice.
    pub fn to_value(&self) -> ASN1Value {
        let mut children = Vec::new();

        if let Some(oid) = &self.direct_reference {
            children.push(ASN1Value::primitive_contents(
                ASN1Identifier::OBJECT_IDENTIFIER,
                oid.raw_bytes(),
            ));
        }
        if let Some(indirect) = self.indirect_reference {
            children.push(integer_value(indirect));
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            children.push(ASN1Value::primitive_contents(
                ASN1Identifier::GRAPHIC_STRING,
                Bytes::copy_from_slice(descriptor.as_bytes()),
            ));
        }

        let content_identifier = ASN1Identifier::new(self.encoding.tag_number(), TagClass::Context);
        let content_value = match &self.encoding {
            ExternalEncoding::SingleAsn1Type(inner) => {
                ASN1Value::constructed_contents(content_identifier, vec![(**inner).clone()])
            }
            ExternalEncoding::OctetAligned(bytes) => {
                ASN1Value::primitive_contents(content_identifier, bytes.clone())
            }
            ExternalEncoding::Arbitrary(bit_string) => {
                let mut content = Vec::with_capacity(bit_string.bytes.len() + 1);
                content.push(bit_string.padding_bits);
                content.extend_from_slice(&bit_string.bytes);
                ASN1Value::primitive_contents(content_identifier, Bytes::from(content))
            }
        };
        children.push(content_value);

        ASN1Value::constructed_contents(ASN1Identifier::SEQUENCE, children)
    }

    /// Parses an EXTERNAL from its SEQUENCE-shaped `ASN1Value`, requiring
    /// the optional leading fields (if present) and the mandatory tagged
    /// `encoding` to appear in the order X.690 §8.18 fixes.
    pub fn from_value(value: ASN1Value) -> Result<Self, ASN1Error> {
        let children = match value {
            ASN1Value::Constructed { identifier, children } if identifier == ASN1Identifier::SEQUENCE => {
                children
            }
            _ => {
                return Err(ASN1Error::new(
                    ErrorCode::UnexpectedFieldType,
                    "EXTERNAL must be a SEQUENCE".to_string(),
                    file!().to_string(),
                    line!(),
                ))
            }
        };

        let mut iter = children.into_iter().peekable();
        let mut direct_reference = None;
        let mut indirect_reference = None;
        let mut data_value_descriptor = None;

        if matches!(iter.peek(), Some(v) if v.identifier() == ASN1Identifier::OBJECT_IDENTIFIER) {
            if let Some(ASN1Value::Primitive { content, .. }) = iter.next() {
                direct_reference = Some(ASN1ObjectIdentifier::from_raw_bytes(content));
            }
        }
        if matches!(iter.peek(), Some(v) if v.identifier() == ASN1Identifier::INTEGER) {
            if let Some(ASN1Value::Primitive { content, .. }) = iter.next() {
                indirect_reference = Some(decode_integer(&content)?);
            }
        }
        if matches!(iter.peek(), Some(v) if v.identifier() == ASN1Identifier::GRAPHIC_STRING) {
            if let Some(ASN1Value::Primitive { content, .. }) = iter.next() {
                data_value_descriptor = Some(String::from_utf8(content.to_vec()).map_err(|_| {
                    ASN1Error::new(
                        ErrorCode::InvalidStringRepresentation,
                        "EXTERNAL data-value-descriptor is not valid UTF-8".to_string(),
                        file!().to_string(),
                        line!(),
                    )
                })?);
            }
        }

        let content = iter.next().ok_or_else(|| {
            ASN1Error::new(
                ErrorCode::StructureError,
                "EXTERNAL is missing its mandatory tagged encoding".to_string(),
                file!().to_string(),
                line!(),
            )
        })?;
        if iter.next().is_some() {
            return Err(ASN1Error::new(
                ErrorCode::StructureError,
                "EXTERNAL has unexpected trailing elements".to_string(),
                file!().to_string(),
                line!(),
            ));
        }

        if content.identifier().tag_class != TagClass::Context {
            return Err(ASN1Error::new(
                ErrorCode::StructureError,
                "EXTERNAL encoding choice must be context-tagged".to_string(),
                file!().to_string(),
                line!(),
            ));
        }

        let encoding = match content.identifier().tag_number {
            0 => match content {
                ASN1Value::Constructed { children, .. } if children.len() == 1 => {
                    ExternalEncoding::SingleAsn1Type(Box::new(children.into_iter().next().unwrap()))
                }
                _ => {
                    return Err(ASN1Error::new(
                        ErrorCode::StructureError,
                        "EXTERNAL single-ASN1-type must wrap exactly one value".to_string(),
                        file!().to_string(),
                        line!(),
                    ))
                }
            },
            1 => match content {
                ASN1Value::Primitive { content, .. } => ExternalEncoding::OctetAligned(content),
                _ => {
                    return Err(ASN1Error::new(
                        ErrorCode::StructureError,
                        "EXTERNAL octet-aligned encoding must be primitive".to_string(),
                        file!().to_string(),
                        line!(),
                    ))
                }
            },
            2 => match content {
                ASN1Value::Primitive { content, .. } => {
                    if content.is_empty() {
                        return Err(ASN1Error::new(
                            ErrorCode::TruncatedASN1Field,
                            "EXTERNAL arbitrary BIT STRING missing padding octet".to_string(),
                            file!().to_string(),
                            line!(),
                        ));
                    }
                    let padding_bits = content[0];
                    let bit_string = ASN1BitString::new(content.slice(1..), padding_bits)?;
                    ExternalEncoding::Arbitrary(bit_string)
                }
                _ => {
                    return Err(ASN1Error::new(
                        ErrorCode::StructureError,
                        "EXTERNAL arbitrary encoding must be primitive".to_string(),
                        file!().to_string(),
                        line!(),
                    ))
                }
            },
            n => {
                return Err(ASN1Error::new(
                    ErrorCode::InvalidArgument,
                    format!("EXTERNAL encoding choice has unsupported tag number {}", n),
                    file!().to_string(),
                    line!(),
                ))
            }
        };

        Ok(ASN1External {
            direct_reference,
            indirect_reference,
            data_value_descriptor,
            encoding,
        })
    }
}

fn integer_value(n: i64) -> ASN1Value {
    let bytes = n.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1
        && ((bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0))
    {
        start += 1;
    }
    ASN1Value::primitive_contents(ASN1Identifier::INTEGER, Bytes::copy_from_slice(&bytes[start..]))
}

fn decode_integer(bytes: &[u8]) -> Result<i64, ASN1Error> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(ASN1Error::new(
            ErrorCode::ValueOutOfRange,
            "EXTERNAL indirect-reference does not fit in i64".to_string(),
            file!().to_string(),
            line!(),
        ));
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = [if negative { 0xFFu8 } else { 0x00 }; 8];
    let offset = 8 - bytes.len();
    buf[offset..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(buf))
}
