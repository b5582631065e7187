use crate::asn1_types::ASN1Identifier;
use crate::parser::ASN1Node;
use crate::errors::{ASN1Error, ErrorCode};
use crate::der::{DERParseable, DERSerializable, Serializer, DERImplicitlyTaggable};
use crate::ber::{BERParseable, BERSerializable, BERImplicitlyTaggable};
use chrono::{DateTime, Utc, TimeZone, NaiveDateTime, Datelike};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneralizedTime(pub DateTime<Utc>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UTCTime(pub DateTime<Utc>);

impl From<DateTime<Utc>> for GeneralizedTime {
    fn from(dt: DateTime<Utc>) -> Self { GeneralizedTime(dt) }
}
impl From<DateTime<Utc>> for UTCTime {
    fn from(dt: DateTime<Utc>) -> Self { UTCTime(dt) }
}

impl DERParseable for GeneralizedTime {
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        Self::from_der_node_with_identifier(node, GeneralizedTime::default_identifier())
    }
}

impl DERSerializable for GeneralizedTime {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
         // Format: YYYYMMDDHHMMSSZ
         // DER requires Z (UTC).
         let s = self.0.format("%Y%m%d%H%M%SZ").to_string();
         serializer.append_primitive_node(Self::default_identifier(), |buf| {
             buf.extend_from_slice(s.as_bytes());
             Ok(())
         })
    }
}

impl DERImplicitlyTaggable for GeneralizedTime {
    fn default_identifier() -> ASN1Identifier {
        ASN1Identifier::GENERALIZED_TIME
    }

    fn from_der_node_with_identifier(node: ASN1Node, identifier: ASN1Identifier) -> Result<Self, ASN1Error> {
         if node.identifier != identifier {
             return Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("Expected {}, got {}", identifier, node.identifier), file!().to_string(), line!()));
        }
        match node.content {
            crate::parser::Content::Primitive(bytes) => {
                let s = String::from_utf8(bytes.to_vec()).map_err(|_| ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid UTF-8".to_string(), file!().to_string(), line!()))?;
                // DER requires the Z (UTC) form with whole seconds; fractional
                // seconds and explicit offsets are valid BER but not accepted here.
                if !s.ends_with('Z') {
                     return Err(ASN1Error::new(ErrorCode::InvalidStringRepresentation, "GeneralizedTime must end with Z in DER".to_string(), file!().to_string(), line!()));
                }
                let naive = NaiveDateTime::parse_from_str(&s, "%Y%m%d%H%M%SZ").map_err(|_| ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid GeneralizedTime format".to_string(), file!().to_string(), line!()))?;
                let dt = Utc.from_utc_datetime(&naive);
                Ok(GeneralizedTime(dt))
            },
             _ => Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, "GeneralizedTime must be primitive".to_string(), file!().to_string(), line!()))
        }
    }
}


impl DERParseable for UTCTime {
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        Self::from_der_node_with_identifier(node, UTCTime::default_identifier())
    }
}

impl DERSerializable for UTCTime {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
         // Format: YYMMDDHHMMSSZ
         let s = self.0.format("%y%m%d%H%M%SZ").to_string();
         serializer.append_primitive_node(Self::default_identifier(), |buf| {
             buf.extend_from_slice(s.as_bytes());
             Ok(())
         })
    }
}

impl DERImplicitlyTaggable for UTCTime {
    fn default_identifier() -> ASN1Identifier {
        ASN1Identifier::UTC_TIME
    }

    fn from_der_node_with_identifier(node: ASN1Node, identifier: ASN1Identifier) -> Result<Self, ASN1Error> {
         if node.identifier != identifier {
             return Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("Expected {}, got {}", identifier, node.identifier), file!().to_string(), line!()));
        }
        match node.content {
            crate::parser::Content::Primitive(bytes) => {
                let s = String::from_utf8(bytes.to_vec()).map_err(|_| ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid UTF-8".to_string(), file!().to_string(), line!()))?;
                if !s.ends_with('Z') {
                     return Err(ASN1Error::new(ErrorCode::InvalidStringRepresentation, "UTCTime must end with Z in DER".to_string(), file!().to_string(), line!()));
                }
                
                if s.len() < 2 {
                      return Err(ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid UTCTime length".to_string(), file!().to_string(), line!()));
                }

                let naive = NaiveDateTime::parse_from_str(&s, "%y%m%d%H%M%SZ").map_err(|_| ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid UTCTime format".to_string(), file!().to_string(), line!()))?;

                // X.680 §47.3's windowing splits at 50, not chrono's %y split at 69:
                // two-digit year 00-49 -> 2000-2049, 50-99 -> 1950-1999.
                let year_str = &s[0..2];
                let year_val: i32 = year_str.parse().unwrap_or(0);
                let century = if year_val >= 50 { 1900 } else { 2000 };
                let full_year = century + year_val;

                let corrected_naive = naive.with_year(full_year).ok_or(ASN1Error::new(ErrorCode::InvalidStringRepresentation, "Invalid year".to_string(), file!().to_string(), line!()))?;
                
                Ok(UTCTime(Utc.from_utc_datetime(&corrected_naive)))
            },
             _ => Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, "UTCTime must be primitive".to_string(), file!().to_string(), line!()))
        }
    }
}

// BER implementations
impl BERParseable for GeneralizedTime {
    fn from_ber_node(node: ASN1Node) -> Result<Self, ASN1Error> { Self::from_der_node(node) }
}
impl BERSerializable for GeneralizedTime {}
impl BERImplicitlyTaggable for GeneralizedTime {
     fn from_ber_node_with_identifier(node: ASN1Node, identifier: ASN1Identifier) -> Result<Self, ASN1Error> { Self::from_der_node_with_identifier(node, identifier) }
}

impl BERParseable for UTCTime {
    fn from_ber_node(node: ASN1Node) -> Result<Self, ASN1Error> { Self::from_der_node(node) }
}
impl BERSerializable for UTCTime {}
impl BERImplicitlyTaggable for UTCTime {
     fn from_ber_node_with_identifier(node: ASN1Node, identifier: ASN1Identifier) -> Result<Self, ASN1Error> { Self::from_der_node_with_identifier(node, identifier) }
}
