use crate::der::Serializer;
use crate::errors::{ASN1Error, ErrorCode};
use crate::parser::{ASN1Node, Content};
use crate::rules::EncodingRules;
use crate::tag::ASN1Identifier;
use bytes::{Bytes, BytesMut};
use std::hash::{Hash, Hasher};

/// A schema-free, owned ASN.1 tree: either raw primitive content octets,
/// a constructed node holding further nodes, or an explicitly tagged value
/// still remembering that it was produced by explicit wrapping (rather than
/// having been flattened into a plain constructed node). This is the
/// generic building block `TaggedObject` and `External` compose with,
/// independent of any concrete leaf type's own
/// `DERParseable`/`BERParseable` machinery.
#[derive(Debug, Clone)]
pub enum ASN1Value {
    Primitive {
        identifier: ASN1Identifier,
        content: Bytes,
    },
    Constructed {
        identifier: ASN1Identifier,
        children: Vec<ASN1Value>,
    },
    /// An explicitly tagged wrapper around `inner`, produced by
    /// [`crate::tagged::ASN1TaggedObject::materialize`]. Always wire-encodes
    /// as a constructed TLV carrying the full TLV of `inner`. Distinguishing
    /// this from a plain `Constructed` node of one child is what lets
    /// [`crate::tagged::ASN1TaggedObject::implicit`] detect a choice-capable
    /// inner (spec §3/§4.4): only a schema-aware caller can mark a type as
    /// CHOICE, and the one schema-free proxy this core has for "already
    /// explicitly disambiguated by its producer" is exactly this variant.
    Tagged {
        identifier: ASN1Identifier,
        inner: Box<ASN1Value>,
    },
}

impl ASN1Value {
    pub fn primitive_contents(identifier: ASN1Identifier, content: Bytes) -> Self {
        ASN1Value::Primitive { identifier, content }
    }

    pub fn constructed_contents(identifier: ASN1Identifier, children: Vec<ASN1Value>) -> Self {
        ASN1Value::Constructed { identifier, children }
    }

    pub fn identifier(&self) -> ASN1Identifier {
        match self {
            ASN1Value::Primitive { identifier, .. } => *identifier,
            ASN1Value::Constructed { identifier, .. } => *identifier,
            ASN1Value::Tagged { identifier, .. } => *identifier,
        }
    }

    /// Whether this value's wire encoding sets the constructed bit.
    /// Explicit tagging (`Tagged`) is always constructed, regardless of
    /// whether its inner value is itself primitive or constructed.
    pub fn is_constructed(&self) -> bool {
        matches!(self, ASN1Value::Constructed { .. } | ASN1Value::Tagged { .. })
    }

    /// True for a value produced by explicit tagging, i.e. the schema-free
    /// proxy this core uses for "choice-capable" (spec §3/§4.4).
    pub(crate) fn is_explicitly_tagged(&self) -> bool {
        matches!(self, ASN1Value::Tagged { .. })
    }

    pub fn with_identifier(self, identifier: ASN1Identifier) -> Self {
        match self {
            ASN1Value::Primitive { content, .. } => ASN1Value::Primitive { identifier, content },
            ASN1Value::Constructed { children, .. } => {
                ASN1Value::Constructed { identifier, children }
            }
            ASN1Value::Tagged { inner, .. } => ASN1Value::Tagged { identifier, inner },
        }
    }

    /// Materializes a lazily-parsed node (and, for constructed nodes,
    /// its entire subtree) into an owned `ASN1Value`.
    pub fn from_node(node: ASN1Node) -> Self {
        match node.content {
            Content::Primitive(content) => ASN1Value::Primitive {
                identifier: node.identifier,
                content,
            },
            Content::Constructed(collection) => {
                let children = collection
                    .into_iter()
                    .map(ASN1Value::from_node)
                    .collect();
                ASN1Value::Constructed {
                    identifier: node.identifier,
                    children,
                }
            }
        }
    }

    pub fn from_ber_bytes(data: &[u8]) -> Result<Self, ASN1Error> {
        let node = crate::ber::parse(data)?;
        Ok(Self::from_node(node))
    }

    pub fn from_dl_bytes(data: &[u8]) -> Result<Self, ASN1Error> {
        let node = crate::dl::parse(data)?;
        Ok(Self::from_node(node))
    }

    pub fn from_der_bytes(data: &[u8]) -> Result<Self, ASN1Error> {
        let node = crate::der::parse(data)?;
        Ok(Self::from_node(node))
    }

    /// Encodes with the given variant's rules. `Ber`/`Dl` preserve
    /// element order and segmentation as given; `Der` normalizes first
    /// (see [`ASN1Value::to_der`]).
    pub fn to_bytes(&self, rules: EncodingRules) -> Bytes {
        match rules {
            EncodingRules::Der => self.clone().to_der().encode_raw(),
            EncodingRules::Ber | EncodingRules::Dl => self.encode_raw(),
        }
    }

    fn encode_raw(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.write_raw(&mut buf);
        buf.freeze()
    }

    fn write_raw(&self, buf: &mut BytesMut) {
        use crate::length::write_length;
        use crate::tag::write_identifier;

        match self {
            ASN1Value::Primitive { identifier, content } => {
                let mut header = Vec::new();
                write_identifier(&mut header, *identifier, false);
                buf.extend_from_slice(&header);
                buf.extend_from_slice(&write_length(content.len()));
                buf.extend_from_slice(content);
            }
            ASN1Value::Constructed { identifier, children } => {
                let mut content = BytesMut::new();
                for child in children {
                    child.write_raw(&mut content);
                }
                let mut header = Vec::new();
                write_identifier(&mut header, *identifier, true);
                buf.extend_from_slice(&header);
                buf.extend_from_slice(&write_length(content.len()));
                buf.extend_from_slice(&content);
            }
            ASN1Value::Tagged { identifier, inner } => {
                let mut content = BytesMut::new();
                inner.write_raw(&mut content);
                let mut header = Vec::new();
                write_identifier(&mut header, *identifier, true);
                buf.extend_from_slice(&header);
                buf.extend_from_slice(&write_length(content.len()));
                buf.extend_from_slice(&content);
            }
        }
    }

    /// Normalizes this tree to DER canonical form: SET elements sorted by
    /// their encoded octets, segmented strings collapsed (already true of
    /// any tree materialized from a parsed node, since the parser itself
    /// never merges BER string segments into this tree — segmentation is
    /// a leaf-type concern handled by `asn1_types::*`'s own BER readers).
    pub fn to_der(self) -> Self {
        match self {
            ASN1Value::Primitive { .. } => self,
            ASN1Value::Constructed { identifier, children } => {
                let mut normalized: Vec<ASN1Value> =
                    children.into_iter().map(ASN1Value::to_der).collect();
                if identifier == ASN1Identifier::SET {
                    normalized.sort_by(|a, b| a.encode_raw().as_ref().cmp(b.encode_raw().as_ref()));
                }
                ASN1Value::Constructed {
                    identifier,
                    children: normalized,
                }
            }
            ASN1Value::Tagged { identifier, inner } => ASN1Value::Tagged {
                identifier,
                inner: Box::new((*inner).to_der()),
            },
        }
    }

    pub fn to_dl(self) -> Self {
        // DL preserves element order; only indefinite lengths are
        // disallowed, which this owned tree never represents anyway.
        self
    }

    pub fn serialize_into(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
        let der_form = self.clone().to_der();
        let bytes = der_form.encode_raw();
        serializer.append_raw(&bytes)
    }
}

/// DER-canonical structural equality: two trees are equal if their
/// canonicalized encodings match byte-for-byte.
impl PartialEq for ASN1Value {
    fn eq(&self, other: &Self) -> bool {
        self.clone().to_der().encode_raw() == other.clone().to_der().encode_raw()
    }
}

impl Eq for ASN1Value {}

impl Hash for ASN1Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.clone().to_der().encode_raw().hash(state);
    }
}

pub(crate) fn tag_mismatch(expected: ASN1Identifier, actual: ASN1Identifier) -> ASN1Error {
    ASN1Error::new(
        ErrorCode::UnexpectedFieldType,
        format!("expected {}, got {}", expected, actual),
        file!().to_string(),
        line!(),
    )
}
