use crate::der::{DERImplicitlyTaggable, DERParseable, DERSerializable};
use crate::errors::{ASN1Error, ErrorCode};
use crate::parser::{ASN1Node, ASN1NodeCollection, ASN1NodeCollectionIterator, Content, ParseResult};
use crate::rules::EncodingRules;
use crate::tag::ASN1Identifier;
use bytes::Bytes;

/// Marker trait for leaf types whose DL decode/encode coincide with their
/// BER-permissive one (definite lengths are enforced at the parse layer,
/// not per-type), matching the X.690 definition of DL as "BER restricted
/// to definite lengths".
pub trait DLParseable: DERParseable {
    fn from_dl_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        Self::from_der_node(node)
    }
}

pub trait DLSerializable: DERSerializable {}

pub trait DLImplicitlyTaggable: DLParseable + DLSerializable + DERImplicitlyTaggable {
    fn from_dl_node_with_identifier(
        node: ASN1Node,
        identifier: ASN1Identifier,
    ) -> Result<Self, ASN1Error> {
        Self::from_der_node_with_identifier(node, identifier)
    }
}

pub fn parse(data: &[u8]) -> Result<ASN1Node, ASN1Error> {
    let bytes = Bytes::copy_from_slice(data);
    let result = ParseResult::parse(bytes, EncodingRules::Dl)?;

    let nodes = result.nodes;
    let first_node = nodes
        .first()
        .ok_or_else(|| {
            ASN1Error::new(
                ErrorCode::InvalidASN1Object,
                "No ASN.1 nodes parsed".to_string(),
                file!().to_string(),
                line!(),
            )
        })?
        .clone();

    if first_node.is_constructed {
        let nodes_arc = std::sync::Arc::new(nodes);
        let range = 1..nodes_arc.len();
        let collection = ASN1NodeCollection::new(nodes_arc, range, first_node.depth);
        Ok(ASN1Node {
            identifier: first_node.identifier,
            content: Content::Constructed(collection),
            encoded_bytes: first_node.encoded_bytes,
        })
    } else {
        Ok(ASN1Node {
            identifier: first_node.identifier,
            content: Content::Primitive(first_node.data_bytes.unwrap()),
            encoded_bytes: first_node.encoded_bytes,
        })
    }
}

pub fn sequence<T, F>(node: ASN1Node, identifier: ASN1Identifier, builder: F) -> Result<T, ASN1Error>
where
    F: FnOnce(&mut ASN1NodeCollectionIterator) -> Result<T, ASN1Error>,
{
    crate::der::sequence(node, identifier, builder)
}

pub fn sequence_of<T: DERParseable>(identifier: ASN1Identifier, root_node: ASN1Node) -> Result<Vec<T>, ASN1Error> {
    crate::der::sequence_of(identifier, root_node)
}
