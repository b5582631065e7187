use crate::asn1_err;
use crate::asn1_types::{ASN1Boolean, ASN1Integer, ASN1UTF8String};
use crate::errors::{ASN1Error, ErrorCode};
use crate::length::write_length;
use crate::parser::{ASN1Node, ASN1NodeCollection, ASN1NodeCollectionIterator, ParseResult};
use crate::rules::EncodingRules;
use crate::tag::{write_identifier, ASN1Identifier};
use bytes::{BufMut, Bytes, BytesMut};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

pub trait DERParseable: Sized {
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error>;

    fn from_der_iterator(iter: &mut ASN1NodeCollectionIterator) -> Result<Self, ASN1Error> {
        let node = iter.next().ok_or_else(|| ASN1Error::new(
            ErrorCode::InvalidASN1Object,
            format!("Unable to decode {}, no ASN.1 nodes to decode", std::any::type_name::<Self>()),
            file!().to_string(),
            line!(),
        ))?;
        Self::from_der_node(node)
    }

    fn from_der_bytes(bytes: &[u8]) -> Result<Self, ASN1Error> {
         let node = parse(bytes)?;
         Self::from_der_node(node)
    }
}

pub trait DERSerializable {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error>;
}

pub trait DERImplicitlyTaggable: DERParseable + DERSerializable {
    fn default_identifier() -> ASN1Identifier;

    fn from_der_node_with_identifier(node: ASN1Node, identifier: ASN1Identifier) -> Result<Self, ASN1Error>;
}

// DER namespace functions

pub fn parse(data: &[u8]) -> Result<ASN1Node, ASN1Error> {
    let bytes = Bytes::copy_from_slice(data);
    let result = ParseResult::parse(bytes, EncodingRules::Der)?;

    let first = result
        .nodes
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

    let nodes_arc = std::sync::Arc::new(result.nodes);
    let root_depth = first.depth;

    // Verify single root
    let end_index = nodes_arc
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, node)| node.depth <= root_depth)
        .map(|(idx, _)| idx)
        .unwrap_or(nodes_arc.len());

    if end_index != nodes_arc.len() {
        return Err(ASN1Error::new(
            ErrorCode::InvalidASN1Object,
            "ASN1ParseResult unexpectedly allowed multiple root nodes".to_string(),
            file!().to_string(),
            line!(),
        ));
    }

    if first.is_constructed {
        let collection = ASN1NodeCollection::new(nodes_arc, 1..end_index, root_depth);
        Ok(ASN1Node {
            identifier: first.identifier,
            content: crate::parser::Content::Constructed(collection),
            encoded_bytes: first.encoded_bytes,
        })
    } else {
        Ok(ASN1Node {
            identifier: first.identifier,
            content: crate::parser::Content::Primitive(first.data_bytes.unwrap()),
            encoded_bytes: first.encoded_bytes,
        })
    }
}

pub fn sequence<T, F>(node: ASN1Node, identifier: ASN1Identifier, builder: F) -> Result<T, ASN1Error>
where
    F: FnOnce(&mut ASN1NodeCollectionIterator) -> Result<T, ASN1Error>,
{
    if node.identifier != identifier {
         return Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("{}", node.identifier), file!().to_string(), line!()));
    }
    match node.content {
        crate::parser::Content::Constructed(collection) => {
            let mut iter = collection.into_iter();
            let result = builder(&mut iter)?;
            if iter.next().is_some() {
                 return Err(ASN1Error::new(ErrorCode::InvalidASN1Object, "Unconsumed sequence nodes".to_string(), file!().to_string(), line!()));
            }
            Ok(result)
        },
        _ => Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("{}", node.identifier), file!().to_string(), line!()))
    }
}

pub fn sequence_of<T: DERParseable>(identifier: ASN1Identifier, root_node: ASN1Node) -> Result<Vec<T>, ASN1Error> {
     if root_node.identifier != identifier {
         return Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("{}", root_node.identifier), file!().to_string(), line!()));
    }
    match root_node.content {
        crate::parser::Content::Constructed(collection) => {
             collection.into_iter().map(|n| T::from_der_node(n)).collect()
        }
         _ => Err(ASN1Error::new(ErrorCode::UnexpectedFieldType, format!("{}", root_node.identifier), file!().to_string(), line!()))
    }
}

// Primitive implementations

impl DERParseable for bool {
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        <Self as DERImplicitlyTaggable>::from_der_node_with_identifier(
            node,
            <Self as DERImplicitlyTaggable>::default_identifier(),
        )
    }
}

impl DERSerializable for bool {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
        ASN1Boolean::from(*self).serialize(serializer)
    }
}

impl DERImplicitlyTaggable for bool {
    fn default_identifier() -> ASN1Identifier {
        ASN1Identifier::BOOLEAN
    }

    fn from_der_node_with_identifier(
        node: ASN1Node,
        identifier: ASN1Identifier,
    ) -> Result<Self, ASN1Error> {
        ASN1Boolean::from_der_node_with_identifier(node, identifier).map(|b| b.0)
    }
}

impl DERParseable for String {
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        <Self as DERImplicitlyTaggable>::from_der_node_with_identifier(
            node,
            <Self as DERImplicitlyTaggable>::default_identifier(),
        )
    }
}

impl DERSerializable for String {
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
        ASN1UTF8String(self.clone()).serialize(serializer)
    }
}

impl DERImplicitlyTaggable for String {
    fn default_identifier() -> ASN1Identifier {
        ASN1Identifier::UTF8_STRING
    }

    fn from_der_node_with_identifier(
        node: ASN1Node,
        identifier: ASN1Identifier,
    ) -> Result<Self, ASN1Error> {
        ASN1UTF8String::from_der_node_with_identifier(node, identifier).map(|s| s.0)
    }
}

macro_rules! impl_der_for_signed_int {
    ($($ty:ty => $to_method:ident),+ $(,)?) => {
        $(
            impl DERParseable for $ty {
                fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
                    <Self as DERImplicitlyTaggable>::from_der_node_with_identifier(
                        node,
                        <Self as DERImplicitlyTaggable>::default_identifier(),
                    )
                }
            }

            impl DERSerializable for $ty {
                fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
                    ASN1Integer { value: BigInt::from(*self) }.serialize(serializer)
                }
            }

            impl DERImplicitlyTaggable for $ty {
                fn default_identifier() -> ASN1Identifier {
                    ASN1Identifier::INTEGER
                }

                fn from_der_node_with_identifier(
                    node: ASN1Node,
                    identifier: ASN1Identifier,
                ) -> Result<Self, ASN1Error> {
                    let value = ASN1Integer::from_der_node_with_identifier(node, identifier)?;
                    value
                        .value
                        .$to_method()
                        .ok_or_else(|| asn1_err!(ErrorCode::ValueOutOfRange, concat!("ASN1Integer does not fit into ", stringify!($ty))))
                }
            }
        )+
    };
}

macro_rules! impl_der_for_unsigned_int {
    ($($ty:ty => $to_method:ident),+ $(,)?) => {
        $(
            impl DERParseable for $ty {
                fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
                    <Self as DERImplicitlyTaggable>::from_der_node_with_identifier(
                        node,
                        <Self as DERImplicitlyTaggable>::default_identifier(),
                    )
                }
            }

            impl DERSerializable for $ty {
                fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
                    ASN1Integer { value: BigInt::from(*self) }.serialize(serializer)
                }
            }

            impl DERImplicitlyTaggable for $ty {
                fn default_identifier() -> ASN1Identifier {
                    ASN1Identifier::INTEGER
                }

                fn from_der_node_with_identifier(
                    node: ASN1Node,
                    identifier: ASN1Identifier,
                ) -> Result<Self, ASN1Error> {
                    let value = ASN1Integer::from_der_node_with_identifier(node, identifier)?;
                    value
                        .value
                        .$to_method()
                        .ok_or_else(|| asn1_err!(ErrorCode::ValueOutOfRange, concat!("ASN1Integer does not fit into ", stringify!($ty))))
                }
            }
        )+
    };
}

impl_der_for_signed_int!(
    i8 => to_i8,
    i16 => to_i16,
    i32 => to_i32,
    i64 => to_i64,
    i128 => to_i128,
    isize => to_isize,
);

impl_der_for_unsigned_int!(
    u8 => to_u8,
    u16 => to_u16,
    u32 => to_u32,
    u64 => to_u64,
    u128 => to_u128,
    usize => to_usize,
);

impl<T> DERParseable for Vec<T>
where
    T: DERParseable + DERSerializable,
{
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        <Self as DERImplicitlyTaggable>::from_der_node_with_identifier(
            node,
            <Self as DERImplicitlyTaggable>::default_identifier(),
        )
    }
}

impl<T> DERSerializable for Vec<T>
where
    T: DERSerializable,
{
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
        serializer.write_sequence(|seq| {
            for item in self {
                seq.serialize(item)?;
            }
            Ok(())
        })
    }
}

impl<T> DERImplicitlyTaggable for Vec<T>
where
    T: DERParseable + DERSerializable,
{
    fn default_identifier() -> ASN1Identifier {
        ASN1Identifier::SEQUENCE
    }

    fn from_der_node_with_identifier(
        node: ASN1Node,
        identifier: ASN1Identifier,
    ) -> Result<Self, ASN1Error> {
        sequence_of(identifier, node)
    }
}

impl<T> DERParseable for Option<T>
where
    T: DERImplicitlyTaggable,
{
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        T::from_der_node(node).map(Some)
    }

    fn from_der_iterator(
        iter: &mut ASN1NodeCollectionIterator,
    ) -> Result<Self, ASN1Error> {
        let should_decode = match iter.peek() {
            None => return Ok(None),
            Some(node) => node.identifier == T::default_identifier(),
        };

        if !should_decode {
            return Ok(None);
        }
        let node = iter.next().expect("peeked node must exist");
        T::from_der_node(node).map(Some)
    }
}

impl<T> DERParseable for Box<T>
where
    T: DERParseable,
{
    fn from_der_node(node: ASN1Node) -> Result<Self, ASN1Error> {
        Ok(Box::new(T::from_der_node(node)?))
    }
}

impl<T> DERSerializable for Option<T>
where
    T: DERSerializable,
{
    fn serialize(&self, serializer: &mut Serializer) -> Result<(), ASN1Error> {
        if let Some(value) = self {
            serializer.serialize(value)?;
        }
        Ok(())
    }
}


pub struct Serializer {
    buffer: BytesMut,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer {
            buffer: BytesMut::with_capacity(1024),
        }
    }
    
    pub fn serialized_bytes(&self) -> Bytes {
        self.buffer.clone().freeze()
    }
    
    pub fn append_primitive_node(
        &mut self,
        identifier: ASN1Identifier,
        content_writer: impl FnOnce(&mut Vec<u8>) -> Result<(), ASN1Error>,
    ) -> Result<(), ASN1Error> {
        let mut content = Vec::new();
        content_writer(&mut content)?;
        self.append_node(identifier, false, &content)
    }

    pub fn append_constructed_node<F>(
        &mut self,
        identifier: ASN1Identifier,
        writer: F,
    ) -> Result<(), ASN1Error>
    where
        F: FnOnce(&mut Serializer) -> Result<(), ASN1Error>,
    {
        let mut nested = Serializer::new();
        writer(&mut nested)?;
        let content = nested.serialized_bytes();
        self.append_node(identifier, true, content.as_ref())
    }

    pub fn write_sequence<F>(&mut self, writer: F) -> Result<(), ASN1Error>
    where
        F: FnOnce(&mut Serializer) -> Result<(), ASN1Error>,
    {
        self.append_constructed_node(ASN1Identifier::SEQUENCE, writer)
    }

    /// Appends already fully-encoded TLV bytes verbatim, for callers (like
    /// [`crate::value::ASN1Value`]) that build their own encoding outside
    /// the `DERSerializable` trait.
    pub fn append_raw(&mut self, encoded: &[u8]) -> Result<(), ASN1Error> {
        self.buffer.put_slice(encoded);
        Ok(())
    }

    pub fn serialize<T: DERSerializable>(&mut self, node: &T) -> Result<(), ASN1Error> {
        node.serialize(self)
    }

    fn append_node(
        &mut self,
        identifier: ASN1Identifier,
        constructed: bool,
        content: &[u8],
    ) -> Result<(), ASN1Error> {
        let mut temp_vec = Vec::new();
        write_identifier(&mut temp_vec, identifier, constructed);
        self.buffer.put_slice(&temp_vec);

        let len_bytes = write_length(content.len());
        self.buffer.put_slice(&len_bytes);
        self.buffer.put_slice(content);
        Ok(())
    }
}
