use crate::errors::{ASN1Error, ErrorCode};
use crate::tag::{ASN1Identifier, TagClass};
use crate::value::ASN1Value;
use bytes::Bytes;
use std::fmt;
use std::hash::{Hash, Hasher};

/// How a tagged value's inner content relates to its wire identifier.
#[derive(Debug, Clone)]
enum TaggedContent {
    /// `inner` is wrapped in an extra constructed layer under the outer tag.
    Explicit(Box<ASN1Value>),
    /// `inner`'s own identifier is replaced by the outer tag; its
    /// constructed-bit (primitive vs. constructed) is inherited unchanged.
    Implicit(Box<ASN1Value>),
    /// APPLICATION-class content is never reinterpreted structurally by
    /// this core: it is kept as opaque octets under its tag number.
    ApplicationSpecific(Bytes),
}

/// A schema-free tagged wrapper over one ASN.1 value, per X.690's
/// context/application/private tagging model (§8.1, §8.14).
#[derive(Debug, Clone)]
pub struct ASN1TaggedObject {
    tag_class: TagClass,
    tag_number: u64,
    content: TaggedContent,
}

impl ASN1TaggedObject {
    /// Wraps `inner` under `[tag_class tag_number]` EXPLICIT.
    ///
    /// `tag_class` must not be `Application` — use
    /// [`ASN1TaggedObject::application_specific`] for that class, since
    /// APPLICATION content is always carried as raw octets regardless of
    /// the explicit/implicit distinction.
    pub fn explicit(tag_class: TagClass, tag_number: u64, inner: ASN1Value) -> Result<Self, ASN1Error> {
        if tag_class == TagClass::Application {
            return Err(application_class_error());
        }
        Ok(ASN1TaggedObject {
            tag_class,
            tag_number,
            content: TaggedContent::Explicit(Box::new(inner)),
        })
    }

    /// Wraps `inner` under `[tag_class tag_number]` IMPLICIT, replacing
    /// its identifier while keeping its content octets and constructed-bit.
    ///
    /// If `inner` is itself an explicitly tagged value ([`ASN1Value::Tagged`]
    /// — the schema-free proxy this core uses for "choice-capable", since a
    /// schema-free core cannot otherwise know a type is CHOICE), ASN.1
    /// forbids implicit tagging of CHOICE (spec §3/§4.4, Testable Property
    /// 6), so this silently upgrades to EXPLICIT instead of honoring the
    /// caller's request.
    pub fn implicit(tag_class: TagClass, tag_number: u64, inner: ASN1Value) -> Result<Self, ASN1Error> {
        if tag_class == TagClass::Application {
            return Err(application_class_error());
        }
        if inner.is_explicitly_tagged() {
            return Ok(ASN1TaggedObject {
                tag_class,
                tag_number,
                content: TaggedContent::Explicit(Box::new(inner)),
            });
        }
        Ok(ASN1TaggedObject {
            tag_class,
            tag_number,
            content: TaggedContent::Implicit(Box::new(inner)),
        })
    }

    /// Wraps `inner` for a CHOICE-typed field, which X.690 §31.2.7
    /// requires to always be tagged explicitly, no matter what tagging
    /// mode the surrounding schema otherwise uses.
    pub fn for_choice(tag_class: TagClass, tag_number: u64, inner: ASN1Value) -> Result<Self, ASN1Error> {
        Self::explicit(tag_class, tag_number, inner)
    }

    /// Builds an APPLICATION-class tagged value from raw content octets.
    /// APPLICATION content is never decomposed by this core; callers that
    /// need structural access must decode `content` themselves.
    pub fn application_specific(tag_number: u64, content: Bytes) -> Self {
        ASN1TaggedObject {
            tag_class: TagClass::Application,
            tag_number,
            content: TaggedContent::ApplicationSpecific(content),
        }
    }

    /// Materialises an already-parsed tagged value into a concrete wrapper
    /// without any schema guidance, applying X.690's conventional
    /// ambiguous-tag heuristic (see [`ASN1TaggedObject::from_constructed_heuristic`] /
    /// [`ASN1TaggedObject::from_primitive_heuristic`]). `value` must not carry
    /// a UNIVERSAL-class identifier.
    pub fn from_value(value: ASN1Value) -> Result<Self, ASN1Error> {
        let identifier = value.identifier();
        if identifier.tag_class == TagClass::Universal {
            return Err(ASN1Error::new(
                ErrorCode::InvalidArgument,
                "Tagged object must not carry a UNIVERSAL-class identifier".to_string(),
                file!().to_string(),
                line!(),
            ));
        }
        Ok(match value {
            ASN1Value::Tagged { inner, .. } => ASN1TaggedObject {
                tag_class: identifier.tag_class,
                tag_number: identifier.tag_number,
                content: TaggedContent::Explicit(inner),
            },
            ASN1Value::Constructed { children, .. } => {
                Self::from_constructed_heuristic(identifier.tag_class, identifier.tag_number, children)
            }
            ASN1Value::Primitive { content, .. } => {
                Self::from_primitive_heuristic(identifier.tag_class, identifier.tag_number, content)
            }
        })
    }

    /// Schema-free heuristic for a constructed tagged value: a single child
    /// is ambiguous between "EXPLICIT wrapper around one value" and
    /// "IMPLICIT SEQUENCE of one value", and this core resolves that the way
    /// the X.690 ambiguous-tag convention does — as EXPLICIT. Zero or
    /// multiple children can only be an IMPLICIT SEQUENCE. APPLICATION class
    /// is always opaque regardless of child count, per [`ASN1TaggedObject::application_specific`].
    pub fn from_constructed_heuristic(
        tag_class: TagClass,
        tag_number: u64,
        children: Vec<ASN1Value>,
    ) -> Self {
        if tag_class == TagClass::Application {
            let mut content = Vec::new();
            for child in &children {
                content.extend_from_slice(child.to_bytes(crate::rules::EncodingRules::Ber).as_ref());
            }
            return ASN1TaggedObject {
                tag_class,
                tag_number,
                content: TaggedContent::ApplicationSpecific(Bytes::from(content)),
            };
        }
        if children.len() == 1 {
            ASN1TaggedObject {
                tag_class,
                tag_number,
                content: TaggedContent::Explicit(Box::new(children.into_iter().next().unwrap())),
            }
        } else {
            let sequence = ASN1Value::constructed_contents(ASN1Identifier::SEQUENCE, children);
            ASN1TaggedObject {
                tag_class,
                tag_number,
                content: TaggedContent::Implicit(Box::new(sequence)),
            }
        }
    }

    /// Schema-free heuristic for a primitive tagged value: treated as an
    /// IMPLICIT OCTET STRING carrying the raw content, since without a
    /// schema no other universal type can be assumed. APPLICATION class is
    /// always opaque, per [`ASN1TaggedObject::application_specific`].
    pub fn from_primitive_heuristic(tag_class: TagClass, tag_number: u64, content: Bytes) -> Self {
        if tag_class == TagClass::Application {
            return ASN1TaggedObject {
                tag_class,
                tag_number,
                content: TaggedContent::ApplicationSpecific(content),
            };
        }
        let inner = ASN1Value::primitive_contents(ASN1Identifier::OCTET_STRING, content);
        ASN1TaggedObject {
            tag_class,
            tag_number,
            content: TaggedContent::Implicit(Box::new(inner)),
        }
    }

    pub fn tag_class(&self) -> TagClass {
        self.tag_class
    }

    pub fn tag_number(&self) -> u64 {
        self.tag_number
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self.content, TaggedContent::Explicit(_))
    }

    fn outer_identifier(&self) -> ASN1Identifier {
        ASN1Identifier::new(self.tag_number, self.tag_class)
    }

    /// Produces the wire-level tree for this tagged value, under its
    /// outer identifier.
    pub fn materialize(&self) -> ASN1Value {
        let outer = self.outer_identifier();
        match &self.content {
            TaggedContent::Explicit(inner) => ASN1Value::Tagged {
                identifier: outer,
                inner: Box::new((**inner).clone()),
            },
            TaggedContent::Implicit(inner) => (**inner).clone().with_identifier(outer),
            TaggedContent::ApplicationSpecific(content) => {
                ASN1Value::primitive_contents(outer, content.clone())
            }
        }
    }

    /// Unwraps an EXPLICIT tagged value: checks the outer identifier,
    /// requires exactly one child, and returns it.
    pub fn load_explicit(
        value: ASN1Value,
        tag_class: TagClass,
        tag_number: u64,
    ) -> Result<ASN1Value, ASN1Error> {
        let expected = ASN1Identifier::new(tag_number, tag_class);
        if value.identifier() != expected {
            return Err(crate::value::tag_mismatch(expected, value.identifier()));
        }
        match value {
            ASN1Value::Tagged { inner, .. } => Ok(*inner),
            ASN1Value::Constructed { children, .. } if children.len() == 1 => {
                Ok(children.into_iter().next().unwrap())
            }
            ASN1Value::Constructed { .. } => Err(ASN1Error::new(
                ErrorCode::StructureError,
                "EXPLICIT tagged value must wrap exactly one inner value".to_string(),
                file!().to_string(),
                line!(),
            )),
            ASN1Value::Primitive { .. } => Err(ASN1Error::new(
                ErrorCode::StructureError,
                "EXPLICIT tagged value must be constructed".to_string(),
                file!().to_string(),
                line!(),
            )),
        }
    }

    /// Unwraps an IMPLICIT tagged value: checks the outer identifier and
    /// retags the content with `restored_identifier` (the default
    /// identifier of the schema type the caller expects underneath).
    pub fn load_implicit(
        value: ASN1Value,
        tag_class: TagClass,
        tag_number: u64,
        restored_identifier: ASN1Identifier,
    ) -> Result<ASN1Value, ASN1Error> {
        let expected = ASN1Identifier::new(tag_number, tag_class);
        if value.identifier() != expected {
            return Err(crate::value::tag_mismatch(expected, value.identifier()));
        }
        Ok(value.with_identifier(restored_identifier))
    }
}

fn application_class_error() -> ASN1Error {
    ASN1Error::new(
        ErrorCode::InvalidArgument,
        "APPLICATION-class tagged values must be built with application_specific, not explicit/implicit".to_string(),
        file!().to_string(),
        line!(),
    )
}

impl fmt::Display for ASN1TaggedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}{}]{}",
            self.tag_class.display_prefix(),
            self.tag_number,
            if self.is_explicit() { " EXPLICIT" } else { "" }
        )
    }
}

impl PartialEq for ASN1TaggedObject {
    fn eq(&self, other: &Self) -> bool {
        self.materialize() == other.materialize()
    }
}

impl Eq for ASN1TaggedObject {}

impl Hash for ASN1TaggedObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.materialize().hash(state);
    }
}
