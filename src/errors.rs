use std::fmt;

#[derive(Debug, Clone)]
pub struct ASN1Error {
    backing: Backing,
}

#[derive(Debug, Clone)]
struct Backing {
    code: ErrorCode,
    reason: String,
    file: String,
    line: u32,
}

impl ASN1Error {
    pub fn new(code: ErrorCode, reason: String, file: String, line: u32) -> Self {
        ASN1Error {
            backing: Backing {
                code,
                reason,
                file,
                line,
            },
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.backing.code
    }
}

impl PartialEq for ASN1Error {
    fn eq(&self, other: &Self) -> bool {
        self.backing.code == other.backing.code
            && self.backing.reason == other.backing.reason
            && self.backing.file == other.backing.file
            && self.backing.line == other.backing.line
    }
}

impl Eq for ASN1Error {}

impl std::hash::Hash for ASN1Error {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.backing.code.hash(state);
        self.backing.reason.hash(state);
        self.backing.file.hash(state);
        self.backing.line.hash(state);
    }
}

impl fmt::Display for ASN1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ASN1Error.{:?}: {} {}:{}",
            self.backing.code, self.backing.reason, self.backing.file, self.backing.line
        )
    }
}

impl std::error::Error for ASN1Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnexpectedFieldType,
    InvalidASN1Object,
    InvalidASN1IntegerEncoding,
    TruncatedASN1Field,
    UnsupportedFieldLength,
    InvalidPEMDocument,
    InvalidStringRepresentation,
    TooFewOIDComponents,
    ValueOutOfRange,
    /// Illegal identifier octets, or a long-form tag encoding violation
    /// (missing terminator, leading-zero padding, tag-number overflow).
    MalformedHeader,
    /// Reserved length byte, indefinite length on a rules variant that
    /// forbids it, or a length header extending past the end of the stream.
    MalformedLength,
    /// An explicit/implicit tagging rule violation, an EXTERNAL element out
    /// of the expected order, or unconsumed/extra elements in a sequence.
    StructureError,
    /// A null `inner`, an invalid tag class, or an out-of-range EXTERNAL
    /// encoding discriminant was supplied by the caller.
    InvalidArgument,
    /// Schema-free implicit reinterpretation was requested for a universal
    /// tag this core does not support (only SEQUENCE/SET/OCTET STRING are).
    Unimplemented,
    /// A read was attempted on a sub-parser that already reached EXHAUSTED.
    StreamExhausted,
    /// The parent parser was advanced while a child sub-parser was still live.
    ChildActive,
    /// A configured depth/node-count/byte budget was exceeded.
    LimitExceeded,
}

#[macro_export]
macro_rules! asn1_err {
    ($code:expr, $msg:expr) => {
        $crate::errors::ASN1Error::new($code, $msg.to_string(), file!().to_string(), line!())
    };
    ($code:expr, $fmt:expr, $($arg:tt)+) => {
        $crate::errors::ASN1Error::new(
            $code,
            format!($fmt, $($arg)+),
            file!().to_string(),
            line!(),
        )
    };
}
