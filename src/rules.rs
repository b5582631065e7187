/// Which X.690 encoding variant a parse or serialize operation follows.
///
/// `Ber` is fully permissive (indefinite lengths, non-minimal length
/// encodings). `Dl` forbids indefinite lengths but is otherwise as
/// permissive as BER at the length-codec level. `Der` is canonical: no
/// indefinite lengths, no non-minimal length encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingRules {
    Ber,
    Dl,
    Der,
}

impl EncodingRules {
    pub fn indefinite_length_allowed(&self) -> bool {
        matches!(self, EncodingRules::Ber)
    }

    pub fn non_minimal_encoded_lengths_allowed(&self) -> bool {
        matches!(self, EncodingRules::Ber)
    }
}
