//! Error types surfaced by the codec and the table.

use core::fmt;

/// Malformed UTF-16 input. Offsets are byte offsets into the input,
/// including any byte order mark.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Malformed {
    OddLength { len: usize },
    UnexpectedLowSurrogate { offset: usize, unit: u16 },
    IncompleteSurrogatePair { offset: usize },
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::OddLength { len } => {
                write!(f, "Malformed UTF-16; odd number of bytes ({len})")
            }
            Malformed::UnexpectedLowSurrogate { offset, unit } => write!(
                f,
                "Malformed UTF-16; unexpected low surrogate {unit:#06x} at byte {offset}"
            ),
            Malformed::IncompleteSurrogatePair { offset } => {
                write!(f, "Malformed UTF-16; incomplete surrogate pair at byte {offset}")
            }
        }
    }
}

impl std::error::Error for Malformed {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EncodeError {
    StartOutOfRange { start: i64, len: usize },
    LengthOutOfRange { start: i64, length: i64, len: usize },
    /// Codepoint above the surrogate-pair range with no replacement given.
    Unencodable { codepoint: u32 },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::StartOutOfRange { start, len } => {
                write!(f, "start out of range: {start} (string has {len} graphemes)")
            }
            EncodeError::LengthOutOfRange { start, length, len } => write!(
                f,
                "length out of range: {length} from {start} (string has {len} graphemes)"
            ),
            EncodeError::Unencodable { codepoint } => write!(
                f,
                "Error encoding UTF-16 string: could not encode codepoint {codepoint}"
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

/// A codepoint above [`Grapheme::MAX_CODEPOINT`](crate::grapheme::Grapheme::MAX_CODEPOINT),
/// which has no non-negative 32-bit grapheme code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CodepointOutOfRange {
    pub codepoint: u32,
}

impl fmt::Display for CodepointOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "codepoint {:#x} has no grapheme code", self.codepoint)
    }
}

impl std::error::Error for CodepointOutOfRange {}

/// A key that is not a concrete grapheme string.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KeyTypeError;

impl fmt::Display for KeyTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("grapheme hash requires concrete string keys")
    }
}

impl std::error::Error for KeyTypeError {}
