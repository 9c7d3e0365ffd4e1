//! Error types for Ion binary encoding, decoding and cursor navigation.

use thiserror::Error;

use crate::model::IonType;

/// Error classes surfaced by the codec and cursors.
///
/// Several [`IonError`] variants share a kind; callers that only care about
/// the class (e.g. "was this a forward-incompatible stream?") match on the
/// kind instead of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A declared length runs past the available input.
    TruncatedInput,
    /// A VarUInt/VarInt is truncated, too long, or overflows.
    MalformedVarInt,
    /// A structurally invalid encoding.
    MalformedValue,
    /// The stream asserts a version this crate does not implement.
    UnsupportedVersion,
    /// An accessor was called on a value of a different type.
    WrongType,
    /// The cursor or encoder was used out of order.
    InvalidState,
    /// A shared symbol table import could not be satisfied by the catalog.
    UnresolvedImport,
    /// A symbol's text is not known to the active symbol table.
    UnknownSymbol,
    /// The underlying byte source failed.
    Io,
}

impl ErrorKind {
    /// Returns the kind's name (e.g., "TruncatedInput").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TruncatedInput => "TruncatedInput",
            ErrorKind::MalformedVarInt => "MalformedVarInt",
            ErrorKind::MalformedValue => "MalformedValue",
            ErrorKind::UnsupportedVersion => "UnsupportedVersion",
            ErrorKind::WrongType => "WrongType",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::UnresolvedImport => "UnresolvedImport",
            ErrorKind::UnknownSymbol => "UnknownSymbol",
            ErrorKind::Io => "Io",
        }
    }
}

/// Error raised while decoding, encoding or navigating Ion data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IonError {
    // === TruncatedInput ===
    #[error("unexpected end of input while reading {context}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    // === MalformedVarInt ===
    #[error("truncated varint while reading {context}")]
    VarIntTruncated { context: &'static str },

    #[error("varint overflow while reading {context}")]
    VarIntOverflow { context: &'static str },

    #[error("varint exceeds maximum length ({max} bytes) while reading {context}")]
    VarIntTooLong { context: &'static str, max: usize },

    // === MalformedValue ===
    #[error("malformed {context}: {reason}")]
    MalformedValue {
        context: &'static str,
        reason: &'static str,
    },

    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    // === UnsupportedVersion ===
    #[error("unsupported Ion version: {version}")]
    UnsupportedVersion { version: String },

    // === WrongType ===
    #[error("current value is not {expected} (found {found})")]
    WrongType {
        expected: &'static str,
        found: IonType,
    },

    #[error("current value is null.{ion_type}")]
    NullValue { ion_type: IonType },

    #[error("integer value does not fit in i64")]
    IntOutOfRange,

    // === InvalidState ===
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("symbol id {sid} exceeds max id {max_id}")]
    SymbolIdOutOfRange { sid: usize, max_id: usize },

    // === UnresolvedImport ===
    #[error("shared symbol table {name:?} version {version} not found in catalog")]
    UnresolvedImport { name: String, version: u32 },

    // === UnknownSymbol ===
    #[error("text of symbol ${sid} is unknown")]
    UnknownSymbolText { sid: usize },

    // === Io ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl IonError {
    /// Returns the error class for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IonError::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            IonError::VarIntTruncated { .. }
            | IonError::VarIntOverflow { .. }
            | IonError::VarIntTooLong { .. } => ErrorKind::MalformedVarInt,
            IonError::MalformedValue { .. } | IonError::InvalidUtf8 { .. } => {
                ErrorKind::MalformedValue
            }
            IonError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            IonError::WrongType { .. } | IonError::NullValue { .. } | IonError::IntOutOfRange => {
                ErrorKind::WrongType
            }
            IonError::InvalidState(_) | IonError::SymbolIdOutOfRange { .. } => {
                ErrorKind::InvalidState
            }
            IonError::UnresolvedImport { .. } => ErrorKind::UnresolvedImport,
            IonError::UnknownSymbolText { .. } => ErrorKind::UnknownSymbol,
            IonError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(context: &'static str, reason: &'static str) -> Self {
        IonError::MalformedValue { context, reason }
    }
}

impl From<std::io::Error> for IonError {
    fn from(err: std::io::Error) -> Self {
        IonError::Io(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IonError>;
