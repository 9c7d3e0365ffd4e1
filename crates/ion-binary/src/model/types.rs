//! The Ion value type tag.

use std::fmt;

/// Type of an Ion value as seen by a cursor.
///
/// Annotation wrappers and NOP padding are wire-level constructs and have no
/// `IonType`; see [`TypeCode`](crate::codec::TypeCode) for the raw nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IonType {
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    Timestamp,
    Symbol,
    String,
    Clob,
    Blob,
    List,
    SExp,
    Struct,
}

impl IonType {
    /// Returns true for list, sexp and struct.
    pub fn is_container(self) -> bool {
        matches!(self, IonType::List | IonType::SExp | IonType::Struct)
    }

    /// Returns true for string and symbol.
    pub fn is_text(self) -> bool {
        matches!(self, IonType::String | IonType::Symbol)
    }

    /// Returns true for clob and blob.
    pub fn is_lob(self) -> bool {
        matches!(self, IonType::Clob | IonType::Blob)
    }

    /// Returns the lowercase type name used in Ion text (e.g., "sexp").
    pub fn as_str(self) -> &'static str {
        match self {
            IonType::Null => "null",
            IonType::Bool => "bool",
            IonType::Int => "int",
            IonType::Float => "float",
            IonType::Decimal => "decimal",
            IonType::Timestamp => "timestamp",
            IonType::Symbol => "symbol",
            IonType::String => "string",
            IonType::Clob => "clob",
            IonType::Blob => "blob",
            IonType::List => "list",
            IonType::SExp => "sexp",
            IonType::Struct => "struct",
        }
    }
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(IonType::SExp.is_container());
        assert!(!IonType::Null.is_container());
        assert!(IonType::Symbol.is_text());
        assert!(IonType::Clob.is_lob());
        assert_eq!(IonType::Timestamp.to_string(), "timestamp");
    }
}
