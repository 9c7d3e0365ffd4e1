//! Type descriptor (header) encoding and decoding.
//!
//! Every value starts with one octet: the high nibble is the type code, the
//! low nibble the length code. Length codes 0-13 are literal payload lengths,
//! 14 means a VarUInt length follows, 15 marks a typed null. For bools the
//! length nibble carries the value itself.

use crate::codec::primitives::{decode_var_uint, Writer};
use crate::error::{IonError, Result};
use crate::limits::{LENGTH_NULL, LENGTH_VAR_UINT, MAX_INLINE_LENGTH};
use crate::model::IonType;

/// Wire type code (high nibble of the type descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    /// `null.null`, or NOP padding when the length code is not 15.
    Null = 0,
    Bool = 1,
    PosInt = 2,
    NegInt = 3,
    Float = 4,
    Decimal = 5,
    Timestamp = 6,
    Symbol = 7,
    String = 8,
    Clob = 9,
    Blob = 10,
    List = 11,
    SExp = 12,
    Struct = 13,
    Annotation = 14,
    Reserved = 15,
}

impl TypeCode {
    /// Maps the low four bits of `nibble` to a type code.
    pub fn from_nibble(nibble: u8) -> TypeCode {
        match nibble & 0x0F {
            0 => TypeCode::Null,
            1 => TypeCode::Bool,
            2 => TypeCode::PosInt,
            3 => TypeCode::NegInt,
            4 => TypeCode::Float,
            5 => TypeCode::Decimal,
            6 => TypeCode::Timestamp,
            7 => TypeCode::Symbol,
            8 => TypeCode::String,
            9 => TypeCode::Clob,
            10 => TypeCode::Blob,
            11 => TypeCode::List,
            12 => TypeCode::SExp,
            13 => TypeCode::Struct,
            14 => TypeCode::Annotation,
            _ => TypeCode::Reserved,
        }
    }

    /// Returns the value type, or `None` for annotation wrappers and the
    /// reserved code.
    pub fn ion_type(self) -> Option<IonType> {
        Some(match self {
            TypeCode::Null => IonType::Null,
            TypeCode::Bool => IonType::Bool,
            TypeCode::PosInt | TypeCode::NegInt => IonType::Int,
            TypeCode::Float => IonType::Float,
            TypeCode::Decimal => IonType::Decimal,
            TypeCode::Timestamp => IonType::Timestamp,
            TypeCode::Symbol => IonType::Symbol,
            TypeCode::String => IonType::String,
            TypeCode::Clob => IonType::Clob,
            TypeCode::Blob => IonType::Blob,
            TypeCode::List => IonType::List,
            TypeCode::SExp => IonType::SExp,
            TypeCode::Struct => IonType::Struct,
            TypeCode::Annotation | TypeCode::Reserved => return None,
        })
    }

    /// Returns the type code used to write values of `ion_type`.
    ///
    /// Ints map to [`TypeCode::PosInt`]; the writer picks the sign.
    pub fn for_ion_type(ion_type: IonType) -> TypeCode {
        match ion_type {
            IonType::Null => TypeCode::Null,
            IonType::Bool => TypeCode::Bool,
            IonType::Int => TypeCode::PosInt,
            IonType::Float => TypeCode::Float,
            IonType::Decimal => TypeCode::Decimal,
            IonType::Timestamp => TypeCode::Timestamp,
            IonType::Symbol => TypeCode::Symbol,
            IonType::String => TypeCode::String,
            IonType::Clob => TypeCode::Clob,
            IonType::Blob => TypeCode::Blob,
            IonType::List => TypeCode::List,
            IonType::SExp => TypeCode::SExp,
            IonType::Struct => TypeCode::Struct,
        }
    }
}

/// A decoded type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub type_code: TypeCode,
    /// Raw low nibble of the descriptor octet.
    pub length_code: u8,
    /// Payload length in bytes (0 for nulls and bools).
    pub length: usize,
    /// Descriptor octet plus any VarUInt length.
    pub header_len: usize,
}

impl Header {
    /// Header for a non-null value with a payload of `length` bytes, using the
    /// inline length nibble when possible.
    pub fn new(type_code: TypeCode, length: usize) -> Header {
        if length <= MAX_INLINE_LENGTH {
            Header {
                type_code,
                length_code: length as u8,
                length,
                header_len: 1,
            }
        } else {
            Header {
                type_code,
                length_code: LENGTH_VAR_UINT,
                length,
                header_len: 1 + var_uint_len(length as u64),
            }
        }
    }

    /// Header for a typed null.
    pub fn null(type_code: TypeCode) -> Header {
        Header {
            type_code,
            length_code: LENGTH_NULL,
            length: 0,
            header_len: 1,
        }
    }

    /// Header for a bool, whose value lives in the length nibble.
    pub fn boolean(value: bool) -> Header {
        Header {
            type_code: TypeCode::Bool,
            length_code: value as u8,
            length: 0,
            header_len: 1,
        }
    }

    /// Returns true for typed nulls (including `null.null`).
    pub fn is_null(&self) -> bool {
        self.length_code == LENGTH_NULL
    }

    /// Returns true for NOP padding.
    pub fn is_nop_pad(&self) -> bool {
        self.type_code == TypeCode::Null && self.length_code != LENGTH_NULL
    }

    /// Header plus payload size.
    pub fn total_len(&self) -> usize {
        self.header_len + self.length
    }
}

fn var_uint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes the type descriptor at `bytes[pos]`.
///
/// Fails with `TruncatedInput` when the descriptor, its VarUInt length, or the
/// declared payload extends past the end of `bytes`.
pub fn decode_header(bytes: &[u8], pos: usize) -> Result<Header> {
    let available = bytes.len().saturating_sub(pos);
    let Some(&descriptor) = bytes.get(pos) else {
        return Err(IonError::TruncatedInput {
            context: "type descriptor",
            needed: 1,
            available,
        });
    };

    let type_code = TypeCode::from_nibble(descriptor >> 4);
    let length_code = descriptor & 0x0F;

    let (length, header_len) = match (type_code, length_code) {
        (TypeCode::Reserved, _) => {
            return Err(IonError::malformed("type descriptor", "reserved type code 15"));
        }
        (TypeCode::Bool, 0 | 1 | LENGTH_NULL) => (0, 1),
        (TypeCode::Bool, _) => {
            return Err(IonError::malformed("bool", "length nibble must be 0, 1 or 15"));
        }
        (TypeCode::Annotation, LENGTH_NULL) => {
            return Err(IonError::malformed("annotation wrapper", "wrapper cannot be null"));
        }
        (_, LENGTH_NULL) => (0, 1),
        (_, LENGTH_VAR_UINT) => match decode_var_uint(&bytes[pos + 1..]) {
            Ok((length, consumed)) => {
                let length = usize::try_from(length).map_err(|_| IonError::VarIntOverflow {
                    context: "length",
                })?;
                (length, 1 + consumed)
            }
            // Input ended inside the length; more bytes may complete it.
            Err(IonError::VarIntTruncated { .. }) => {
                return Err(IonError::TruncatedInput {
                    context: "length",
                    needed: available + 1,
                    available,
                });
            }
            Err(e) => return Err(e),
        },
        (_, n) => (n as usize, 1),
    };

    let needed = header_len
        .checked_add(length)
        .ok_or(IonError::VarIntOverflow { context: "length" })?;
    if needed > available {
        return Err(IonError::TruncatedInput {
            context: "value payload",
            needed,
            available,
        });
    }

    Ok(Header {
        type_code,
        length_code,
        length,
        header_len,
    })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writes a type descriptor (and VarUInt length when needed).
pub fn encode_header(header: &Header, writer: &mut Writer) {
    writer.write_byte(((header.type_code as u8) << 4) | header.length_code);
    if header.length_code == LENGTH_VAR_UINT {
        writer.write_var_uint(header.length as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_decode_inline() {
        let header = decode_header(&[0x21, 0x05], 0).unwrap();
        assert_eq!(header.type_code, TypeCode::PosInt);
        assert_eq!(header.length, 1);
        assert_eq!(header.header_len, 1);
    }

    #[test]
    fn test_decode_var_uint_length() {
        let mut bytes = vec![0x8E, 0x0E];
        bytes.extend_from_slice(&[b'a'; 14]);
        let header = decode_header(&bytes, 0).unwrap();
        assert_eq!(header.type_code, TypeCode::String);
        assert_eq!(header.length, 14);
        assert_eq!(header.header_len, 2);
        assert_eq!(header.total_len(), 16);
    }

    #[test]
    fn test_bool_and_null() {
        assert!(!decode_header(&[0x10], 0).unwrap().is_null());
        assert_eq!(decode_header(&[0x11], 0).unwrap().length_code, 1);
        assert!(decode_header(&[0x1F], 0).unwrap().is_null());
        assert!(decode_header(&[0xBF], 0).unwrap().is_null());
        assert!(decode_header(&[0x0F], 0).unwrap().is_null());

        let err = decode_header(&[0x12], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_nop_pad() {
        let header = decode_header(&[0x02, 0x00, 0x00], 0).unwrap();
        assert!(header.is_nop_pad());
        assert_eq!(header.total_len(), 3);
    }

    #[test]
    fn test_reserved_type_code() {
        let err = decode_header(&[0xF0], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_truncated_payload() {
        // Header claims 10 bytes, only 4 present.
        let bytes = [0x8A, b'a', b'b', b'c', b'd'];
        let err = decode_header(&bytes, 0).unwrap_err();
        assert_eq!(
            err,
            IonError::TruncatedInput {
                context: "value payload",
                needed: 11,
                available: 5,
            }
        );
    }

    #[test]
    fn test_truncated_length() {
        let err = decode_header(&[0x8E, 0x81], 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);

        let err = decode_header(&[0x20], 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_encode_minimal() {
        let mut writer = Writer::new();
        encode_header(&Header::new(TypeCode::PosInt, 0), &mut writer);
        encode_header(&Header::boolean(true), &mut writer);
        encode_header(&Header::null(TypeCode::List), &mut writer);
        encode_header(&Header::new(TypeCode::Blob, 200), &mut writer);
        assert_eq!(writer.as_bytes(), &[0x20, 0x11, 0xBF, 0xAE, 0x81, 0x48]);
    }

    proptest! {
        #[test]
        fn prop_header_roundtrip(code in 0u8..14, length in 0usize..4096) {
            prop_assume!(code != TypeCode::Bool as u8);
            let header = Header::new(TypeCode::from_nibble(code), length);

            let mut writer = Writer::new();
            encode_header(&header, &mut writer);
            prop_assert_eq!(writer.len(), header.header_len);
            writer.write_bytes(&vec![0u8; length]);

            let decoded = decode_header(writer.as_bytes(), 0).unwrap();
            prop_assert_eq!(decoded, header);
        }

        #[test]
        fn prop_null_and_bool_header_roundtrip(code in 0u8..14, value in any::<bool>()) {
            let mut writer = Writer::new();
            encode_header(&Header::null(TypeCode::from_nibble(code)), &mut writer);
            prop_assert_eq!(writer.as_bytes(), &[(code << 4) | 0x0F][..]);
            let decoded = decode_header(writer.as_bytes(), 0).unwrap();
            prop_assert_eq!(decoded, Header::null(TypeCode::from_nibble(code)));
            prop_assert!(decoded.is_null());

            let mut writer = Writer::new();
            encode_header(&Header::boolean(value), &mut writer);
            let decoded = decode_header(writer.as_bytes(), 0).unwrap();
            prop_assert_eq!(decoded, Header::boolean(value));
            prop_assert!(!decoded.is_null());
        }
    }
}
