//! Value payload encoding/decoding.
//!
//! Scalar decoders take a header and its payload slice; the cursor calls them
//! lazily from its accessors. [`decode_element`] materializes whole values,
//! which the cursor uses for in-stream symbol table definitions. Symbol IDs
//! are resolved against the table passed in by the caller, never a global one.

use num_bigint::{BigInt, Sign};
use num_traits::Zero;

use crate::codec::header::{decode_header, Header, TypeCode};
use crate::codec::primitives::{
    decode_signed_magnitude, decode_var_uint, encode_signed_magnitude, uint_bytes,
    big_uint_bytes, Reader, Writer,
};
use crate::error::{IonError, Result};
use crate::limits::MAX_OFFSET_MINUTES;
use crate::model::{Coefficient, Decimal, Element, Int, SymbolToken, Timestamp, Value};
use crate::symbol::SymbolTable;

// =============================================================================
// DECODING
// =============================================================================

/// Decodes an int payload; the sign comes from the type code.
pub fn decode_int(type_code: TypeCode, payload: &[u8]) -> Result<Int> {
    let negative = type_code == TypeCode::NegInt;

    if payload.len() <= 8 {
        let mut buf = [0u8; 8];
        buf[8 - payload.len()..].copy_from_slice(payload);
        let magnitude = u64::from_be_bytes(buf);
        if negative && magnitude == 0 {
            return Err(IonError::malformed("int", "negative zero"));
        }
        return Ok(match (negative, i64::try_from(magnitude)) {
            (false, Ok(v)) => Int::I64(v),
            (true, Ok(v)) => Int::I64(-v),
            (true, Err(_)) if magnitude == 1u64 << 63 => Int::I64(i64::MIN),
            _ => Int::from_sign_magnitude(negative, magnitude.into()),
        });
    }

    let magnitude = num_bigint::BigUint::from_bytes_be(payload);
    if negative && magnitude.is_zero() {
        return Err(IonError::malformed("int", "negative zero"));
    }
    Ok(Int::from_sign_magnitude(negative, magnitude))
}

/// Decodes a float payload of 0, 4 or 8 bytes.
pub fn decode_float(payload: &[u8]) -> Result<f64> {
    match payload.len() {
        0 => Ok(0.0),
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(payload);
            Ok(f64::from(f32::from_be_bytes(buf)))
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(payload);
            Ok(f64::from_be_bytes(buf))
        }
        _ => Err(IonError::malformed("float", "length must be 0, 4 or 8")),
    }
}

/// Decodes a decimal payload: VarInt exponent then sign-magnitude coefficient.
pub fn decode_decimal(payload: &[u8]) -> Result<Decimal> {
    if payload.is_empty() {
        return Ok(Decimal::zero());
    }
    let mut reader = Reader::new(payload);
    let exponent = read_exponent(&mut reader, "decimal exponent")?;
    Ok(coefficient_decimal(reader.remaining(), exponent))
}

/// Reads a decimal exponent; `i64::MIN` has no negation and is rejected.
fn read_exponent(reader: &mut Reader<'_>, context: &'static str) -> Result<i64> {
    let exponent = reader.read_var_int(context)?;
    if exponent == i64::MIN {
        return Err(IonError::malformed(context, "exponent out of range"));
    }
    Ok(exponent)
}

fn coefficient_decimal(bytes: &[u8], exponent: i64) -> Decimal {
    let (negative, magnitude) = decode_signed_magnitude(bytes);
    if negative && magnitude.is_zero() {
        Decimal::negative_zero(exponent)
    } else {
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Decimal::new(BigInt::from_biguint(sign, magnitude), exponent)
    }
}

/// Decodes a timestamp payload.
///
/// Layout: VarInt offset (negative zero = unknown), VarUInt year, then
/// optionally month, day, hour and minute, second, and a fraction
/// (VarInt exponent plus sign-magnitude coefficient).
pub fn decode_timestamp(payload: &[u8]) -> Result<Timestamp> {
    let mut reader = Reader::new(payload);

    let (negative, magnitude) = reader.read_var_int_parts("timestamp offset")?;
    let offset = if negative && magnitude == 0 {
        None
    } else {
        let minutes = i64::try_from(magnitude)
            .ok()
            .filter(|m| *m < MAX_OFFSET_MINUTES)
            .ok_or(IonError::malformed("timestamp", "offset out of range"))?;
        Some((if negative { -minutes } else { minutes }) as i32)
    };

    let year = component::<u32>(&mut reader, "timestamp year")?;
    let mut builder = Timestamp::builder(year).offset(offset);

    if !reader.is_empty() {
        builder = builder.month(component(&mut reader, "timestamp month")?);
    }
    if !reader.is_empty() {
        builder = builder.day(component(&mut reader, "timestamp day")?);
    }
    if !reader.is_empty() {
        let hour = component(&mut reader, "timestamp hour")?;
        if reader.is_empty() {
            return Err(IonError::malformed("timestamp", "hour without minute"));
        }
        let minute = component(&mut reader, "timestamp minute")?;
        builder = builder.hour_minute(hour, minute);
    }
    if !reader.is_empty() {
        builder = builder.second(component(&mut reader, "timestamp second")?);
    }
    if !reader.is_empty() {
        let exponent = read_exponent(&mut reader, "timestamp fraction exponent")?;
        builder = builder.fraction(coefficient_decimal(reader.remaining(), exponent));
    }

    builder.build()
}

fn component<T: TryFrom<u64>>(reader: &mut Reader<'_>, context: &'static str) -> Result<T> {
    let value = reader.read_var_uint(context)?;
    T::try_from(value).map_err(|_| IonError::malformed("timestamp", "component out of range"))
}

/// Validates a string payload as UTF-8.
pub fn decode_string(payload: &[u8]) -> Result<&str> {
    std::str::from_utf8(payload).map_err(|_| IonError::InvalidUtf8 { context: "string" })
}

/// Decodes a symbol payload to its ID. An empty payload is ID 0.
pub fn decode_symbol_id(payload: &[u8]) -> Result<usize> {
    if payload.is_empty() {
        return Ok(0);
    }
    let (sid, consumed) = decode_var_uint(payload)?;
    if consumed != payload.len() {
        return Err(IonError::malformed("symbol", "trailing bytes after symbol id"));
    }
    usize::try_from(sid).map_err(|_| IonError::VarIntOverflow { context: "symbol" })
}

/// Resolves `sid` against `symbols`, keeping the ID when text is unknown.
pub fn resolve_symbol(sid: usize, symbols: &SymbolTable) -> SymbolToken {
    SymbolToken::resolved(symbols.find_text(sid).map(str::to_string), sid)
}

/// Contents of an annotation wrapper payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnnotationWrapper {
    pub annotations: Vec<usize>,
    /// Offset of the wrapped value's header within the wrapper payload.
    pub value_offset: usize,
    pub value_header: Header,
}

/// Parses a wrapper payload: VarUInt annotation-list length, the annotation
/// IDs, then exactly one value filling the remainder.
pub(crate) fn parse_annotation_wrapper(payload: &[u8]) -> Result<AnnotationWrapper> {
    let mut reader = Reader::new(payload);
    let list_len = reader
        .read_var_usize("annotation list length")
        .map_err(wrapper_overrun)?;
    if list_len == 0 {
        return Err(IonError::malformed("annotation wrapper", "empty annotation list"));
    }
    let list = reader
        .read_bytes(list_len, "annotation list")
        .map_err(wrapper_overrun)?;

    let mut annotations = Vec::new();
    let mut list_reader = Reader::new(list);
    while !list_reader.is_empty() {
        annotations.push(list_reader.read_var_usize("annotation")?);
    }

    let value_offset = reader.position();
    let value_header = decode_header(payload, value_offset).map_err(wrapper_overrun)?;
    if value_header.type_code == TypeCode::Annotation {
        return Err(IonError::malformed("annotation wrapper", "nested annotation wrapper"));
    }
    if value_header.is_nop_pad() {
        return Err(IonError::malformed("annotation wrapper", "wrapped value is padding"));
    }
    if value_offset + value_header.total_len() != payload.len() {
        return Err(IonError::malformed(
            "annotation wrapper",
            "wrapped value does not fill the wrapper",
        ));
    }

    Ok(AnnotationWrapper {
        annotations,
        value_offset,
        value_header,
    })
}

fn wrapper_overrun(err: IonError) -> IonError {
    match err {
        IonError::TruncatedInput { .. } | IonError::VarIntTruncated { .. } => {
            IonError::malformed("annotation wrapper", "contents overrun the wrapper")
        }
        other => other,
    }
}

/// A truncation inside a container whose bytes are all present means a child
/// overruns its parent.
pub(crate) fn container_overrun(err: IonError) -> IonError {
    match err {
        IonError::TruncatedInput { .. } => {
            IonError::malformed("container", "child value overruns its container")
        }
        other => other,
    }
}

/// Decodes the next value at the reader, skipping NOP padding.
///
/// Returns `None` when the reader is exhausted.
pub(crate) fn decode_next(reader: &mut Reader<'_>, symbols: &SymbolTable) -> Result<Option<Element>> {
    while !reader.is_empty() {
        let header = decode_header(reader.remaining(), 0)?;
        if header.is_nop_pad() {
            reader.read_bytes(header.total_len(), "padding")?;
            continue;
        }
        return decode_with_header(reader, header, symbols).map(Some);
    }
    Ok(None)
}

/// Decodes one complete value (with annotations) at the reader.
///
/// Symbol text is resolved against `symbols` while decoding, which suits
/// symbol table structs; user values go through the cursor instead.
pub(crate) fn decode_element(reader: &mut Reader<'_>, symbols: &SymbolTable) -> Result<Element> {
    decode_next(reader, symbols)?.ok_or(IonError::TruncatedInput {
        context: "value",
        needed: 1,
        available: 0,
    })
}

fn decode_with_header(
    reader: &mut Reader<'_>,
    header: Header,
    symbols: &SymbolTable,
) -> Result<Element> {
    reader.read_bytes(header.header_len, "type descriptor")?;
    let payload = reader.read_bytes(header.length, "value payload")?;

    if header.type_code != TypeCode::Annotation {
        return Ok(Element::new(decode_value(&header, payload, symbols)?));
    }

    let wrapper = parse_annotation_wrapper(payload)?;
    let start = wrapper.value_offset + wrapper.value_header.header_len;
    let value = decode_value(&wrapper.value_header, &payload[start..], symbols)?;
    Ok(Element {
        annotations: wrapper
            .annotations
            .iter()
            .map(|sid| resolve_symbol(*sid, symbols))
            .collect(),
        value,
    })
}

/// Decodes an unannotated value from its header and payload.
pub(crate) fn decode_value(header: &Header, payload: &[u8], symbols: &SymbolTable) -> Result<Value> {
    let ion_type = header
        .type_code
        .ion_type()
        .ok_or(IonError::malformed("type descriptor", "not a value type code"))?;
    if header.is_null() {
        return Ok(Value::Null(ion_type));
    }

    Ok(match header.type_code {
        TypeCode::Bool => Value::Bool(header.length_code == 1),
        TypeCode::PosInt | TypeCode::NegInt => Value::Int(decode_int(header.type_code, payload)?),
        TypeCode::Float => Value::Float(decode_float(payload)?),
        TypeCode::Decimal => Value::Decimal(decode_decimal(payload)?),
        TypeCode::Timestamp => Value::Timestamp(decode_timestamp(payload)?),
        TypeCode::Symbol => Value::Symbol(resolve_symbol(decode_symbol_id(payload)?, symbols)),
        TypeCode::String => Value::String(decode_string(payload)?.to_string()),
        TypeCode::Clob => Value::Clob(payload.to_vec()),
        TypeCode::Blob => Value::Blob(payload.to_vec()),
        TypeCode::List => Value::List(decode_sequence(payload, symbols)?),
        TypeCode::SExp => Value::SExp(decode_sequence(payload, symbols)?),
        TypeCode::Struct => Value::Struct(decode_fields(payload, symbols)?),
        TypeCode::Null | TypeCode::Annotation | TypeCode::Reserved => {
            return Err(IonError::malformed("value", "unexpected type code"));
        }
    })
}

fn decode_sequence(payload: &[u8], symbols: &SymbolTable) -> Result<Vec<Element>> {
    let mut reader = Reader::new(payload);
    let mut items = Vec::new();
    while let Some(item) = decode_next(&mut reader, symbols).map_err(container_overrun)? {
        items.push(item);
    }
    Ok(items)
}

fn decode_fields(payload: &[u8], symbols: &SymbolTable) -> Result<Vec<(SymbolToken, Element)>> {
    let mut reader = Reader::new(payload);
    let mut fields = Vec::new();
    while !reader.is_empty() {
        let sid = reader
            .read_var_usize("field name")
            .map_err(|e| match e {
                IonError::VarIntTruncated { .. } => {
                    IonError::malformed("struct", "field name overruns the struct")
                }
                other => other,
            })?;
        let header = decode_header(reader.remaining(), 0).map_err(container_overrun)?;
        if header.is_nop_pad() {
            reader.read_bytes(header.total_len(), "padding")?;
            continue;
        }
        let value = decode_with_header(&mut reader, header, symbols)?;
        fields.push((resolve_symbol(sid, symbols), value));
    }
    Ok(fields)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes an int payload and picks the type code from its sign.
///
/// Zero is an empty positive-int payload.
pub fn encode_int(value: &Int) -> (TypeCode, Vec<u8>) {
    let type_code = if value.is_negative() {
        TypeCode::NegInt
    } else {
        TypeCode::PosInt
    };
    let payload = match value {
        Int::I64(v) => uint_bytes(v.unsigned_abs()),
        Int::Big(_) => big_uint_bytes(&value.magnitude()),
    };
    (type_code, payload)
}

/// Encodes a 64-bit float; positive zero is an empty payload.
pub fn encode_f64(value: f64) -> Vec<u8> {
    if value == 0.0 && value.is_sign_positive() {
        Vec::new()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Encodes a 32-bit float; positive zero is an empty payload.
pub fn encode_f32(value: f32) -> Vec<u8> {
    if value == 0.0 && value.is_sign_positive() {
        Vec::new()
    } else {
        value.to_be_bytes().to_vec()
    }
}

/// Encodes a decimal payload; `0d0` is empty.
pub fn encode_decimal(value: &Decimal) -> Vec<u8> {
    if value.exponent() == 0 && value.coefficient() == &Coefficient::Finite(BigInt::zero()) {
        return Vec::new();
    }
    let mut writer = Writer::new();
    writer.write_var_int(value.exponent());
    writer.write_bytes(&encode_signed_magnitude(
        value.is_sign_negative(),
        &value.coefficient_magnitude(),
    ));
    writer.into_bytes()
}

/// Encodes a timestamp payload with exactly the components its precision has.
pub fn encode_timestamp(value: &Timestamp) -> Vec<u8> {
    use crate::model::Precision;

    let mut writer = Writer::new();
    match value.offset() {
        None => writer.write_var_int_parts(true, 0),
        Some(offset) => writer.write_var_int(i64::from(offset)),
    }
    writer.write_var_uint(u64::from(value.year()));

    let precision = value.precision();
    if precision >= Precision::Month {
        writer.write_var_uint(u64::from(value.month()));
    }
    if precision >= Precision::Day {
        writer.write_var_uint(u64::from(value.day()));
    }
    if precision >= Precision::Minute {
        writer.write_var_uint(u64::from(value.hour()));
        writer.write_var_uint(u64::from(value.minute()));
    }
    if precision >= Precision::Second {
        writer.write_var_uint(u64::from(value.second()));
    }
    if let Some(fraction) = value.fraction() {
        writer.write_var_int(fraction.exponent());
        writer.write_bytes(&encode_signed_magnitude(
            fraction.is_sign_negative(),
            &fraction.coefficient_magnitude(),
        ));
    }
    writer.into_bytes()
}

/// Encodes a symbol payload; ID 0 is empty.
pub fn encode_symbol_id(sid: usize) -> Vec<u8> {
    if sid == 0 {
        return Vec::new();
    }
    let mut writer = Writer::new();
    writer.write_var_uint(sid as u64);
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{IonType, Precision};
    use crate::symbol::system_table;

    fn system() -> std::sync::Arc<SymbolTable> {
        system_table("$ion_1_0").unwrap()
    }

    fn decode_one(bytes: &[u8]) -> Result<Element> {
        let mut reader = Reader::new(bytes);
        decode_element(&mut reader, &system())
    }

    #[test]
    fn test_int_zero() {
        let (code, payload) = encode_int(&Int::I64(0));
        assert_eq!(code, TypeCode::PosInt);
        assert!(payload.is_empty());
        assert_eq!(decode_one(&[0x20]).unwrap(), Element::from(0i64));
    }

    #[test]
    fn test_int_values() {
        assert_eq!(decode_int(TypeCode::PosInt, &[0x03, 0xE8]).unwrap(), Int::I64(1000));
        assert_eq!(decode_int(TypeCode::NegInt, &[0x01]).unwrap(), Int::I64(-1));
        assert_eq!(
            decode_int(TypeCode::NegInt, &[0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            Int::I64(i64::MIN)
        );
        let big = decode_int(TypeCode::PosInt, &[0xFF; 9]).unwrap();
        assert!(matches!(big, Int::Big(_)));

        let (code, payload) = encode_int(&Int::I64(i64::MIN));
        assert_eq!(code, TypeCode::NegInt);
        assert_eq!(payload, vec![0x80, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_negative_zero_int_is_malformed() {
        let err = decode_int(TypeCode::NegInt, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
        let err = decode_int(TypeCode::NegInt, &[0u8; 10]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_floats() {
        assert_eq!(decode_float(&[]).unwrap(), 0.0);
        assert_eq!(decode_float(&1.5f32.to_be_bytes()).unwrap(), 1.5);
        assert_eq!(decode_float(&(-2.25f64).to_be_bytes()).unwrap(), -2.25);
        assert!(decode_float(&[0, 0]).is_err());

        assert!(encode_f64(0.0).is_empty());
        assert_eq!(encode_f64(-0.0).len(), 8);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(decode_decimal(&[]).unwrap(), Decimal::zero());
        assert!(encode_decimal(&Decimal::zero()).is_empty());

        // 123.45 = 12345d-2
        let payload = encode_decimal(&Decimal::new(12345, -2));
        assert_eq!(payload, vec![0x42, 0x30, 0x39]);
        assert_eq!(decode_decimal(&payload).unwrap(), Decimal::new(12345, -2));

        // Exponent 0, lone sign octet.
        let neg_zero = decode_decimal(&[0x00, 0x80]).unwrap();
        assert!(neg_zero.is_negative_zero());
        assert_eq!(encode_decimal(&neg_zero), vec![0x00, 0x80]);

        // Zero coefficient with non-zero exponent keeps the exponent.
        let payload = encode_decimal(&Decimal::new(0, -3));
        assert_eq!(decode_decimal(&payload).unwrap(), Decimal::new(0, -3));
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Timestamp::builder(2024)
            .month(3)
            .day(15)
            .hour_minute(10, 30)
            .second(5)
            .fraction(Decimal::new(250, -3))
            .offset(Some(-300))
            .build()
            .unwrap();
        let payload = encode_timestamp(&ts);
        assert_eq!(decode_timestamp(&payload).unwrap(), ts);

        let day = Timestamp::builder(2024).month(2).day(29).build().unwrap();
        let payload = encode_timestamp(&day);
        // Unknown offset, year, month, day.
        assert_eq!(payload[0], 0x40);
        let decoded = decode_timestamp(&payload).unwrap();
        assert_eq!(decoded.precision(), Precision::Day);
        assert_eq!(decoded.offset(), None);
    }

    #[test]
    fn test_timestamp_validation() {
        // Offset 0, year 2024, month 13.
        let mut writer = Writer::new();
        writer.write_var_int(0);
        writer.write_var_uint(2024);
        writer.write_var_uint(13);
        let err = decode_timestamp(writer.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);

        // Offset of a full day.
        let mut writer = Writer::new();
        writer.write_var_int(1440);
        writer.write_var_uint(2024);
        assert!(decode_timestamp(writer.as_bytes()).is_err());

        // Hour without minute.
        let mut writer = Writer::new();
        writer.write_var_int(0);
        for c in [2024, 1, 1, 10] {
            writer.write_var_uint(c);
        }
        assert!(decode_timestamp(writer.as_bytes()).is_err());
    }

    #[test]
    fn test_symbols() {
        assert_eq!(decode_symbol_id(&[]).unwrap(), 0);
        assert_eq!(decode_symbol_id(&[0x04]).unwrap(), 4);
        let err = decode_symbol_id(&[0x04, 0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);

        let element = decode_one(&[0x71, 0x04]).unwrap();
        assert_eq!(element, Element::symbol("name"));
        let unknown = decode_one(&[0x71, 0x63]).unwrap();
        assert_eq!(unknown.value, Value::Symbol(SymbolToken::sid(99)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = decode_one(&[0x82, 0xC3, 0x28]).unwrap_err();
        assert_eq!(err, IonError::InvalidUtf8 { context: "string" });
    }

    #[test]
    fn test_struct_keeps_repeated_fields() {
        // {name: 1, name: 2} with a NOP pad between fields.
        let bytes = [0xD8, 0x04, 0x21, 0x01, 0x00, 0x00, 0x04, 0x21, 0x02];
        let element = decode_one(&bytes).unwrap();
        let fields = element.as_struct().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, SymbolToken::text("name"));
        assert_eq!(fields[1].1, Element::from(2i64));
    }

    #[test]
    fn test_annotated_value() {
        // version::"hi"
        let bytes = [0xE5, 0x01, 0x05, 0x82, b'h', b'i'];
        let element = decode_one(&bytes).unwrap();
        assert_eq!(element.annotations, vec![SymbolToken::text("version")]);
        assert_eq!(element.as_text(), Some("hi"));
    }

    #[test]
    fn test_annotation_wrapper_errors() {
        // Empty annotation list.
        let err = decode_one(&[0xE2, 0x00, 0x20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
        // Nested wrapper.
        let err = decode_one(&[0xE6, 0x01, 0x04, 0xE3, 0x01, 0x04, 0x20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
        // Wrapped value shorter than the wrapper.
        let err = decode_one(&[0xE4, 0x01, 0x04, 0x20, 0x20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
        // Wrapped value longer than the wrapper.
        let err = decode_one(&[0xE3, 0x01, 0x04, 0x21, 0x01]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_child_overrun_is_malformed() {
        // List of length 2 holding a string that claims 5 bytes.
        let err = decode_one(&[0xB2, 0x85, b'a']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_typed_nulls() {
        assert_eq!(decode_one(&[0x0F]).unwrap(), Element::null(IonType::Null));
        assert_eq!(decode_one(&[0xDF]).unwrap(), Element::null(IonType::Struct));
    }
}
