//! Primitive encoding/decoding for the Ion binary format.
//!
//! Implements VarUInt, VarInt (sign-magnitude) and the fixed-length UInt/Int
//! magnitudes that appear inside value payloads.
//!
//! Both variable-length forms store 7 data bits per octet, most significant
//! group first. The high bit of every octet is a continuation flag that is
//! cleared on the last octet. In a VarInt the first octet gives up one more
//! data bit (bit 6) to carry the sign.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{IonError, Result};
use crate::limits::MAX_VARINT_BYTES;

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a VarUInt from the start of `bytes`.
///
/// Returns the value and the number of octets consumed.
pub fn decode_var_uint(bytes: &[u8]) -> Result<(u64, usize)> {
    var_uint(bytes, "VarUInt")
}

/// Decodes a VarInt from the start of `bytes`.
///
/// Negative zero decodes as `0`; use [`decode_var_int_parts`] where the
/// distinction matters.
pub fn decode_var_int(bytes: &[u8]) -> Result<(i64, usize)> {
    let (negative, magnitude, len) = var_int_parts(bytes, "VarInt")?;
    Ok((signed_from_parts(negative, magnitude, "VarInt")?, len))
}

/// Decodes a VarInt into `(is_negative, magnitude, octets_consumed)`.
pub fn decode_var_int_parts(bytes: &[u8]) -> Result<(bool, u64, usize)> {
    var_int_parts(bytes, "VarInt")
}

fn var_uint(bytes: &[u8], context: &'static str) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_VARINT_BYTES {
            return Err(IonError::VarIntTooLong {
                context,
                max: MAX_VARINT_BYTES,
            });
        }
        if result > (u64::MAX >> 7) {
            return Err(IonError::VarIntOverflow { context });
        }
        result = (result << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(IonError::VarIntTruncated { context })
}

fn var_int_parts(bytes: &[u8], context: &'static str) -> Result<(bool, u64, usize)> {
    let Some(&first) = bytes.first() else {
        return Err(IonError::VarIntTruncated { context });
    };
    let negative = first & 0x40 != 0;
    let mut magnitude = u64::from(first & 0x3F);
    if first & 0x80 == 0 {
        return Ok((negative, magnitude, 1));
    }

    for (i, &byte) in bytes.iter().enumerate().skip(1) {
        if i == MAX_VARINT_BYTES {
            return Err(IonError::VarIntTooLong {
                context,
                max: MAX_VARINT_BYTES,
            });
        }
        if magnitude > (u64::MAX >> 7) {
            return Err(IonError::VarIntOverflow { context });
        }
        magnitude = (magnitude << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((negative, magnitude, i + 1));
        }
    }
    Err(IonError::VarIntTruncated { context })
}

fn signed_from_parts(negative: bool, magnitude: u64, context: &'static str) -> Result<i64> {
    if negative {
        if magnitude > 1u64 << 63 {
            return Err(IonError::VarIntOverflow { context });
        }
        // 2^63 wraps to i64::MIN, which is the intended value.
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| IonError::VarIntOverflow { context })
    }
}

/// Splits a sign-magnitude Int payload into `(is_negative, magnitude)`.
///
/// An empty payload is positive zero; a lone `0x80` is negative zero.
pub fn decode_signed_magnitude(bytes: &[u8]) -> (bool, BigUint) {
    match bytes.split_first() {
        None => (false, BigUint::zero()),
        Some((&first, rest)) => {
            let mut magnitude = Vec::with_capacity(bytes.len());
            magnitude.push(first & 0x7F);
            magnitude.extend_from_slice(rest);
            (first & 0x80 != 0, BigUint::from_bytes_be(&magnitude))
        }
    }
}

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(IonError::TruncatedInput {
            context,
            needed: 1,
            available: 0,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining_len() {
            return Err(IonError::TruncatedInput {
                context,
                needed: n,
                available: self.remaining_len(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a VarUInt.
    #[inline]
    pub fn read_var_uint(&mut self, context: &'static str) -> Result<u64> {
        let (value, len) = var_uint(self.remaining(), context)?;
        self.pos += len;
        Ok(value)
    }

    /// Reads a VarUInt that must fit in `usize`.
    pub fn read_var_usize(&mut self, context: &'static str) -> Result<usize> {
        let value = self.read_var_uint(context)?;
        usize::try_from(value).map_err(|_| IonError::VarIntOverflow { context })
    }

    /// Reads a VarInt.
    pub fn read_var_int(&mut self, context: &'static str) -> Result<i64> {
        let (negative, magnitude) = self.read_var_int_parts(context)?;
        signed_from_parts(negative, magnitude, context)
    }

    /// Reads a VarInt as `(is_negative, magnitude)`, preserving negative zero.
    pub fn read_var_int_parts(&mut self, context: &'static str) -> Result<(bool, u64)> {
        let (negative, magnitude, len) = var_int_parts(self.remaining(), context)?;
        self.pos += len;
        Ok((negative, magnitude))
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a VarUInt using the minimal number of octets.
pub fn encode_var_uint(value: u64) -> Vec<u8> {
    let mut writer = Writer::with_capacity(MAX_VARINT_BYTES);
    writer.write_var_uint(value);
    writer.into_bytes()
}

/// Encodes a VarInt using the minimal number of octets.
pub fn encode_var_int(value: i64) -> Vec<u8> {
    let mut writer = Writer::with_capacity(MAX_VARINT_BYTES);
    writer.write_var_int(value);
    writer.into_bytes()
}

/// Encodes a VarInt from sign and magnitude, allowing negative zero.
pub fn encode_var_int_parts(negative: bool, magnitude: u64) -> Vec<u8> {
    let mut writer = Writer::with_capacity(MAX_VARINT_BYTES);
    writer.write_var_int_parts(negative, magnitude);
    writer.into_bytes()
}

/// Returns the big-endian magnitude of `value` without leading zero octets.
///
/// Zero yields an empty slice.
pub fn uint_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = (value.leading_zeros() / 8) as usize;
    bytes[skip..].to_vec()
}

/// Returns the big-endian magnitude of `value` without leading zero octets.
pub fn big_uint_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

/// Encodes a sign-magnitude Int payload.
///
/// Positive zero is empty; negative zero is a lone sign octet.
pub fn encode_signed_magnitude(negative: bool, magnitude: &BigUint) -> Vec<u8> {
    let mut bytes = big_uint_bytes(magnitude);
    if bytes.is_empty() {
        return if negative { vec![0x80] } else { bytes };
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    if negative {
        bytes[0] |= 0x80;
    }
    bytes
}

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discards all written bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a VarUInt.
    #[inline]
    pub fn write_var_uint(&mut self, value: u64) {
        // Fill a stack buffer from the least significant group backwards.
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut start = MAX_VARINT_BYTES;
        let mut remaining = value;
        let mut continuation = 0u8;
        loop {
            start -= 1;
            buf[start] = (remaining & 0x7F) as u8 | continuation;
            continuation = 0x80;
            remaining >>= 7;
            if remaining == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&buf[start..]);
    }

    /// Writes a VarInt.
    pub fn write_var_int(&mut self, value: i64) {
        self.write_var_int_parts(value < 0, value.unsigned_abs());
    }

    /// Writes a VarInt from sign and magnitude, allowing negative zero.
    pub fn write_var_int_parts(&mut self, negative: bool, magnitude: u64) {
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut start = MAX_VARINT_BYTES;
        let mut remaining = magnitude;
        let mut continuation = 0u8;
        while remaining > 0x3F {
            start -= 1;
            buf[start] = (remaining & 0x7F) as u8 | continuation;
            continuation = 0x80;
            remaining >>= 7;
        }
        start -= 1;
        let sign = if negative { 0x40 } else { 0x00 };
        buf[start] = remaining as u8 | sign | continuation;
        self.buf.extend_from_slice(&buf[start..]);
    }
}
