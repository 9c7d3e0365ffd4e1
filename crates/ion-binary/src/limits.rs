//! Wire constants and decoding limits.

/// Binary version marker for Ion 1.0.
pub const VERSION_MARKER: [u8; 4] = [0xE0, 0x01, 0x00, 0xEA];

/// System symbol table identifier for Ion 1.0.
pub const ION_1_0: &str = "$ion_1_0";

/// Maximum number of octets in a VarUInt/VarInt (64-bit value).
pub const MAX_VARINT_BYTES: usize = 10;

/// Largest length that fits in the length nibble.
pub const MAX_INLINE_LENGTH: usize = 13;

/// Length nibble meaning "length follows as VarUInt".
pub const LENGTH_VAR_UINT: u8 = 14;

/// Length nibble meaning "null value of this type".
pub const LENGTH_NULL: u8 = 15;

/// Bytes requested from a source before the first header decode attempt.
///
/// Large enough for a field name, an annotation wrapper and a header with a
/// VarUInt length in the common case.
pub const INITIAL_SCAN_WINDOW: usize = 64;

/// Read size used by stream sources.
pub const STREAM_CHUNK_SIZE: usize = 8 * 1024;

/// Consumed prefix size at which stream sources compact their buffer.
pub const STREAM_RELEASE_THRESHOLD: usize = 64 * 1024;

/// Exclusive bound on the magnitude of a timestamp offset, in minutes.
pub const MAX_OFFSET_MINUTES: i64 = 24 * 60;

/// Largest magnitude of a timestamp fraction exponent, i.e. the most
/// fractional-second digits a timestamp may carry.
pub const MAX_FRACTION_DIGITS: u64 = 4096;
