//! Binary encoding and decoding.
//!
//! Layers, lowest first: VarUInt/VarInt primitives, type descriptors, per-type
//! payloads, and the [`Encoder`] that writes whole streams.

pub mod encoder;
pub mod header;
pub mod primitives;
pub mod value;

pub use encoder::{EncodeOptions, Encoder};
pub use header::{decode_header, encode_header, Header, TypeCode};
pub use primitives::{
    decode_var_int, decode_var_int_parts, decode_var_uint, encode_var_int, encode_var_int_parts,
    encode_var_uint, Reader, Writer,
};
