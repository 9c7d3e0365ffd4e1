//! Ion 1.0 binary: a self-describing binary format with a JSON-superset data
//! model, read and written without a schema.
//!
//! This crate provides the binary codec, the symbol table machinery and a
//! streaming cursor that walks nested values lazily with byte-exact spans.
//!
//! # Overview
//!
//! Values are typed (null, bool, arbitrary-precision int, float, decimal,
//! timestamp, string, symbol, clob, blob, list, sexp, struct) and may carry
//! annotations. Field names, annotations and symbol values travel as integer
//! IDs resolved through symbol tables:
//! - **System**: fixed per format version, shared process-wide
//! - **Local**: declared in the stream, importing shared tables
//! - **Shared**: named, versioned tables supplied by a [`Catalog`]
//!
//! # Quick Start
//!
//! ```rust
//! use ion_binary::{decode_elements, encode_elements, Element};
//!
//! let person = Element::from_fields([
//!     ("name", Element::from("Alice")),
//!     ("age", Element::from(30i64)),
//! ])
//! .with_annotations(["person"]);
//!
//! let bytes = encode_elements(std::slice::from_ref(&person)).unwrap();
//! let decoded = decode_elements(&bytes).unwrap();
//! assert_eq!(decoded, vec![person]);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Data types (IonType, Int, Decimal, Timestamp, SymbolToken, Element)
//! - [`codec`]: Primitives, type descriptors, payloads and the [`Encoder`]
//! - [`symbol`]: System, local and shared symbol tables and catalogs
//! - [`reader`]: The [`IonReader`] cursor over binary input or element trees
//! - [`error`]: Error types
//! - [`limits`]: Wire constants and decoding limits
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Declared lengths are checked against the bytes available
//! - Varints are limited to 10 octets to prevent overflow
//! - Invalid data is rejected with descriptive errors, never a panic
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (symbol table changes, unresolved
//! imports, navigation) and never installs a subscriber.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod reader;
pub mod symbol;
mod util;

// Re-export commonly used types at crate root
pub use codec::{EncodeOptions, Encoder};
pub use error::{ErrorKind, IonError, Result};
pub use model::{
    Coefficient, Decimal, Element, Int, IonType, Precision, SymbolToken, Timestamp,
    TimestampBuilder, Value,
};
pub use reader::{
    BinaryReader, BufferSource, ByteSource, IonReader, ReaderOptions, SliceSource, Span,
    StreamSource, TreeReader,
};
pub use symbol::{
    system_table, Catalog, LocalSymbolTable, SharedSymbolTable, SimpleCatalog, SymbolTable,
    SystemRegistry,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encodes values as a complete binary stream (version marker, symbol table,
/// values).
pub fn encode_elements(elements: &[Element]) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    for element in elements {
        encoder.write_element(element)?;
    }
    encoder.finish()
}

/// Decodes every user value of a complete binary stream.
pub fn decode_elements(bytes: &[u8]) -> Result<Vec<Element>> {
    let mut reader = BinaryReader::from_slice(bytes)?;
    Element::read_all(&mut reader)
}
