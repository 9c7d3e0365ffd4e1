//! Cursors over Ion data.
//!
//! A cursor visits one value at a time. [`IonReader::next`] moves to the next
//! value at the current depth, [`IonReader::step_in`] and
//! [`IonReader::step_out`] move between nesting levels, and typed accessors
//! decode the current value on demand.
//!
//! - [`BinaryReader`]: streaming cursor over binary input
//! - [`TreeReader`]: the same contract over an in-memory [`Element`](crate::model::Element) slice

pub mod binary;
pub mod source;
pub mod tree;

use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::error::{IonError, Result};
use crate::model::{Decimal, Int, IonType, SymbolToken, Timestamp};
use crate::symbol::{Catalog, SimpleCatalog, SymbolTable, SystemRegistry};

pub use binary::BinaryReader;
pub use source::{BufferSource, ByteSource, SliceSource, StreamSource};
pub use tree::TreeReader;

/// Byte range of a value in its input.
///
/// Starts at the annotation wrapper (or the type descriptor when there is
/// none) and ends after the payload. Field names are not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cursor configuration.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Resolves shared symbol table imports.
    pub catalog: Arc<dyn Catalog>,
    /// Source of system symbol tables.
    pub registry: Arc<SystemRegistry>,
    /// Table in effect before the first version marker or symbol table, for
    /// streams whose table is shared out of band.
    pub initial_symbols: Option<Arc<SymbolTable>>,
    /// Surface symbol table structs and `$ion_1_0` symbols as ordinary values
    /// (they still take effect).
    pub surface_system_values: bool,
    /// Stepping into a null container behaves as an empty container when set;
    /// otherwise it fails with `InvalidState`.
    pub step_into_null_containers: bool,
    /// Fail with `UnresolvedImport` instead of reserving unknown symbols.
    pub strict_imports: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            catalog: Arc::new(SimpleCatalog::new()),
            registry: SystemRegistry::shared(),
            initial_symbols: None,
            surface_system_values: false,
            step_into_null_containers: true,
            strict_imports: false,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_initial_symbols(mut self, symbols: Arc<SymbolTable>) -> Self {
        self.initial_symbols = Some(symbols);
        self
    }
}

/// A cursor over Ion values.
///
/// Accessors fail with `InvalidState` when there is no current value,
/// `WrongType` when the current value has another type, and `NullValue` when
/// it is a typed null.
pub trait IonReader {
    /// Moves to the next value at the current depth.
    ///
    /// Returns `None` at the end of the container or stream; repeated calls
    /// keep returning `None`.
    fn next(&mut self) -> Result<Option<IonType>>;

    /// Reports whether [`next`](Self::next) would find a value, without
    /// moving. Repeated calls are idempotent.
    fn has_next(&mut self) -> Result<bool>;

    /// Descends into the current container.
    fn step_in(&mut self) -> Result<()>;

    /// Returns to the parent level, positioned after the container.
    fn step_out(&mut self) -> Result<()>;

    /// Number of containers stepped into.
    fn depth(&self) -> usize;

    /// Type of the current value; `InvalidState` before `next()` or at the end.
    fn ion_type(&self) -> Result<IonType>;

    fn is_null(&self) -> Result<bool>;

    /// True when the current level is a struct's fields.
    fn is_in_struct(&self) -> bool;

    /// Field name of the current value inside a struct.
    fn field_name(&self) -> Result<Option<SymbolToken>>;

    fn annotations(&self) -> Result<Vec<SymbolToken>>;

    fn bool_value(&self) -> Result<bool>;

    fn int_value(&self) -> Result<Int>;

    fn i64_value(&self) -> Result<i64> {
        self.int_value()?.as_i64().ok_or(IonError::IntOutOfRange)
    }

    fn f64_value(&self) -> Result<f64>;

    fn decimal_value(&self) -> Result<Decimal>;

    fn big_decimal_value(&self) -> Result<BigDecimal> {
        self.decimal_value()?
            .to_big_decimal()
            .ok_or(IonError::malformed("decimal", "exponent out of range"))
    }

    fn timestamp_value(&self) -> Result<Timestamp>;

    /// Text of a string, or of a symbol whose text is known.
    fn string_value(&self) -> Result<&str>;

    fn symbol_value(&self) -> Result<SymbolToken>;

    /// Bytes of a clob or blob.
    fn lob_value(&self) -> Result<&[u8]>;

    /// Byte range of the current value.
    fn current_span(&self) -> Result<Span>;
}
