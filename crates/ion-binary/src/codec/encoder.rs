//! Binary encoder.
//!
//! Values are written into a pending buffer while symbols are interned into
//! the encoder's local table. [`Encoder::flush`] then assembles the output:
//! version marker (once), a symbol table definition when the table grew, and
//! the pending values, so a definition always precedes the values that
//! reference it.

use std::sync::Arc;

use tracing::debug;

use crate::codec::header::{encode_header, Header, TypeCode};
use crate::codec::primitives::Writer;
use crate::codec::value;
use crate::error::{IonError, Result};
use crate::limits::VERSION_MARKER;
use crate::model::{Decimal, Element, Int, IonType, SymbolToken, Timestamp, Value};
use crate::symbol::system::ION;
use crate::symbol::{LocalSymbolTable, SharedSymbolTable, SystemRegistry};

/// Options for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Start the output with the binary version marker.
    pub write_version_marker: bool,
    /// Emit symbol table definitions for imports and new symbols.
    ///
    /// When disabled the reader must be given the encoder's table out of
    /// band, and writing text that is not already in the table fails.
    pub write_symbol_tables: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            write_version_marker: true,
            write_symbol_tables: true,
        }
    }
}

impl EncodeOptions {
    /// Creates default encoding options (self-describing output).
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a bare value stream decoded with a table shared out of
    /// band: no version marker, no symbol table definitions.
    pub fn bare() -> Self {
        Self {
            write_version_marker: false,
            write_symbol_tables: false,
        }
    }
}

/// An open container being materialized.
#[derive(Debug)]
struct Container {
    ion_type: IonType,
    buf: Writer,
    field_sid: Option<usize>,
    annotations: Vec<usize>,
}

/// Writes values in the binary format.
///
/// # Example
///
/// ```rust
/// use ion_binary::{BinaryReader, Encoder, IonReader, IonType};
///
/// let mut encoder = Encoder::new();
/// encoder.step_in(IonType::Struct).unwrap();
/// encoder.set_field_name("greeting").unwrap();
/// encoder.write_string("hello").unwrap();
/// encoder.step_out().unwrap();
/// let bytes = encoder.finish().unwrap();
///
/// let mut reader = BinaryReader::from_slice(&bytes).unwrap();
/// assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
/// reader.step_in().unwrap();
/// reader.next().unwrap();
/// assert_eq!(reader.field_name().unwrap().unwrap().as_text(), Some("greeting"));
/// assert_eq!(reader.string_value().unwrap(), "hello");
/// ```
#[derive(Debug)]
pub struct Encoder {
    options: EncodeOptions,
    system: Arc<SharedSymbolTable>,
    symbols: LocalSymbolTable,
    /// The table has declarations not yet emitted.
    symbols_dirty: bool,
    marker_written: bool,
    out: Writer,
    pending: Writer,
    containers: Vec<Container>,
    field_sid: Option<usize>,
    annotations: Vec<usize>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_options(EncodeOptions::default())
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        let system = Arc::clone(SystemRegistry::shared().ion_1_0());
        Self::from_table(LocalSymbolTable::new(system), options)
    }

    /// Encoder whose table imports `imports` after the system table.
    pub fn with_imports(
        imports: impl IntoIterator<Item = Arc<SharedSymbolTable>>,
        options: EncodeOptions,
    ) -> Self {
        let system = Arc::clone(SystemRegistry::shared().ion_1_0());
        let builder = imports
            .into_iter()
            .fold(LocalSymbolTable::builder().import(system), |b, t| b.import(t));
        Self::from_table(builder.build(), options)
    }

    /// Encoder using `table` as its symbol table.
    ///
    /// With [`EncodeOptions::write_symbol_tables`] the table is declared in the
    /// output, where the system table is always the implicit first import, so
    /// `table` must import the full system table first and nowhere else.
    /// Otherwise the reader must be seeded with the same table.
    pub fn with_symbol_table(table: LocalSymbolTable, options: EncodeOptions) -> Result<Self> {
        let registry = SystemRegistry::shared();
        let system = registry.ion_1_0();
        if options.write_symbol_tables && !declares_as_is(&table, system) {
            return Err(IonError::InvalidState(
                "symbol table must import the system table first",
            ));
        }
        Ok(Self::from_table(table, options))
    }

    fn from_table(table: LocalSymbolTable, options: EncodeOptions) -> Self {
        let symbols_dirty = table.imports().iter().any(|i| i.name() != ION)
            || table.local_symbols().next().is_some();
        Self {
            options,
            system: Arc::clone(SystemRegistry::shared().ion_1_0()),
            symbols: table,
            symbols_dirty,
            marker_written: false,
            out: Writer::with_capacity(256),
            pending: Writer::with_capacity(256),
            containers: Vec::new(),
            field_sid: None,
            annotations: Vec::new(),
        }
    }

    pub fn symbol_table(&self) -> &LocalSymbolTable {
        &self.symbols
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    // =========================================================================
    // Field names, annotations, symbols
    // =========================================================================

    /// Sets the field name of the next value; only valid inside a struct.
    pub fn set_field_name(&mut self, name: impl Into<SymbolToken>) -> Result<()> {
        if !self.in_struct() {
            return Err(IonError::InvalidState("field name outside a struct"));
        }
        self.field_sid = Some(self.symbol_id(&name.into())?);
        Ok(())
    }

    /// Adds an annotation to the next value.
    pub fn add_annotation(&mut self, annotation: impl Into<SymbolToken>) -> Result<()> {
        let sid = self.symbol_id(&annotation.into())?;
        self.annotations.push(sid);
        Ok(())
    }

    fn in_struct(&self) -> bool {
        self.containers
            .last()
            .is_some_and(|c| c.ion_type == IonType::Struct)
    }

    /// Resolves a token to an ID, interning unknown text.
    fn symbol_id(&mut self, token: &SymbolToken) -> Result<usize> {
        if let Some(text) = token.as_text() {
            if let Some(sid) = self.symbols.find_id(text) {
                return Ok(sid);
            }
            if !self.options.write_symbol_tables {
                return Err(IonError::InvalidState(
                    "new symbol text while symbol tables are disabled",
                ));
            }
            self.symbols_dirty = true;
            return Ok(self.symbols.add_symbol(Some(text.to_string())));
        }

        let sid = token
            .as_sid()
            .ok_or(IonError::InvalidState("symbol token has neither text nor id"))?;
        let max_id = self.symbols.max_id();
        if sid > max_id {
            return Err(IonError::SymbolIdOutOfRange { sid, max_id });
        }
        Ok(sid)
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Writes a value with a minimal header and the given payload.
    pub fn write_value(&mut self, type_code: TypeCode, payload: &[u8]) -> Result<()> {
        self.emit(Header::new(type_code, payload.len()), payload)
    }

    fn emit(&mut self, header: Header, payload: &[u8]) -> Result<()> {
        let field_sid = self.take_field_name()?;
        let annotations = std::mem::take(&mut self.annotations);
        let target = match self.containers.last_mut() {
            Some(container) => &mut container.buf,
            None => &mut self.pending,
        };
        write_framed(target, field_sid, &annotations, header, payload);
        Ok(())
    }

    fn take_field_name(&mut self) -> Result<Option<usize>> {
        let field_sid = self.field_sid.take();
        if self.in_struct() && field_sid.is_none() {
            return Err(IonError::InvalidState("struct field without a name"));
        }
        Ok(field_sid)
    }

    pub fn write_null(&mut self, ion_type: IonType) -> Result<()> {
        self.emit(Header::null(TypeCode::for_ion_type(ion_type)), &[])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.emit(Header::boolean(value), &[])
    }

    pub fn write_int(&mut self, value: &Int) -> Result<()> {
        let (type_code, payload) = value::encode_int(value);
        self.write_value(type_code, &payload)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_int(&Int::I64(value))
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_value(TypeCode::Float, &value::encode_f32(value))
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_value(TypeCode::Float, &value::encode_f64(value))
    }

    pub fn write_decimal(&mut self, value: &Decimal) -> Result<()> {
        self.write_value(TypeCode::Decimal, &value::encode_decimal(value))
    }

    pub fn write_timestamp(&mut self, value: &Timestamp) -> Result<()> {
        self.write_value(TypeCode::Timestamp, &value::encode_timestamp(value))
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_value(TypeCode::String, value.as_bytes())
    }

    pub fn write_symbol(&mut self, token: impl Into<SymbolToken>) -> Result<()> {
        let sid = self.symbol_id(&token.into())?;
        self.write_value(TypeCode::Symbol, &value::encode_symbol_id(sid))
    }

    pub fn write_clob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_value(TypeCode::Clob, bytes)
    }

    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_value(TypeCode::Blob, bytes)
    }

    /// Opens a list, sexp or struct; its children follow until
    /// [`step_out`](Self::step_out).
    pub fn step_in(&mut self, ion_type: IonType) -> Result<()> {
        if !ion_type.is_container() {
            return Err(IonError::InvalidState("step_in requires a container type"));
        }
        let field_sid = self.take_field_name()?;
        self.containers.push(Container {
            ion_type,
            buf: Writer::new(),
            field_sid,
            annotations: std::mem::take(&mut self.annotations),
        });
        Ok(())
    }

    /// Closes the innermost container and writes it, length-prefixed, into
    /// its parent.
    pub fn step_out(&mut self) -> Result<()> {
        if self.field_sid.is_some() || !self.annotations.is_empty() {
            return Err(IonError::InvalidState("field name or annotations without a value"));
        }
        let container = self
            .containers
            .pop()
            .ok_or(IonError::InvalidState("step_out at top level"))?;
        let header = Header::new(
            TypeCode::for_ion_type(container.ion_type),
            container.buf.len(),
        );
        let target = match self.containers.last_mut() {
            Some(parent) => &mut parent.buf,
            None => &mut self.pending,
        };
        write_framed(
            target,
            container.field_sid,
            &container.annotations,
            header,
            container.buf.as_bytes(),
        );
        Ok(())
    }

    /// Writes a complete value tree.
    pub fn write_element(&mut self, element: &Element) -> Result<()> {
        for annotation in &element.annotations {
            self.add_annotation(annotation.clone())?;
        }
        match &element.value {
            Value::Null(ion_type) => self.write_null(*ion_type),
            Value::Bool(b) => self.write_bool(*b),
            Value::Int(i) => self.write_int(i),
            Value::Float(f) => self.write_f64(*f),
            Value::Decimal(d) => self.write_decimal(d),
            Value::Timestamp(t) => self.write_timestamp(t),
            Value::String(s) => self.write_string(s),
            Value::Symbol(token) => self.write_symbol(token.clone()),
            Value::Clob(bytes) => self.write_clob(bytes),
            Value::Blob(bytes) => self.write_blob(bytes),
            Value::List(items) | Value::SExp(items) => {
                self.step_in(element.ion_type())?;
                for item in items {
                    self.write_element(item)?;
                }
                self.step_out()
            }
            Value::Struct(fields) => {
                self.step_in(IonType::Struct)?;
                for (name, item) in fields {
                    self.set_field_name(name.clone())?;
                    self.write_element(item)?;
                }
                self.step_out()
            }
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Moves completed top-level values to the output, preceded by the
    /// version marker and any pending symbol table definition.
    pub fn flush(&mut self) -> Result<()> {
        if !self.containers.is_empty() {
            return Err(IonError::InvalidState("flush inside a container"));
        }
        if self.field_sid.is_some() || !self.annotations.is_empty() {
            return Err(IonError::InvalidState("annotations without a value"));
        }

        if self.options.write_version_marker && !self.marker_written {
            self.out.write_bytes(&VERSION_MARKER);
            self.marker_written = true;
        }
        if self.options.write_symbol_tables && self.symbols_dirty {
            let definition = self.symbol_table_definition()?;
            self.out.write_bytes(&definition);
            self.symbols_dirty = false;
            debug!(
                max_id = self.symbols.max_id(),
                imports = self.symbols.imports().len(),
                bytes = definition.len(),
                "emitted local symbol table"
            );
        }
        self.out.write_bytes(self.pending.as_bytes());
        self.pending.clear();
        Ok(())
    }

    /// Flushes and returns the encoded bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.flush()?;
        Ok(self.out.into_bytes())
    }

    /// Encodes the full `$ion_symbol_table` struct; its field names and
    /// annotation are all system symbols.
    fn symbol_table_definition(&self) -> Result<Vec<u8>> {
        let mut encoder = Encoder::from_table(
            LocalSymbolTable::new(Arc::clone(&self.system)),
            EncodeOptions::bare(),
        );
        encoder.write_element(&self.symbols.to_element())?;
        encoder.finish()
    }
}

/// True when `table` assigns the same IDs as the definition emitted for it,
/// which always starts with the system symbols.
fn declares_as_is(table: &LocalSymbolTable, system: &SharedSymbolTable) -> bool {
    match table.imports().split_first() {
        Some((first, rest)) => {
            first.name() == ION
                && first.max_id() == system.max_id()
                && rest.iter().all(|i| i.name() != ION)
        }
        None => false,
    }
}

/// Writes `[field name] [annotation wrapper] header payload`.
fn write_framed(
    writer: &mut Writer,
    field_sid: Option<usize>,
    annotations: &[usize],
    header: Header,
    payload: &[u8],
) {
    if let Some(sid) = field_sid {
        writer.write_var_uint(sid as u64);
    }
    if annotations.is_empty() {
        encode_header(&header, writer);
        writer.write_bytes(payload);
        return;
    }

    let mut list = Writer::with_capacity(annotations.len());
    for sid in annotations {
        list.write_var_uint(*sid as u64);
    }
    let mut wrapped = Writer::with_capacity(list.len() + header.total_len() + 2);
    wrapped.write_var_uint(list.len() as u64);
    wrapped.write_bytes(list.as_bytes());
    encode_header(&header, &mut wrapped);
    wrapped.write_bytes(payload);

    encode_header(&Header::new(TypeCode::Annotation, wrapped.len()), writer);
    writer.write_bytes(wrapped.as_bytes());
}
