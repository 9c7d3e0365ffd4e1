//! Streaming cursor over binary Ion.
//!
//! The cursor scans one header at a time and never decodes a payload until an
//! accessor asks for it; containers are skipped by length unless stepped into.
//! At top level it also consumes version markers, symbol table definitions and
//! `$ion_1_0` symbols, switching the table that governs the values after them.

use std::io::Read;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::codec::header::{decode_header, TypeCode};
use crate::codec::primitives::Reader;
use crate::codec::value::{self, container_overrun, parse_annotation_wrapper, resolve_symbol};
use crate::error::{IonError, Result};
use crate::limits::{INITIAL_SCAN_WINDOW, ION_1_0, VERSION_MARKER};
use crate::model::{Decimal, Int, IonType, SymbolToken, Timestamp};
use crate::reader::{ByteSource, IonReader, ReaderOptions, SliceSource, Span, StreamSource};
use crate::symbol::{LocalSymbolTable, SharedSymbolTable, SymbolTable, ION_SYMBOL_TABLE};

/// A scanned value whose payload has not been decoded.
#[derive(Debug, Clone)]
struct RawValue {
    ion_type: IonType,
    type_code: TypeCode,
    length_code: u8,
    null: bool,
    field_sid: Option<usize>,
    annotations: Vec<usize>,
    /// Field name start, or the span start outside structs.
    scan_start: u64,
    span_start: u64,
    payload_start: u64,
    end: u64,
    /// Table governing this value's symbols.
    symbols: Arc<SymbolTable>,
}

#[derive(Debug)]
enum Scan {
    End,
    VersionMarker { end: u64 },
    Pad { end: u64 },
    Value(RawValue),
}

/// Saved parent level.
#[derive(Debug)]
struct Frame {
    resume: u64,
    end: Option<u64>,
    container_type: Option<IonType>,
    scan_symbols: Arc<SymbolTable>,
}

/// Cursor over binary Ion read from a [`ByteSource`].
///
/// # Example
///
/// ```rust
/// use ion_binary::{BinaryReader, IonReader, IonType};
///
/// let bytes = [0xE0, 0x01, 0x00, 0xEA, 0x85, b'h', b'e', b'l', b'l', b'o'];
/// let mut reader = BinaryReader::from_slice(&bytes).unwrap();
/// assert_eq!(reader.next().unwrap(), Some(IonType::String));
/// assert_eq!(reader.string_value().unwrap(), "hello");
/// assert_eq!(reader.next().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct BinaryReader<S> {
    source: S,
    options: ReaderOptions,
    system: Arc<SymbolTable>,
    system_import: Arc<SharedSymbolTable>,
    /// Table for the next value scanned at this level.
    scan_symbols: Arc<SymbolTable>,
    pos: u64,
    container_end: Option<u64>,
    container_type: Option<IonType>,
    stack: Vec<Frame>,
    current: Option<RawValue>,
    lookahead: Option<RawValue>,
    eof: bool,
}

impl<'a> BinaryReader<SliceSource<'a>> {
    /// Cursor over a complete in-memory input.
    pub fn from_slice(data: &'a [u8]) -> Result<Self> {
        Self::new(SliceSource::new(data))
    }
}

impl<R: Read> BinaryReader<StreamSource<R>> {
    /// Cursor reading incrementally from `reader`.
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::new(StreamSource::new(reader))
    }
}

impl<S: ByteSource> BinaryReader<S> {
    pub fn new(source: S) -> Result<Self> {
        Self::with_options(source, ReaderOptions::default())
    }

    pub fn with_options(source: S, options: ReaderOptions) -> Result<Self> {
        let system = options.registry.system_table(ION_1_0)?;
        let system_import = options.registry.system_import(ION_1_0)?;
        let scan_symbols = options
            .initial_symbols
            .clone()
            .unwrap_or_else(|| Arc::clone(&system));
        Ok(Self {
            source,
            options,
            system,
            system_import,
            scan_symbols,
            pos: 0,
            container_end: None,
            container_type: None,
            stack: Vec::new(),
            current: None,
            lookahead: None,
            eof: false,
        })
    }

    /// Absolute offset where the next scan starts.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Table governing the current value (or the next one, before `next()`).
    pub fn symbol_table(&self) -> &Arc<SymbolTable> {
        self.current
            .as_ref()
            .map_or(&self.scan_symbols, |raw| &raw.symbols)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source, e.g. to append bytes to a
    /// [`BufferSource`](crate::reader::BufferSource) after `TruncatedInput`.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    // =========================================================================
    // Scanning
    // =========================================================================

    fn scan_next(&mut self) -> Result<Option<RawValue>> {
        loop {
            if let Some(end) = self.container_end {
                if self.pos >= end {
                    return Ok(None);
                }
            }
            match self.scan_at(self.pos)? {
                Scan::End => return Ok(None),
                Scan::VersionMarker { end } => {
                    trace!(offset = self.pos, "version marker");
                    self.scan_symbols = Arc::clone(&self.system);
                    self.pos = end;
                }
                Scan::Pad { end } => self.pos = end,
                Scan::Value(raw) => {
                    let is_system = self.stack.is_empty() && self.apply_system_value(&raw)?;
                    self.pos = raw.end;
                    if !is_system || self.options.surface_system_values {
                        return Ok(Some(raw));
                    }
                }
            }
        }
    }

    /// Scans the value at `start`, growing the requested window until the
    /// whole value is buffered or the source runs dry.
    fn scan_at(&mut self, start: u64) -> Result<Scan> {
        let limit = self.container_end;
        let in_struct = self.container_type == Some(IonType::Struct);
        let at_top = self.stack.is_empty();
        let mut want = INITIAL_SCAN_WINDOW;

        loop {
            let mut bytes = self.source.fill(start, want)?;
            let fetched = bytes.len();
            match limit {
                Some(end) => {
                    let room = usize::try_from(end - start).unwrap_or(usize::MAX);
                    bytes = &bytes[..fetched.min(room)];
                }
                None if bytes.is_empty() => return Ok(Scan::End),
                None => {}
            }

            match parse_value(bytes, start, in_struct, at_top, &self.scan_symbols) {
                Ok(scan) => return Ok(scan),
                Err(IonError::TruncatedInput { needed, .. }) if limit.is_none() && fetched >= want => {
                    want = needed.max(want.saturating_mul(2));
                }
                Err(err) if limit.is_some() => return Err(container_overrun(err)),
                Err(err) => return Err(err),
            }
        }
    }

    /// Applies a top-level symbol table definition or `$ion_1_0` symbol.
    /// Returns false for ordinary values.
    fn apply_system_value(&mut self, raw: &RawValue) -> Result<bool> {
        match raw.ion_type {
            IonType::Struct => {
                let first = raw.annotations.first().and_then(|sid| raw.symbols.find_text(*sid));
                if first != Some(ION_SYMBOL_TABLE) {
                    return Ok(false);
                }
                let table = if raw.null {
                    LocalSymbolTable::new(Arc::clone(&self.system_import))
                } else {
                    self.read_symbol_table(raw)?
                };
                debug!(
                    offset = raw.span_start,
                    max_id = table.max_id(),
                    imports = table.imports().len(),
                    "installed local symbol table"
                );
                self.scan_symbols = Arc::new(SymbolTable::Local(table));
                Ok(true)
            }
            IonType::Symbol if raw.annotations.is_empty() && !raw.null => {
                let sid = value::decode_symbol_id(self.payload_of(raw)?)?;
                if raw.symbols.find_text(sid) != Some(ION_1_0) {
                    return Ok(false);
                }
                trace!(offset = raw.span_start, "system identifier symbol");
                self.scan_symbols = Arc::clone(&self.system);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn read_symbol_table(&self, raw: &RawValue) -> Result<LocalSymbolTable> {
        let bytes = self
            .source
            .get(raw.span_start, raw.end)
            .ok_or(IonError::InvalidState("value bytes are no longer buffered"))?;
        let element = value::decode_element(&mut Reader::new(bytes), &raw.symbols)?;
        LocalSymbolTable::from_struct(
            &element,
            self.options.catalog.as_ref(),
            &self.system_import,
            &raw.symbols,
            self.options.strict_imports,
        )
    }

    fn promote(&mut self, raw: RawValue) -> IonType {
        let ion_type = raw.ion_type;
        if self.stack.is_empty() {
            self.source.release(raw.scan_start);
        }
        self.current = Some(raw);
        ion_type
    }

    // =========================================================================
    // Accessor helpers
    // =========================================================================

    fn current(&self) -> Result<&RawValue> {
        self.current
            .as_ref()
            .ok_or(IonError::InvalidState("no current value"))
    }

    fn payload_of(&self, raw: &RawValue) -> Result<&[u8]> {
        self.source
            .get(raw.payload_start, raw.end)
            .ok_or(IonError::InvalidState("value bytes are no longer buffered"))
    }

    fn typed(&self, ion_type: IonType, expected: &'static str) -> Result<(&RawValue, &[u8])> {
        let raw = self.current()?;
        if raw.ion_type != ion_type {
            return Err(IonError::WrongType {
                expected,
                found: raw.ion_type,
            });
        }
        if raw.null {
            return Err(IonError::NullValue {
                ion_type: raw.ion_type,
            });
        }
        Ok((raw, self.payload_of(raw)?))
    }
}

/// Parses the field name, annotation wrapper and header at the start of
/// `bytes`, whose first byte sits at absolute offset `base`.
fn parse_value(
    bytes: &[u8],
    base: u64,
    in_struct: bool,
    at_top: bool,
    symbols: &Arc<SymbolTable>,
) -> Result<Scan> {
    let mut reader = Reader::new(bytes);
    let field_sid = if in_struct {
        let sid = reader.read_var_usize("field name").map_err(|e| match e {
            IonError::VarIntTruncated { context } => IonError::TruncatedInput {
                context,
                needed: bytes.len() + 1,
                available: bytes.len(),
            },
            other => other,
        })?;
        Some(sid)
    } else {
        None
    };
    let offset = reader.position();

    if at_top && bytes.get(offset) == Some(&VERSION_MARKER[0]) {
        let marker = bytes
            .get(offset..offset + VERSION_MARKER.len())
            .ok_or(IonError::TruncatedInput {
                context: "version marker",
                needed: offset + VERSION_MARKER.len(),
                available: bytes.len(),
            })?;
        if marker != &VERSION_MARKER[..] {
            return Err(IonError::UnsupportedVersion {
                version: format!("{}.{}", marker[1], marker[2]),
            });
        }
        return Ok(Scan::VersionMarker {
            end: base + (offset + VERSION_MARKER.len()) as u64,
        });
    }

    let header = decode_header(bytes, offset)?;
    let end = base + (offset + header.total_len()) as u64;
    if header.is_nop_pad() {
        return Ok(Scan::Pad { end });
    }

    let (annotations, value_header, value_offset) = if header.type_code == TypeCode::Annotation {
        let payload_offset = offset + header.header_len;
        let wrapper =
            parse_annotation_wrapper(&bytes[payload_offset..offset + header.total_len()])?;
        (
            wrapper.annotations,
            wrapper.value_header,
            payload_offset + wrapper.value_offset,
        )
    } else {
        (Vec::new(), header, offset)
    };
    let ion_type = value_header
        .type_code
        .ion_type()
        .ok_or(IonError::malformed("type descriptor", "not a value type code"))?;

    Ok(Scan::Value(RawValue {
        ion_type,
        type_code: value_header.type_code,
        length_code: value_header.length_code,
        null: value_header.is_null(),
        field_sid,
        annotations,
        scan_start: base,
        span_start: base + offset as u64,
        payload_start: base + (value_offset + value_header.header_len) as u64,
        end,
        symbols: Arc::clone(symbols),
    }))
}

impl<S: ByteSource> IonReader for BinaryReader<S> {
    fn next(&mut self) -> Result<Option<IonType>> {
        if let Some(raw) = self.lookahead.take() {
            return Ok(Some(self.promote(raw)));
        }
        if self.eof {
            self.current = None;
            return Ok(None);
        }
        match self.scan_next()? {
            Some(raw) => Ok(Some(self.promote(raw))),
            None => {
                self.current = None;
                // Top level stays open so appended input can be picked up.
                self.eof = !self.stack.is_empty();
                Ok(None)
            }
        }
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.lookahead.is_some() {
            return Ok(true);
        }
        if self.eof {
            return Ok(false);
        }
        match self.scan_next()? {
            Some(raw) => {
                self.lookahead = Some(raw);
                Ok(true)
            }
            None => {
                self.eof = !self.stack.is_empty();
                Ok(false)
            }
        }
    }

    fn step_in(&mut self) -> Result<()> {
        let raw = self.current()?;
        if !raw.ion_type.is_container() {
            return Err(IonError::InvalidState("current value is not a container"));
        }
        if raw.null && !self.options.step_into_null_containers {
            return Err(IonError::InvalidState("cannot step into a null container"));
        }

        let container_type = raw.ion_type;
        let payload_start = raw.payload_start;
        let end = raw.end;
        let symbols = Arc::clone(&raw.symbols);
        let resume = self
            .lookahead
            .take()
            .map_or(self.pos, |next| next.scan_start);

        self.stack.push(Frame {
            resume,
            end: self.container_end,
            container_type: self.container_type,
            scan_symbols: std::mem::replace(&mut self.scan_symbols, symbols),
        });
        self.pos = payload_start;
        self.container_end = Some(end);
        self.container_type = Some(container_type);
        self.current = None;
        self.eof = false;
        trace!(depth = self.stack.len(), offset = payload_start, "step in");
        Ok(())
    }

    fn step_out(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or(IonError::InvalidState("step_out at top level"))?;
        self.pos = frame.resume;
        self.container_end = frame.end;
        self.container_type = frame.container_type;
        self.scan_symbols = frame.scan_symbols;
        self.current = None;
        self.lookahead = None;
        self.eof = false;
        trace!(depth = self.stack.len(), offset = self.pos, "step out");
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn ion_type(&self) -> Result<IonType> {
        Ok(self.current()?.ion_type)
    }

    fn is_null(&self) -> Result<bool> {
        Ok(self.current()?.null)
    }

    fn is_in_struct(&self) -> bool {
        self.container_type == Some(IonType::Struct)
    }

    fn field_name(&self) -> Result<Option<SymbolToken>> {
        let raw = self.current()?;
        Ok(raw.field_sid.map(|sid| resolve_symbol(sid, &raw.symbols)))
    }

    fn annotations(&self) -> Result<Vec<SymbolToken>> {
        let raw = self.current()?;
        Ok(raw
            .annotations
            .iter()
            .map(|sid| resolve_symbol(*sid, &raw.symbols))
            .collect())
    }

    fn bool_value(&self) -> Result<bool> {
        let (raw, _) = self.typed(IonType::Bool, "a bool")?;
        Ok(raw.length_code == 1)
    }

    fn int_value(&self) -> Result<Int> {
        let (raw, payload) = self.typed(IonType::Int, "an int")?;
        value::decode_int(raw.type_code, payload)
    }

    fn f64_value(&self) -> Result<f64> {
        let (_, payload) = self.typed(IonType::Float, "a float")?;
        value::decode_float(payload)
    }

    fn decimal_value(&self) -> Result<Decimal> {
        let (_, payload) = self.typed(IonType::Decimal, "a decimal")?;
        value::decode_decimal(payload)
    }

    fn timestamp_value(&self) -> Result<Timestamp> {
        let (_, payload) = self.typed(IonType::Timestamp, "a timestamp")?;
        value::decode_timestamp(payload)
    }

    fn string_value(&self) -> Result<&str> {
        let raw = self.current()?;
        if !raw.ion_type.is_text() {
            return Err(IonError::WrongType {
                expected: "a string or symbol",
                found: raw.ion_type,
            });
        }
        if raw.null {
            return Err(IonError::NullValue {
                ion_type: raw.ion_type,
            });
        }
        let payload = self.payload_of(raw)?;
        if raw.ion_type == IonType::String {
            return value::decode_string(payload);
        }
        let sid = value::decode_symbol_id(payload)?;
        raw.symbols
            .find_text(sid)
            .ok_or(IonError::UnknownSymbolText { sid })
    }

    fn symbol_value(&self) -> Result<SymbolToken> {
        let (raw, payload) = self.typed(IonType::Symbol, "a symbol")?;
        Ok(resolve_symbol(value::decode_symbol_id(payload)?, &raw.symbols))
    }

    fn lob_value(&self) -> Result<&[u8]> {
        let raw = self.current()?;
        if !raw.ion_type.is_lob() {
            return Err(IonError::WrongType {
                expected: "a clob or blob",
                found: raw.ion_type,
            });
        }
        if raw.null {
            return Err(IonError::NullValue {
                ion_type: raw.ion_type,
            });
        }
        self.payload_of(raw)
    }

    fn current_span(&self) -> Result<Span> {
        let raw = self.current()?;
        Ok(Span {
            start: raw.span_start,
            end: raw.end,
        })
    }
}
