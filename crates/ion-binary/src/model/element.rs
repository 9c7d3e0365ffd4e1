//! Immutable value tree.
//!
//! [`Element`] is the materialized form of a value: encoder input, the
//! backing data of [`TreeReader`](crate::reader::TreeReader), and what
//! [`Element::read_all`] builds from any cursor.

use crate::error::{IonError, Result};
use crate::model::{Decimal, Int, IonType, SymbolToken, Timestamp};
use crate::reader::IonReader;

/// Payload of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A typed null (`null.int`, ...); `Null(IonType::Null)` is `null`.
    Null(IonType),
    Bool(bool),
    Int(Int),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    String(String),
    Symbol(SymbolToken),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Vec<Element>),
    SExp(Vec<Element>),
    /// Fields in encounter order; repeated names are kept.
    Struct(Vec<(SymbolToken, Element)>),
}

impl Value {
    pub fn ion_type(&self) -> IonType {
        match self {
            Value::Null(t) => *t,
            Value::Bool(_) => IonType::Bool,
            Value::Int(_) => IonType::Int,
            Value::Float(_) => IonType::Float,
            Value::Decimal(_) => IonType::Decimal,
            Value::Timestamp(_) => IonType::Timestamp,
            Value::String(_) => IonType::String,
            Value::Symbol(_) => IonType::Symbol,
            Value::Clob(_) => IonType::Clob,
            Value::Blob(_) => IonType::Blob,
            Value::List(_) => IonType::List,
            Value::SExp(_) => IonType::SExp,
            Value::Struct(_) => IonType::Struct,
        }
    }
}

/// A value with its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub annotations: Vec<SymbolToken>,
    pub value: Value,
}

impl Element {
    pub fn new(value: Value) -> Element {
        Element {
            annotations: Vec::new(),
            value,
        }
    }

    pub fn null(ion_type: IonType) -> Element {
        Element::new(Value::Null(ion_type))
    }

    pub fn symbol(token: impl Into<SymbolToken>) -> Element {
        Element::new(Value::Symbol(token.into()))
    }

    pub fn clob(bytes: impl Into<Vec<u8>>) -> Element {
        Element::new(Value::Clob(bytes.into()))
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Element {
        Element::new(Value::Blob(bytes.into()))
    }

    pub fn list(items: impl IntoIterator<Item = Element>) -> Element {
        Element::new(Value::List(items.into_iter().collect()))
    }

    pub fn sexp(items: impl IntoIterator<Item = Element>) -> Element {
        Element::new(Value::SExp(items.into_iter().collect()))
    }

    pub fn from_fields<K: Into<SymbolToken>>(
        fields: impl IntoIterator<Item = (K, Element)>,
    ) -> Element {
        Element::new(Value::Struct(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Replaces the annotations.
    pub fn with_annotations<A: Into<SymbolToken>>(
        mut self,
        annotations: impl IntoIterator<Item = A>,
    ) -> Element {
        self.annotations = annotations.into_iter().map(Into::into).collect();
        self
    }

    pub fn ion_type(&self) -> IonType {
        self.value.ion_type()
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null(_))
    }

    /// True if the first annotation has the given text.
    pub fn has_first_annotation(&self, text: &str) -> bool {
        self.annotations
            .first()
            .and_then(SymbolToken::as_text)
            .is_some_and(|t| t == text)
    }

    /// Text of a string or symbol value.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            Value::Symbol(token) => token.as_text(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Int(i) => i.as_i64(),
            _ => None,
        }
    }

    /// Children of a list or sexp.
    pub fn as_sequence(&self) -> Option<&[Element]> {
        match &self.value {
            Value::List(items) | Value::SExp(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[(SymbolToken, Element)]> {
        match &self.value {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// First field with the given name.
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.as_struct()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(name))
            .map(|(_, v)| v)
    }

    /// Reads every remaining value at the cursor's current depth.
    pub fn read_all<R: IonReader + ?Sized>(reader: &mut R) -> Result<Vec<Element>> {
        let mut elements = Vec::new();
        while reader.next()?.is_some() {
            elements.push(Element::read(reader)?);
        }
        Ok(elements)
    }

    /// Materializes the cursor's current value, descending into containers.
    ///
    /// The cursor is left on the same value afterwards.
    pub fn read<R: IonReader + ?Sized>(reader: &mut R) -> Result<Element> {
        let ion_type = reader.ion_type()?;
        let annotations = reader.annotations()?;

        let value = if reader.is_null()? {
            Value::Null(ion_type)
        } else {
            match ion_type {
                IonType::Null => Value::Null(IonType::Null),
                IonType::Bool => Value::Bool(reader.bool_value()?),
                IonType::Int => Value::Int(reader.int_value()?),
                IonType::Float => Value::Float(reader.f64_value()?),
                IonType::Decimal => Value::Decimal(reader.decimal_value()?),
                IonType::Timestamp => Value::Timestamp(reader.timestamp_value()?),
                IonType::String => Value::String(reader.string_value()?.to_string()),
                IonType::Symbol => Value::Symbol(reader.symbol_value()?),
                IonType::Clob => Value::Clob(reader.lob_value()?.to_vec()),
                IonType::Blob => Value::Blob(reader.lob_value()?.to_vec()),
                IonType::List | IonType::SExp => {
                    reader.step_in()?;
                    let children = Element::read_all(reader)?;
                    reader.step_out()?;
                    if ion_type == IonType::List {
                        Value::List(children)
                    } else {
                        Value::SExp(children)
                    }
                }
                IonType::Struct => {
                    reader.step_in()?;
                    let mut fields = Vec::new();
                    while reader.next()?.is_some() {
                        let name = reader
                            .field_name()?
                            .ok_or(IonError::InvalidState("struct field without a name"))?;
                        fields.push((name, Element::read(reader)?));
                    }
                    reader.step_out()?;
                    Value::Struct(fields)
                }
            }
        };

        Ok(Element { annotations, value })
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        Element::new(value)
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Element::new(Value::Bool(value))
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::new(Value::Int(Int::I64(value)))
    }
}

impl From<Int> for Element {
    fn from(value: Int) -> Self {
        Element::new(Value::Int(value))
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::new(Value::Float(value))
    }
}

impl From<Decimal> for Element {
    fn from(value: Decimal) -> Self {
        Element::new(Value::Decimal(value))
    }
}

impl From<Timestamp> for Element {
    fn from(value: Timestamp) -> Self {
        Element::new(Value::Timestamp(value))
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::new(Value::String(value.to_string()))
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::new(Value::String(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_lookup_keeps_first() {
        let element = Element::from_fields([
            ("name", Element::from("a")),
            ("name", Element::from("b")),
        ]);
        assert_eq!(element.get("name").and_then(Element::as_text), Some("a"));
        assert_eq!(element.as_struct().map(|f| f.len()), Some(2));
        assert!(element.get("missing").is_none());
    }

    #[test]
    fn test_first_annotation() {
        let element = Element::from(1i64).with_annotations(["$ion_symbol_table", "x"]);
        assert!(element.has_first_annotation("$ion_symbol_table"));
        assert!(!Element::from(1i64).has_first_annotation("x"));
        assert_eq!(Element::null(IonType::List).ion_type(), IonType::List);
    }
}
