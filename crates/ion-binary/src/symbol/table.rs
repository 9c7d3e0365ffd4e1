//! Shared symbol tables and the table enum cursors resolve against.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{IonError, Result};
use crate::model::{Element, Value};
use crate::symbol::LocalSymbolTable;

/// Annotation marking a shared symbol table definition.
pub const ION_SHARED_SYMBOL_TABLE: &str = "$ion_shared_symbol_table";

/// A named, versioned, immutable list of symbols.
///
/// IDs are 1-based. Slots may be unnamed (`None`), which is how placeholders
/// for unresolvable imports reserve their ID range.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedSymbolTable {
    name: String,
    version: u32,
    symbols: Vec<Option<String>>,
    ids: FxHashMap<String, usize>,
}

impl SharedSymbolTable {
    /// Creates a table from symbol texts.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        version: u32,
        symbols: impl IntoIterator<Item = S>,
    ) -> SharedSymbolTable {
        SharedSymbolTable::with_slots(name, version, symbols.into_iter().map(|s| Some(s.into())))
    }

    /// Creates a table whose slots may be unnamed.
    pub fn with_slots(
        name: impl Into<String>,
        version: u32,
        slots: impl IntoIterator<Item = Option<String>>,
    ) -> SharedSymbolTable {
        let symbols: Vec<Option<String>> = slots.into_iter().collect();
        let mut ids = FxHashMap::default();
        for (i, text) in symbols.iter().enumerate() {
            if let Some(text) = text {
                ids.entry(text.clone()).or_insert(i + 1);
            }
        }
        SharedSymbolTable {
            name: name.into(),
            version,
            symbols,
            ids,
        }
    }

    /// A table of `max_id` unnamed slots standing in for one the catalog
    /// could not supply.
    pub fn placeholder(name: impl Into<String>, version: u32, max_id: usize) -> SharedSymbolTable {
        SharedSymbolTable {
            name: name.into(),
            version,
            symbols: vec![None; max_id],
            ids: FxHashMap::default(),
        }
    }

    /// Parses a `$ion_shared_symbol_table::{name, version, symbols}` value.
    pub fn from_element(element: &Element) -> Result<SharedSymbolTable> {
        if !element.has_first_annotation(ION_SHARED_SYMBOL_TABLE) || element.as_struct().is_none() {
            return Err(IonError::malformed(
                "shared symbol table",
                "expected an annotated struct",
            ));
        }
        let name = element
            .get("name")
            .and_then(Element::as_text)
            .filter(|n| !n.is_empty())
            .ok_or(IonError::malformed("shared symbol table", "missing name"))?;
        let version = element
            .get("version")
            .and_then(Element::as_i64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v >= 1)
            .unwrap_or(1);
        let slots = element
            .get("symbols")
            .and_then(Element::as_sequence)
            .unwrap_or_default()
            .iter()
            .map(|s| match &s.value {
                Value::String(text) => Some(text.clone()),
                _ => None,
            });
        Ok(SharedSymbolTable::with_slots(name, version, slots))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Highest ID defined by this table.
    pub fn max_id(&self) -> usize {
        self.symbols.len()
    }

    /// Lowest ID with the given text.
    pub fn find_id(&self, text: &str) -> Option<usize> {
        self.ids.get(text).copied()
    }

    /// Text of `id`, or `None` when the slot is unnamed or out of range.
    pub fn find_text(&self, id: usize) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|i| self.symbols.get(i))
            .and_then(|s| s.as_deref())
    }

    /// Iterates slots in ID order.
    pub fn symbols(&self) -> impl Iterator<Item = Option<&str>> {
        self.symbols.iter().map(|s| s.as_deref())
    }
}

/// Any symbol table a cursor or encoder can resolve against.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolTable {
    /// The fixed table of a format version.
    System(Arc<SharedSymbolTable>),
    /// A table shared out of band, used directly.
    Shared(Arc<SharedSymbolTable>),
    /// A stream's local table (imports plus local symbols).
    Local(LocalSymbolTable),
}

impl SymbolTable {
    pub fn find_id(&self, text: &str) -> Option<usize> {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.find_id(text),
            SymbolTable::Local(t) => t.find_id(text),
        }
    }

    /// Text of `id`; `None` for ID 0, unnamed slots and IDs above `max_id`.
    pub fn find_text(&self, id: usize) -> Option<&str> {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.find_text(id),
            SymbolTable::Local(t) => t.find_text(id),
        }
    }

    pub fn max_id(&self) -> usize {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.max_id(),
            SymbolTable::Local(t) => t.max_id(),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, SymbolTable::System(_))
    }

    pub fn as_local(&self) -> Option<&LocalSymbolTable> {
        match self {
            SymbolTable::Local(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Element;

    #[test]
    fn test_ids_are_one_based_first_match() {
        let table = SharedSymbolTable::new("t", 1, ["a", "b", "a"]);
        assert_eq!(table.max_id(), 3);
        assert_eq!(table.find_id("a"), Some(1));
        assert_eq!(table.find_text(3), Some("a"));
        assert_eq!(table.find_text(0), None);
        assert_eq!(table.find_text(4), None);
    }

    #[test]
    fn test_placeholder_reserves_slots() {
        let table = SharedSymbolTable::placeholder("missing", 2, 3);
        assert_eq!(table.max_id(), 3);
        assert_eq!(table.find_text(2), None);
        assert_eq!(table.find_id("x"), None);
    }

    #[test]
    fn test_from_element() {
        let element = Element::from_fields([
            ("name", Element::from("com.example")),
            ("version", Element::from(2i64)),
            (
                "symbols",
                Element::list([Element::from("a"), Element::from(5i64), Element::from("c")]),
            ),
        ])
        .with_annotations([ION_SHARED_SYMBOL_TABLE]);

        let table = SharedSymbolTable::from_element(&element).unwrap();
        assert_eq!(table.name(), "com.example");
        assert_eq!(table.version(), 2);
        assert_eq!(table.max_id(), 3);
        assert_eq!(table.find_text(2), None);
        assert_eq!(table.find_id("c"), Some(3));
    }

    #[test]
    fn test_from_element_requires_name() {
        let element = Element::from_fields([("version", Element::from(1i64))])
            .with_annotations([ION_SHARED_SYMBOL_TABLE]);
        assert!(SharedSymbolTable::from_element(&element).is_err());
    }
}
