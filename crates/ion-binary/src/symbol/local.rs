//! Local symbol tables: an import chain followed by stream-local symbols.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::error::{IonError, Result};
use crate::model::{Element, IonType, Value};
use crate::symbol::system::{ION, ION_SYMBOL_TABLE};
use crate::symbol::{Catalog, SharedSymbolTable, SymbolTable};

/// One entry of a local table's import chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    table: Arc<SharedSymbolTable>,
    /// IDs of this import are `offset + 1 ..= offset + max_id`.
    offset: usize,
    max_id: usize,
    resolved: bool,
}

impl Import {
    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn version(&self) -> u32 {
        self.table.version()
    }

    /// Number of IDs this import reserves.
    pub fn max_id(&self) -> usize {
        self.max_id
    }

    /// Highest ID below this import's range.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// False when the catalog could not supply the table and its slots are
    /// unnamed placeholders.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn table(&self) -> &Arc<SharedSymbolTable> {
        &self.table
    }
}

/// A stream's symbol table.
///
/// IDs `1..=max_imported_id` belong to the imports in order; local symbols
/// follow. Text lookup is first-match-wins across the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSymbolTable {
    imports: Vec<Import>,
    max_imported_id: usize,
    symbols: Vec<Option<String>>,
    ids: FxHashMap<String, usize>,
}

impl LocalSymbolTable {
    /// A table importing only `system`.
    pub fn new(system: Arc<SharedSymbolTable>) -> LocalSymbolTable {
        LocalSymbolTable::builder().import(system).build()
    }

    /// Builds a table from an explicit import chain.
    ///
    /// Unlike [`from_struct`](Self::from_struct), nothing is imported
    /// implicitly; tables shared out of band are assembled this way.
    pub fn builder() -> LocalSymbolTableBuilder {
        LocalSymbolTableBuilder::default()
    }

    /// Interprets an in-stream `$ion_symbol_table::{imports, symbols}` struct.
    ///
    /// `system` is always the first import. `imports: $ion_symbol_table`
    /// appends to `current` instead. Imports the catalog cannot resolve
    /// reserve their declared `max_id` as unnamed slots, or fail with
    /// `UnresolvedImport` when `strict` is set.
    pub fn from_struct(
        element: &Element,
        catalog: &dyn Catalog,
        system: &Arc<SharedSymbolTable>,
        current: &SymbolTable,
        strict: bool,
    ) -> Result<LocalSymbolTable> {
        let fields = element
            .as_struct()
            .ok_or(IonError::malformed("local symbol table", "expected a struct"))?;

        let mut imports_field = None;
        let mut symbols_field = None;
        for (name, value) in fields {
            let slot = match name.as_text() {
                Some("imports") => &mut imports_field,
                Some("symbols") => &mut symbols_field,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(IonError::malformed(
                    "local symbol table",
                    "repeated imports or symbols field",
                ));
            }
        }

        let mut table = match imports_field.map(|v| &v.value) {
            Some(Value::Symbol(token)) if token.as_text() == Some(ION_SYMBOL_TABLE) => {
                match current {
                    SymbolTable::Local(local) => local.clone(),
                    _ => LocalSymbolTable::new(Arc::clone(system)),
                }
            }
            Some(Value::List(entries)) => resolve_imports(entries, catalog, system, strict)?.build(),
            _ => LocalSymbolTable::new(Arc::clone(system)),
        };

        if let Some(Value::List(symbols)) = symbols_field.map(|v| &v.value) {
            for symbol in symbols {
                let text = match &symbol.value {
                    Value::String(text) => Some(text.clone()),
                    _ => None,
                };
                table.add_symbol(text);
            }
        }

        Ok(table)
    }

    /// Lowest ID with the given text.
    pub fn find_id(&self, text: &str) -> Option<usize> {
        for import in &self.imports {
            if let Some(id) = import.table.find_id(text) {
                if id <= import.max_id {
                    return Some(import.offset + id);
                }
            }
        }
        self.ids.get(text).copied()
    }

    /// Text of `id`; `None` for ID 0, unnamed slots and IDs above `max_id`.
    pub fn find_text(&self, id: usize) -> Option<&str> {
        if id == 0 {
            return None;
        }
        if id <= self.max_imported_id {
            let import = self.imports.iter().find(|i| id <= i.offset + i.max_id)?;
            return import.table.find_text(id - import.offset);
        }
        self.symbols
            .get(id - self.max_imported_id - 1)
            .and_then(|s| s.as_deref())
    }

    pub fn max_id(&self) -> usize {
        self.max_imported_id + self.symbols.len()
    }

    pub fn max_imported_id(&self) -> usize {
        self.max_imported_id
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Local symbols in ID order.
    pub fn local_symbols(&self) -> impl Iterator<Item = Option<&str>> {
        self.symbols.iter().map(|s| s.as_deref())
    }

    /// Appends a local slot and returns its ID.
    pub fn add_symbol(&mut self, text: Option<String>) -> usize {
        let id = self.max_id() + 1;
        if let Some(text) = &text {
            if self.find_id(text).is_none() {
                self.ids.insert(text.clone(), id);
            }
        }
        self.symbols.push(text);
        id
    }

    /// Returns the ID of `text`, appending it as a local symbol if absent.
    pub fn intern(&mut self, text: &str) -> usize {
        match self.find_id(text) {
            Some(id) => id,
            None => self.add_symbol(Some(text.to_string())),
        }
    }

    /// The `$ion_symbol_table` struct that recreates this table, assuming the
    /// system table is imported implicitly.
    pub fn to_element(&self) -> Element {
        let imports: Vec<Element> = self
            .imports
            .iter()
            .filter(|i| i.name() != ION)
            .map(|i| {
                Element::from_fields([
                    ("name", Element::from(i.name())),
                    ("version", Element::from(i64::from(i.version()))),
                    ("max_id", Element::from(i.max_id() as i64)),
                ])
            })
            .collect();

        let mut fields = Vec::with_capacity(2);
        if !imports.is_empty() {
            fields.push(("imports", Element::list(imports)));
        }
        if !self.symbols.is_empty() {
            let symbols = self.symbols.iter().map(|s| match s {
                Some(text) => Element::from(text.as_str()),
                None => Element::null(IonType::Null),
            });
            fields.push(("symbols", Element::list(symbols)));
        }
        Element::from_fields(fields).with_annotations([ION_SYMBOL_TABLE])
    }
}

fn resolve_imports(
    entries: &[Element],
    catalog: &dyn Catalog,
    system: &Arc<SharedSymbolTable>,
    strict: bool,
) -> Result<LocalSymbolTableBuilder> {
    let mut builder = LocalSymbolTable::builder().import(Arc::clone(system));

    for entry in entries {
        let name = match entry.get("name").map(|n| &n.value) {
            Some(Value::String(name)) if !name.is_empty() && name != ION => name.as_str(),
            _ => continue,
        };
        let version = entry
            .get("version")
            .and_then(Element::as_i64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v >= 1)
            .unwrap_or(1);
        let max_id = entry
            .get("max_id")
            .and_then(Element::as_i64)
            .and_then(|v| usize::try_from(v).ok());

        match catalog.resolve(name, version, max_id) {
            Some(table) => {
                if table.version() != version {
                    let Some(max_id) = max_id else {
                        return Err(IonError::malformed(
                            "symbol table import",
                            "inexact catalog match requires max_id",
                        ));
                    };
                    warn!(
                        table = name,
                        requested = version,
                        found = table.version(),
                        max_id,
                        "using inexact shared symbol table match"
                    );
                }
                let max_id = max_id.unwrap_or(table.max_id());
                builder = builder.import_with_max_id(table, max_id);
            }
            None => {
                if strict {
                    return Err(IonError::UnresolvedImport {
                        name: name.to_string(),
                        version,
                    });
                }
                let Some(max_id) = max_id else {
                    return Err(IonError::malformed(
                        "symbol table import",
                        "unresolved import requires max_id",
                    ));
                };
                warn!(
                    table = name,
                    version,
                    max_id,
                    "shared symbol table not in catalog; its symbols have unknown text"
                );
                builder = builder.unresolved_import(name, version, max_id);
            }
        }
    }

    Ok(builder)
}

/// Builder for [`LocalSymbolTable`].
#[derive(Debug, Clone, Default)]
pub struct LocalSymbolTableBuilder {
    imports: Vec<Import>,
    max_imported_id: usize,
    symbols: Vec<Option<String>>,
}

impl LocalSymbolTableBuilder {
    /// Imports every symbol of `table`.
    pub fn import(self, table: Arc<SharedSymbolTable>) -> Self {
        let max_id = table.max_id();
        self.push_import(table, max_id, true)
    }

    /// Imports the first `max_id` IDs of `table` (unnamed beyond its end).
    pub fn import_with_max_id(self, table: Arc<SharedSymbolTable>, max_id: usize) -> Self {
        self.push_import(table, max_id, true)
    }

    /// Reserves `max_id` unnamed IDs for a table that is not available.
    pub fn unresolved_import(self, name: &str, version: u32, max_id: usize) -> Self {
        let placeholder = Arc::new(SharedSymbolTable::placeholder(name, version, max_id));
        self.push_import(placeholder, max_id, false)
    }

    /// Appends a local symbol.
    pub fn symbol(mut self, text: impl Into<String>) -> Self {
        self.symbols.push(Some(text.into()));
        self
    }

    /// Appends an unnamed local slot.
    pub fn unnamed_symbol(mut self) -> Self {
        self.symbols.push(None);
        self
    }

    fn push_import(mut self, table: Arc<SharedSymbolTable>, max_id: usize, resolved: bool) -> Self {
        self.imports.push(Import {
            table,
            offset: self.max_imported_id,
            max_id,
            resolved,
        });
        self.max_imported_id += max_id;
        self
    }

    pub fn build(self) -> LocalSymbolTable {
        let mut table = LocalSymbolTable {
            imports: self.imports,
            max_imported_id: self.max_imported_id,
            symbols: Vec::with_capacity(self.symbols.len()),
            ids: FxHashMap::default(),
        };
        for symbol in self.symbols {
            table.add_symbol(symbol);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::SymbolToken;
    use crate::symbol::{SimpleCatalog, SystemRegistry};

    fn system() -> Arc<SharedSymbolTable> {
        SystemRegistry::shared().system_import("$ion_1_0").unwrap()
    }

    fn system_symbols() -> SymbolTable {
        SymbolTable::System(system())
    }

    fn lst(fields: Vec<(&str, Element)>) -> Element {
        Element::from_fields(fields).with_annotations([ION_SYMBOL_TABLE])
    }

    fn import(name: &str, version: i64, max_id: Option<i64>) -> Element {
        let mut fields = vec![("name", Element::from(name)), ("version", Element::from(version))];
        if let Some(max_id) = max_id {
            fields.push(("max_id", Element::from(max_id)));
        }
        Element::from_fields(fields)
    }

    #[test]
    fn test_id_stability_with_unresolved_import() {
        let a = Arc::new(SharedSymbolTable::new("A", 1, ["a1", "a2", "a3", "a4", "a5"]));

        let resolved = LocalSymbolTable::builder()
            .import(Arc::clone(&a))
            .import(Arc::new(SharedSymbolTable::new("B", 1, ["b1", "b2", "b3"])))
            .symbol("local")
            .build();
        let unresolved = LocalSymbolTable::builder()
            .import(a)
            .unresolved_import("B", 1, 3)
            .symbol("local")
            .build();

        assert_eq!(resolved.find_id("local"), Some(9));
        assert_eq!(unresolved.find_id("local"), Some(9));
        assert_eq!(unresolved.find_text(7), None);
        assert_eq!(resolved.find_text(7), Some("b2"));
        assert!(!unresolved.imports()[1].is_resolved());
    }

    #[test]
    fn test_chain_of_three_and_two() {
        let table = LocalSymbolTable::builder()
            .import(Arc::new(SharedSymbolTable::new("first", 1, ["x", "y", "z"])))
            .import(Arc::new(SharedSymbolTable::new("second", 1, ["p", "q"])))
            .symbol("name")
            .build();
        assert_eq!(table.max_imported_id(), 5);
        assert_eq!(table.find_id("name"), Some(6));
        assert_eq!(table.find_text(6), Some("name"));
        assert_eq!(table.find_text(4), Some("p"));
        assert_eq!(table.find_text(7), None);
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = LocalSymbolTable::new(system());
        let id = table.add_symbol(Some("name".to_string()));
        assert_eq!(id, 10);
        assert_eq!(table.find_id("name"), Some(4));
        assert_eq!(table.find_text(10), Some("name"));
        assert_eq!(table.intern("fresh"), 11);
        assert_eq!(table.intern("fresh"), 11);
    }

    #[test]
    fn test_from_struct_with_catalog() {
        let catalog = SimpleCatalog::new();
        catalog.put(SharedSymbolTable::new("com.example", 1, ["a", "b", "c", "d", "e", "f", "g", "h"]));

        let element = lst(vec![
            ("imports", Element::list([import("com.example", 1, None)])),
            ("symbols", Element::list([Element::from("local")])),
        ]);
        let table =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap();
        // 9 system symbols + 8 imported, then the local one.
        assert_eq!(table.find_id("local"), Some(18));
        assert_eq!(table.find_text(10), Some("a"));
    }

    #[test]
    fn test_from_struct_unresolved_import() {
        let catalog = SimpleCatalog::new();
        let element = lst(vec![
            ("imports", Element::list([import("missing", 2, Some(4))])),
            ("symbols", Element::list([Element::from("x")])),
        ]);

        let table =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap();
        assert_eq!(table.find_id("x"), Some(14));
        assert_eq!(table.find_text(12), None);

        let err =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), true)
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedImport);
    }

    #[test]
    fn test_from_struct_unresolved_without_max_id() {
        let catalog = SimpleCatalog::new();
        let element = lst(vec![("imports", Element::list([import("missing", 1, None)]))]);
        let err =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_from_struct_append() {
        let catalog = SimpleCatalog::new();
        let mut current = LocalSymbolTable::new(system());
        current.add_symbol(Some("one".to_string()));

        let element = lst(vec![
            ("imports", Element::symbol(ION_SYMBOL_TABLE)),
            ("symbols", Element::list([Element::from("two")])),
        ]);
        let table = LocalSymbolTable::from_struct(
            &element,
            &catalog,
            &system(),
            &SymbolTable::Local(current),
            false,
        )
        .unwrap();
        assert_eq!(table.find_id("one"), Some(10));
        assert_eq!(table.find_id("two"), Some(11));
    }

    #[test]
    fn test_from_struct_non_string_symbols_reserve_slots() {
        let catalog = SimpleCatalog::new();
        let element = lst(vec![(
            "symbols",
            Element::list([Element::from("a"), Element::from(7i64), Element::from("b")]),
        )]);
        let table =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap();
        assert_eq!(table.find_text(11), None);
        assert_eq!(table.find_id("b"), Some(12));
    }

    #[test]
    fn test_from_struct_rejects_repeated_fields() {
        let catalog = SimpleCatalog::new();
        let element = lst(vec![
            ("symbols", Element::list([Element::from("a")])),
            ("symbols", Element::list([Element::from("b")])),
        ]);
        let err =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_to_element_roundtrip() {
        let catalog = SimpleCatalog::new();
        catalog.put(SharedSymbolTable::new("shared", 1, ["s1", "s2"]));
        let table = LocalSymbolTable::builder()
            .import(system())
            .import(Arc::new(SharedSymbolTable::new("shared", 1, ["s1", "s2"])))
            .symbol("local")
            .build();

        let element = table.to_element();
        assert_eq!(element.annotations, vec![SymbolToken::text(ION_SYMBOL_TABLE)]);
        let rebuilt =
            LocalSymbolTable::from_struct(&element, &catalog, &system(), &system_symbols(), false)
                .unwrap();
        assert_eq!(rebuilt.find_id("local"), Some(12));
        assert_eq!(rebuilt.find_text(11), Some("s2"));
    }
}
