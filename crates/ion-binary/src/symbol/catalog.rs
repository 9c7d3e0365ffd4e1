//! Catalogs of shared symbol tables.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::symbol::SharedSymbolTable;

/// Source of shared symbol tables for resolving imports.
pub trait Catalog: Debug + Send + Sync {
    /// Returns the table `name` at `version`, or the best available stand-in.
    ///
    /// `max_id` is the size the importing stream declared, if any.
    fn resolve(
        &self,
        name: &str,
        version: u32,
        max_id: Option<usize>,
    ) -> Option<Arc<SharedSymbolTable>>;
}

/// In-memory catalog.
///
/// Resolves the exact version when present, else the highest version below the
/// requested one, else nothing.
#[derive(Debug, Default)]
pub struct SimpleCatalog {
    tables: RwLock<FxHashMap<String, BTreeMap<u32, Arc<SharedSymbolTable>>>>,
}

impl SimpleCatalog {
    pub fn new() -> SimpleCatalog {
        SimpleCatalog::default()
    }

    /// Adds (or replaces) a table.
    pub fn put(&self, table: impl Into<Arc<SharedSymbolTable>>) {
        let table = table.into();
        let mut tables = self
            .tables
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tables
            .entry(table.name().to_string())
            .or_default()
            .insert(table.version(), table);
    }

    /// Number of tables held.
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for SimpleCatalog {
    fn resolve(
        &self,
        name: &str,
        version: u32,
        _max_id: Option<usize>,
    ) -> Option<Arc<SharedSymbolTable>> {
        let tables = self
            .tables
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let versions = tables.get(name)?;
        versions
            .range(..=version)
            .next_back()
            .map(|(_, table)| Arc::clone(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SimpleCatalog {
        let catalog = SimpleCatalog::new();
        catalog.put(SharedSymbolTable::new("t", 1, ["a"]));
        catalog.put(SharedSymbolTable::new("t", 3, ["a", "b", "c"]));
        catalog
    }

    #[test]
    fn test_exact_match() {
        let table = catalog().resolve("t", 3, None).unwrap();
        assert_eq!(table.version(), 3);
    }

    #[test]
    fn test_highest_lower_version() {
        let table = catalog().resolve("t", 2, Some(2)).unwrap();
        assert_eq!(table.version(), 1);
        let table = catalog().resolve("t", 9, None).unwrap();
        assert_eq!(table.version(), 3);
    }

    #[test]
    fn test_missing() {
        let catalog = catalog();
        assert!(catalog.resolve("other", 1, None).is_none());
        assert!(catalog.resolve("t", 0, None).is_none());
        assert_eq!(catalog.len(), 2);
    }
}
