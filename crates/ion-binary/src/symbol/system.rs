//! System symbol tables.
//!
//! The system table of each supported version is built once per process and
//! shared read-only through [`SystemRegistry`].

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::{IonError, Result};
use crate::limits::ION_1_0;
use crate::symbol::{SharedSymbolTable, SymbolTable};

/// Name of the system table (also the first system symbol).
pub const ION: &str = "$ion";

/// Annotation marking a local symbol table definition.
pub const ION_SYMBOL_TABLE: &str = "$ion_symbol_table";

/// System symbols of Ion 1.0, IDs 1 through 9.
pub const ION_1_0_SYMBOLS: [&str; 9] = [
    ION,
    ION_1_0,
    ION_SYMBOL_TABLE,
    "name",
    "version",
    "imports",
    "symbols",
    "max_id",
    "$ion_shared_symbol_table",
];

/// Well-known system symbol IDs.
pub mod sid {
    pub const ION: usize = 1;
    pub const ION_1_0: usize = 2;
    pub const ION_SYMBOL_TABLE: usize = 3;
    pub const NAME: usize = 4;
    pub const VERSION: usize = 5;
    pub const IMPORTS: usize = 6;
    pub const SYMBOLS: usize = 7;
    pub const MAX_ID: usize = 8;
    pub const ION_SHARED_SYMBOL_TABLE: usize = 9;
}

lazy_static! {
    static ref DEFAULT_REGISTRY: Arc<SystemRegistry> = Arc::new(SystemRegistry::new());
}

/// Read-only registry of system symbol tables, keyed by version identifier.
#[derive(Debug)]
pub struct SystemRegistry {
    ion_1_0: Arc<SharedSymbolTable>,
    ion_1_0_table: Arc<SymbolTable>,
}

impl SystemRegistry {
    fn new() -> SystemRegistry {
        let ion_1_0 = Arc::new(SharedSymbolTable::new(ION, 1, ION_1_0_SYMBOLS));
        let ion_1_0_table = Arc::new(SymbolTable::System(Arc::clone(&ion_1_0)));
        SystemRegistry {
            ion_1_0,
            ion_1_0_table,
        }
    }

    /// The process-wide registry.
    pub fn shared() -> Arc<SystemRegistry> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    /// The Ion 1.0 system table as an importable shared table.
    pub fn ion_1_0(&self) -> &Arc<SharedSymbolTable> {
        &self.ion_1_0
    }

    /// System table for a version identifier such as `"$ion_1_0"`.
    pub fn system_table(&self, version_id: &str) -> Result<Arc<SymbolTable>> {
        match version_id {
            ION_1_0 => Ok(Arc::clone(&self.ion_1_0_table)),
            other => Err(IonError::UnsupportedVersion {
                version: other.to_string(),
            }),
        }
    }

    /// The same table as an importable shared table.
    pub fn system_import(&self, version_id: &str) -> Result<Arc<SharedSymbolTable>> {
        match version_id {
            ION_1_0 => Ok(Arc::clone(&self.ion_1_0)),
            other => Err(IonError::UnsupportedVersion {
                version: other.to_string(),
            }),
        }
    }
}

/// System table for `version_id` from the process-wide registry.
pub fn system_table(version_id: &str) -> Result<Arc<SymbolTable>> {
    DEFAULT_REGISTRY.system_table(version_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_ion_1_0_symbols() {
        let table = system_table(ION_1_0).unwrap();
        assert!(table.is_system());
        assert_eq!(table.max_id(), 9);
        assert_eq!(table.find_text(sid::ION_SYMBOL_TABLE), Some(ION_SYMBOL_TABLE));
        assert_eq!(table.find_id("max_id"), Some(sid::MAX_ID));
        assert_eq!(table.find_text(0), None);
        assert_eq!(table.find_text(10), None);
    }

    #[test]
    fn test_registry_is_shared() {
        let a = system_table(ION_1_0).unwrap();
        let b = SystemRegistry::shared().system_table(ION_1_0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unsupported_version() {
        let err = system_table("$ion_2_0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
    }
}
