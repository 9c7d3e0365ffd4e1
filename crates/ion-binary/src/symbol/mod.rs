//! Symbol tables.
//!
//! Symbols travel as integer IDs. This module maps IDs to text through the
//! system table of the format version, local tables declared in the stream,
//! and shared tables resolved through a [`Catalog`].

pub mod catalog;
pub mod local;
pub mod system;
pub mod table;

pub use catalog::{Catalog, SimpleCatalog};
pub use local::{Import, LocalSymbolTable, LocalSymbolTableBuilder};
pub use system::{system_table, SystemRegistry, ION_SYMBOL_TABLE};
pub use table::{SharedSymbolTable, SymbolTable, ION_SHARED_SYMBOL_TABLE};
