//! Data model types.
//!
//! - Value type tags ([`IonType`])
//! - Numbers ([`Int`], [`Decimal`]) and [`Timestamp`]s
//! - Symbol tokens
//! - The immutable value tree ([`Element`])

pub mod element;
pub mod number;
pub mod symbol;
pub mod timestamp;
pub mod types;

pub use element::{Element, Value};
pub use number::{Coefficient, Decimal, Int};
pub use symbol::SymbolToken;
pub use timestamp::{Precision, Timestamp, TimestampBuilder};
pub use types::IonType;
