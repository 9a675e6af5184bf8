//! migrun core - error and logging facilities shared by the store and CLI
//!
//! - `errors`: `ExError` structured errors and the `MigrateError` taxonomy
//! - `logging_facility`: one-shot tracing initialisation and operation macros
//! - `schema`: canonical log field names

pub mod errors;
pub mod logging_facility;
pub mod schema;

pub use errors::{ExError, ExErrorKind, MigrateError, Result};
