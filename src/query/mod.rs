//! Query translator boundary.
//!
//! Free text goes to the external query-language service, the returned DSL is
//! repaired for the backend grammar's dialect, then split into structured
//! entities that every backend of a run shares read-only.

pub mod dsl;
pub mod translator;

pub use dsl::{ClauseParser, EntityParser, QueryEntity, StructuredQuery, repair_dsl};
pub use translator::{HttpTranslator, QueryTranslation, QueryTranslator};
