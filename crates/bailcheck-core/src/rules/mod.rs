//! Legal rule tables.
//!
//! Rule tables are structured data validated against JSON Schema.
//! This module handles parsing YAML/JSON tables, validating them, and
//! resolving section numbers to rules.

mod schema;
mod table;

pub use schema::{validate_rule_table_schema, SchemaError};
pub use table::{RuleTable, RuleTableError};
