//! JSON Schema validation for rule tables.
//!
//! Rule tables are validated against schema/legal-rules.schema.json before
//! they are deserialized, so malformed seed files fail with a list of
//! field-level errors instead of a single serde message.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded rule-table schema (loaded at compile time).
const RULE_TABLE_SCHEMA_JSON: &str = include_str!("../../../../schema/legal-rules.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(RULE_TABLE_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a rule table JSON value against the schema.
///
/// Returns every violation as "<message> at <instance path>".
pub fn validate_rule_table_schema(table_json: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(table_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
