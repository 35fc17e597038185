//! Errors raised while wrapping serialized scenes

use serde_json::Value;

/// Scene wrapping errors
///
/// Only the root is validated strictly. Malformed children and display
/// entries further down the tree are skipped instead of failing the wrap.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The scene root was not a JSON object
    #[error("scene root must be an object, found {found}")]
    NotAnObject {
        /// JSON kind that was found instead
        found: &'static str,
    },

    /// The input was not valid JSON
    #[error("invalid scene json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Short name of a JSON value's kind for diagnostics
#[must_use]
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
