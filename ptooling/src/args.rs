//! JSON argument helpers for structured tool inputs.
//!
//! ```rust
//! use ptooling::{input_object, required_string};
//! use serde_json::json;
//!
//! let input = json!({"skill_name": "xlsx"});
//! let args = input_object(&input).expect("object should parse");
//! let name = required_string(args, "skill_name").expect("name should be present");
//! assert_eq!(name, "xlsx");
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub fn input_object(input: &Value) -> Result<&Map<String, Value>, ToolError> {
    input
        .as_object()
        .ok_or_else(|| ToolError::invalid_arguments("expected JSON object arguments"))
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extract_required_string_from_object() {
        let input = json!({"query": "rust"});
        let args = input_object(&input).expect("args should be an object");
        let query = required_string(args, "query").expect("query should exist");
        assert_eq!(query, "rust");
    }

    #[test]
    fn non_object_input_returns_invalid_arguments() {
        let error = input_object(&json!(["a"])).expect_err("array should fail");
        assert_eq!(error.kind, crate::ToolErrorKind::InvalidArguments);
    }

    #[test]
    fn non_string_value_is_reported_missing() {
        let input = json!({"skill_name": 7});
        let args = input_object(&input).expect("args should be an object");
        let error = required_string(args, "skill_name").expect_err("number is not a string");
        assert_eq!(error.message, "missing required string: 'skill_name'");
    }
}
