use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;

/// Types a model is asked to return as JSON.
///
/// Automatically implemented for any type that implements `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// JSON schema for this type, trimmed for embedding in a prompt.
    fn prompt_schema() -> serde_json::Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        if let serde_json::Value::Object(map) = &mut value {
            map.remove("$schema");
            map.remove("definitions");
            map.remove("title");
        }

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Verdict {
        /// Whether the answer was right
        correct: bool,
        note: Option<String>,
    }

    #[test]
    fn prompt_schema_lists_properties_without_meta_keys() {
        let schema = Verdict::prompt_schema();
        assert!(schema.get("$schema").is_none());
        assert!(schema["properties"].get("correct").is_some());
        assert!(schema["properties"].get("note").is_some());
    }
}
