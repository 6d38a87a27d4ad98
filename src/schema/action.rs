use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lenient;

/// A user-triggered effect, packaged but never executed by the interpreter.
///
/// `kind` is free-form (`navigate`, `submit`, `call`, ...); the dispatcher
/// decides what each one means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub target: String,
    #[serde(default, deserialize_with = "lenient::scalar_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl Action {
    pub fn new(kind: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: target.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_parameters_are_stringified() {
        let action: Action = serde_json::from_value(json!({
            "type": "navigate",
            "target": "jobDetail",
            "parameters": {"jobId": 42, "urgent": true, "extra": {"nested": 1}}
        }))
        .unwrap();

        assert_eq!(action.kind, "navigate");
        assert_eq!(action.parameters.get("jobId").map(String::as_str), Some("42"));
        assert_eq!(action.parameters.get("urgent").map(String::as_str), Some("true"));
        assert!(!action.parameters.contains_key("extra"));
    }

    #[test]
    fn test_action_without_type_fails() {
        assert!(serde_json::from_value::<Action>(json!({"target": "home"})).is_err());
    }
}
