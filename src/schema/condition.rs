use serde::{Deserialize, Serialize};

use super::lenient;

/// Comparison applied between an environment value and a literal.
///
/// Operators this build does not know decode as [`ConditionOperator::Unknown`],
/// which always evaluates to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    #[serde(alias = "==", alias = "eq")]
    Equals,
    #[serde(alias = "!=", alias = "ne")]
    NotEquals,
    Contains,
    NotContains,
    #[serde(alias = ">", alias = "gt")]
    GreaterThan,
    #[serde(alias = ">=", alias = "gte")]
    GreaterThanOrEqual,
    #[serde(alias = "<", alias = "lt")]
    LessThan,
    #[serde(alias = "<=", alias = "lte")]
    LessThanOrEqual,
    Exists,
    #[default]
    #[serde(other)]
    Unknown,
}

/// `field` is a dot-path into the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub field: String,
    #[serde(default, deserialize_with = "operator")]
    pub operator: ConditionOperator,
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub value: String,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

fn operator<'de, D>(deserializer: D) -> Result<ConditionOperator, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient::optional(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_operators_decode() {
        let c: Condition = serde_json::from_value(json!({
            "field": "user.role", "operator": "notEquals", "value": "guest"
        }))
        .unwrap();
        assert_eq!(c.operator, ConditionOperator::NotEquals);

        let c: Condition = serde_json::from_value(json!({
            "field": "job.count", "operator": ">=", "value": 3
        }))
        .unwrap();
        assert_eq!(c.operator, ConditionOperator::GreaterThanOrEqual);
        assert_eq!(c.value, "3");
    }

    #[test]
    fn test_unknown_operator_falls_back() {
        let c: Condition = serde_json::from_value(json!({
            "field": "a", "operator": "matchesRegex", "value": ".*"
        }))
        .unwrap();
        assert_eq!(c.operator, ConditionOperator::Unknown);

        let c: Condition = serde_json::from_value(json!({"field": "a", "operator": 7})).unwrap();
        assert_eq!(c.operator, ConditionOperator::Unknown);
    }
}
