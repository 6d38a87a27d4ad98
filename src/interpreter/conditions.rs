//! Visibility conditions.
//!
//! A node's conditions are ANDed; an empty list is always true. Anything
//! that cannot be evaluated cleanly is false: a missing field, an unknown
//! operator, or an environment value whose type the operator cannot compare
//! (arrays and objects for everything except `contains`/`notContains` on
//! arrays, non-numeric operands for ordering operators).
//!
//! Only JSON numbers compare numerically. A string binding compares as text
//! even when it looks like a number, so `"1.10"` never equals `"1.1"`.

use serde_json::Value;

use crate::interpreter::environment::Scope;
use crate::schema::{scalar_to_string, Condition, ConditionOperator};

/// True when every condition holds.
pub fn all_hold(conditions: &[Condition], scope: &Scope<'_>) -> bool {
    conditions.iter().all(|condition| holds(condition, scope))
}

pub fn holds(condition: &Condition, scope: &Scope<'_>) -> bool {
    if condition.operator == ConditionOperator::Unknown {
        tracing::debug!(field = %condition.field, "Unknown condition operator evaluates to false");
        return false;
    }
    let Some(actual) = scope.lookup(&condition.field) else {
        return false;
    };
    let expected = condition.value.as_str();

    match condition.operator {
        ConditionOperator::Exists => true,
        ConditionOperator::Equals => scalar_equals(actual, expected).unwrap_or(false),
        ConditionOperator::NotEquals => scalar_equals(actual, expected).is_some_and(|eq| !eq),
        ConditionOperator::Contains => contains(actual, expected).unwrap_or(false),
        ConditionOperator::NotContains => contains(actual, expected).is_some_and(|found| !found),
        ConditionOperator::GreaterThan => compare(actual, expected).is_some_and(|o| o.is_gt()),
        ConditionOperator::GreaterThanOrEqual => compare(actual, expected).is_some_and(|o| o.is_ge()),
        ConditionOperator::LessThan => compare(actual, expected).is_some_and(|o| o.is_lt()),
        ConditionOperator::LessThanOrEqual => compare(actual, expected).is_some_and(|o| o.is_le()),
        ConditionOperator::Unknown => false,
    }
}

/// `None` when `actual` is not a scalar. A numeric binding equals any
/// expected value that parses to the same number, so `3` matches `"3.0"`.
fn scalar_equals(actual: &Value, expected: &str) -> Option<bool> {
    let actual_str = scalar_to_string(actual)?;
    if let (Some(a), Some(b)) = (as_number(actual), expected.trim().parse::<f64>().ok()) {
        return Some(a == b);
    }
    Some(actual_str == expected)
}

fn contains(actual: &Value, expected: &str) -> Option<bool> {
    match actual {
        Value::Array(items) => Some(
            items
                .iter()
                .any(|item| scalar_equals(item, expected).unwrap_or(false)),
        ),
        Value::String(s) => Some(s.contains(expected)),
        _ => None,
    }
}

fn compare(actual: &Value, expected: &str) -> Option<std::cmp::Ordering> {
    let a = as_number(actual)?;
    let b = expected.trim().parse::<f64>().ok()?;
    a.partial_cmp(&b)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
