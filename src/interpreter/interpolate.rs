//! `{{path}}` token substitution.
//!
//! Resolved values are stringified and substituted; unresolved tokens are
//! left verbatim so binding mistakes stay visible. Substituted text is not
//! rescanned.

use serde_json::Value;

use crate::interpreter::environment::Scope;
use crate::schema::scalar_to_string;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub text: String,
    /// Paths of tokens that had no binding, in order of appearance.
    pub unresolved: Vec<String>,
}

pub fn interpolate(template: &str, scope: &Scope<'_>) -> Interpolated {
    let mut text = String::with_capacity(template.len());
    let mut unresolved = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        text.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let path = after_open[..end].trim();
        if !is_path(path) {
            // Not a token; emit one brace and rescan from the next one.
            text.push('{');
            rest = &rest[start + 1..];
            continue;
        }

        let token = &rest[start..start + OPEN.len() + end + CLOSE.len()];
        match scope.lookup(path).map(stringify) {
            Some(value) => text.push_str(&value),
            None => {
                text.push_str(token);
                unresolved.push(path.to_string());
            }
        }
        rest = &after_open[end + CLOSE.len()..];
    }
    text.push_str(rest);

    Interpolated { text, unresolved }
}

/// True when `template` contains at least one token-shaped substring.
pub fn has_tokens(template: &str) -> bool {
    template.contains(OPEN)
}

fn is_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn stringify(value: &Value) -> String {
    scalar_to_string(value).unwrap_or_else(|| value.to_string())
}
