use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::lenient;
use super::ComponentNode;

/// A stored screen template.
///
/// `version` is opaque: documents with a version this build has never seen
/// still decode, and anything it cannot understand degrades per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDocument {
    pub id: String,
    #[serde(default = "default_version", deserialize_with = "version")]
    pub version: u64,
    #[serde(default, deserialize_with = "lenient::scalar_string")]
    pub title: String,
    #[serde(default, deserialize_with = "components")]
    pub components: Vec<ComponentNode>,
}

/// A node that will render degraded, found while scanning a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedNode {
    pub id: Option<String>,
    pub type_name: Option<String>,
    pub reason: String,
}

impl ScreenDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>, components: Vec<ComponentNode>) -> Self {
        Self {
            id: id.into(),
            version: default_version(),
            title: title.into(),
            components,
        }
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        Self::from_slice(input.as_bytes())
    }

    /// Decode a template of any nesting depth. The parser grows its stack on
    /// demand instead of failing the document at serde_json's recursion
    /// limit; nodes too deep to render degrade individually.
    pub fn from_slice(input: &[u8]) -> Result<Self, serde_json::Error> {
        let mut parser = serde_json::Deserializer::from_slice(input);
        parser.disable_recursion_limit();
        let document = Self::deserialize(serde_stacker::Deserializer::new(&mut parser))?;
        parser.end()?;
        Ok(document)
    }

    /// Every unsupported node in the template, in document order.
    pub fn degraded_nodes(&self) -> Vec<DegradedNode> {
        let mut found = Vec::new();
        for component in &self.components {
            component.walk(&mut |node| {
                if let ComponentNode::Unsupported(n) = node {
                    found.push(DegradedNode {
                        id: n.id.clone(),
                        type_name: n.type_name.clone(),
                        reason: n.reason.clone(),
                    });
                }
            });
        }
        found
    }
}

fn default_version() -> u64 {
    1
}

/// Top-level components, decoded straight from the parsed JSON so no
/// nesting level goes through another recursive deserializer.
fn components<'de, D>(deserializer: D) -> Result<Vec<ComponentNode>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().map(ComponentNode::from_value).collect()),
        Value::Null => Ok(Vec::new()),
        _ => {
            tracing::debug!("Ignoring non-array components field");
            Ok(Vec::new())
        }
    }
}

fn version<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::optional(deserializer)?.unwrap_or_else(default_version))
}
