//! Component nodes: the tagged union a screen template is built from.
//!
//! Decoding never fails for a node that is a JSON object: unknown or missing
//! `type` tags, list nodes lacking their binding fields and nodes nested
//! deeper than [`MAX_DECODE_DEPTH`] decode as [`ComponentNode::Unsupported`]
//! with the raw JSON kept for diagnostics and re-encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::lenient;
use super::{Action, Condition, Style};

/// Node nesting past which subtrees are not decoded. Deeper than any
/// interpreter depth limit, so such nodes could never render anyway.
pub const MAX_DECODE_DEPTH: usize = 512;

/// Fields every node variant may carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCommon {
    pub id: Option<String>,
    pub style: Option<Style>,
    pub action: Option<Action>,
    pub conditions: Vec<Condition>,
}

impl NodeCommon {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    VStack,
    HStack,
    ZStack,
    Card,
}

impl ContainerKind {
    pub fn tag(self) -> &'static str {
        match self {
            ContainerKind::VStack => "vstack",
            ContainerKind::HStack => "hstack",
            ContainerKind::ZStack => "zstack",
            ContainerKind::Card => "card",
        }
    }
}

/// Where an image comes from. Remote URLs may contain `{{path}}` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Bundled(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub common: NodeCommon,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonNode {
    pub common: NodeCommon,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub common: NodeCommon,
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub common: NodeCommon,
    pub kind: ContainerKind,
    pub children: Vec<ComponentNode>,
}

/// A node repeated once per element of an environment array.
#[derive(Debug, Clone, PartialEq)]
pub struct ListNode {
    pub common: NodeCommon,
    pub data_source: String,
    pub item_template: Box<ComponentNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedNode {
    pub id: Option<String>,
    pub type_name: Option<String>,
    /// Still gate visibility, decoded leniently from `raw`.
    pub conditions: Vec<Condition>,
    pub reason: String,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentNode {
    Text(TextNode),
    Button(ButtonNode),
    Image(ImageNode),
    Container(ContainerNode),
    List(ListNode),
    Spacer(NodeCommon),
    Divider(NodeCommon),
    Unsupported(UnsupportedNode),
}

impl ComponentNode {
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        ComponentNode::Text(TextNode {
            common: NodeCommon::with_id(id),
            text: text.into(),
        })
    }

    pub fn container(
        kind: ContainerKind,
        id: impl Into<String>,
        children: Vec<ComponentNode>,
    ) -> Self {
        ComponentNode::Container(ContainerNode {
            common: NodeCommon::with_id(id),
            kind,
            children,
        })
    }

    pub fn list(
        id: impl Into<String>,
        data_source: impl Into<String>,
        item_template: ComponentNode,
    ) -> Self {
        ComponentNode::List(ListNode {
            common: NodeCommon::with_id(id),
            data_source: data_source.into(),
            item_template: Box::new(item_template),
        })
    }

    /// Shared fields, or `None` for an unsupported node.
    pub fn common(&self) -> Option<&NodeCommon> {
        match self {
            ComponentNode::Text(n) => Some(&n.common),
            ComponentNode::Button(n) => Some(&n.common),
            ComponentNode::Image(n) => Some(&n.common),
            ComponentNode::Container(n) => Some(&n.common),
            ComponentNode::List(n) => Some(&n.common),
            ComponentNode::Spacer(c) | ComponentNode::Divider(c) => Some(c),
            ComponentNode::Unsupported(_) => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            ComponentNode::Unsupported(n) => n.id.as_deref(),
            other => other.common().and_then(|c| c.id.as_deref()),
        }
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ComponentNode::Text(_) => Some("text"),
            ComponentNode::Button(_) => Some("button"),
            ComponentNode::Image(_) => Some("image"),
            ComponentNode::Container(n) => Some(n.kind.tag()),
            ComponentNode::List(_) => Some("list"),
            ComponentNode::Spacer(_) => Some("spacer"),
            ComponentNode::Divider(_) => Some("divider"),
            ComponentNode::Unsupported(n) => n.type_name.as_deref(),
        }
    }

    /// Conditions gating this node, including an unsupported one.
    pub fn conditions(&self) -> &[Condition] {
        match self {
            ComponentNode::Unsupported(n) => &n.conditions,
            other => other.common().map(|c| c.conditions.as_slice()).unwrap_or_default(),
        }
    }

    /// Decode a node from raw JSON. Never fails; see the module docs.
    pub fn from_value(raw: Value) -> Self {
        decode_at(raw, 0)
    }

    /// Visit this node and every template descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ComponentNode)) {
        visit(self);
        match self {
            ComponentNode::Container(n) => n.children.iter().for_each(|c| c.walk(visit)),
            ComponentNode::List(n) => n.item_template.walk(visit),
            _ => {}
        }
    }
}

fn decode_at(raw: Value, depth: usize) -> ComponentNode {
    let mut fields = match raw {
        Value::Object(fields) => fields,
        other => return unsupported(None, None, Vec::new(), "node is not a JSON object", other),
    };
    if depth >= MAX_DECODE_DEPTH {
        return too_deep(fields);
    }

    // Nested nodes are moved out so each level decodes only its own fields.
    let nested = Nested {
        children: fields.remove("children"),
        item_template: fields.remove("itemTemplate"),
    };
    let shallow = Value::Object(fields);
    match WireNode::deserialize(&shallow) {
        Ok(wire) => wire.into_node(shallow, nested, depth),
        Err(err) => {
            let reason = format!("undecodable node: {err}");
            unsupported(None, None, Vec::new(), &reason, nested.reattach(shallow))
        }
    }
}

/// Keep only the scalar fields of an over-deep node and tear the rest down
/// without recursing.
fn too_deep(fields: serde_json::Map<String, Value>) -> ComponentNode {
    let id = fields.get("id").and_then(Value::as_str).map(str::to_string);
    let type_name = fields.get("type").and_then(Value::as_str).map(str::to_string);

    let mut kept = serde_json::Map::new();
    let mut pending = Vec::new();
    for (key, value) in fields {
        if value.is_array() || value.is_object() {
            pending.push(value);
        } else {
            kept.insert(key, value);
        }
    }
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            _ => {}
        }
    }

    let reason = format!("nested deeper than {MAX_DECODE_DEPTH} levels");
    unsupported(id, type_name, Vec::new(), &reason, Value::Object(kept))
}

fn unsupported(
    id: Option<String>,
    type_name: Option<String>,
    conditions: Vec<Condition>,
    reason: &str,
    raw: Value,
) -> ComponentNode {
    ComponentNode::Unsupported(UnsupportedNode {
        id,
        type_name,
        conditions,
        reason: reason.to_string(),
        raw,
    })
}

/// Undecoded `children` / `itemTemplate` of a node.
struct Nested {
    children: Option<Value>,
    item_template: Option<Value>,
}

impl Nested {
    /// Put the nested fields back for a node kept as raw JSON.
    fn reattach(self, shallow: Value) -> Value {
        let mut fields = match shallow {
            Value::Object(fields) => fields,
            other => return other,
        };
        if let Some(children) = self.children {
            fields.insert("children".to_string(), children);
        }
        if let Some(item_template) = self.item_template {
            fields.insert("itemTemplate".to_string(), item_template);
        }
        Value::Object(fields)
    }

    fn children(&mut self, depth: usize) -> Vec<ComponentNode> {
        match self.children.take() {
            Some(Value::Array(items)) => items.into_iter().map(|c| decode_at(c, depth + 1)).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                tracing::debug!("Ignoring non-array sequence field");
                Vec::new()
            }
        }
    }
}

/// Flat wire shape shared by every variant.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNode {
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    style: Option<Style>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    action: Option<Action>,
    #[serde(default, deserialize_with = "lenient::sequence", skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
    #[serde(default, deserialize_with = "lenient::sequence", skip_serializing_if = "Vec::is_empty")]
    children: Vec<ComponentNode>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    data_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    item_template: Option<Box<ComponentNode>>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional", skip_serializing_if = "Option::is_none")]
    image_name: Option<String>,
}

impl WireNode {
    /// Build the node from shallow fields decoded off `shallow`, with the
    /// nested fields still undecoded in `nested`.
    fn into_node(self, shallow: Value, mut nested: Nested, depth: usize) -> ComponentNode {
        let Some(kind) = self.kind else {
            let raw = nested.reattach(shallow);
            return unsupported(self.id, None, self.conditions, "missing required field `type`", raw);
        };
        let common = NodeCommon {
            id: self.id,
            style: self.style,
            action: self.action,
            conditions: self.conditions,
        };
        let container_kind = match kind.as_str() {
            "vstack" => Some(ContainerKind::VStack),
            "hstack" => Some(ContainerKind::HStack),
            "zstack" => Some(ContainerKind::ZStack),
            "card" => Some(ContainerKind::Card),
            _ => None,
        };
        if let Some(kind) = container_kind {
            return ComponentNode::Container(ContainerNode {
                common,
                kind,
                children: nested.children(depth),
            });
        }

        match kind.as_str() {
            "text" => ComponentNode::Text(TextNode {
                text: self.text.or(self.label).unwrap_or_default(),
                common,
            }),
            "button" => ComponentNode::Button(ButtonNode {
                label: self.label.or(self.text).unwrap_or_default(),
                common,
            }),
            "image" => match (self.image_url, self.image_name) {
                (Some(url), _) => ComponentNode::Image(ImageNode {
                    common,
                    source: ImageSource::Remote(url),
                }),
                (None, Some(name)) => ComponentNode::Image(ImageNode {
                    common,
                    source: ImageSource::Bundled(name),
                }),
                (None, None) => unsupported(
                    common.id,
                    Some(kind.clone()),
                    common.conditions,
                    "image without `imageUrl` or `imageName`",
                    nested.reattach(shallow),
                ),
            },
            "list" => match (self.data_source, nested.item_template.take()) {
                (Some(data_source), Some(item_template)) if !item_template.is_null() => {
                    ComponentNode::List(ListNode {
                        common,
                        data_source,
                        item_template: Box::new(decode_at(item_template, depth + 1)),
                    })
                }
                (_, item_template) => {
                    nested.item_template = item_template;
                    unsupported(
                        common.id,
                        Some(kind.clone()),
                        common.conditions,
                        "list without `dataSource` and `itemTemplate`",
                        nested.reattach(shallow),
                    )
                }
            },
            "spacer" => ComponentNode::Spacer(common),
            "divider" => ComponentNode::Divider(common),
            _ => {
                let reason = format!("unsupported component type `{kind}`");
                let raw = nested.reattach(shallow);
                unsupported(common.id, Some(kind.clone()), common.conditions, &reason, raw)
            }
        }
    }

    fn from_node(node: &ComponentNode) -> Self {
        let mut wire = WireNode {
            kind: node.type_name().map(str::to_string),
            ..WireNode::default()
        };
        if let Some(common) = node.common() {
            wire.id = common.id.clone();
            wire.style = common.style.clone();
            wire.action = common.action.clone();
            wire.conditions = common.conditions.clone();
        }
        match node {
            ComponentNode::Text(n) => wire.text = Some(n.text.clone()),
            ComponentNode::Button(n) => wire.label = Some(n.label.clone()),
            ComponentNode::Image(n) => match &n.source {
                ImageSource::Remote(url) => wire.image_url = Some(url.clone()),
                ImageSource::Bundled(name) => wire.image_name = Some(name.clone()),
            },
            ComponentNode::Container(n) => wire.children = n.children.clone(),
            ComponentNode::List(n) => {
                wire.data_source = Some(n.data_source.clone());
                wire.item_template = Some(n.item_template.clone());
            }
            ComponentNode::Spacer(_) | ComponentNode::Divider(_) | ComponentNode::Unsupported(_) => {}
        }
        wire
    }
}

impl<'de> Deserialize<'de> for ComponentNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(ComponentNode::from_value(Value::deserialize(deserializer)?))
    }
}

impl Serialize for ComponentNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ComponentNode::Unsupported(n) => n.raw.serialize(serializer),
            node => WireNode::from_node(node).serialize(serializer),
        }
    }
}
