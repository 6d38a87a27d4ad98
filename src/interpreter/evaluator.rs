//! The component tree interpreter.
//!
//! Evaluation is a synchronous walk over immutable inputs. Per node:
//!
//! ```text
//! depth check ─→ conditions ─→ unsupported? ─→ text ─→ children / list items ─→ action
//!      │              │              │
//!      └─ Truncated   │              └─ Unsupported placeholder
//!                     └─ hidden (no recursion, no expansion)
//! ```
//!
//! Every per-node anomaly becomes a degraded node plus a [`Diagnostic`];
//! nothing below the root can fail the pass.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::InterpreterConfig;
use crate::dispatch::{ActionDispatcher, LoggingDispatcher};
use crate::interpreter::conditions;
use crate::interpreter::environment::{Environment, Scope};
use crate::interpreter::interpolate::{has_tokens, interpolate};
use crate::interpreter::render::{
    Diagnostic, DiagnosticKind, RenderKind, RenderNode, RenderTree, ResourceDescriptor,
    ResourceSource, ResourceState,
};
use crate::schema::{
    Action, ComponentNode, ContainerKind, ImageSource, ListNode, ScreenDocument,
};

/// Identity of the implicit parent of top-level components.
pub const ROOT_IDENTITY: &str = "$";

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("Root node must be a JSON object, got {found}")]
    MalformedRoot { found: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    #[error("No node '{identity}' in the render tree")]
    UnknownNode { identity: String },

    #[error("Node '{identity}' is not visible")]
    Hidden { identity: String },

    #[error("Node '{identity}' has no action")]
    NoAction { identity: String },
}

/// Evaluates component trees against environments.
///
/// Holds no per-pass state, so one instance can serve concurrent passes.
pub struct Interpreter {
    config: InterpreterConfig,
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterConfig::default(), Arc::new(LoggingDispatcher))
    }
}

impl Interpreter {
    pub fn new(config: InterpreterConfig, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Evaluate a single node and its descendants.
    pub fn evaluate(&self, node: &ComponentNode, env: &Environment) -> RenderNode {
        let identity = node.id().unwrap_or(ROOT_IDENTITY).to_string();
        let mut pass = Pass::new(&self.config);
        pass.node(node, &Scope::root(env), identity, None, 0)
    }

    /// Evaluate an undecoded node. Fails only when the root is not an object.
    pub fn evaluate_json(&self, node: &Value, env: &Environment) -> Result<RenderNode, EvaluateError> {
        if !node.is_object() {
            return Err(EvaluateError::MalformedRoot {
                found: json_type(node),
            });
        }
        Ok(self.evaluate(&ComponentNode::from_value(node.clone()), env))
    }

    /// Evaluate every component of a screen into a render tree.
    pub fn render(&self, document: &ScreenDocument, env: &Environment) -> RenderTree {
        let scope = Scope::root(env);
        let mut pass = Pass::new(&self.config);

        let nodes = document
            .components
            .iter()
            .enumerate()
            .map(|(index, component)| {
                let identity = child_identity(component, ROOT_IDENTITY, index, None);
                pass.node(component, &scope, identity, None, 0)
            })
            .collect();

        if !pass.diagnostics.is_empty() {
            tracing::warn!(
                screen_id = %document.id,
                degraded = pass.diagnostics.len(),
                "Screen rendered with degraded nodes"
            );
        }

        let mut tree = RenderTree {
            screen_id: document.id.clone(),
            version: document.version,
            title: document.title.clone(),
            nodes,
            actions: Vec::new(),
            resources: Vec::new(),
            diagnostics: pass.diagnostics,
        };
        tree.collect_reachable();
        tree
    }

    /// Convert an interaction on `identity` into its action and hand it to
    /// the dispatcher. Returns the dispatched action.
    pub fn interact(&self, tree: &RenderTree, identity: &str) -> Result<Action, InteractionError> {
        let node = tree.find(identity).ok_or_else(|| InteractionError::UnknownNode {
            identity: identity.to_string(),
        })?;
        if !node.visible {
            return Err(InteractionError::Hidden {
                identity: identity.to_string(),
            });
        }
        let action = tree
            .action_for(identity)
            .cloned()
            .ok_or_else(|| InteractionError::NoAction {
                identity: identity.to_string(),
            })?;

        tracing::debug!(identity, kind = %action.kind, target = %action.target, "Dispatching action");
        self.dispatcher.dispatch(action.clone());
        Ok(action)
    }
}

/// Identity for the `index`th child of `parent`.
///
/// Declared ids are used as-is, prefixed by the enclosing list item when
/// inside one; anonymous nodes are addressed by position.
fn child_identity(
    child: &ComponentNode,
    parent: &str,
    index: usize,
    item_prefix: Option<&str>,
) -> String {
    match (child.id(), item_prefix) {
        (Some(id), Some(prefix)) => format!("{prefix}/{id}"),
        (Some(id), None) => id.to_string(),
        (None, _) => format!("{parent}/{index}"),
    }
}

fn render_kind(node: &ComponentNode) -> RenderKind {
    match node {
        ComponentNode::Text(_) => RenderKind::Text,
        ComponentNode::Button(_) => RenderKind::Button,
        ComponentNode::Image(_) => RenderKind::Image,
        ComponentNode::Container(n) => match n.kind {
            ContainerKind::VStack => RenderKind::VStack,
            ContainerKind::HStack => RenderKind::HStack,
            ContainerKind::ZStack => RenderKind::ZStack,
            ContainerKind::Card => RenderKind::Card,
        },
        ComponentNode::List(_) => RenderKind::List,
        ComponentNode::Spacer(_) => RenderKind::Spacer,
        ComponentNode::Divider(_) => RenderKind::Divider,
        ComponentNode::Unsupported(_) => RenderKind::Unsupported,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// State for one evaluation pass.
struct Pass<'c> {
    config: &'c InterpreterConfig,
    diagnostics: Vec<Diagnostic>,
    /// `dataSource` keys of the lists currently being expanded.
    list_sources: Vec<String>,
}

impl<'c> Pass<'c> {
    fn new(config: &'c InterpreterConfig) -> Self {
        Self {
            config,
            diagnostics: Vec::new(),
            list_sources: Vec::new(),
        }
    }

    fn node(
        &mut self,
        node: &ComponentNode,
        scope: &Scope<'_>,
        identity: String,
        item_prefix: Option<&str>,
        depth: usize,
    ) -> RenderNode {
        if depth >= self.config.max_depth {
            let detail = format!("nesting exceeds {} levels", self.config.max_depth);
            return self.truncated(node, identity, DiagnosticKind::DepthExceeded, detail);
        }

        if !conditions::all_hold(node.conditions(), scope) {
            let mut hidden = RenderNode::new(identity, render_kind(node));
            hidden.visible = false;
            hidden.source_id = node.id().map(str::to_string);
            if let ComponentNode::Unsupported(n) = node {
                hidden.source_type = n.type_name.clone();
            }
            return hidden;
        }

        let Some(common) = node.common() else {
            return self.unsupported(node, identity);
        };

        let mut out = RenderNode::new(identity, render_kind(node));
        out.source_id = common.id.clone();
        out.style = common.style.clone();

        match node {
            ComponentNode::Text(n) => out.text = Some(self.text(&n.text, scope, &out.identity)),
            ComponentNode::Button(n) => out.text = Some(self.text(&n.label, scope, &out.identity)),
            ComponentNode::Image(n) => {
                out.resource = Some(self.resource(&n.source, scope, &out.identity));
            }
            ComponentNode::Container(n) => {
                for (index, child) in n.children.iter().enumerate() {
                    let child_id = child_identity(child, &out.identity, index, item_prefix);
                    let rendered = self.node(child, scope, child_id, item_prefix, depth + 1);
                    out.children.push(rendered);
                }
            }
            ComponentNode::List(list) => {
                if self.list_sources.iter().any(|source| source == &list.data_source) {
                    let detail = format!("`{}` is already being expanded by an ancestor", list.data_source);
                    return self.truncated(node, out.identity, DiagnosticKind::ListCycle, detail);
                }
                out.children = self.expand(list, scope, &out.identity, depth);
            }
            ComponentNode::Spacer(_) | ComponentNode::Divider(_) | ComponentNode::Unsupported(_) => {}
        }

        out.action = common
            .action
            .as_ref()
            .map(|action| self.action(action, scope, &out.identity));
        out
    }

    fn expand(
        &mut self,
        list: &ListNode,
        scope: &Scope<'_>,
        identity: &str,
        depth: usize,
    ) -> Vec<RenderNode> {
        let items = match scope.lookup(&list.data_source) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                let detail = format!("`{}` is a {}, not an array", list.data_source, json_type(other));
                self.diagnose(identity, DiagnosticKind::MissingDataSource, detail);
                return Vec::new();
            }
            None => {
                let detail = format!("no binding for `{}`", list.data_source);
                self.diagnose(identity, DiagnosticKind::MissingDataSource, detail);
                return Vec::new();
            }
        };

        self.list_sources.push(list.data_source.clone());
        let mut children = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_identity = format!("{identity}#{index}");
            let item_scope = scope.with_item(item);
            let rendered = self.node(
                &list.item_template,
                &item_scope,
                item_identity.clone(),
                Some(item_identity.as_str()),
                depth + 1,
            );
            children.push(rendered);
        }
        self.list_sources.pop();
        children
    }

    fn text(&mut self, template: &str, scope: &Scope<'_>, identity: &str) -> String {
        if !has_tokens(template) {
            return template.to_string();
        }
        let interpolated = interpolate(template, scope);
        for path in interpolated.unresolved {
            self.diagnose(identity, DiagnosticKind::UnresolvedBinding, format!("no binding for `{path}`"));
        }
        interpolated.text
    }

    fn action(&mut self, action: &Action, scope: &Scope<'_>, identity: &str) -> Action {
        let mut packaged = action.clone();
        packaged.target = self.text(&action.target, scope, identity);
        for value in packaged.parameters.values_mut() {
            *value = self.text(value, scope, identity);
        }
        packaged
    }

    fn resource(&mut self, source: &ImageSource, scope: &Scope<'_>, identity: &str) -> ResourceDescriptor {
        let (source, state) = match source {
            ImageSource::Remote(url) => (
                ResourceSource::Remote(self.text(url, scope, identity)),
                ResourceState::Placeholder,
            ),
            ImageSource::Bundled(name) => (
                ResourceSource::Bundled(self.text(name, scope, identity)),
                ResourceState::Bundled,
            ),
        };
        ResourceDescriptor {
            identity: identity.to_string(),
            source,
            state,
        }
    }

    fn unsupported(&mut self, node: &ComponentNode, identity: String) -> RenderNode {
        let reason = match node {
            ComponentNode::Unsupported(n) => n.reason.clone(),
            _ => "unsupported node".to_string(),
        };
        self.diagnose(&identity, DiagnosticKind::UnsupportedType, reason);

        let mut out = RenderNode::new(identity, RenderKind::Unsupported);
        out.source_id = node.id().map(str::to_string);
        out.source_type = node.type_name().map(str::to_string);
        out
    }

    fn truncated(
        &mut self,
        node: &ComponentNode,
        identity: String,
        kind: DiagnosticKind,
        detail: String,
    ) -> RenderNode {
        self.diagnose(&identity, kind, detail);
        let mut out = RenderNode::new(identity, RenderKind::Truncated);
        out.source_id = node.id().map(str::to_string);
        out.source_type = node.type_name().map(str::to_string);
        out
    }

    fn diagnose(&mut self, identity: &str, kind: DiagnosticKind, detail: String) {
        tracing::debug!(identity, kind = ?kind, detail = %detail, "Degraded node");
        self.diagnostics.push(Diagnostic {
            identity: identity.to_string(),
            kind,
            detail,
        });
    }
}
