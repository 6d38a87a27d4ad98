//! Interpreter output: the render tree handed to a platform drawing layer.

use serde::{Deserialize, Serialize};

use crate::schema::{Action, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderKind {
    Text,
    Button,
    Image,
    VStack,
    HStack,
    ZStack,
    Card,
    List,
    Spacer,
    Divider,
    /// The template node could not be interpreted; see `sourceType`.
    Unsupported,
    /// Evaluation stopped here (depth limit or list cycle).
    Truncated,
}

/// Lifecycle of an out-of-band resource referenced by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ResourceState {
    /// Not fetched yet; draw a placeholder.
    Placeholder,
    /// Ships with the client; nothing to fetch.
    Bundled,
    Loaded { bytes: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "location")]
pub enum ResourceSource {
    Remote(String),
    Bundled(String),
}

/// A resource the render consumer needs, described rather than fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub identity: String,
    pub source: ResourceSource,
    #[serde(flatten)]
    pub state: ResourceState,
}

impl ResourceDescriptor {
    pub fn remote_url(&self) -> Option<&str> {
        match &self.source {
            ResourceSource::Remote(url) => Some(url),
            ResourceSource::Bundled(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Stable across evaluations of the same template and environment.
    pub identity: String,
    pub kind: RenderKind,
    pub visible: bool,
    /// The template `id`, when the template declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// The template `type`, kept for unsupported nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub(crate) fn new(identity: String, kind: RenderKind) -> Self {
        Self {
            identity,
            kind,
            visible: true,
            source_id: None,
            source_type: None,
            text: None,
            style: None,
            action: None,
            resource: None,
            children: Vec::new(),
        }
    }

    /// Depth-first search by identity, including hidden nodes.
    pub fn find(&self, identity: &str) -> Option<&RenderNode> {
        if self.identity == identity {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(identity))
    }

    /// Visit every node reachable through visible ancestors, pre-order.
    pub fn visit_visible<'a>(&'a self, visit: &mut dyn FnMut(&'a RenderNode)) {
        if !self.visible {
            return;
        }
        visit(self);
        for child in &self.children {
            child.visit_visible(visit);
        }
    }

    pub(crate) fn visit_mut(&mut self, visit: &mut dyn FnMut(&mut RenderNode)) {
        visit(self);
        for child in &mut self.children {
            child.visit_mut(visit);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    UnresolvedBinding,
    UnsupportedType,
    MissingDataSource,
    DepthExceeded,
    ListCycle,
}

/// A per-node anomaly recovered during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub identity: String,
    pub kind: DiagnosticKind,
    pub detail: String,
}

/// An action attached to a visible node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachableAction {
    pub identity: String,
    pub action: Action,
}

/// A fully evaluated screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTree {
    pub screen_id: String,
    pub version: u64,
    pub title: String,
    pub nodes: Vec<RenderNode>,
    pub actions: Vec<ReachableAction>,
    pub resources: Vec<ResourceDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderTree {
    pub fn find(&self, identity: &str) -> Option<&RenderNode> {
        self.nodes.iter().find_map(|node| node.find(identity))
    }

    pub fn action_for(&self, identity: &str) -> Option<&Action> {
        self.actions
            .iter()
            .find(|reachable| reachable.identity == identity)
            .map(|reachable| &reachable.action)
    }

    /// Rebuild `actions` and `resources` from the visible nodes.
    pub(crate) fn collect_reachable(&mut self) {
        let mut actions = Vec::new();
        let mut resources = Vec::new();
        for node in &self.nodes {
            node.visit_visible(&mut |n| {
                if let Some(action) = &n.action {
                    actions.push(ReachableAction {
                        identity: n.identity.clone(),
                        action: action.clone(),
                    });
                }
                if let Some(resource) = &n.resource {
                    resources.push(resource.clone());
                }
            });
        }
        self.actions = actions;
        self.resources = resources;
    }

    /// Apply `update` to every resource descriptor, in nodes and the summary.
    pub(crate) fn update_resources(&mut self, update: &mut dyn FnMut(&mut ResourceDescriptor)) {
        for node in &mut self.nodes {
            node.visit_mut(&mut |n| {
                if let Some(resource) = n.resource.as_mut() {
                    update(resource);
                }
            });
        }
        self.resources.iter_mut().for_each(|r| update(r));
    }
}
