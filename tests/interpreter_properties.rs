use std::sync::Arc;

use sdui::config::InterpreterConfig;
use sdui::dispatch::ChannelDispatcher;
use sdui::interpreter::{
    DiagnosticKind, Environment, EvaluateError, InteractionError, Interpreter, RenderKind,
};
use sdui::schema::{ComponentNode, ScreenDocument};
use serde_json::{json, Value};

fn document(components: Value) -> ScreenDocument {
    serde_json::from_value(json!({"id": "screen", "components": components})).unwrap()
}

fn nested(levels: usize) -> Value {
    let mut node = json!({"id": "leaf", "type": "text", "text": "bottom"});
    for level in (0..levels).rev() {
        node = json!({"id": format!("level-{level}"), "type": "vstack", "children": [node]});
    }
    node
}

#[test]
fn test_node_without_conditions_is_visible() {
    let doc = document(json!([{"id": "a", "type": "text", "text": "static"}]));
    let tree = Interpreter::default().render(&doc, &Environment::new());

    let node = tree.find("a").unwrap();
    assert!(node.visible);
    assert_eq!(node.text.as_deref(), Some("static"));
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_condition_on_missing_field_hides_node() {
    let doc = document(json!([{
        "id": "banner",
        "type": "card",
        "conditions": [{"field": "user.tier", "operator": "notEquals", "value": "gold"}],
        "children": [{"id": "inner", "type": "text", "text": "{{user.name}}"}]
    }]));
    let tree = Interpreter::default().render(&doc, &Environment::new());

    let banner = tree.find("banner").unwrap();
    assert!(!banner.visible);
    assert!(banner.children.is_empty());
    // Hidden subtrees are not interpolated, so nothing is reported.
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_all_conditions_must_hold() {
    let doc = document(json!([{
        "id": "offer",
        "type": "text",
        "text": "Upgrade",
        "conditions": [
            {"field": "user.age", "operator": ">=", "value": 18},
            {"field": "cart.items", "operator": "contains", "value": "ticket"}
        ]
    }]));
    let interpreter = Interpreter::default();

    let adult_with_ticket = Environment::new()
        .with("user.age", 30)
        .with("cart.items", json!(["ticket", "snack"]));
    assert!(interpreter.render(&doc, &adult_with_ticket).find("offer").unwrap().visible);

    let minor = adult_with_ticket.clone().with("user.age", "12");
    assert!(!interpreter.render(&doc, &minor).find("offer").unwrap().visible);
}

#[test]
fn test_interpolation_substitutes_bound_values() {
    let doc = document(json!([{"id": "greeting", "type": "text", "text": "Hello {{user.name}}"}]));
    let env = Environment::new().with("user.name", "John");
    let tree = Interpreter::default().render(&doc, &env);

    assert_eq!(tree.find("greeting").unwrap().text.as_deref(), Some("Hello John"));
}

#[test]
fn test_unbound_token_is_kept_and_reported() {
    let doc = document(json!([{"id": "greeting", "type": "text", "text": "Hello {{user.name}}"}]));
    let tree = Interpreter::default().render(&doc, &Environment::new());

    assert_eq!(tree.find("greeting").unwrap().text.as_deref(), Some("Hello {{user.name}}"));
    assert_eq!(tree.diagnostics.len(), 1);
    assert_eq!(tree.diagnostics[0].kind, DiagnosticKind::UnresolvedBinding);
    assert_eq!(tree.diagnostics[0].identity, "greeting");
}

#[test]
fn test_list_expands_once_per_item() {
    let doc = document(json!([{
        "id": "stops",
        "type": "list",
        "dataSource": "route.stops",
        "itemTemplate": {"id": "stop", "type": "text", "text": "{{item.name}} ({{user.name}})"}
    }]));
    let env = Environment::new()
        .with("user.name", "Ana")
        .with("route.stops", json!([{"name": "North"}, {"name": "Central"}, {"name": "South"}]));
    let tree = Interpreter::default().render(&doc, &env);

    let list = tree.find("stops").unwrap();
    assert_eq!(list.kind, RenderKind::List);
    assert_eq!(list.children.len(), 3);
    for (index, child) in list.children.iter().enumerate() {
        assert_eq!(child.identity, format!("stops#{index}"));
    }
    assert_eq!(list.children[2].text.as_deref(), Some("South (Ana)"));
}

#[test]
fn test_list_without_data_renders_empty() {
    let doc = document(json!([{
        "id": "stops",
        "type": "list",
        "dataSource": "route.stops",
        "itemTemplate": {"type": "text", "text": "{{item}}"}
    }]));
    let env = Environment::new().with("route.stops", "not a list");
    let tree = Interpreter::default().render(&doc, &env);

    assert!(tree.find("stops").unwrap().children.is_empty());
    assert_eq!(tree.diagnostics[0].kind, DiagnosticKind::MissingDataSource);
}

#[test]
fn test_nested_lists_bind_innermost_item() {
    let doc = document(json!([{
        "id": "days",
        "type": "list",
        "dataSource": "days",
        "itemTemplate": {
            "type": "vstack",
            "children": [
                {"id": "day", "type": "text", "text": "{{item.label}}"},
                {
                    "id": "slots",
                    "type": "list",
                    "dataSource": "item.slots",
                    "itemTemplate": {"id": "slot", "type": "text", "text": "{{item}}"}
                }
            ]
        }
    }]));
    let env = Environment::new().with(
        "days",
        json!([{"label": "Mon", "slots": ["09:00", "10:00"]}, {"label": "Tue", "slots": []}]),
    );
    let tree = Interpreter::default().render(&doc, &env);

    let monday_slots = tree.find("days#0/slots").unwrap();
    assert_eq!(monday_slots.children.len(), 2);
    assert_eq!(monday_slots.children[1].identity, "days#0/slots#1");
    assert_eq!(monday_slots.children[1].text.as_deref(), Some("10:00"));
    assert!(tree.find("days#1/slots").unwrap().children.is_empty());
    assert_eq!(tree.find("days#1/day").unwrap().text.as_deref(), Some("Tue"));
}

#[test]
fn test_evaluation_is_deterministic() {
    let doc = document(json!([
        {"id": "title", "type": "text", "text": "{{user.name}} has {{count}} trips"},
        {
            "id": "trips",
            "type": "list",
            "dataSource": "trips",
            "itemTemplate": {"type": "button", "label": "{{item}}", "action": {"type": "open", "target": "{{item}}"}}
        },
        {"id": "pic", "type": "image", "imageUrl": "https://cdn.example.com/{{user.name}}.png"}
    ]));
    let env = Environment::new()
        .with("user.name", "Kai")
        .with("count", 2)
        .with("trips", json!(["a", "b"]));
    let interpreter = Interpreter::default();

    let first = interpreter.render(&doc, &env);
    let second = interpreter.render(&doc, &env);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_unknown_type_falls_back_with_identity() {
    let doc = document(json!([
        {"id": "ok", "type": "text", "text": "fine"},
        {"id": "weird", "type": "carousel3d", "items": [1, 2, 3]},
        {"type": "text", "text": "still here", "style": "bold", "action": 7}
    ]));
    let tree = Interpreter::default().render(&doc, &Environment::new());

    let weird = tree.find("weird").unwrap();
    assert_eq!(weird.kind, RenderKind::Unsupported);
    assert_eq!(weird.source_type.as_deref(), Some("carousel3d"));
    assert!(weird.visible);

    // Wrong-typed optional fields do not degrade the node.
    let lenient = tree.find("$/2").unwrap();
    assert_eq!(lenient.kind, RenderKind::Text);
    assert_eq!(lenient.text.as_deref(), Some("still here"));
    assert!(lenient.style.is_none());
    assert!(lenient.action.is_none());

    assert_eq!(tree.diagnostics.len(), 1);
    assert_eq!(tree.diagnostics[0].kind, DiagnosticKind::UnsupportedType);
}

#[test]
fn test_unknown_type_still_honours_conditions() {
    let doc = document(json!([{
        "id": "map",
        "type": "map",
        "conditions": [{"field": "feature.maps", "operator": "equals", "value": "on"}]
    }]));

    let tree = Interpreter::default().render(&doc, &Environment::new());
    let map = tree.find("map").unwrap();
    assert_eq!(map.kind, RenderKind::Unsupported);
    assert!(!map.visible);
    assert!(tree.diagnostics.is_empty());

    let env = Environment::new().with("feature.maps", "on");
    let tree = Interpreter::default().render(&doc, &env);
    let map = tree.find("map").unwrap();
    assert!(map.visible);
    assert_eq!(tree.diagnostics[0].kind, DiagnosticKind::UnsupportedType);
}

#[test]
fn test_anonymous_nodes_render_by_position() {
    let doc = document(json!([
        {"id": "title", "type": "text", "text": "named"},
        {"type": "text", "text": "anon"},
        {"type": "vstack", "children": [{"type": "divider"}]}
    ]));
    let tree = Interpreter::default().render(&doc, &Environment::new());

    let anon = tree.find("$/1").unwrap();
    assert_eq!(anon.kind, RenderKind::Text);
    assert_eq!(anon.text.as_deref(), Some("anon"));
    assert!(anon.source_id.is_none());
    assert_eq!(tree.find("$/2/0").unwrap().kind, RenderKind::Divider);
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn test_evaluate_single_node() {
    let node = ComponentNode::from_value(json!({
        "type": "card",
        "children": [{"id": "greeting", "type": "text", "text": "Hi {{user.name}}"}]
    }));
    let env = Environment::new().with("user.name", "Jane");
    let rendered = Interpreter::default().evaluate(&node, &env);

    assert_eq!(rendered.identity, "$");
    assert_eq!(rendered.kind, RenderKind::Card);
    assert_eq!(rendered.children[0].identity, "greeting");
    assert_eq!(rendered.children[0].text.as_deref(), Some("Hi Jane"));

    let named = ComponentNode::text("banner", "static");
    assert_eq!(Interpreter::default().evaluate(&named, &env).identity, "banner");
}

#[test]
fn test_evaluate_json_rejects_non_object_roots() {
    let interpreter = Interpreter::default();
    let env = Environment::new();
    for (root, found) in [
        (Value::Null, "null"),
        (json!([{"type": "text"}]), "array"),
        (json!("text"), "string"),
        (json!(42), "number"),
    ] {
        let err = interpreter.evaluate_json(&root, &env).unwrap_err();
        assert!(
            matches!(err, EvaluateError::MalformedRoot { found: f } if f == found),
            "{root}: {err}"
        );
    }

    let rendered = interpreter
        .evaluate_json(&json!({"id": "x", "type": "hologram"}), &env)
        .unwrap();
    assert_eq!(rendered.identity, "x");
    assert_eq!(rendered.kind, RenderKind::Unsupported);
}

#[test]
fn test_unsupported_nodes_survive_reserialization() {
    let raw = json!({"id": "weird", "type": "carousel3d", "items": [1, 2, 3]});
    let node = ComponentNode::from_value(raw.clone());
    assert_eq!(serde_json::to_value(&node).unwrap(), raw);
}

#[test]
fn test_deep_nesting_terminates() {
    let raw = serde_json::to_vec(&json!({"id": "screen", "components": [nested(70)]})).unwrap();
    let doc = ScreenDocument::from_slice(&raw).unwrap();
    let tree = Interpreter::default().render(&doc, &Environment::new());

    let mut truncated = Vec::new();
    for node in &tree.nodes {
        node.visit_visible(&mut |n| {
            if n.kind == RenderKind::Truncated {
                truncated.push(n.identity.clone());
            }
        });
    }
    assert_eq!(truncated, vec!["level-32".to_string()]);
    assert_eq!(tree.diagnostics[0].kind, DiagnosticKind::DepthExceeded);
}

#[test]
fn test_depth_limit_is_configurable() {
    let config = InterpreterConfig { max_depth: 4 };
    let interpreter = Interpreter::new(config, Arc::new(sdui::dispatch::LoggingDispatcher));
    let tree = interpreter.render(&document(json!([nested(10)])), &Environment::new());

    assert_eq!(tree.find("level-4").unwrap().kind, RenderKind::Truncated);
    assert!(tree.find("level-5").is_none());
}

#[test]
fn test_self_referencing_list_is_cut() {
    let doc = document(json!([{
        "id": "tree",
        "type": "list",
        "dataSource": "nodes",
        "itemTemplate": {
            "id": "again",
            "type": "list",
            "dataSource": "nodes",
            "itemTemplate": {"type": "text", "text": "{{item}}"}
        }
    }]));
    let env = Environment::new().with("nodes", json!(["x"]));
    let tree = Interpreter::default().render(&doc, &env);

    let item = tree.find("tree#0").unwrap();
    assert_eq!(item.kind, RenderKind::Truncated);
    assert!(tree
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ListCycle));
}

#[tokio::test]
async fn test_interaction_dispatches_action() {
    let (dispatcher, mut actions) = ChannelDispatcher::new();
    let interpreter = Interpreter::new(InterpreterConfig::default(), Arc::new(dispatcher));
    let doc = document(json!([
        {
            "id": "book",
            "type": "button",
            "label": "Book",
            "action": {"type": "navigate", "target": "booking/{{trip.id}}", "parameters": {"source": "{{user.id}}"}}
        },
        {"id": "plain", "type": "text", "text": "no action"},
        {
            "id": "secret",
            "type": "button",
            "label": "Hidden",
            "action": {"type": "navigate", "target": "secret"},
            "conditions": [{"field": "flags.beta", "operator": "exists"}]
        }
    ]));
    let env = Environment::new().with("trip.id", "T9").with("user.id", "u1");
    let tree = interpreter.render(&doc, &env);

    let action = interpreter.interact(&tree, "book").unwrap();
    assert_eq!(action.target, "booking/T9");

    let received = actions.recv().await.unwrap();
    assert_eq!(received.kind, "navigate");
    assert_eq!(received.target, "booking/T9");
    assert_eq!(received.parameters.get("source").map(String::as_str), Some("u1"));

    assert_eq!(
        interpreter.interact(&tree, "plain").unwrap_err(),
        InteractionError::NoAction { identity: "plain".to_string() }
    );
    assert_eq!(
        interpreter.interact(&tree, "secret").unwrap_err(),
        InteractionError::Hidden { identity: "secret".to_string() }
    );
    assert!(matches!(
        interpreter.interact(&tree, "ghost"),
        Err(InteractionError::UnknownNode { .. })
    ));
    assert!(actions.try_recv().is_err());
}
