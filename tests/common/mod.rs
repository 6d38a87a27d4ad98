//! Shared test utilities: template fixtures, a bound screen service and a
//! mock asset server.

#![allow(dead_code)]

pub mod mock_assets;

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sdui::interpreter::Interpreter;
use sdui::resolve::ScreenResolver;
use sdui::server::{ScreenServer, ServerHandle};
use sdui::store::{DirectoryTemplateStore, MemoryTemplateStore, TemplateStore};
use sdui::schema::ScreenDocument;
use serde_json::{json, Value};
use tempfile::TempDir;

/// The screen used across the service tests.
pub fn test_screen() -> Value {
    json!({
        "id": "test-screen",
        "version": 3,
        "title": "Test Screen",
        "components": [
            {"id": "header", "type": "text", "text": "Welcome, {{user.name}}!"},
            {
                "id": "promo",
                "type": "card",
                "conditions": [{"field": "user.tier", "operator": "equals", "value": "gold"}],
                "children": [{"id": "promo-text", "type": "text", "text": "Gold perks"}]
            },
            {
                "id": "trips",
                "type": "list",
                "dataSource": "trips",
                "itemTemplate": {
                    "type": "hstack",
                    "children": [
                        {"id": "destination", "type": "text", "text": "{{item.destination}}"},
                        {
                            "id": "open",
                            "type": "button",
                            "label": "Open",
                            "action": {
                                "type": "navigate",
                                "target": "trip/{{item.id}}"
                            }
                        }
                    ]
                }
            },
            {"id": "logo", "type": "image", "imageName": "logo"},
            {"id": "mystery", "type": "hologram", "text": "???"}
        ]
    })
}

/// Write `(file name, JSON)` pairs into a fresh temp directory.
pub fn template_dir(files: &[(&str, Value)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, body) in files {
        write_json(dir.path(), name, body);
    }
    dir
}

pub fn write_json(dir: &Path, name: &str, body: &Value) {
    let content = serde_json::to_string_pretty(body).expect("serializable fixture");
    fs::write(dir.join(name), content).expect("Failed to write template");
}

pub fn memory_store(documents: &[Value]) -> Arc<MemoryTemplateStore> {
    let store = MemoryTemplateStore::new();
    for document in documents {
        let document: ScreenDocument =
            serde_json::from_value(document.clone()).expect("valid fixture");
        store.insert(document);
    }
    Arc::new(store)
}

pub fn directory_store(dir: &TempDir) -> Arc<dyn TemplateStore> {
    Arc::new(DirectoryTemplateStore::new(dir.path()))
}

/// A screen service bound to an ephemeral port, running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
}

impl TestServer {
    pub async fn start(store: Arc<dyn TemplateStore>) -> Self {
        let resolver = Arc::new(ScreenResolver::new(store));
        let interpreter = Arc::new(Interpreter::default());
        let mut server = ScreenServer::new(resolver, interpreter);

        // Bind before spawning so the port is live when requests start.
        let addr = server.bind("127.0.0.1:0").await.expect("Failed to bind");
        let handle = server.handle();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self { addr, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}
