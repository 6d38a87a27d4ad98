use std::fs;
use std::path::PathBuf;

use sdui::config::{Config, ConfigError};
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Failed to write config");
    (dir, path)
}

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    assert!(config.templates.directory.is_none());
    assert!(!config.templates.preload);
    assert_eq!(config.interpreter.max_depth, 32);
    assert_eq!(config.resources.fetch_timeout_seconds, 10);
    assert_eq!(config.resources.max_bytes, 5 * 1024 * 1024);
    assert_eq!(config.resources.cache_bytes, 64 * 1024 * 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    assert!(Config::config_path().ends_with("sdui/config.toml"));
}

#[test]
fn test_load_partial_file_fills_defaults() {
    let (_dir, path) = write_config(
        r#"
[server]
bind_addr = "0.0.0.0:9000"

[templates]
directory = "/srv/screens"
preload = true
"#,
    );
    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
    assert_eq!(config.templates.directory, Some(PathBuf::from("/srv/screens")));
    assert!(config.templates.preload);
    assert_eq!(config.interpreter.max_depth, 32);
}

#[test]
fn test_validation_rejects_bad_values() {
    let (_dir, path) = write_config("[interpreter]\nmax_depth = 0\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Invalid { key: "interpreter.max_depth", .. })
    ));

    let (_dir, path) = write_config("[server]\nbind_addr = \"not-an-address\"\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("not-an-address"));

    let (_dir, path) = write_config("[resources]\nfetch_timeout_seconds = 0\n");
    assert!(Config::load_from(&path).is_err());

    let (_dir, path) = write_config("[resources]\nmax_bytes = 2048\ncache_bytes = 1024\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Invalid { key: "resources.cache_bytes", .. })
    ));
}

#[test]
fn test_parse_error_names_the_file() {
    let (_dir, path) = write_config("[server\nbind_addr = ");
    match Config::load_from(&path) {
        Err(ConfigError::Malformed { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let result = Config::load_from(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
}
