//! Tests for configuration loading and validation

use std::io::Write;
use std::path::Path;

use devgate::config::Config;

#[test]
fn test_parse_full_config() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen: 127.0.0.1:3000
static:
  root: ./dist
proxy:
  /api:
    target: http://localhost:8080
    change_origin: true
    secure: false
"#,
    )
    .unwrap();

    assert_eq!(cfg.server.listen, "127.0.0.1:3000");

    let statics = cfg.static_files.unwrap();
    assert_eq!(statics.root, Path::new("./dist"));
    assert_eq!(statics.index, "index.html");

    let rule = cfg.proxy.get("/api").unwrap();
    assert_eq!(rule.target, "http://localhost:8080");
    assert!(rule.change_origin);
    assert!(!rule.secure);
}

#[test]
fn test_rule_option_defaults() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen: 127.0.0.1:3000
proxy:
  /api:
    target: http://localhost:8080
"#,
    )
    .unwrap();

    let rule = cfg.proxy.get("/api").unwrap();
    assert!(!rule.change_origin, "change_origin defaults to off");
    assert!(rule.secure, "certificate validation defaults to on");
}

#[test]
fn test_static_and_proxy_sections_optional() {
    let cfg = Config::from_yaml("server:\n  listen: 127.0.0.1:3000\n").unwrap();

    assert!(cfg.static_files.is_none());
    assert!(cfg.proxy.is_empty());
}

#[test]
fn test_custom_index_file() {
    let cfg = Config::from_yaml(
        r#"
server:
  listen: 127.0.0.1:3000
static:
  root: ./public
  index: app.html
"#,
    )
    .unwrap();

    assert_eq!(cfg.static_files.unwrap().index, "app.html");
}

#[test]
fn test_missing_server_section_rejected() {
    assert!(Config::from_yaml("proxy: {}\n").is_err());
}

#[test]
fn test_empty_listen_rejected() {
    assert!(Config::from_yaml("server:\n  listen: \"\"\n").is_err());
}

#[test]
fn test_unknown_rule_field_rejected() {
    let result = Config::from_yaml(
        r#"
server:
  listen: 127.0.0.1:3000
proxy:
  /api:
    target: http://localhost:8080
    rewrite: /v2
"#,
    );

    assert!(result.is_err());
}

#[test]
fn test_garbage_yaml_rejected() {
    assert!(Config::from_yaml("server: [not: a mapping").is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "server:\n  listen: 127.0.0.1:3000\nproxy:\n  /api:\n    target: http://localhost:8080\n"
    )
    .unwrap();

    let cfg = Config::load(file.path()).unwrap();
    assert_eq!(cfg.proxy.len(), 1);
}

#[test]
fn test_load_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();

    assert!(err.to_string().contains("nope.yaml"));
}
