use std::path::PathBuf;
use std::time::Duration;

use fileserve::config::Config;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:6703");
    assert_eq!(cfg.server.max_connections, None);
    assert_eq!(cfg.static_files.root, PathBuf::from("."));
    assert_eq!(cfg.static_files.index_file, "index.html");
}

#[test]
fn test_config_from_full_yaml() {
    let yaml = r#"
server:
  listen_addr: "127.0.0.1:8000"
  max_connections: 64
  read_timeout_secs: 3
  write_timeout_secs: 4
static_files:
  root: "/srv/www"
  index_file: "home.html"
  max_body_bytes: 2048
"#;
    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:8000");
    assert_eq!(cfg.server.max_connections, Some(64));
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
    assert_eq!(cfg.static_files.index_file, "home.html");

    let settings = cfg.connection_settings();
    assert_eq!(settings.read_timeout, Duration::from_secs(3));
    assert_eq!(settings.write_timeout, Duration::from_secs(4));
    assert_eq!(settings.limits.max_body, 2048);
    assert_eq!(settings.resolver.root(), PathBuf::from("/srv/www"));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("static_files:\n  root: public\n").unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:6703");
    assert_eq!(cfg.static_files.root, PathBuf::from("public"));
    assert_eq!(cfg.static_files.index_file, "index.html");
}

#[test]
fn test_config_rejects_invalid_values() {
    assert!(Config::from_yaml("server:\n  max_connections: 0\n").is_err());
    assert!(Config::from_yaml("server:\n  read_timeout_secs: 0\n").is_err());
    assert!(Config::from_yaml("static_files:\n  index_file: a/b.html\n").is_err());
    assert!(Config::from_yaml("server: [1, 2]\n").is_err());
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::default()
        .with_overrides(|key| match key {
            "LISTEN" => Some("127.0.0.1:9000".to_string()),
            "DOC_ROOT" => Some("/var/www".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.static_files.root, PathBuf::from("/var/www"));
}

#[test]
fn test_config_without_overrides_is_unchanged() {
    let cfg = Config::default().with_overrides(no_env).unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:6703");
}

#[test]
fn test_config_from_missing_file_fails() {
    let err = Config::from_file("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.listen_addr, cfg2.server.listen_addr);
}
