use std::io::Write;

use webeco_core::config::{Config, CONFIG_FILE_NAME};

#[test]
fn parse_valid_toml() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"
own_host = "example.com"
resolve_image_sizes = false
carbon_intensity = 0.233
http_timeout_secs = 5

[metrics]
cpu_time = 420.0
network_requests = 32
"#
    )
    .unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg.own_host.as_deref(), Some("example.com"));
    assert_eq!(cfg.resolve_image_sizes, Some(false));
    assert_eq!(cfg.carbon_intensity, Some(0.233));
    assert_eq!(cfg.http_timeout_secs, Some(5));
    assert_eq!(cfg.metrics.cpu_time, Some(420.0));
    assert_eq!(cfg.metrics.network_requests, Some(32));
    assert_eq!(cfg.metrics.memory_usage, None);
}

#[test]
fn parse_empty_toml_gives_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "").unwrap();

    let cfg = Config::load(f.path()).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn parse_invalid_toml_returns_error() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "this is not valid [ toml {{{{").unwrap();

    let result = Config::load(f.path());
    assert!(result.is_err());
}

#[test]
fn negative_carbon_intensity_is_rejected() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "carbon_intensity = -1.0").unwrap();

    let err = Config::load(f.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("carbon_intensity"));
}

#[test]
fn zero_timeout_is_rejected() {
    let cfg = Config {
        http_timeout_secs: Some(0),
        ..Config::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn discover_finds_config_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "own_host = \"example.com\"").unwrap();

    let cfg = Config::discover_in(dir.path()).unwrap();
    assert_eq!(cfg.own_host.as_deref(), Some("example.com"));
}

#[test]
fn discover_skips_missing_and_broken_configs() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::discover_in(dir.path()), None);

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "carbon_intensity = -1.0").unwrap();
    assert_eq!(Config::discover_in(dir.path()), None);

    std::fs::write(dir.path().join(CONFIG_FILE_NAME), "not [ toml").unwrap();
    assert_eq!(Config::discover_in(dir.path()), None);
}
