use keel_core::config::GlobalConfig;
use std::path::Path;

#[test]
fn defaults_when_file_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let config = GlobalConfig::load_from(&tmp.path().join("config.toml")).unwrap();
    assert_eq!(config.lock.path, "Keel.lock");
    assert_eq!(config.log.filter, "warn");
}

#[test]
fn partial_config_keeps_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[log]\nfilter = \"keel_resolver=debug\"\n").unwrap();

    let config = GlobalConfig::load_from(&path).unwrap();
    assert_eq!(config.log.filter, "keel_resolver=debug");
    assert_eq!(config.lock.path, "Keel.lock");
}

#[test]
fn invalid_config_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[lock\npath = 1").unwrap();

    let err = GlobalConfig::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Config error"), "got: {err}");
}

#[test]
fn lock_path_resolution() {
    let mut config = GlobalConfig::default();
    assert_eq!(
        config.lock_path(Path::new("/srv/keel")),
        Path::new("/srv/keel/Keel.lock")
    );
    config.lock.path = "/var/lib/keel/Keel.lock".into();
    assert_eq!(
        config.lock_path(Path::new("/srv/keel")),
        Path::new("/var/lib/keel/Keel.lock")
    );
}
