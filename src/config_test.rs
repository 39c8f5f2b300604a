use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_env_is_empty() {
    let cfg = StudioConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(cfg.public_base_url, "http://127.0.0.1:3000");
    assert_eq!(cfg.storage_backend, StorageBackend::Memory);
    assert_eq!(cfg.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
    assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(cfg.upload_ticket_ttl_secs, DEFAULT_UPLOAD_TICKET_TTL_SECS);
    assert_eq!(cfg.upload_rate_per_client, DEFAULT_UPLOAD_RATE_PER_CLIENT);
    assert_eq!(cfg.upload_rate_global, DEFAULT_UPLOAD_RATE_GLOBAL);
    assert_eq!(cfg.upload_rate_window_secs, DEFAULT_UPLOAD_RATE_WINDOW_SECS);
}

#[test]
fn base_url_follows_port_when_unset() {
    let cfg = StudioConfig::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap();
    assert_eq!(cfg.public_base_url, "http://127.0.0.1:8080");
}

#[test]
fn overrides_are_applied() {
    let cfg = StudioConfig::from_lookup(lookup_from(&[
        ("PUBLIC_BASE_URL", "https://sig.example.test/"),
        ("STORAGE_BACKEND", "fs"),
        ("STORAGE_DIR", "/var/lib/sig"),
        ("MAX_UPLOAD_BYTES", "1024"),
        ("UPLOAD_TICKET_TTL_SECS", "60"),
        ("UPLOAD_RATE_PER_CLIENT", "5"),
        ("UPLOAD_RATE_GLOBAL", "50"),
        ("UPLOAD_RATE_WINDOW_SECS", "10"),
    ]))
    .unwrap();
    assert_eq!(cfg.public_base_url, "https://sig.example.test");
    assert_eq!(cfg.storage_backend, StorageBackend::Fs);
    assert_eq!(cfg.storage_dir, PathBuf::from("/var/lib/sig"));
    assert_eq!(cfg.max_upload_bytes, 1024);
    assert_eq!(cfg.upload_ticket_ttl_secs, 60);
    assert_eq!(cfg.upload_rate_per_client, 5);
    assert_eq!(cfg.upload_rate_global, 50);
    assert_eq!(cfg.upload_rate_window_secs, 10);
}

#[test]
fn unparseable_numbers_fall_back() {
    let cfg = StudioConfig::from_lookup(lookup_from(&[("PORT", "eighty"), ("MAX_UPLOAD_BYTES", "-1")])).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
}

#[test]
fn unknown_backend_is_rejected() {
    let err = StudioConfig::from_lookup(lookup_from(&[("STORAGE_BACKEND", "s3")])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownBackend("s3".into()));
    assert_eq!(err.error_code(), "E_CONFIG_BACKEND");
}

#[test]
fn non_http_base_url_is_rejected() {
    let err = StudioConfig::from_lookup(lookup_from(&[("PUBLIC_BASE_URL", "ftp://files")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
}
