//! Configuration resolution: layering, endpoint selection and base-URL routing.

use market_conformance_rs::common::config::{ConfigOverrides, RunFile, parse_bool};
use market_conformance_rs::{ConformanceError, EnvConfig, Environment, SubscriptionType};
use std::path::Path;

fn run_file() -> RunFile {
    serde_json::from_str(
        r#"{
            "rest": {"prod": "https://rest.prod.test/v1", "uat": "https://rest.uat.test/v1/"},
            "ws_market": {"prod": "wss://ws.prod.test/market", "uat": "wss://ws.uat.test/market"},
            "defaults": {"env": "uat", "instrument_name": "ETHUSD-PERP", "depth": 10}
        }"#,
    )
    .expect("valid run file")
}

#[test]
fn test_builtin_defaults() {
    let config = EnvConfig::resolve(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(config.env, Environment::Prod);
    assert_eq!(config.instrument_name, "BTCUSD-PERP");
    assert_eq!(config.depth, 50);
    assert_eq!(config.book_subscription_type, SubscriptionType::SnapshotAndUpdate);
    assert_eq!(config.book_update_frequency, 100);
    assert_eq!(config.rest_base, "https://api.crypto.com/exchange/v1/");
    assert_eq!(config.ws_market_url, "wss://stream.crypto.com/exchange/v1/market");
    assert!(!config.insecure);
    assert!(config.cafile.is_none());
}

#[test]
fn test_run_file_defaults_and_endpoints() {
    let file = run_file();
    let config = EnvConfig::resolve(Some(&file), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.env, Environment::Uat);
    assert_eq!(config.instrument_name, "ETHUSD-PERP");
    assert_eq!(config.depth, 10);
    assert_eq!(config.rest_base, "https://rest.uat.test/v1/");
    assert_eq!(config.ws_market_url, "wss://ws.uat.test/market");
}

#[test]
fn test_overrides_win_over_run_file() {
    let file = run_file();
    let overrides = ConfigOverrides {
        env: Some("PROD".to_string()),
        depth: Some(150),
        book_subscription_type: Some("snapshot".to_string()),
        insecure: Some(true),
        ..ConfigOverrides::default()
    };
    let config = EnvConfig::resolve(Some(&file), &overrides).unwrap();
    assert_eq!(config.env, Environment::Prod);
    assert_eq!(config.depth, 150);
    assert_eq!(config.book_subscription_type, SubscriptionType::Snapshot);
    assert_eq!(config.instrument_name, "ETHUSD-PERP");
    // trailing slash is added
    assert_eq!(config.rest_base, "https://rest.prod.test/v1/");
    assert!(config.tls().insecure);
}

#[test]
fn test_merge_prefers_higher_layer() {
    let env = ConfigOverrides {
        env: Some("uat".to_string()),
        instrument_name: Some("ETHUSD-PERP".to_string()),
        ..ConfigOverrides::default()
    };
    let cli = ConfigOverrides {
        instrument_name: Some("SOLUSD-PERP".to_string()),
        ..ConfigOverrides::default()
    };
    let merged = env.merge(cli);
    assert_eq!(merged.env.as_deref(), Some("uat"));
    assert_eq!(merged.instrument_name.as_deref(), Some("SOLUSD-PERP"));
}

#[test]
fn test_base_url_routed_by_scheme() {
    let ws = ConfigOverrides {
        base_url: Some("ws://127.0.0.1:9000/market".to_string()),
        ..ConfigOverrides::default()
    };
    let config = EnvConfig::resolve(None, &ws).unwrap();
    assert_eq!(config.ws_market_url, "ws://127.0.0.1:9000/market");
    assert_eq!(config.rest_base, "https://api.crypto.com/exchange/v1/");

    let http = ConfigOverrides {
        base_url: Some("http://127.0.0.1:9001/v1".to_string()),
        ..ConfigOverrides::default()
    };
    let config = EnvConfig::resolve(None, &http).unwrap();
    assert_eq!(config.rest_base, "http://127.0.0.1:9001/v1/");
    assert_eq!(config.ws_market_url, "wss://stream.crypto.com/exchange/v1/market");

    let ftp = ConfigOverrides {
        base_url: Some("ftp://example.test".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(matches!(
        EnvConfig::resolve(None, &ftp),
        Err(ConformanceError::ConfigError(_))
    ));
}

#[test]
fn test_unknown_values_rejected() {
    let bad_env = ConfigOverrides {
        env: Some("staging".to_string()),
        ..ConfigOverrides::default()
    };
    let err = EnvConfig::resolve(None, &bad_env).unwrap_err();
    println!("{}", err);
    assert!(matches!(err, ConformanceError::ConfigError(_)));

    let bad_type = ConfigOverrides {
        book_subscription_type: Some("DELTA".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(EnvConfig::resolve(None, &bad_type).is_err());
}

#[test]
fn test_env_missing_from_run_file() {
    let file: RunFile =
        serde_json::from_str(r#"{"rest": {"prod": "https://rest.prod.test/"}}"#).unwrap();
    let uat = ConfigOverrides {
        env: Some("uat".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(matches!(
        EnvConfig::resolve(Some(&file), &uat),
        Err(ConformanceError::ConfigError(_))
    ));
}

#[test]
fn test_shipped_run_file() {
    let file = RunFile::load(Path::new("config/run.json"))
        .unwrap()
        .expect("config/run.json ships with the crate");
    let config = EnvConfig::resolve(Some(&file), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.rest_base, "https://api.crypto.com/exchange/v1/");
    assert_eq!(config.ws_market_url, "wss://stream.crypto.com/exchange/v1/market");

    assert!(RunFile::load(Path::new("config/missing.json")).unwrap().is_none());
}

#[test]
fn test_parse_bool() {
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool(" 1 "), Some(true));
    assert_eq!(parse_bool("off"), Some(false));
    assert_eq!(parse_bool("maybe"), None);
}
