use std::collections::HashMap;

use super::*;

fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    AppConfig::from_lookup(|key| map.get(key).cloned())
}

#[test]
fn empty_environment_yields_defaults() {
    assert_eq!(config(&[]).unwrap(), AppConfig::default());
}

#[test]
fn values_are_read_and_trimmed() {
    let cfg = config(&[
        ("PORT", "8080"),
        ("DATABASE_URL", " postgres://db/tiles "),
        ("DB_MAX_CONNECTIONS", "12"),
        ("PUBLIC_ORIGIN", "https://tiles.test/"),
        ("STATIC_DIR", "public"),
        ("SESSION_TTL_HOURS", "1"),
        ("STRIPE_SECRET_KEY", "sk_test"),
    ])
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.database_url.as_deref(), Some("postgres://db/tiles"));
    assert_eq!(cfg.db_max_connections, 12);
    assert_eq!(cfg.public_origin, "https://tiles.test");
    assert_eq!(cfg.static_dir, "public");
    assert_eq!(cfg.session_ttl_hours, 1);
    assert_eq!(cfg.stripe_secret_key.as_deref(), Some("sk_test"));
}

#[test]
fn unparseable_numbers_fall_back() {
    let cfg = config(&[("PORT", "eighty"), ("DB_MAX_CONNECTIONS", "-1")]).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
}

#[test]
fn blank_values_count_as_unset() {
    let cfg = config(&[("DATABASE_URL", "   "), ("STRIPE_SECRET_KEY", "")]).unwrap();
    assert_eq!(cfg.database_url, None);
    assert_eq!(cfg.stripe_secret_key, None);
}

#[test]
fn cookie_secure_follows_origin_unless_set() {
    assert!(config(&[("PUBLIC_ORIGIN", "https://tiles.test")]).unwrap().cookie_secure);
    assert!(!config(&[("PUBLIC_ORIGIN", "https://tiles.test"), ("COOKIE_SECURE", "off")]).unwrap().cookie_secure);
    assert!(config(&[("COOKIE_SECURE", "YES")]).unwrap().cookie_secure);
}

#[test]
fn mailer_needs_both_key_and_sender() {
    assert_eq!(config(&[("RESEND_API_KEY", "re_x")]).unwrap().mailer, None);
    let cfg = config(&[("RESEND_API_KEY", "re_x"), ("RESEND_FROM", "tiles@x.test")]).unwrap();
    assert_eq!(cfg.mailer, Some(MailerConfig { api_key: "re_x".into(), from: "tiles@x.test".into() }));
}

#[test]
fn non_http_origin_is_rejected() {
    assert!(matches!(config(&[("PUBLIC_ORIGIN", "tiles.test")]), Err(ConfigError::InvalidOrigin(_))));
}

#[test]
fn parse_bool_variants() {
    for raw in ["1", "true", " Yes ", "ON"] {
        assert_eq!(parse_bool(raw), Some(true), "{raw}");
    }
    for raw in ["0", "false", "no", "off"] {
        assert_eq!(parse_bool(raw), Some(false), "{raw}");
    }
    assert_eq!(parse_bool("maybe"), None);
}
