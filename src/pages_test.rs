use super::*;

#[test]
fn known_routes_resolve() {
    assert_eq!(Page::resolve("/"), Page::Home);
    assert_eq!(Page::resolve(""), Page::Home);
    assert_eq!(Page::resolve("/auth"), Page::Auth);
    assert_eq!(Page::resolve("/auth/"), Page::Auth);
    assert_eq!(Page::resolve("/donatie"), Page::Donate);
    assert_eq!(Page::resolve("/donatie-bedankt"), Page::DonationThanks);
    assert_eq!(Page::resolve("/shared/abc123"), Page::Shared { token: "abc123".into() });
}

#[test]
fn everything_else_is_not_found() {
    for path in ["/shared", "/shared/", "/shared/a/b", "/admin", "/auth/extra", "/donaties"] {
        let page = Page::resolve(path);
        assert_eq!(page, Page::NotFound, "{path}");
        assert!(!page.is_known());
    }
}

#[test]
fn language_defaults_to_dutch() {
    assert_eq!(Language::default(), Language::Nl);
    assert_eq!(Language::from_stored(None), Language::Nl);
    assert_eq!(Language::from_stored(Some("klingon")), Language::Nl);
    assert_eq!(Language::from_stored(Some("FR")), Language::Fr);
    assert_eq!(Language::STORAGE_KEY, "language");
}

#[test]
fn language_codes_parse_back() {
    for lang in Language::ALL {
        assert_eq!(lang.code().parse::<Language>().unwrap(), lang);
        assert_eq!(lang.to_string(), lang.code());
    }
}

#[test]
fn shell_config_reflects_stored_language() {
    let config = ShellConfig::for_visitor(Some("de"));
    assert_eq!(config.language, Language::De);
    assert_eq!(ShellConfig::for_visitor(None).language, Language::Nl);

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["language"], "de");
    assert_eq!(json["languages"][0], "nl");
    assert_eq!(json["language_storage_key"], "language");
    assert_eq!(json["donation_redirect_secs"], DONATION_SUCCESS_REDIRECT_SECS);
}

#[test]
fn shell_config_script_tag_embeds_json() {
    let tag = ShellConfig::for_visitor(Some("en")).script_tag().unwrap();
    assert!(tag.starts_with("<script id=\"app-config\" type=\"application/json\">{"));
    assert!(tag.ends_with("}</script>"));
    assert!(tag.contains("\"language\":\"en\""));
}
