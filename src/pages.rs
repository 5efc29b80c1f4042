//! Client-side routes and browser-held UI state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The front end is a single-page app. The server only needs to know which
//! paths belong to it, so the shell is served with 200 for known routes and
//! 404 for everything else. The shell also carries a `ShellConfig` the app
//! reads on boot: the language to start in (from the `language` cookie the
//! app mirrors its stored choice into), the supported languages and the
//! thank-you page delay.
//!
//! Password-recovery links put their token in the URL fragment, which never
//! reaches the server. They are always minted for `/auth` directly.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Seconds the donation thank-you page waits before returning home.
pub const DONATION_SUCCESS_REDIRECT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    Auth,
    Donate,
    DonationThanks,
    Shared { token: String },
    NotFound,
}

impl Page {
    /// Match a request path (without query or fragment) to a page.
    #[must_use]
    pub fn resolve(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/auth" => Self::Auth,
            "/donatie" => Self::Donate,
            "/donatie-bedankt" => Self::DonationThanks,
            _ => match trimmed.strip_prefix("/shared/") {
                Some(token) if !token.is_empty() && !token.contains('/') => Self::Shared { token: token.to_owned() },
                _ => Self::NotFound,
            },
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

// =============================================================================
// LANGUAGE
// =============================================================================

/// UI language, persisted by the browser under [`Language::STORAGE_KEY`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Nl,
    En,
    Fr,
    Es,
    It,
    De,
}

impl Language {
    pub const STORAGE_KEY: &str = "language";
    pub const ALL: [Self; 6] = [Self::Nl, Self::En, Self::Fr, Self::Es, Self::It, Self::De];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Nl => "nl",
            Self::En => "en",
            Self::Fr => "fr",
            Self::Es => "es",
            Self::It => "it",
            Self::De => "de",
        }
    }

    /// Restore from storage; anything unrecognised is the default.
    #[must_use]
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(raw))
            .ok_or_else(|| UnknownLanguage(raw.to_owned()))
    }
}

// =============================================================================
// SHELL CONFIG
// =============================================================================

/// Boot settings embedded in the app shell as `<script id="app-config">`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellConfig {
    pub language: Language,
    pub languages: [Language; 6],
    pub language_storage_key: &'static str,
    pub donation_redirect_secs: u64,
}

impl ShellConfig {
    /// Config for a visitor whose stored language cookie is `stored`.
    #[must_use]
    pub fn for_visitor(stored: Option<&str>) -> Self {
        Self {
            language: Language::from_stored(stored),
            languages: Language::ALL,
            language_storage_key: Language::STORAGE_KEY,
            donation_redirect_secs: DONATION_SUCCESS_REDIRECT_SECS,
        }
    }

    /// The `<script>` element carrying this config as JSON.
    ///
    /// # Errors
    ///
    /// Only if serialization fails, which the field types rule out.
    pub fn script_tag(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?.replace("</", "<\\/");
        Ok(format!("<script id=\"app-config\" type=\"application/json\">{json}</script>"))
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
