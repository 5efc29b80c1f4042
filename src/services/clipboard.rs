//! Clipboard formats for a tile's HTML content.
//!
//! DESIGN
//! ======
//! One tile body is rendered four ways for a rich clipboard write:
//!
//! - `html`: the body with whitespace collapsed, wrapped in a fixed document
//!   whose inline styles paste cleanly into chat and mail clients
//! - `plain`: `<br>` as newlines, tags stripped, entities decoded, runs of
//!   blanks and runs of newlines collapsed, trimmed
//! - `markdown`: bold, italic, links, h1-h3 and paragraphs mapped, every
//!   other tag dropped
//! - `rtf`: the plain text in a minimal RTF envelope
//!
//! A `ClipboardSink` is tried tier by tier (all four formats, then HTML plus
//! plain, then plain alone) and the outcome names the tier that stuck.
//!
//! SMS
//! ===
//! `sms_safe` reduces the text to GSM-friendly ASCII and caps it at
//! `SMS_MAX_CHARS`. Any change at all, including trimming, marks the result
//! as modified so the confirmation can warn.
//!
//! The mappings are regex based and line oriented: a `<b>` whose closing
//! tag sits on a later line is stripped rather than converted.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

pub const SMS_MAX_CHARS: usize = 1530;

const HTML_HEAD: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>\
body{font-family:Arial,sans-serif;line-height:1.6;margin:0;padding:0;}\
a{color:#0066cc;text-decoration:none;}\
a:hover{text-decoration:underline;}\
</style></head><body>";
const HTML_TAIL: &str = "</body></html>";

const RTF_HEAD: &str = "{\\rtf1\\ansi\\deff0 {\\fonttbl {\\f0 Times New Roman;}}\\f0\\fs24 ";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("clipboard patterns are valid")
}

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| re(r">\s+<"));
static BR: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<br\s*/?>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]*>"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| re(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);"));
static BLANKS: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t]+"));
static NEWLINES: LazyLock<Regex> = LazyLock::new(|| re(r"\n+"));

static MARKDOWN_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (re(r"(?i)<br\s*/?>"), "\n"),
        (re(r"(?i)<strong>(.*?)</strong>"), "**${1}**"),
        (re(r"(?i)<b>(.*?)</b>"), "**${1}**"),
        (re(r"(?i)<em>(.*?)</em>"), "*${1}*"),
        (re(r"(?i)<i>(.*?)</i>"), "*${1}*"),
        (re(r#"(?i)<a href="([^"]*)"[^>]*>(.*?)</a>"#), "[${2}](${1})"),
        (re(r"(?i)<h1>(.*?)</h1>"), "# ${1}\n"),
        (re(r"(?i)<h2>(.*?)</h2>"), "## ${1}\n"),
        (re(r"(?i)<h3>(.*?)</h3>"), "### ${1}\n"),
        (re(r"(?i)<p>(.*?)</p>"), "${1}\n\n"),
        (re(r"<[^>]+>"), ""),
    ]
});

// =============================================================================
// TEXT EXTRACTION
// =============================================================================

fn decode_entity(caps: &Captures<'_>) -> String {
    let name = &caps[1];
    let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = name.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match name {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "ndash" => Some('\u{2013}'),
            "mdash" => Some('\u{2014}'),
            "lsquo" => Some('\u{2018}'),
            "rsquo" => Some('\u{2019}'),
            "ldquo" => Some('\u{201C}'),
            "rdquo" => Some('\u{201D}'),
            "bdquo" => Some('\u{201E}'),
            "hellip" => Some('\u{2026}'),
            "euro" => Some('\u{20AC}'),
            _ => None,
        }
    };
    decoded.map_or_else(|| caps[0].to_owned(), String::from)
}

/// Text content of an HTML fragment with `<br>` kept as line breaks.
/// No whitespace cleanup.
#[must_use]
pub fn text_content(html: &str) -> String {
    let with_breaks = BR.replace_all(html, "\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    ENTITY.replace_all(&stripped, decode_entity).into_owned()
}

fn collapse_lines(text: &str) -> String {
    let blanks = BLANKS.replace_all(text, " ");
    NEWLINES.replace_all(&blanks, "\n").trim().to_owned()
}

// =============================================================================
// FORMATS
// =============================================================================

#[must_use]
pub fn html_document(content: &str) -> String {
    let collapsed = WHITESPACE.replace_all(content, " ");
    let cleaned = BETWEEN_TAGS.replace_all(&collapsed, "><");
    format!("{HTML_HEAD}{}{HTML_TAIL}", cleaned.trim())
}

#[must_use]
pub fn plain_text(content: &str) -> String {
    collapse_lines(&text_content(content))
}

#[must_use]
pub fn markdown(content: &str) -> String {
    MARKDOWN_RULES
        .iter()
        .fold(content.to_owned(), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        })
}

/// Minimal RTF document around already-extracted plain text.
#[must_use]
pub fn rtf(plain: &str) -> String {
    let mut out = String::with_capacity(RTF_HEAD.len() + plain.len() + 1);
    out.push_str(RTF_HEAD);
    for ch in plain.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\par "),
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    // RTF \u takes a signed 16-bit value.
                    let _ = write!(out, "\\u{}?", i16::from_ne_bytes(unit.to_ne_bytes()));
                }
            }
        }
    }
    out.push('}');
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardPayload {
    pub html: String,
    pub plain: String,
    pub markdown: String,
    pub rtf: String,
}

impl ClipboardPayload {
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        let plain = plain_text(content);
        Self { html: html_document(content), rtf: rtf(&plain), markdown: markdown(content), plain }
    }
}

// =============================================================================
// SINK
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

/// A clipboard that may support only some of the write styles.
pub trait ClipboardSink {
    /// Write all four formats as one item.
    fn write_rich(&mut self, payload: &ClipboardPayload) -> Result<(), ClipboardError>;

    fn write_html_plain(&mut self, html: &str, plain: &str) -> Result<(), ClipboardError>;

    fn write_plain(&mut self, plain: &str) -> Result<(), ClipboardError>;
}

/// Which tier of the copy chain succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyOutcome {
    MultiFormat,
    HtmlPlain,
    Plain,
}

impl CopyOutcome {
    /// Translation key of the confirmation shown for this tier.
    #[must_use]
    pub fn notice_key(self) -> &'static str {
        match self {
            Self::MultiFormat => "tile.copiedMultiFormat",
            Self::HtmlPlain => "tile.copiedHtmlPlain",
            Self::Plain => "tile.copiedPlain",
        }
    }
}

/// Copy `payload` through the degrading chain.
///
/// # Errors
///
/// Returns the last tier's error when every tier fails.
pub fn copy_to(sink: &mut dyn ClipboardSink, payload: &ClipboardPayload) -> Result<CopyOutcome, ClipboardError> {
    match sink.write_rich(payload) {
        Ok(()) => return Ok(CopyOutcome::MultiFormat),
        Err(e) => tracing::warn!(error = %e, "rich clipboard write failed"),
    }
    match sink.write_html_plain(&payload.html, &payload.plain) {
        Ok(()) => return Ok(CopyOutcome::HtmlPlain),
        Err(e) => tracing::warn!(error = %e, "html clipboard write failed"),
    }
    sink.write_plain(&payload.plain)?;
    Ok(CopyOutcome::Plain)
}

// =============================================================================
// SMS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// Confirmation shown after copying. Keys are translated by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title_key: &'static str,
    pub description_key: &'static str,
    pub variant: NoticeVariant,
    pub length: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsText {
    pub text: String,
    pub modified: bool,
    pub length: usize,
}

impl SmsText {
    #[must_use]
    pub fn notice(&self) -> Notice {
        let (title_key, variant) = if self.modified {
            ("tile.smsModified", NoticeVariant::Destructive)
        } else {
            ("tile.smsCopied", NoticeVariant::Default)
        };
        Notice { title_key, description_key: "tile.smsCopied", variant, length: self.length, limit: SMS_MAX_CHARS }
    }
}

fn ascii_substitute(ch: char) -> Option<char> {
    match ch {
        '\u{201C}' | '\u{201D}' | '\u{201E}' => Some('"'),
        '\u{2018}' | '\u{2019}' => Some('\''),
        '\u{2014}' | '\u{2013}' => Some('-'),
        '\u{00A0}' | '\t' => Some(' '),
        c if c.is_ascii() => Some(c),
        _ => None,
    }
}

/// SMS-safe rendering of a tile's HTML content.
#[must_use]
pub fn sms_safe(content: &str) -> SmsText {
    let original = text_content(content);
    let ascii: String = original.chars().filter_map(ascii_substitute).collect();
    let mut text = collapse_lines(&ascii);
    let mut modified = text != original;

    if text.len() > SMS_MAX_CHARS {
        // ASCII only by now, so byte and char counts agree.
        text.truncate(SMS_MAX_CHARS);
        modified = true;
    }

    let length = text.len();
    SmsText { text, modified, length }
}

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod tests;
