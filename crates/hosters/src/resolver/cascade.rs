//! Deobfuscation cascade for hosts that hide the playable URL inside an
//! inline player configuration. Strategies are ordered cheapest-first and
//! applied with short-circuit iteration; the first one producing a non-bait
//! `http(s)` URL wins.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use tracing::debug;
use url::Url;

/// Ad/tracking hosts some pages substitute for the real delivery URL. A hit
/// on one of these rejects the candidate and lets the cascade continue.
const BAIT_DOMAINS: &[&str] = &[
    "bit.ly",
    "adtng.com",
    "adsco.re",
    "popads.net",
    "tsyndicate.com",
    "exoclick.com",
    "juicyads.com",
    "trafficjunky.net",
];

static DIRECT_SOURCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?(?:mp4|hls|file|source)["']?\s*:\s*["'](https?://[^"']+)["']"#).unwrap()
});

static CDN_LITERAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[A-Za-z0-9.-]+/(?:hls|engine|stream|cdn)/[^\s"'<>\\]+"#).unwrap()
});

static OPAQUE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:atob\(\s*|["'](?:source|token)["']\s*:\s*)["']([A-Za-z0-9+/=]{24,})["']"#)
        .unwrap()
});

static OBFUSCATED_PAYLOAD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:let|var|const)\s+[A-Za-z0-9_]{4,}\s*=\s*'([^']{40,})'").unwrap()
});

// Exactly seven junk-part strings, as emitted by the host's obfuscator.
static JUNK_PARTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*((?:"[^"]*"\s*,\s*){6}"[^"]*")\s*\]"#).unwrap()
});

#[derive(Debug, Clone)]
pub struct CascadeHit {
    /// Name of the winning strategy, e.g. "direct" or "substitution".
    pub strategy: &'static str,
    pub url: String,
}

type Strategy = fn(&str) -> Option<String>;

pub(crate) const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", direct_source),
    ("cdn-literal", cdn_literal),
    ("base64-token", base64_token),
    ("reversed-json", reversed_json),
    ("substitution", substitution_recovery),
];

/// Run the full cascade over a page. Each strategy is tried independently;
/// bait URLs are rejected and the iteration continues.
pub fn run(page: &str) -> Option<CascadeHit> {
    for &(name, strategy) in STRATEGIES {
        let Some(url) = strategy(page) else {
            continue;
        };
        if is_bait_url(&url) {
            debug!(strategy = name, %url, "rejecting bait url");
            continue;
        }
        return Some(CascadeHit { strategy: name, url });
    }
    None
}

pub fn is_bait_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return true;
    };
    let Some(host) = parsed.host_str() else {
        return true;
    };
    BAIT_DOMAINS
        .iter()
        .any(|bait| host == *bait || host.ends_with(&format!(".{bait}")))
}

/// (a) A known configuration key whose value is already a bare URL.
fn direct_source(page: &str) -> Option<String> {
    DIRECT_SOURCE_REGEX
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// (b) A CDN-path literal embedded verbatim.
fn cdn_literal(page: &str) -> Option<String> {
    CDN_LITERAL_REGEX.find(page).map(|m| m.as_str().to_string())
}

fn captured_token(page: &str) -> Option<String> {
    OPAQUE_TOKEN_REGEX
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

fn decode_base64(token: &str) -> Option<String> {
    let bytes = BASE64.decode(token.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// (c) The opaque token base64-decodes directly to a URL.
fn base64_token(page: &str) -> Option<String> {
    let decoded = decode_base64(&captured_token(page)?)?;
    decoded.starts_with("http").then_some(decoded)
}

/// (d) The opaque token decodes to reversed JSON: the decoded text begins
/// with the closing `}` of the (reversed) document. Reverse, parse, read the
/// `file`/`source` key.
fn reversed_json(page: &str) -> Option<String> {
    let decoded = decode_base64(&captured_token(page)?)?;
    if !decoded.trim_start().starts_with('}') {
        return None;
    }
    let reversed: String = decoded.chars().rev().collect();
    let value: serde_json::Value = serde_json::from_str(reversed.trim()).ok()?;
    let url = value
        .get("file")
        .or_else(|| value.get("source"))
        .and_then(|v| v.as_str())?;
    url.starts_with("http").then(|| url.to_string())
}

/// (e) Full substitution recovery: a 7-element token array elsewhere in the
/// page names the placeholder substrings to strip from an obfuscated payload;
/// the remainder is ROT13-rotated base64.
fn substitution_recovery(page: &str) -> Option<String> {
    let parts = junk_parts(page)?;
    let payload = OBFUSCATED_PAYLOAD_REGEX
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())?;

    let stripped = strip_junk_parts(payload, &parts);
    let decoded = decode_base64(&rot13(&stripped))?;
    decoded.starts_with("http").then_some(decoded)
}

fn junk_parts(page: &str) -> Option<Vec<String>> {
    let inner = JUNK_PARTS_REGEX
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())?;
    let parts: Vec<String> = serde_json::from_str(&format!("[{inner}]")).ok()?;
    (parts.len() == 7).then_some(parts)
}

pub(crate) fn strip_junk_parts(payload: &str, parts: &[String]) -> String {
    let mut cleaned = payload.to_string();
    for part in parts {
        if !part.is_empty() {
            cleaned = cleaned.replace(part.as_str(), "");
        }
    }
    cleaned
}

/// 13-position alphabetic rotation; non-alphabetic characters pass through,
/// which keeps base64 digits, `+`, `/` and `=` intact.
pub(crate) fn rot13(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'a'..='z' => (b'a' + (c as u8 - b'a' + 13) % 26) as char,
            'A'..='Z' => (b'A' + (c as u8 - b'A' + 13) % 26) as char,
            _ => c,
        })
        .collect()
}
