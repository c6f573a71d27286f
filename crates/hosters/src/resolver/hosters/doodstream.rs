use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use crate::media::ResolvedStream;
use crate::resolver::error::ResolverError;
use crate::resolver::hoster::{HosterResolver, Resolver, parse_hoster_url, second_level_domain};

pub static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[de]/([a-zA-Z0-9]+)").unwrap());

// e.g. $.get('/pass_md5/15342/g2wx0q8y', function(data) { ... })
static PASS_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(/pass_md5/[^']+)'").unwrap());

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?token=([a-zA-Z0-9]+)&expiry=").unwrap());

const PLAY_TAIL_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Host requiring a two-request token exchange: the embed page carries an
/// ephemeral `/pass_md5/` path and an access token; a second request to that
/// path returns the CDN base the playable URL is assembled from.
pub struct DoodStream {
    resolver: Resolver,
}

impl DoodStream {
    const ALIASES: &[&str] = &[
        "dood.li",
        "dood.to",
        "dood.watch",
        "doodstream.com",
        "ds2play.com",
        "ds2video.com",
    ];

    const OFFLINE_MARKERS: &[&str] = &["Video not found", "File Deleted", "File not found"];

    // A captcha interstitial hides the player without saying anything about
    // the file itself.
    const CAPTCHA_MARKERS: &[&str] = &["g-recaptcha", "cf-turnstile", "Verify you are human"];

    pub fn new(client: Client) -> Self {
        Self {
            resolver: Resolver::new("doodstream", client),
        }
    }

    fn extract_file_id(&self, url: &str) -> Result<String, ResolverError> {
        let parsed = parse_hoster_url(url)?;
        let domain = second_level_domain(&parsed)?;
        if !self.handles(&domain) {
            return Err(ResolverError::InvalidUrl(url.to_string()));
        }
        URL_REGEX
            .captures(parsed.path())
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ResolverError::InvalidUrl(url.to_string()))
    }

    fn classify_embed_page(body: &str) -> Result<(), ResolverError> {
        // Blocked is checked first: a captcha page must not count as removal
        // evidence even if it happens to mention an offline phrase.
        if Self::CAPTCHA_MARKERS.iter().any(|marker| body.contains(marker)) {
            return Err(ResolverError::Blocked);
        }
        if let Some(marker) = Self::OFFLINE_MARKERS
            .iter()
            .find(|marker| body.contains(**marker))
        {
            return Err(ResolverError::Offline((*marker).to_string()));
        }
        Ok(())
    }

    fn extract_pass_path(body: &str) -> Result<&str, ResolverError> {
        PASS_PATH_REGEX
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ResolverError::MalformedResponse("pass_md5 path not found".into()))
    }

    fn extract_token(body: &str) -> Result<&str, ResolverError> {
        TOKEN_REGEX
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| ResolverError::MalformedResponse("access token not found".into()))
    }

    /// The playable URL is the CDN base returned by the pass_md5 call plus a
    /// random tail, the page token and a current-time expiry parameter.
    fn assemble_play_url(cdn_base: &str, token: &str, expiry_millis: u128) -> String {
        let mut rng = rand::rng();
        let tail: String = (0..10)
            .map(|_| {
                let idx = rng.random_range(0..PLAY_TAIL_CHARSET.len());
                PLAY_TAIL_CHARSET[idx] as char
            })
            .collect();
        format!("{cdn_base}{tail}?token={token}&expiry={expiry_millis}")
    }
}

#[async_trait]
impl HosterResolver for DoodStream {
    fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn handles(&self, domain: &str) -> bool {
        Self::ALIASES.contains(&domain)
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedStream, ResolverError> {
        let id = self.extract_file_id(url)?;
        let base = format!("https://{}", Self::ALIASES[0]);
        let embed_url = format!("{base}/e/{id}");

        let body = self
            .resolver
            .get(&embed_url)
            .send()
            .await?
            .text()
            .await?;

        Self::classify_embed_page(&body)?;

        let pass_path = Self::extract_pass_path(&body)?;
        let token = Self::extract_token(&body)?;

        debug!(%pass_path, "exchanging ephemeral path for cdn base");

        let cdn_base = self
            .resolver
            .get(&format!("{base}{pass_path}"))
            .header(reqwest::header::REFERER, embed_url.clone())
            .send()
            .await?
            .text()
            .await?;

        if !cdn_base.starts_with("http") {
            return Err(ResolverError::MalformedResponse(
                "pass_md5 exchange returned no cdn base".into(),
            ));
        }

        let expiry = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let play_url = Self::assemble_play_url(cdn_base.trim(), token, expiry);

        Ok(ResolvedStream::new(play_url).with_header("Referer", format!("{base}/")))
    }
}
