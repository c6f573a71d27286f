use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::media::ResolvedStream;
use crate::resolver::error::ResolverError;
use crate::resolver::hoster::{HosterResolver, Resolver, parse_hoster_url, second_level_domain};

pub static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:embed-)?([a-zA-Z0-9]{8,14})").unwrap());

// The playable URL is embedded reversed, as dash-joined hex byte pairs.
static HEX_SEGMENTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-stream="([0-9a-fA-F]{2}(?:-[0-9a-fA-F]{2})+)""#).unwrap()
});

static OFFLINE_MARKERS: &[&str] = &["File Not Found", "File was deleted"];

/// Host embedding the playable URL as a delimiter-joined sequence of hex byte
/// pairs representing the *reversed* original string.
pub struct Hexload {
    resolver: Resolver,
}

impl Hexload {
    const ALIASES: &[&str] = &["hexload.com", "hexupload.net"];

    pub fn new(client: Client) -> Self {
        Self {
            resolver: Resolver::new("hexload", client),
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

    /// Strip delimiters, decode each byte, then reverse the result.
    pub(crate) fn decode_segments(encoded: &str) -> Result<String, ResolverError> {
        let bytes = encoded
            .split('-')
            .map(|pair| u8::from_str_radix(pair, 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| ResolverError::MalformedResponse("invalid hex segment".into()))?;

        let reversed = String::from_utf8(bytes)
            .map_err(|_| ResolverError::MalformedResponse("hex segments are not utf-8".into()))?;

        Ok(reversed.chars().rev().collect())
    }

    fn recover_from_page(body: &str) -> Result<String, ResolverError> {
        let encoded = HEX_SEGMENTS_REGEX
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| {
                ResolverError::MalformedResponse("hex segment attribute not found".into())
            })?;

        let url = Self::decode_segments(encoded)?;
        if !url.starts_with("http") {
            return Err(ResolverError::MalformedResponse(
                "decoded segments are not a url".into(),
            ));
        }
        Ok(url)
    }

    fn check_offline(body: &str) -> Result<(), ResolverError> {
        if let Some(marker) = OFFLINE_MARKERS.iter().find(|marker| body.contains(**marker)) {
            return Err(ResolverError::Offline((*marker).to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HosterResolver for Hexload {
    fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn handles(&self, domain: &str) -> bool {
        Self::ALIASES.contains(&domain)
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedStream, ResolverError> {
        let id = self.extract_file_id(url)?;
        let embed_url = format!("https://{}/embed-{}.html", Self::ALIASES[0], id);

        let body = self
            .resolver
            .get(&embed_url)
            .send()
            .await?
            .text()
            .await?;

        Self::check_offline(&body)?;
        let video_url = Self::recover_from_page(&body)?;

        Ok(ResolvedStream::new(video_url).with_header("Referer", embed_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a URL the way the host does: reverse, then emit each byte as a
    /// dash-joined hex pair.
    fn encode_segments(url: &str) -> String {
        url.chars()
            .rev()
            .collect::<String>()
            .bytes()
            .map(|byte| format!("{byte:02x}"))
            .collect::<Vec<_>>()
            .join("-")
    }

    #[test]
    fn test_round_trip_law() {
        let original = "https://srv14.hexload.com/files/0/abc123/video.mp4";
        let encoded = encode_segments(original);
        assert_eq!(Hexload::decode_segments(&encoded).unwrap(), original);
    }

    #[test]
    fn test_recover_from_page() {
        let encoded = encode_segments("https://srv14.hexload.com/files/0/abc123/video.mp4");
        let body = format!(r#"<div class="player" data-stream="{encoded}"></div>"#);
        assert_eq!(
            Hexload::recover_from_page(&body).unwrap(),
            "https://srv14.hexload.com/files/0/abc123/video.mp4"
        );
    }

    #[test]
    fn test_invalid_hex_is_malformed() {
        assert!(matches!(
            Hexload::decode_segments("zz-41"),
            Err(ResolverError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_extract_file_id() {
        let hexload = Hexload::new(Client::new());
        assert_eq!(
            hexload
                .extract_file_id("https://hexupload.net/embed-8yh3l0x2w9qa.html")
                .unwrap(),
            "8yh3l0x2w9qa"
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_integration() {
        let hexload = Hexload::new(crate::resolver::default_client());
        let stream = hexload.resolve("https://hexload.com/8yh3l0x2w9qa").await;
        println!("{stream:?}");
    }
}
