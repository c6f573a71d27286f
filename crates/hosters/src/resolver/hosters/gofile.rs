use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::media::{Quality, ResolvedStream};
use crate::resolver::credential::TokenCache;
use crate::resolver::error::ResolverError;
use crate::resolver::hoster::{HosterResolver, Resolver, parse_hoster_url, second_level_domain};

pub static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(?:d|w)/([a-zA-Z0-9]+)").unwrap());

const API_BASE: &str = "https://api.gofile.io";

// Guest tokens stay valid well beyond this; refreshing early avoids serving
// a token that dies mid-resolution.
const TOKEN_TTL: Duration = Duration::from_secs(23 * 60 * 60);

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ContentsData {
    #[serde(default)]
    children: rustc_hash::FxHashMap<String, ChildEntry>,
}

#[derive(Debug, Deserialize)]
struct ChildEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default, rename = "type")]
    kind: String,
}

/// Host whose contents endpoint requires a bearer token issued by a separate
/// accounts call; the token lives in a process-wide shared slot and is reused
/// until its TTL elapses.
pub struct GoFile {
    resolver: Resolver,
    tokens: Arc<TokenCache>,
}

impl GoFile {
    const ALIASES: &[&str] = &["gofile.io"];

    pub fn new(client: Client) -> Self {
        Self::with_token_cache(client, Arc::new(TokenCache::new(TOKEN_TTL)))
    }

    pub fn with_token_cache(client: Client, tokens: Arc<TokenCache>) -> Self {
        Self {
            resolver: Resolver::new("gofile", client),
            tokens,
        }
    }

    fn extract_content_id(&self, url: &str) -> Result<String, ResolverError> {
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

    async fn issue_token(resolver: &Resolver) -> Result<String, ResolverError> {
        let envelope = resolver
            .post(&format!("{API_BASE}/accounts"))
            .send()
            .await?
            .json::<ApiEnvelope<AccountData>>()
            .await?;

        if envelope.status != "ok" {
            return Err(ResolverError::MalformedResponse(format!(
                "accounts endpoint answered status {}",
                envelope.status
            )));
        }

        envelope
            .data
            .map(|data| data.token)
            .ok_or_else(|| ResolverError::MalformedResponse("accounts data missing".into()))
    }

    fn pick_stream(contents: ContentsData) -> Result<ResolvedStream, ResolverError> {
        let file = contents
            .children
            .into_values()
            .find(|child| child.kind == "file" && child.link.is_some())
            .ok_or_else(|| ResolverError::Offline("no downloadable children".into()))?;

        let link = file.link.unwrap();
        let quality = Quality::from_label(&file.name);
        Ok(ResolvedStream::new(link).with_quality(quality))
    }
}

#[async_trait]
impl HosterResolver for GoFile {
    fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn handles(&self, domain: &str) -> bool {
        Self::ALIASES.contains(&domain)
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedStream, ResolverError> {
        let content_id = self.extract_content_id(url)?;

        let resolver = &self.resolver;
        let token = self
            .tokens
            .get_or_issue(|| Self::issue_token(resolver))
            .await?;

        debug!(%content_id, "querying contents endpoint");

        let envelope = self
            .resolver
            .get(&format!("{API_BASE}/contents/{content_id}"))
            .bearer_auth(&token)
            .send()
            .await?
            .json::<ApiEnvelope<ContentsData>>()
            .await?;

        // API-level status, not HTTP status: "error-notFound" and friends
        // arrive with HTTP 200.
        if envelope.status != "ok" {
            return Err(ResolverError::Offline(format!(
                "api status {}",
                envelope.status
            )));
        }

        let contents = envelope
            .data
            .ok_or_else(|| ResolverError::MalformedResponse("contents data missing".into()))?;

        let mut stream = Self::pick_stream(contents)?;
        stream
            .extra_headers
            .insert("Cookie".to_string(), format!("accountToken={token}"));
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content_id() {
        let gofile = GoFile::new(Client::new());
        assert_eq!(
            gofile.extract_content_id("https://gofile.io/d/Ab3dEf").unwrap(),
            "Ab3dEf"
        );
        assert!(matches!(
            gofile.extract_content_id("https://gofile.io/profile"),
            Err(ResolverError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_api_status_is_checked_by_value() {
        let envelope: ApiEnvelope<ContentsData> =
            serde_json::from_str(r#"{"status": "error-notFound", "data": null}"#).unwrap();
        assert_eq!(envelope.status, "error-notFound");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_pick_stream_prefers_file_children() {
        let contents: ContentsData = serde_json::from_str(
            r#"{
                "children": {
                    "a": {"name": "folder", "type": "folder"},
                    "b": {"name": "Movie.2024.1080p.mkv", "type": "file",
                          "link": "https://store3.gofile.io/download/direct/b/Movie.mkv"}
                }
            }"#,
        )
        .unwrap();

        let stream = GoFile::pick_stream(contents).unwrap();
        assert_eq!(
            stream.video_url,
            "https://store3.gofile.io/download/direct/b/Movie.mkv"
        );
        assert_eq!(stream.quality, Quality::Hd1080);
    }

    #[test]
    fn test_pick_stream_without_files_is_offline() {
        let contents: ContentsData =
            serde_json::from_str(r#"{"children": {}}"#).unwrap();
        assert!(matches!(
            GoFile::pick_stream(contents),
            Err(ResolverError::Offline(_))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_integration() {
        let gofile = GoFile::new(crate::resolver::default_client());
        let stream = gofile.resolve("https://gofile.io/d/Ab3dEf").await;
        println!("{stream:?}");
    }
}
