use crate::media::ResolvedStream;
use crate::resolver::default::DEFAULT_UA;
use crate::resolver::error::ResolverError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use std::str::FromStr;
use url::Url;

/// Base resolver shared by all hoster implementations.
///
/// Holds the hoster's stable name, the process-wide HTTP client and the
/// browser-like header set sent with every request. Resolvers are long-lived
/// singletons constructed once by the registry; the target URL is passed per
/// call rather than stored.
#[derive(Debug, Clone)]
pub struct Resolver {
    // stable identifier used for dispatch, e.g. "voe", "doodstream"
    pub name: &'static str,
    // The reqwest client
    pub client: Client,
    // hoster-specific headers sent with every request
    headers: HeaderMap,
}

impl Resolver {
    pub fn new(name: &'static str, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(reqwest::header::USER_AGENT, DEFAULT_UA.parse().unwrap());
        default_headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.9,de;q=0.5".parse().unwrap(),
        );
        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            "gzip, deflate".parse().unwrap(),
        );

        Self {
            name,
            client,
            headers: default_headers,
        }
    }

    pub fn add_header<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.headers.insert(
            HeaderName::from_str(&key.into()).unwrap(),
            HeaderValue::from_str(&value.into()).unwrap(),
        );
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.headers.clone())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Extract the second-level domain of a URL, e.g.
/// `https://www.dood.watch/e/abc` -> `dood.watch`.
pub fn second_level_domain(url: &Url) -> Result<String, ResolverError> {
    let host = url
        .host_str()
        .ok_or_else(|| ResolverError::InvalidUrl(url.to_string()))?;
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Ok(host.to_string());
    }
    Ok(labels[labels.len() - 2..].join("."))
}

/// Parse a hoster URL, rejecting anything that is not http(s).
pub fn parse_hoster_url(url: &str) -> Result<Url, ResolverError> {
    let parsed = Url::parse(url).map_err(|_| ResolverError::InvalidUrl(url.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ResolverError::InvalidUrl(url.to_string()));
    }
    Ok(parsed)
}

#[async_trait]
pub trait HosterResolver: Send + Sync {
    fn resolver(&self) -> &Resolver;

    /// Stable identifier used for dispatch-by-host.
    fn name(&self) -> &'static str {
        self.resolver().name
    }

    /// Whether this resolver is responsible for the given second-level domain.
    fn handles(&self, domain: &str) -> bool;

    /// Resolve a hoster URL into a playable stream.
    ///
    /// Every error kind collapses to a negative result at the registry
    /// boundary; nothing here aborts a caller's batch.
    async fn resolve(&self, url: &str) -> Result<ResolvedStream, ResolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_level_domain() {
        let url = Url::parse("https://www.dood.watch/e/abc123").unwrap();
        assert_eq!(second_level_domain(&url).unwrap(), "dood.watch");

        let url = Url::parse("https://voe.sx/e/xyz").unwrap();
        assert_eq!(second_level_domain(&url).unwrap(), "voe.sx");
    }

    #[test]
    fn test_parse_hoster_url_rejects_non_http() {
        assert!(matches!(
            parse_hoster_url("ftp://example.com/file"),
            Err(ResolverError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_hoster_url("not a url"),
            Err(ResolverError::InvalidUrl(_))
        ));
    }
}
