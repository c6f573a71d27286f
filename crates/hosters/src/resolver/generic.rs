use crate::media::ResolvedStream;
use crate::resolver::descriptor::{HostDescriptor, IdSource};
use crate::resolver::error::ResolverError;
use crate::resolver::hoster::{HosterResolver, Resolver, parse_hoster_url, second_level_domain};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use tracing::debug;

/// Final-URL fragments that identify a redirect onto an error page.
pub(crate) const ERROR_PATH_FRAGMENTS: &[&str] =
    &["/404", "/error", "/file_not_found", "/deleted", "/unavailable"];

/// One resolver instance per descriptor; all behavior is driven by the
/// descriptor data. Covers the ~25 hosts that only differ in URL shape and
/// offline-page text.
pub struct GenericResolver {
    resolver: Resolver,
    descriptor: &'static HostDescriptor,
    id_pattern: Regex,
}

impl GenericResolver {
    pub fn new(descriptor: &'static HostDescriptor, client: Client) -> Self {
        let resolver = Resolver::new(descriptor.name, client);
        // Descriptor patterns are static and covered by table tests.
        let id_pattern = Regex::new(descriptor.id_pattern).unwrap();
        Self {
            resolver,
            descriptor,
            id_pattern,
        }
    }

    pub fn descriptor(&self) -> &'static HostDescriptor {
        self.descriptor
    }

    /// Extract and validate the file ID without touching the network.
    pub fn extract_file_id(&self, url: &str) -> Result<String, ResolverError> {
        let parsed = parse_hoster_url(url)?;
        let domain = second_level_domain(&parsed)?;
        if !self.descriptor.matches_domain(&domain) {
            return Err(ResolverError::InvalidUrl(url.to_string()));
        }

        let haystack = match self.descriptor.id_source {
            IdSource::Path => parsed.path().to_string(),
            IdSource::Query => parsed.query().unwrap_or_default().to_string(),
        };

        let id = self
            .id_pattern
            .captures(&haystack)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ResolverError::InvalidUrl(url.to_string()))?;

        if let Some(min_len) = self.descriptor.min_id_len
            && id.len() < min_len
        {
            return Err(ResolverError::InvalidUrl(url.to_string()));
        }

        Ok(id)
    }
}

/// Classify a fetched canonical page. Pure so every descriptor marker can be
/// exercised without network.
pub(crate) fn classify_response(
    descriptor: &HostDescriptor,
    status: StatusCode,
    final_url: &str,
    body: &str,
) -> Result<(), ResolverError> {
    if !status.is_success() {
        return Err(ResolverError::Offline(format!("status {}", status.as_u16())));
    }

    if let Some(fragment) = ERROR_PATH_FRAGMENTS
        .iter()
        .find(|fragment| final_url.contains(**fragment))
    {
        return Err(ResolverError::Offline(format!("redirected to {fragment}")));
    }

    // Markers are ordered; the first match short-circuits.
    if let Some(marker) = descriptor
        .offline_markers
        .iter()
        .find(|marker| body.contains(**marker))
    {
        return Err(ResolverError::Offline((*marker).to_string()));
    }

    Ok(())
}

#[async_trait]
impl HosterResolver for GenericResolver {
    fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn handles(&self, domain: &str) -> bool {
        self.descriptor.matches_domain(domain)
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedStream, ResolverError> {
        let id = self.extract_file_id(url)?;
        let canonical = self.descriptor.canonical_url(&id);

        debug!(hoster = self.descriptor.name, %canonical, "probing canonical url");

        let response = self.resolver.get(&canonical).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        classify_response(self.descriptor, status, &final_url, &body)?;

        // The original URL is returned, not the canonical one, so the caller
        // keeps the mirror identity it scraped.
        Ok(ResolvedStream::new(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::descriptor::DESCRIPTORS;

    fn descriptor(name: &str) -> &'static HostDescriptor {
        DESCRIPTORS
            .iter()
            .find(|descriptor| descriptor.name == name)
            .unwrap()
    }

    fn resolver_for(name: &str) -> GenericResolver {
        GenericResolver::new(descriptor(name), Client::new())
    }

    #[test]
    fn test_unlisted_domain_is_rejected_without_network() {
        for entry in DESCRIPTORS {
            let resolver = GenericResolver::new(entry, Client::new());
            let result = resolver.extract_file_id("https://definitely-not-a-mirror.example/e/abcdef123456");
            assert!(
                matches!(result, Err(ResolverError::InvalidUrl(_))),
                "{} accepted a foreign domain",
                entry.name
            );
        }
    }

    #[test]
    fn test_short_id_is_rejected_without_network() {
        // pattern-level: uqload ids are exactly 12 chars
        let resolver = resolver_for("uqload");
        let result = resolver.extract_file_id("https://uqload.ws/embed-abc123def45.html");
        assert!(matches!(result, Err(ResolverError::InvalidUrl(_))));

        // min_id_len-level: hitfile's pattern matches any length, the
        // descriptor minimum rejects afterwards
        let resolver = resolver_for("hitfile");
        let result = resolver.extract_file_id("https://hitfile.net/abc");
        assert!(matches!(result, Err(ResolverError::InvalidUrl(_))));
        assert!(resolver.extract_file_id("https://hitfile.net/Ab3dE9").is_ok());
    }

    #[test]
    fn test_extracts_id_from_path() {
        let resolver = resolver_for("streamwish");
        let id = resolver
            .extract_file_id("https://embedwish.com/e/k9hq2lmw3xyz")
            .unwrap();
        assert_eq!(id, "k9hq2lmw3xyz");
    }

    #[test]
    fn test_extracts_id_from_query() {
        let resolver = resolver_for("1fichier");
        let id = resolver
            .extract_file_id("https://1fichier.com/?p0p9q8r7s6t5")
            .unwrap();
        assert_eq!(id, "p0p9q8r7s6t5");
    }

    #[test]
    fn test_canonical_rewrite_is_idempotent() {
        let resolver = resolver_for("streamwish");
        let entry = descriptor("streamwish");

        let mirror_id = resolver
            .extract_file_id("https://wishfast.top/e/k9hq2lmw3xyz")
            .unwrap();
        let canonical_id = resolver
            .extract_file_id("https://streamwish.to/e/k9hq2lmw3xyz")
            .unwrap();

        assert_eq!(entry.canonical_url(&mirror_id), entry.canonical_url(&canonical_id));
    }

    #[test]
    fn test_every_offline_marker_classifies_offline() {
        for entry in DESCRIPTORS {
            for marker in entry.offline_markers {
                let body = format!("<html><body><h1>{marker}</h1></body></html>");
                let result = classify_response(
                    entry,
                    StatusCode::OK,
                    &entry.canonical_url("abcdef123456"),
                    &body,
                );
                assert!(
                    matches!(result, Err(ResolverError::Offline(_))),
                    "{}: marker {:?} not detected",
                    entry.name,
                    marker
                );
            }
        }
    }

    #[test]
    fn test_first_marker_wins() {
        let entry = descriptor("uqload");
        let body = format!(
            "page says {} and also {}",
            entry.offline_markers[1], entry.offline_markers[0]
        );
        match classify_response(entry, StatusCode::OK, "https://uqload.ws/embed-x.html", &body) {
            Err(ResolverError::Offline(marker)) => assert_eq!(marker, entry.offline_markers[0]),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_error_status_and_redirect_classify_offline() {
        let entry = descriptor("vidoza");
        assert!(matches!(
            classify_response(entry, StatusCode::NOT_FOUND, "https://vidoza.net/embed-x.html", ""),
            Err(ResolverError::Offline(_))
        ));
        assert!(matches!(
            classify_response(entry, StatusCode::OK, "https://vidoza.net/404", "<html></html>"),
            Err(ResolverError::Offline(_))
        ));
    }

    #[test]
    fn test_healthy_page_classifies_alive() {
        let entry = descriptor("vidoza");
        let body = "<html><video src=\"blob:\"></video></html>";
        assert!(
            classify_response(entry, StatusCode::OK, "https://vidoza.net/embed-x.html", body)
                .is_ok()
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_resolve_integration() {
        let resolver = resolver_for("vidoza");
        let stream = resolver
            .resolve("https://vidoza.net/embed-3q5x8k2m9f1c.html")
            .await;
        println!("{stream:?}");
    }
}
