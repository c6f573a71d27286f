use std::sync::Arc;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::media::ResolvedStream;
use crate::resolver::descriptor::{DESCRIPTORS, HostDescriptor};
use crate::resolver::error::ResolverError;
use crate::resolver::generic::GenericResolver;
use crate::resolver::hoster::{HosterResolver, second_level_domain};
use crate::resolver::hosters::{DoodStream, GoFile, Hexload, MixDrop, Streamtape, Voe};

/// Registry of every known hoster resolver: one generic resolver per
/// descriptor plus the bespoke implementations, all sharing a single
/// outbound HTTP client.
pub struct Registry {
    resolvers: Vec<Arc<dyn HosterResolver>>,
}

impl Registry {
    pub fn with_client(client: Client) -> Self {
        let mut resolvers: Vec<Arc<dyn HosterResolver>> = DESCRIPTORS
            .iter()
            .map(|descriptor| {
                Arc::new(GenericResolver::new(descriptor, client.clone()))
                    as Arc<dyn HosterResolver>
            })
            .collect();

        resolvers.push(Arc::new(Voe::new(client.clone())));
        resolvers.push(Arc::new(DoodStream::new(client.clone())));
        resolvers.push(Arc::new(Streamtape::new(client.clone())));
        resolvers.push(Arc::new(GoFile::new(client.clone())));
        resolvers.push(Arc::new(Hexload::new(client.clone())));
        resolvers.push(Arc::new(MixDrop::new(client)));

        Self { resolvers }
    }

    /// The static descriptor table backing the generic family.
    pub fn descriptors() -> &'static [HostDescriptor] {
        DESCRIPTORS
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resolvers.iter().map(|resolver| resolver.name())
    }

    /// Look up a resolver by its stable name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn HosterResolver>> {
        self.resolvers.iter().find(|resolver| resolver.name() == name)
    }

    /// Dispatch by the URL's second-level domain.
    pub fn for_url(&self, url: &str) -> Result<&Arc<dyn HosterResolver>, ResolverError> {
        let parsed = Url::parse(url).map_err(|_| ResolverError::InvalidUrl(url.to_string()))?;
        let domain = second_level_domain(&parsed)?;
        self.resolvers
            .iter()
            .find(|resolver| resolver.handles(&domain))
            .ok_or(ResolverError::UnsupportedHoster)
    }

    /// Resolve a hoster URL, collapsing every failure to `None`.
    ///
    /// Batch callers resolve dozens of independently unreliable hosts; a
    /// single host's failure must never abort the batch, so nothing
    /// propagates past this boundary.
    pub async fn resolve(&self, url: &str) -> Option<ResolvedStream> {
        let resolver = match self.for_url(url) {
            Ok(resolver) => resolver,
            Err(_) => {
                debug!(%url, "no resolver registered for host");
                return None;
            }
        };

        match resolver.resolve(url).await {
            Ok(stream) => Some(stream),
            Err(ResolverError::Blocked) => {
                // Not removal evidence; the file may still exist behind the
                // gate.
                debug!(hoster = resolver.name(), %url, "blocked by challenge gate");
                None
            }
            Err(error) => {
                debug!(hoster = resolver.name(), %url, %error, "resolution failed");
                None
            }
        }
    }
}
