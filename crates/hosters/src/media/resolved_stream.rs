use crate::media::Quality;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A playable or downloadable URL recovered from a hoster page.
///
/// Produced fresh on every resolution call and owned by the caller; resolvers
/// never cache these. `extra_headers` carries request headers the delivery CDN
/// requires (typically `Referer`/`Origin`).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResolvedStream {
    pub video_url: String,
    pub quality: Quality,
    pub is_hls: bool,
    pub extra_headers: FxHashMap<String, String>,
}

impl ResolvedStream {
    pub fn new<S: Into<String>>(video_url: S) -> Self {
        let video_url = video_url.into();
        let is_hls = video_url.contains(".m3u8");
        Self {
            video_url,
            quality: Quality::Unknown,
            is_hls,
            extra_headers: FxHashMap::default(),
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ResolvedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_hls { "hls" } else { "direct" };
        write!(f, "{} ({}) - {}", self.video_url, kind, self.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hls_detection() {
        assert!(ResolvedStream::new("https://cdn.example.com/hls/master.m3u8").is_hls);
        assert!(!ResolvedStream::new("https://cdn.example.com/v/file.mp4").is_hls);
    }
}
