use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unsupported hoster")]
    UnsupportedHoster,
    #[error("http error: {0}")]
    Unreachable(#[from] reqwest::Error),
    #[error("offline: {0}")]
    Offline(String),
    #[error("blocked by challenge gate")]
    Blocked,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ResolverError {
    /// Whether this failure is evidence that the underlying file was removed.
    ///
    /// `Blocked` in particular means a captcha/challenge gate masked the
    /// content; the file may still exist, so callers keeping removal
    /// statistics must not count it.
    pub fn indicates_removal(&self) -> bool {
        matches!(self, ResolverError::Offline(_))
    }
}
