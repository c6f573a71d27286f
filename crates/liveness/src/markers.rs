//! Signature corpora shared by both probe phases.
//!
//! The offline list is compiled from host-specific knowledge across every
//! supported hoster and is deliberately broader than any single resolver's
//! marker set: the prober only decides reachability, so a false Dead on an
//! exotic page is cheaper than surfacing removed files.

/// Cross-host offline signatures, matched against response bodies.
pub const OFFLINE_MARKERS: &[&str] = &[
    "File Not Found",
    "File not found",
    "file not found",
    "Not Found",
    "File was deleted",
    "The file was deleted",
    "This file was deleted",
    "File Deleted",
    "File has been removed",
    "file has been removed",
    "This file has been removed",
    "The file was removed",
    "File Removed",
    "File is removed",
    "File doesn't exist",
    "No such file",
    "has been deleted",
    "File is no longer available",
    "no longer available",
    "Video not found",
    "This video does not exist",
    "Video is processing",
    "Video unavailable",
    "WE ARE SORRY",
    "Page not found",
    "This content has expired",
];

/// Cloudflare challenge signatures. Their presence means the host's true
/// liveness is masked, not that the file is gone.
pub const CHALLENGE_MARKERS: &[&str] = &[
    "Just a moment",
    "Checking your browser",
    "Attention Required! | Cloudflare",
    "cf-browser-verification",
    "cf_chl_opt",
    "challenge-platform",
    "cf-turnstile",
];

/// Page titles shown while a challenge is still being solved; used by the
/// browser pool's best-effort wait.
pub const CHALLENGE_TITLES: &[&str] = &["just a moment", "checking your browser", "attention required"];

/// Final-URL fragments identifying a redirect onto an error page.
pub const ERROR_PATH_FRAGMENTS: &[&str] =
    &["/404", "/error", "/file_not_found", "/deleted", "/unavailable"];

#[cfg(test)]
mod tests {
    use super::*;

    /// The curated corpus must cover every descriptor-level marker the
    /// resolver side knows about, so a page any resolver would call offline
    /// is also dead to the prober.
    #[test]
    fn test_corpus_covers_every_descriptor_marker() {
        for descriptor in hoster_resolver::Registry::descriptors() {
            for marker in descriptor.offline_markers {
                assert!(
                    OFFLINE_MARKERS.iter().any(|known| marker.contains(known)),
                    "{}: marker {:?} not covered by the curated corpus",
                    descriptor.name,
                    marker
                );
            }
        }
    }

    #[test]
    fn test_challenge_markers_do_not_overlap_offline_markers() {
        for challenge in CHALLENGE_MARKERS {
            assert!(
                !OFFLINE_MARKERS.iter().any(|offline| challenge.contains(offline)),
                "{challenge:?} would classify as offline"
            );
        }
    }
}
