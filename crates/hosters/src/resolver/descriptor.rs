/// Where a descriptor's `id_pattern` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Match against the URL path (leading `/` included).
    Path,
    /// Match against the raw query string.
    Query,
}

/// Immutable description of one structurally homogeneous hoster family
/// member: URL shape, mirror domains and offline signatures. Pure data; the
/// generic resolver supplies all behavior.
#[derive(Debug)]
pub struct HostDescriptor {
    /// Globally unique, stable identifier used for dispatch.
    pub name: &'static str,
    /// Known mirror domains. The first entry is the canonical domain every
    /// mirror URL is rewritten to before fetching.
    pub domain_aliases: &'static [&'static str],
    /// Regex extracting the file ID; capture group 1 is the ID.
    pub id_pattern: &'static str,
    pub id_source: IdSource,
    /// Canonical path template; `{}` is replaced with the extracted ID.
    pub embed_path: &'static str,
    /// Offline signatures, checked in order against the response body.
    pub offline_markers: &'static [&'static str],
    /// IDs shorter than this are rejected before any network call.
    pub min_id_len: Option<usize>,
}

impl HostDescriptor {
    pub fn canonical_domain(&self) -> &'static str {
        self.domain_aliases[0]
    }

    pub fn canonical_url(&self, id: &str) -> String {
        format!(
            "https://{}{}",
            self.canonical_domain(),
            self.embed_path.replacen("{}", id, 1)
        )
    }

    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain_aliases.contains(&domain)
    }
}

/// Static table of all descriptor-driven hosters. Created once at process
/// start; never mutated.
pub const DESCRIPTORS: &[HostDescriptor] = &[
    // --- embed/video hosts -------------------------------------------------
    HostDescriptor {
        name: "streamwish",
        domain_aliases: &["streamwish.to", "streamwish.com", "embedwish.com", "wishfast.top"],
        id_pattern: r"^/(?:e/|f/)?([a-zA-Z0-9]{10,14})$",
        id_source: IdSource::Path,
        embed_path: "/e/{}",
        offline_markers: &["File is no longer available", "The file was deleted"],
        min_id_len: Some(10),
    },
    HostDescriptor {
        name: "vidhide",
        domain_aliases: &["vidhide.com", "vidhidepro.com", "vidhidevip.com"],
        id_pattern: r"^/(?:e/|f/)?([a-zA-Z0-9]{10,14})$",
        id_source: IdSource::Path,
        embed_path: "/e/{}",
        offline_markers: &["File is no longer available", "File Not Found"],
        min_id_len: Some(10),
    },
    HostDescriptor {
        name: "filelions",
        domain_aliases: &["filelions.to", "filelions.site", "alions.pro"],
        id_pattern: r"^/(?:e/|f/|v/)?([a-zA-Z0-9]{10,14})$",
        id_source: IdSource::Path,
        embed_path: "/v/{}",
        offline_markers: &["File is no longer available", "File Not Found"],
        min_id_len: Some(10),
    },
    HostDescriptor {
        name: "uqload",
        domain_aliases: &["uqload.ws", "uqload.io", "uqload.com"],
        id_pattern: r"^/(?:embed-)?([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/embed-{}.html",
        offline_markers: &["File was deleted", "File Not Found"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "upstream",
        domain_aliases: &["upstream.to"],
        id_pattern: r"^/(?:embed-)?([a-zA-Z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/embed-{}.html",
        offline_markers: &["File Not Found", "The file was removed"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "vidoza",
        domain_aliases: &["vidoza.net", "videzz.net"],
        id_pattern: r"^/(?:embed-)?([a-zA-Z0-9]+)(?:\.html)?$",
        id_source: IdSource::Path,
        embed_path: "/embed-{}.html",
        offline_markers: &["Video not found", "File was deleted"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "supervideo",
        domain_aliases: &["supervideo.cc", "supervideo.tv"],
        id_pattern: r"^/(?:e/)?([a-z0-9]+)$",
        id_source: IdSource::Path,
        embed_path: "/e/{}",
        offline_markers: &["File is no longer available", "Not Found"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "luluvdo",
        domain_aliases: &["luluvdo.com", "lulustream.com"],
        id_pattern: r"^/(?:e/|d/)?([a-zA-Z0-9]{10,14})$",
        id_source: IdSource::Path,
        embed_path: "/e/{}",
        offline_markers: &["File is no longer available", "File Not Found"],
        min_id_len: Some(10),
    },
    HostDescriptor {
        name: "vtube",
        domain_aliases: &["vtube.network", "vtbe.to"],
        id_pattern: r"^/(?:embed-)?([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/embed-{}.html",
        offline_markers: &["File Not Found", "The file was deleted"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "wolfstream",
        domain_aliases: &["wolfstream.tv"],
        id_pattern: r"^/(?:embed-)?([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/embed-{}.html",
        offline_markers: &["File Not Found", "Video is processing"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "goodstream",
        domain_aliases: &["goodstream.one", "goodstream.uno"],
        id_pattern: r"^/(?:video|embed)/([a-zA-Z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/embed/{}",
        offline_markers: &["Video not found", "has been deleted"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "streamvid",
        domain_aliases: &["streamvid.net"],
        id_pattern: r"^/(?:e/|d/)?([a-zA-Z0-9]{10,14})$",
        id_source: IdSource::Path,
        embed_path: "/e/{}",
        offline_markers: &["File is no longer available", "Not Found"],
        min_id_len: Some(10),
    },
    // --- file hosts --------------------------------------------------------
    HostDescriptor {
        name: "rapidgator",
        domain_aliases: &["rapidgator.net", "rg.to"],
        id_pattern: r"^/file/([a-z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/file/{}",
        offline_markers: &["File not found", "This file was deleted"],
        min_id_len: Some(6),
    },
    HostDescriptor {
        name: "ddownload",
        domain_aliases: &["ddownload.com", "ddl.to"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "No such file"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "katfile",
        domain_aliases: &["katfile.com"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "File has been removed"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "nitroflare",
        domain_aliases: &["nitroflare.com", "nitro.download"],
        id_pattern: r"^/view/([A-Z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/view/{}",
        offline_markers: &["File doesn't exist", "This file has been removed"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "turbobit",
        domain_aliases: &["turbobit.net", "turb.cc"],
        id_pattern: r"^/([a-z0-9]+)\.html",
        id_source: IdSource::Path,
        embed_path: "/{}.html",
        offline_markers: &["File not found", "File was deleted or did not exist"],
        min_id_len: Some(6),
    },
    HostDescriptor {
        name: "hitfile",
        domain_aliases: &["hitfile.net", "hil.to"],
        id_pattern: r"^/([A-Za-z0-9]+)\b",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File not found", "File was deleted"],
        min_id_len: Some(5),
    },
    HostDescriptor {
        name: "1fichier",
        domain_aliases: &["1fichier.com", "alterupload.com", "cjoint.net"],
        id_pattern: r"^([a-z0-9]+)",
        id_source: IdSource::Query,
        embed_path: "/?{}",
        offline_markers: &["The requested file has been deleted", "File not found"],
        min_id_len: Some(5),
    },
    HostDescriptor {
        name: "mexashare",
        domain_aliases: &["mexa.sh", "mexashare.com"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "No such file"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "clicknupload",
        domain_aliases: &["clicknupload.click", "clicknupload.to"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "File has been removed"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "fikper",
        domain_aliases: &["fikper.com"],
        id_pattern: r"^/([a-zA-Z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File not found", "File has been removed"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "krakenfiles",
        domain_aliases: &["krakenfiles.com"],
        id_pattern: r"^/view/([a-zA-Z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/view/{}/file.html",
        offline_markers: &["File not found", "File is removed"],
        min_id_len: Some(8),
    },
    HostDescriptor {
        name: "sendcm",
        domain_aliases: &["send.cm", "send.now"],
        id_pattern: r"^/(?:d/)?([a-zA-Z0-9]+)",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "File has been removed"],
        min_id_len: Some(6),
    },
    HostDescriptor {
        name: "dailyuploads",
        domain_aliases: &["dailyuploads.net"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "File Removed"],
        min_id_len: Some(12),
    },
    HostDescriptor {
        name: "usersdrive",
        domain_aliases: &["usersdrive.com"],
        id_pattern: r"^/([a-z0-9]{12})",
        id_source: IdSource::Path,
        embed_path: "/{}",
        offline_markers: &["File Not Found", "File was deleted"],
        min_id_len: Some(12),
    },
];
